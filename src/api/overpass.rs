use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use super::http;
use crate::config::Config;
use crate::domain::{BoundingBox, Element, LatLng, Poi};
use crate::error::{Error, Result};
use crate::osm::normalize_elements;

const SERVICE: &str = "Overpass API";

/// Raw Overpass API response
#[derive(Debug, Deserialize)]
pub(crate) struct OverpassResponse {
    pub elements: Vec<Element>,
    /// Set when the query hit a runtime error; `elements` may be partial
    #[serde(default)]
    pub remark: Option<String>,
}

/// One POI category, matched as `["key"="value"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<(&str, &str)> for TagFilter {
    fn from((key, value): (&str, &str)) -> Self {
        Self::new(key, value)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for TagFilter {
    type Err = Error;

    /// Parse `key=value`, e.g. `amenity=cafe`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                Ok(Self::new(key.trim(), value.trim()))
            }
            _ => Err(Error::InvalidInput(format!(
                "tag filter {s:?}: expected key=value"
            ))),
        }
    }
}

/// Categories queried by [`fetch_food_shops`]
pub fn food_categories() -> Vec<TagFilter> {
    vec![
        TagFilter::new("amenity", "cafe"),
        TagFilter::new("amenity", "restaurant"),
        TagFilter::new("shop", "deli"),
        TagFilter::new("amenity", "ice_cream"),
        TagFilter::new("amenity", "fast_food"),
    ]
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Overpass QL query returning every node, way and relation matching one of
/// `categories` inside `bbox`, followed by the nodes they reference.
pub fn build_poi_query(bbox: &BoundingBox, categories: &[TagFilter]) -> String {
    let mut statements = String::new();
    for category in categories {
        let filter = format!(r#"["{}"="{}"]"#, escape(&category.key), escape(&category.value));
        for kind in ["node", "way", "relation"] {
            statements.push_str(&format!("  {kind}{filter}({bbox});\n"));
        }
    }

    format!(
        r#"[out:json][timeout:25];
(
{statements});
out body;
>;
out skel qt;"#
    )
}

/// Fetch POIs of the given categories from Overpass
///
/// # Arguments
/// * `bbox` - Area to search
/// * `categories` - Tag pairs such as `amenity=restaurant`; at least one
///
/// # Returns
/// * Normalized POIs, one per tagged element
pub fn fetch_pois(config: &Config, bbox: &BoundingBox, categories: &[TagFilter]) -> Result<Vec<Poi>> {
    if categories.is_empty() {
        return Err(Error::InvalidInput(
            "at least one POI category is required".to_string(),
        ));
    }

    let query = build_poi_query(bbox, categories);
    let response = execute_overpass_query(config, &query)?;

    let fetched = response.elements.len();
    let pois = normalize_elements(response.elements);
    debug!(fetched, kept = pois.len(), "Normalized Overpass elements");

    Ok(pois)
}

/// [`fetch_pois`] for a map view given by its corners
pub fn fetch_pois_in_corners(
    config: &Config,
    north_east: LatLng,
    south_west: LatLng,
    categories: &[TagFilter],
) -> Result<Vec<Poi>> {
    let bbox = BoundingBox::from_corners(north_east, south_west);
    fetch_pois(config, &bbox, categories)
}

/// Restaurants, cafes, delis, ice cream parlours and fast food in a map view
pub fn fetch_food_shops(config: &Config, north_east: LatLng, south_west: LatLng) -> Result<Vec<Poi>> {
    fetch_pois_in_corners(config, north_east, south_west, &food_categories())
}

fn execute_overpass_query(config: &Config, query: &str) -> Result<OverpassResponse> {
    let client = http::build_client(&config.http)?;
    debug!(url = %config.endpoints.overpass_url, "Sending Overpass query");

    // Overpass expects form-encoded POST data: data=<query>
    let request = client
        .post(&config.endpoints.overpass_url)
        .form(&[("data", query)]);

    let response: OverpassResponse = http::fetch_json(SERVICE, request)?;
    if let Some(remark) = &response.remark {
        warn!(%remark, "Overpass API returned a remark, results may be incomplete");
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_poi_query() {
        let bbox: BoundingBox = "14.67,-17.46,14.71,-17.41".parse().unwrap();
        let query = build_poi_query(
            &bbox,
            &[
                TagFilter::new("amenity", "cafe"),
                TagFilter::new("amenity", "restaurant"),
            ],
        );

        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains(r#"  node["amenity"="cafe"](14.67,-17.46,14.71,-17.41);"#));
        assert!(query.contains(r#"  way["amenity"="cafe"](14.67,-17.46,14.71,-17.41);"#));
        assert!(query.contains(r#"  relation["amenity"="restaurant"](14.67,-17.46,14.71,-17.41);"#));
        assert_eq!(query.matches("node[").count(), 2);
        assert_eq!(query.matches("way[").count(), 2);
        assert_eq!(query.matches("relation[").count(), 2);
        assert!(query.ends_with("out body;\n>;\nout skel qt;"));
    }

    #[test]
    fn test_query_escapes_quotes() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let query = build_poi_query(&bbox, &[TagFilter::new("name", r#"Bob's "Diner""#)]);
        assert!(query.contains(r#"["name"="Bob's \"Diner\""]"#));
    }

    #[test]
    fn test_tag_filter_parse() {
        assert_eq!(
            "amenity=cafe".parse::<TagFilter>().unwrap(),
            TagFilter::new("amenity", "cafe")
        );
        assert_eq!(
            "cuisine=a=b".parse::<TagFilter>().unwrap(),
            TagFilter::new("cuisine", "a=b")
        );
        assert!("amenity".parse::<TagFilter>().is_err());
        assert!("=cafe".parse::<TagFilter>().is_err());
        assert_eq!(TagFilter::from(("shop", "deli")).to_string(), "shop=deli");
    }

    #[test]
    fn test_food_categories() {
        let categories = food_categories();
        assert_eq!(categories.len(), 5);
        assert!(categories.contains(&TagFilter::new("shop", "deli")));
    }

    #[test]
    fn test_fetch_pois_requires_categories() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let err = fetch_pois(&Config::default(), &bbox, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_parse_overpass_response() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 14.69, "lon": -17.44, "tags": {"amenity": "cafe"}},
                {"type": "way", "id": 2, "nodes": [1, 3]},
                {"type": "node", "id": 3, "lat": 14.7, "lon": -17.45}
            ]
        }"#;

        let response: OverpassResponse = http::decode_json(SERVICE, json).unwrap();
        assert_eq!(response.elements.len(), 3);
        assert!(response.remark.is_none());

        let pois = normalize_elements(response.elements);
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].get_str("amenity"), Some("cafe"));
    }
}
