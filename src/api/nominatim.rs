use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::http;
use crate::config::Config;
use crate::domain::{BoundingBox, LatLng};
use crate::error::{Error, Result};

const SERVICE: &str = "Nominatim";

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    osm_type: Option<String>,
    #[serde(default)]
    osm_id: Option<u64>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default, rename = "type")]
    type_: Option<String>,
    /// `[south, north, west, east]` as strings
    #[serde(default)]
    boundingbox: Option<Vec<String>>,
}

/// A geocoding hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub display_name: String,
    pub location: LatLng,
    pub osm_type: Option<String>,
    pub osm_id: Option<u64>,
    pub class: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub bounding_box: Option<BoundingBox>,
}

impl NominatimResult {
    fn into_place(self) -> Option<Place> {
        let lat: f64 = self.lat.parse().ok()?;
        let lon: f64 = self.lon.parse().ok()?;

        let bounding_box = self.boundingbox.as_deref().and_then(parse_bounding_box);

        Some(Place {
            display_name: self.display_name,
            location: LatLng::new(lat, lon),
            osm_type: self.osm_type,
            osm_id: self.osm_id,
            class: self.class,
            kind: self.type_,
            bounding_box,
        })
    }
}

fn parse_bounding_box(raw: &[String]) -> Option<BoundingBox> {
    let values: Vec<f64> = raw.iter().map(|v| v.parse().ok()).collect::<Option<_>>()?;
    match values.as_slice() {
        &[south, north, west, east] => Some(BoundingBox::new(south, west, north, east)),
        _ => None,
    }
}

/// Search places matching a free-form query (e.g. "Dakar, Senegal")
pub fn search_places(config: &Config, query: &str, limit: u32) -> Result<Vec<Place>> {
    let client = http::build_client(&config.http)?;
    let limit = limit.to_string();

    debug!(query, "Searching Nominatim");
    let request = client.get(&config.endpoints.nominatim_url).query(&[
        ("q", query),
        ("format", "json"),
        ("limit", limit.as_str()),
    ]);

    let results: Vec<NominatimResult> = http::fetch_json(SERVICE, request)?;

    Ok(results
        .into_iter()
        .filter_map(|r| {
            let name = r.display_name.clone();
            let place = r.into_place();
            if place.is_none() {
                warn!(%name, "Skipping Nominatim result with unparsable coordinates");
            }
            place
        })
        .collect())
}

/// Coordinates of the best match for `query`
pub fn geocode(config: &Config, query: &str) -> Result<LatLng> {
    search_places(config, query, 1)?
        .into_iter()
        .next()
        .map(|place| place.location)
        .ok_or_else(|| Error::NotFound {
            service: SERVICE,
            what: format!("place {query:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nominatim_response() {
        let json = r#"[{
            "place_id": 259174015,
            "osm_type": "relation",
            "osm_id": 3209426,
            "lat": "14.6934",
            "lon": "-17.4479",
            "class": "boundary",
            "type": "administrative",
            "display_name": "Dakar, Sénégal",
            "boundingbox": ["14.6369", "14.7908", "-17.5449", "-17.4019"]
        }]"#;

        let results: Vec<NominatimResult> = http::decode_json(SERVICE, json).unwrap();
        let place = results.into_iter().next().unwrap().into_place().unwrap();

        assert_eq!(place.display_name, "Dakar, Sénégal");
        assert_eq!(place.location, LatLng::new(14.6934, -17.4479));
        assert_eq!(place.osm_type.as_deref(), Some("relation"));
        assert_eq!(place.kind.as_deref(), Some("administrative"));
        assert_eq!(
            place.bounding_box,
            Some(BoundingBox::new(14.6369, -17.5449, 14.7908, -17.4019))
        );
    }

    #[test]
    fn test_minimal_result() {
        let json = r#"[{"lat":"37.7790262","lon":"-122.4199061","display_name":"San Francisco, California, USA"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();
        let place = results.into_iter().next().unwrap().into_place().unwrap();

        assert_eq!(place.location.lat, 37.7790262);
        assert!(place.bounding_box.is_none());
    }

    #[test]
    fn test_unparsable_coordinates() {
        let json = r#"[{"lat":"north","lon":"-122.4","display_name":"Nowhere"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();
        assert!(results.into_iter().next().unwrap().into_place().is_none());
    }
}
