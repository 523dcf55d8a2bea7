use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::http;
use crate::config::Config;
use crate::domain::LatLng;
use crate::error::Result;

const SERVICE: &str = "Wikidata";
const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

pub const DEFAULT_LIMIT: u32 = 3000;

#[derive(Debug, Default, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: SparqlResults,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// A Wikidata entity with coordinates, flattened from a SPARQL binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikidataItem {
    /// Q-identifier, e.g. "Q3718"
    pub id: String,
    pub entity_url: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub location: Option<LatLng>,
    /// Commons file URL (P18)
    pub image: Option<String>,
    /// Commons category (P373)
    pub commons_category: Option<String>,
}

/// SPARQL query listing entities with a coordinate location (P625) inside
/// the box, with their image, Commons category, label and description.
pub fn build_box_query(north_east: LatLng, south_west: LatLng, limit: u32) -> String {
    format!(
        r#"SELECT ?q ?qLabel ?location ?image ?reason ?desc ?commonscat WHERE {{
  SERVICE wikibase:box {{
    ?q wdt:P625 ?location.
    bd:serviceParam wikibase:cornerSouthWest "Point({sw_lng} {sw_lat})"^^geo:wktLiteral;
      wikibase:cornerNorthEast "Point({ne_lng} {ne_lat})"^^geo:wktLiteral.
  }}
  OPTIONAL {{ ?q wdt:P18 ?image. }}
  OPTIONAL {{ ?q wdt:P373 ?commonscat. }}
  SERVICE wikibase:label {{
    bd:serviceParam wikibase:language "[AUTO_LANGUAGE]".
    ?q schema:description ?desc;
      rdfs:label ?qLabel.
  }}
}}
LIMIT {limit}"#,
        sw_lng = south_west.lng,
        sw_lat = south_west.lat,
        ne_lng = north_east.lng,
        ne_lat = north_east.lat,
    )
}

/// Parse a WKT literal such as `Point(-17.4 14.7)` (longitude first)
pub fn parse_wkt_point(wkt: &str) -> Option<LatLng> {
    let inner = wkt
        .trim()
        .strip_prefix("Point(")
        .and_then(|rest| rest.strip_suffix(')'))?;

    let mut coords = inner.split_whitespace().map(str::parse::<f64>);
    let lng = coords.next()?.ok()?;
    let lat = coords.next()?.ok()?;
    if coords.next().is_some() {
        return None;
    }

    Some(LatLng::new(lat, lng))
}

fn item_from_binding(mut binding: HashMap<String, SparqlValue>) -> Option<WikidataItem> {
    let entity_url = binding.remove("q")?.value;
    let id = entity_url
        .strip_prefix(ENTITY_PREFIX)
        .unwrap_or(&entity_url)
        .to_string();

    let mut take = |key: &str| binding.remove(key).map(|v| v.value);
    let label = take("qLabel");
    let description = take("desc");
    let location = take("location").as_deref().and_then(parse_wkt_point);
    let image = take("image");
    let commons_category = take("commonscat");

    Some(WikidataItem {
        id,
        entity_url,
        label,
        description,
        location,
        image,
        commons_category,
    })
}

fn to_items(response: SparqlResponse) -> Vec<WikidataItem> {
    response
        .results
        .bindings
        .into_iter()
        .filter_map(item_from_binding)
        .collect()
}

/// Wikidata entities located inside the box spanned by the two corners
pub fn query_box(
    config: &Config,
    north_east: LatLng,
    south_west: LatLng,
    limit: u32,
) -> Result<Vec<WikidataItem>> {
    let client = http::build_client(&config.http)?;
    let query = build_box_query(north_east, south_west, limit);

    debug!(url = %config.endpoints.wikidata_sparql_url, "Running Wikidata SPARQL query");
    let request = client
        .get(&config.endpoints.wikidata_sparql_url)
        .query(&[("format", "json"), ("query", query.as_str())]);

    let response: SparqlResponse = http::fetch_json(SERVICE, request)?;
    let items = to_items(response);
    debug!(count = items.len(), "Wikidata items");

    Ok(items)
}
