use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http;
use crate::config::Config;
use crate::domain::LatLng;
use crate::error::Result;

const SERVICE: &str = "Wikipedia";

/// Parameters of a Wikipedia geosearch
#[derive(Debug, Clone, PartialEq)]
pub struct WikipediaGeoSearch {
    pub center: LatLng,
    /// Wiki language code, e.g. "en", "fr"
    pub language: String,
    /// Search radius in meters (the API caps it at 10000)
    pub radius_m: u32,
    pub limit: u32,
}

impl Default for WikipediaGeoSearch {
    fn default() -> Self {
        Self {
            center: LatLng::new(37.0, -122.0),
            language: "en".to_string(),
            radius_m: 10000,
            limit: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    query: GeoSearchQuery,
}

#[derive(Debug, Deserialize)]
struct GeoSearchQuery {
    #[serde(default)]
    geosearch: Vec<GeoSearchHit>,
}

#[derive(Debug, Deserialize)]
struct GeoSearchHit {
    pageid: u64,
    title: String,
    lat: f64,
    lon: f64,
    dist: f64,
}

/// An article located near the search center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikipediaArticle {
    pub pageid: u64,
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the search center in meters
    pub dist: f64,
    pub url: String,
}

pub fn article_url(language: &str, title: &str) -> String {
    format!(
        "https://{language}.wikipedia.org/wiki/{}",
        title.replace(' ', "_")
    )
}

/// Wikipedia articles around a location
pub fn geosearch(config: &Config, search: &WikipediaGeoSearch) -> Result<Vec<WikipediaArticle>> {
    let client = http::build_client(&config.http)?;
    let url = config.endpoints.wikipedia_api_url(&search.language);

    let coord = format!("{}|{}", search.center.lat, search.center.lng);
    let radius = search.radius_m.to_string();
    let limit = search.limit.to_string();

    debug!(%url, %coord, "Wikipedia geosearch");
    let request = client.get(&url).query(&[
        ("action", "query"),
        ("list", "geosearch"),
        ("gscoord", coord.as_str()),
        ("gsradius", radius.as_str()),
        ("gslimit", limit.as_str()),
        ("origin", "*"),
        ("format", "json"),
    ]);

    let response: GeoSearchResponse = http::fetch_json(SERVICE, request)?;
    Ok(to_articles(&search.language, response))
}

fn to_articles(language: &str, response: GeoSearchResponse) -> Vec<WikipediaArticle> {
    response
        .query
        .geosearch
        .into_iter()
        .map(|hit| WikipediaArticle {
            url: article_url(language, &hit.title),
            pageid: hit.pageid,
            title: hit.title,
            lat: hit.lat,
            lon: hit.lon,
            dist: hit.dist,
        })
        .collect()
}
