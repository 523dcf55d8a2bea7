//! Wikimedia Commons: geotagged files, image metadata and thumbnails, and
//! the picture of the day.
//!
//! See <https://www.mediawiki.org/wiki/API:Imageinfo> for the `imageinfo`
//! payloads reshaped here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::http;
use crate::config::Config;
use crate::domain::LatLng;
use crate::error::{Error, Result};

const SERVICE: &str = "Wikimedia Commons";

/// Lines of the picture-of-the-day feed that link to a file
const POTD_LINK_MARKER: &str = r#"href="https://commons.wikimedia.org/wiki/Special"#;

pub const DEFAULT_GEOSEARCH_LIMIT: u32 = 100;
pub const DEFAULT_THUMB_WIDTH: u32 = 600;
pub const DEFAULT_AUTHOR_LINK_LIMIT: u32 = 40;

/// Which side of the thumbnail is constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbFit {
    Width(u32),
    Height(u32),
}

impl Default for ThumbFit {
    fn default() -> Self {
        ThumbFit::Width(DEFAULT_THUMB_WIDTH)
    }
}

impl ThumbFit {
    fn query_param(&self) -> (&'static str, String) {
        match self {
            ThumbFit::Width(px) => ("iiurlwidth", px.to_string()),
            ThumbFit::Height(px) => ("iiurlheight", px.to_string()),
        }
    }
}

/// A geotagged file returned by the Commons geosearch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonsImage {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub dist: f64,
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    #[serde(default)]
    query: Option<GeoSearchQuery>,
}

#[derive(Debug, Deserialize)]
struct GeoSearchQuery {
    #[serde(default)]
    geosearch: Vec<CommonsImage>,
}

/// One `extmetadata` entry; values are usually HTML strings but some are numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtMetadataValue {
    pub value: Value,
    #[serde(default)]
    pub source: Option<String>,
}

impl ExtMetadataValue {
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub descriptionurl: Option<String>,
    #[serde(default)]
    pub thumburl: Option<String>,
    #[serde(default)]
    pub thumbwidth: Option<u32>,
    #[serde(default)]
    pub thumbheight: Option<u32>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub extmetadata: BTreeMap<String, ExtMetadataValue>,
}

impl ImageInfo {
    fn meta(&self, key: &str) -> Option<String> {
        self.extmetadata.get(key).and_then(ExtMetadataValue::as_text)
    }
}

/// An entry of `query.pages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePage {
    #[serde(default)]
    pub pageid: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: HashMap<String, ImagePage>,
}

/// Flattened image metadata and thumbnail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDetails {
    pub pageid: u64,
    pub title: String,
    pub name: Option<String>,
    pub date: Option<String>,
    pub categories: Option<String>,
    pub description: Option<String>,
    pub artist_html: Option<String>,
    pub url: Option<String>,
    pub description_url: Option<String>,
    pub thumb_url: Option<String>,
    pub thumb_width: Option<u32>,
    pub thumb_height: Option<u32>,
}

impl ImageDetails {
    fn from_page(pageid: u64, page: &ImagePage) -> Option<Self> {
        let info = page.imageinfo.first()?;

        Some(Self {
            pageid,
            title: page.title.clone(),
            name: info.meta("ObjectName"),
            date: info.meta("DateTime"),
            categories: info.meta("Categories"),
            description: info.meta("ImageDescription"),
            artist_html: info.meta("Artist"),
            url: info.url.clone(),
            description_url: info.descriptionurl.clone(),
            thumb_url: info.thumburl.clone(),
            thumb_width: info.thumbwidth,
            thumb_height: info.thumbheight,
        })
    }
}

/// `gsbbox` parameter: top|left|bottom|right
pub fn geosearch_bbox(north_east: LatLng, south_west: LatLng) -> String {
    format!(
        "{}|{}|{}|{}",
        north_east.lat, south_west.lng, south_west.lat, north_east.lng
    )
}

/// Geotagged files (namespace 6) inside the box spanned by the two corners
pub fn geosearch(
    config: &Config,
    north_east: LatLng,
    south_west: LatLng,
    limit: u32,
) -> Result<Vec<CommonsImage>> {
    let client = http::build_client(&config.http)?;
    let bbox = geosearch_bbox(north_east, south_west);
    let limit = limit.to_string();

    debug!(%bbox, "Commons geosearch");
    let request = client.get(&config.endpoints.commons_url).query(&[
        ("action", "query"),
        ("list", "geosearch"),
        ("gsbbox", bbox.as_str()),
        ("gsnamespace", "6"),
        ("gslimit", limit.as_str()),
        ("format", "json"),
        ("origin", "*"),
    ]);

    let response: GeoSearchResponse = http::fetch_json(SERVICE, request)?;
    Ok(response.query.map(|q| q.geosearch).unwrap_or_default())
}

fn query_pages(config: &Config, params: &[(&str, &str)]) -> Result<BTreeMap<u64, ImagePage>> {
    let client = http::build_client(&config.http)?;
    let request = client
        .get(&config.endpoints.commons_url)
        .query(&[("action", "query"), ("format", "json"), ("origin", "*")])
        .query(params);

    let response: PagesResponse = http::fetch_json(SERVICE, request)?;
    Ok(index_pages(response))
}

/// Key pages by numeric id. Missing titles come back under negative keys and
/// are dropped.
fn index_pages(response: PagesResponse) -> BTreeMap<u64, ImagePage> {
    response
        .query
        .map(|q| q.pages)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, page)| match key.parse::<u64>() {
            Ok(id) => Some((id, page)),
            Err(_) => {
                debug!(%key, title = %page.title, "Dropping missing page");
                None
            }
        })
        .collect()
}

/// Raw `imageinfo` (metadata and URLs, plus a thumbnail fitted to `fit`)
/// for several pages in one request
pub fn image_info_pages(
    config: &Config,
    pageids: &[u64],
    fit: ThumbFit,
) -> Result<BTreeMap<u64, ImagePage>> {
    if pageids.is_empty() {
        return Err(Error::InvalidInput(
            "at least one page id is required".to_string(),
        ));
    }

    let ids = pageids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("|");
    let (fit_key, fit_value) = fit.query_param();

    query_pages(
        config,
        &[
            ("pageids", ids.as_str()),
            ("prop", "imageinfo"),
            ("iiprop", "extmetadata|url"),
            (fit_key, fit_value.as_str()),
        ],
    )
}

/// Metadata and thumbnail of one file
pub fn thumb(config: &Config, pageid: u64, fit: ThumbFit) -> Result<ImageDetails> {
    let pages = image_info_pages(config, &[pageid], fit)?;
    let page = pages.get(&pageid).ok_or_else(|| Error::NotFound {
        service: SERVICE,
        what: format!("page {pageid}"),
    })?;

    ImageDetails::from_page(pageid, page).ok_or_else(|| Error::NotFound {
        service: SERVICE,
        what: format!("image info for page {pageid}"),
    })
}

/// Metadata and thumbnails of several files, in the order requested.
/// Pages that are missing or carry no image info are skipped.
pub fn thumbs(config: &Config, pageids: &[u64], fit: ThumbFit) -> Result<Vec<ImageDetails>> {
    let pages = image_info_pages(config, pageids, fit)?;
    Ok(collect_details(pageids, &pages))
}

fn collect_details(pageids: &[u64], pages: &BTreeMap<u64, ImagePage>) -> Vec<ImageDetails> {
    pageids
        .iter()
        .filter_map(|id| {
            let details = pages.get(id).and_then(|page| ImageDetails::from_page(*id, page));
            if details.is_none() {
                warn!(pageid = id, "No image info for page");
            }
            details
        })
        .collect()
}

/// User name of the uploader of `title`
pub fn author(config: &Config, title: &str, pageid: u64) -> Result<String> {
    let pages = query_pages(config, &[("titles", title), ("prop", "imageinfo")])?;

    pages
        .get(&pageid)
        .and_then(|page| page.imageinfo.first())
        .and_then(|info| info.user.clone())
        .ok_or_else(|| Error::NotFound {
            service: SERVICE,
            what: format!("author of {title}"),
        })
}

/// Link to the list of files uploaded by `name`
pub fn author_link(name: &str, limit: u32) -> String {
    format!("https://commons.wikimedia.org/wiki/Special:ListFiles?limit={limit}&user={name}")
}

/// File links of the picture-of-the-day feed.
///
/// An empty `language` falls back to the configured default.
pub fn picture_of_the_day(config: &Config, language: &str) -> Result<Vec<String>> {
    let language = if language.is_empty() {
        config.language.as_str()
    } else {
        language
    };

    let client = http::build_client(&config.http)?;
    let request = client.get(&config.endpoints.commons_url).query(&[
        ("action", "featuredfeed"),
        ("feed", "potd"),
        ("feedformat", "atom"),
        ("language", language),
        ("origin", "*"),
    ]);

    let feed = http::fetch_text(SERVICE, request)?;
    Ok(extract_potd_links(&feed))
}

/// Keep feed lines linking to a Commons special page and take the sixth
/// `"`-delimited segment of each
pub fn extract_potd_links(feed: &str) -> Vec<String> {
    feed.lines()
        .filter(|line| line.contains(POTD_LINK_MARKER))
        .filter_map(|line| line.split('"').nth(5))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geosearch_bbox() {
        let bbox = geosearch_bbox(LatLng::new(14.71, -17.41), LatLng::new(14.67, -17.47));
        assert_eq!(bbox, "14.71|-17.47|14.67|-17.41");
    }

    #[test]
    fn test_thumb_fit() {
        assert_eq!(ThumbFit::default(), ThumbFit::Width(600));
        assert_eq!(
            ThumbFit::Height(400).query_param(),
            ("iiurlheight", "400".to_string())
        );
        assert_eq!(
            ThumbFit::Width(400).query_param(),
            ("iiurlwidth", "400".to_string())
        );
    }

    #[test]
    fn test_author_link() {
        assert_eq!(
            author_link("Jdoe", DEFAULT_AUTHOR_LINK_LIMIT),
            "https://commons.wikimedia.org/wiki/Special:ListFiles?limit=40&user=Jdoe"
        );
    }

    #[test]
    fn test_parse_geosearch() {
        let json = r#"{
            "batchcomplete": "",
            "query": {
                "geosearch": [
                    {"pageid": 136289240, "ns": 6, "title": "File:Dakar plateau.jpg", "lat": 14.67, "lon": -17.43, "dist": 0, "primary": ""}
                ]
            }
        }"#;
        let response: GeoSearchResponse = http::decode_json(SERVICE, json).unwrap();
        let images = response.query.map(|q| q.geosearch).unwrap_or_default();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].pageid, 136289240);
        assert_eq!(images[0].ns, 6);
    }

    #[test]
    fn test_geosearch_error_payload() {
        let json = r#"{"error": {"code": "toomanyvalues", "info": "Too many values supplied for parameter \"gsbbox\"."}}"#;
        let err = http::decode_json::<GeoSearchResponse>(SERVICE, json).unwrap_err();
        assert!(matches!(err, Error::Upstream { ref code, .. } if code == "toomanyvalues"));
    }

    fn sample_pages() -> PagesResponse {
        let json = r#"{
            "query": {
                "pages": {
                    "136289240": {
                        "pageid": 136289240,
                        "ns": 6,
                        "title": "File:Gorée.jpg",
                        "imagerepository": "local",
                        "imageinfo": [{
                            "thumburl": "https://upload.wikimedia.org/thumb/Gor%C3%A9e.jpg/400px-Gor%C3%A9e.jpg",
                            "thumbwidth": 400,
                            "thumbheight": 300,
                            "url": "https://upload.wikimedia.org/Gor%C3%A9e.jpg",
                            "descriptionurl": "https://commons.wikimedia.org/wiki/File:Gor%C3%A9e.jpg",
                            "user": "Jdoe",
                            "extmetadata": {
                                "ObjectName": {"value": "Gorée", "source": "description"},
                                "DateTime": {"value": "2023-05-01 10:00:00", "source": "mediawiki-metadata"},
                                "Categories": {"value": "Gorée|Senegal", "source": "commons-categories"},
                                "ImageDescription": {"value": "View of <b>Gorée</b>", "source": "commons-desc-page"},
                                "Artist": {"value": "<a href=\"//commons.wikimedia.org/wiki/User:Jdoe\">Jdoe</a>", "source": "commons-desc-page"},
                                "CommonsMetadataExtension": {"value": 1.2, "source": "extension"}
                            }
                        }]
                    },
                    "136289206": {"pageid": 136289206, "ns": 6, "title": "File:Empty.jpg"},
                    "-1": {"ns": 6, "title": "File:Nope.jpg", "missing": ""}
                }
            }
        }"#;
        http::decode_json(SERVICE, json).unwrap()
    }

    #[test]
    fn test_index_pages() {
        let pages = index_pages(sample_pages());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[&136289240].imageinfo.len(), 1);
        assert!(pages[&136289206].imageinfo.is_empty());
    }

    #[test]
    fn test_image_details() {
        let pages = index_pages(sample_pages());
        let details = ImageDetails::from_page(136289240, &pages[&136289240]).unwrap();

        assert_eq!(details.title, "File:Gorée.jpg");
        assert_eq!(details.name.as_deref(), Some("Gorée"));
        assert_eq!(details.date.as_deref(), Some("2023-05-01 10:00:00"));
        assert_eq!(details.categories.as_deref(), Some("Gorée|Senegal"));
        assert_eq!(details.description.as_deref(), Some("View of <b>Gorée</b>"));
        assert!(details.artist_html.as_deref().unwrap().contains("User:Jdoe"));
        assert_eq!(details.thumb_width, Some(400));
        assert_eq!(details.thumb_height, Some(300));

        let info = &pages[&136289240].imageinfo[0];
        assert_eq!(info.meta("CommonsMetadataExtension").as_deref(), Some("1.2"));
        assert_eq!(info.user.as_deref(), Some("Jdoe"));
    }

    #[test]
    fn test_collect_details_keeps_request_order() {
        let pages = index_pages(sample_pages());
        let details = collect_details(&[136289206, 1, 136289240], &pages);

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].pageid, 136289240);
    }

    #[test]
    fn test_image_info_pages_requires_ids() {
        let err = image_info_pages(&Config::default(), &[], ThumbFit::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_extract_potd_links() {
        let feed = concat!(
            "<?xml version=\"1.0\"?>\n",
            "<feed xmlns=\"http://www.w3.org/2005/Atom\">\n",
            "<link rel=\"self\" type=\"application/atom+xml\" href=\"https://commons.wikimedia.org/w/api.php?action=featuredfeed\"/>\n",
            "<link rel=\"alternate\" type=\"text/html\" href=\"https://commons.wikimedia.org/wiki/Special:FeedItem/potd/20261016000000/fr\"/>\n",
            "<title>Image du jour</title>\n",
            "<link rel=\"alternate\" type=\"text/html\" href=\"https://commons.wikimedia.org/wiki/Special:FeedItem/potd/20261017000000/fr\"/>\n",
        );

        let links = extract_potd_links(feed);
        assert_eq!(
            links,
            vec![
                "https://commons.wikimedia.org/wiki/Special:FeedItem/potd/20261016000000/fr".to_string(),
                "https://commons.wikimedia.org/wiki/Special:FeedItem/potd/20261017000000/fr".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_potd_links_empty() {
        assert!(extract_potd_links("").is_empty());
        assert!(extract_potd_links("<feed></feed>").is_empty());
    }
}
