pub mod commons;
pub mod http;
pub mod nominatim;
pub mod overpass;
pub mod wikidata;
pub mod wikipedia;

pub use commons::{CommonsImage, ImageDetails, ImagePage, ThumbFit};
pub use nominatim::{Place, geocode, search_places};
pub use overpass::{TagFilter, fetch_food_shops, fetch_pois, fetch_pois_in_corners};
pub use wikidata::{WikidataItem, query_box};
pub use wikipedia::{WikipediaArticle, WikipediaGeoSearch};
