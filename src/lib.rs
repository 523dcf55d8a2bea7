//! opendata - Query OpenStreetMap, Wikipedia, Wikidata and Wikimedia Commons
//! and get flat, ergonomic results

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod osm;

pub use config::Config;
pub use domain::{BoundingBox, DietCount, Element, ElementKind, LatLng, Poi};
pub use error::{Error, Result};
pub use osm::{extract_diets, normalize_elements};
