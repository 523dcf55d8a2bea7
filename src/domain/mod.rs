pub mod diet;
pub mod element;
pub mod geo;
pub mod poi;

pub use diet::DietCount;
pub use element::{Element, ElementKind};
pub use geo::{BoundingBox, LatLng};
pub use poi::Poi;
