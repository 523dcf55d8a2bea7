pub mod diets;
pub mod normalize;

pub use diets::extract_diets;
pub use normalize::{normalize_element, normalize_elements};
