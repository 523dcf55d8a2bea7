use serde::{Deserialize, Serialize};

/// How many POIs of a batch carry a given cuisine or diet label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietCount {
    /// Lower-cased, trimmed label such as `thai` or `vegan`
    pub label: String,
    pub count: usize,
}

impl DietCount {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}
