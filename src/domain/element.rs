use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OSM element type as reported in the Overpass `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Classify an Overpass `type` value
    pub fn from_type_tag(tag: &str) -> Option<ElementKind> {
        match tag {
            "node" => Some(ElementKind::Node),
            "way" => Some(ElementKind::Way),
            "relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// A single element from an Overpass `out body` response.
///
/// Kept as an open JSON object: Overpass attaches different fields to
/// nodes (`lat`/`lon`), ways (`nodes`) and relations (`members`), and all of
/// them must survive normalization untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element {
    fields: Map<String, Value>,
}

impl Element {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn id(&self) -> Option<u64> {
        self.fields.get("id").and_then(Value::as_u64)
    }

    /// Raw `type` field
    pub fn type_tag(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.type_tag().and_then(ElementKind::from_type_tag)
    }

    pub fn lat(&self) -> Option<f64> {
        self.fields.get("lat").and_then(Value::as_f64)
    }

    pub fn lon(&self) -> Option<f64> {
        self.fields.get("lon").and_then(Value::as_f64)
    }

    /// Relations carry a `members` list; nodes and ways never do
    pub fn has_members(&self) -> bool {
        self.fields.get("members").is_some_and(|m| !m.is_null())
    }

    pub fn tags(&self) -> Option<&Map<String, Value>> {
        self.fields.get("tags").and_then(Value::as_object)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Element {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
