use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const OSM_BASE_URL: &str = "https://www.openstreetmap.org";

/// A normalized point of interest.
///
/// The element's OSM tags live at the top level next to `id`, `lat`, `lon`,
/// plus the derived `osm_url` and `osm_url_edit`. Tag vocabularies are open
/// ended, so the record stays a JSON object and only the fields the library
/// itself relies on get typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Poi {
    fields: Map<String, Value>,
}

impl Poi {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field value if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<u64> {
        self.fields.get("id").and_then(Value::as_u64)
    }

    /// The `type` field. For tagged relations this is usually the `type` tag
    /// (e.g. `multipolygon`) since tags win over element fields.
    pub fn type_tag(&self) -> Option<&str> {
        self.get_str("type")
    }

    pub fn lat(&self) -> Option<f64> {
        self.fields.get("lat").and_then(Value::as_f64)
    }

    pub fn lon(&self) -> Option<f64> {
        self.fields.get("lon").and_then(Value::as_f64)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn website(&self) -> Option<&str> {
        self.get_str("website")
    }

    pub fn contact_website(&self) -> Option<&str> {
        self.get_str("contact:website")
    }

    /// Raw `cuisine` tag. Left untyped so callers can tell a missing tag
    /// from a malformed one.
    pub fn cuisine(&self) -> Option<&Value> {
        self.fields.get("cuisine")
    }

    /// Labels of the `diet*=yes` fields (`diet:vegan=yes` → `vegan`).
    ///
    /// The label is the segment after the first `:`, trimmed and lower-cased.
    /// Keys without such a segment, or with an empty one, yield nothing.
    pub fn diet_flags(&self) -> impl Iterator<Item = String> + '_ {
        self.fields
            .iter()
            .filter_map(|(key, value)| diet_flag_label(key, value))
    }

    /// OSM element kind the links point at (`node`, `way`, `relation`, ...),
    /// read back from `osm_url`
    pub fn kind(&self) -> Option<&str> {
        let path = self.osm_url()?.strip_prefix(OSM_BASE_URL)?;
        let (kind, _id) = path.strip_prefix('/')?.split_once('/')?;
        (!kind.is_empty()).then_some(kind)
    }

    pub fn osm_url(&self) -> Option<&str> {
        self.get_str("osm_url")
    }

    pub fn osm_url_edit(&self) -> Option<&str> {
        self.get_str("osm_url_edit")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Poi {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}

fn diet_flag_label(key: &str, value: &Value) -> Option<String> {
    if !key.starts_with("diet") || value.as_str() != Some("yes") {
        return None;
    }

    let label = key.split(':').nth(1)?.trim().to_lowercase();
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn poi(value: Value) -> Poi {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_diet_flags() {
        let poi = poi(json!({
            "diet:vegan": "yes",
            "diet:Halal ": "yes",
            "diet:vegetarian": "no",
            "diet:gluten_free": true,
            "cuisine": "thai"
        }));

        let mut flags: Vec<String> = poi.diet_flags().collect();
        flags.sort();
        assert_eq!(flags, vec!["halal", "vegan"]);
    }

    #[test]
    fn test_diet_flag_label_is_second_segment() {
        let poi = poi(json!({"diet:vegan:only": "yes"}));
        assert_eq!(poi.diet_flags().collect::<Vec<_>>(), vec!["vegan"]);
    }

    #[test]
    fn test_diet_flags_without_label() {
        let poi = poi(json!({"diet:": "yes", "diet": "yes", "dietary": "yes"}));
        assert_eq!(poi.diet_flags().count(), 0);
    }

    #[test]
    fn test_cuisine_is_raw() {
        assert_eq!(poi(json!({"cuisine": "thai"})).cuisine(), Some(&json!("thai")));
        assert_eq!(poi(json!({"cuisine": 7})).cuisine(), Some(&json!(7)));
        assert_eq!(poi(json!({"cuisine": null})).cuisine(), Some(&Value::Null));
        assert_eq!(poi(json!({})).cuisine(), None);
    }

    #[test]
    fn test_kind_from_osm_url() {
        let way = poi(json!({"osm_url": "https://www.openstreetmap.org/way/2"}));
        assert_eq!(way.kind(), Some("way"));

        let area = poi(json!({"osm_url": "https://www.openstreetmap.org/area/5"}));
        assert_eq!(area.kind(), Some("area"));

        let no_id = poi(json!({"osm_url": "https://www.openstreetmap.org/node/"}));
        assert_eq!(no_id.kind(), Some("node"));

        assert_eq!(poi(json!({"type": "node"})).kind(), None);
    }
}
