use crate::domain::poi::OSM_BASE_URL;
use crate::domain::{Element, ElementKind, Poi};
use serde_json::Value;

/// Flatten Overpass elements into POIs
///
/// # Algorithm
/// 1. Drop elements without a `tags` object (bare way nodes, relation member stubs)
/// 2. Merge the tags into the element's own fields, tags winning on conflict
/// 3. Backfill `website` from `contact:website`
/// 4. Add `osm_url` and `osm_url_edit` pointing at the element on openstreetmap.org
pub fn normalize_elements(elements: Vec<Element>) -> Vec<Poi> {
    elements.into_iter().filter_map(normalize_element).collect()
}

/// Normalize a single element, `None` if it carries no tags
pub fn normalize_element(element: Element) -> Option<Poi> {
    element.tags()?;

    // Taken from the element itself: tagged relations usually carry a
    // `type=multipolygon` (or similar) tag that would shadow the element type.
    let kind = osm_kind(&element);

    let mut fields = element.into_fields();
    let tags = match fields.remove("tags") {
        Some(Value::Object(tags)) => tags,
        _ => return None,
    };
    fields.extend(tags);

    if is_blank(fields.get("website"))
        && let Some(contact) = fields.get("contact:website").filter(|v| !is_blank(Some(*v)))
    {
        let contact = contact.clone();
        fields.insert("website".to_string(), contact);
    }

    let id = id_segment(fields.get("id"));
    fields.insert(
        "osm_url".to_string(),
        Value::String(format!("{OSM_BASE_URL}/{kind}/{id}")),
    );
    fields.insert(
        "osm_url_edit".to_string(),
        Value::String(format!("{OSM_BASE_URL}/edit?{kind}={id}")),
    );

    Some(Poi::from_fields(fields))
}

/// `relation` when the element lists members, otherwise its own `type` as
/// given (Overpass also returns `area` elements). Elements without a string
/// `type` are linked as nodes.
fn osm_kind(element: &Element) -> String {
    if element.has_members() {
        return ElementKind::Relation.as_str().to_string();
    }
    element
        .type_tag()
        .unwrap_or(ElementKind::Node.as_str())
        .to_string()
}

fn id_segment(id: Option<&Value>) -> String {
    match id {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
