use crate::domain::{DietCount, Poi};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Count cuisine and diet labels across a batch of POIs (mostly makes sense
/// for restaurants, cafes and the like).
///
/// Each POI contributes at most 1 to any label, however many tags produced
/// it. The result is sorted by count descending; equal counts are ordered
/// alphabetically.
pub fn extract_diets(pois: &[Poi]) -> Vec<DietCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for poi in pois {
        for label in poi_diets(poi) {
            *counts.entry(label).or_default() += 1;
        }
    }

    let mut diets: Vec<DietCount> = counts
        .into_iter()
        .map(|(label, count)| DietCount::new(label, count))
        .collect();
    diets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    diets
}

/// Deduplicated labels of one POI
fn poi_diets(poi: &Poi) -> BTreeSet<String> {
    let mut diets = BTreeSet::new();

    match poi.cuisine() {
        Some(Value::String(cuisine)) => diets.extend(cuisine_labels(cuisine)),
        None | Some(Value::Null) => {}
        Some(other) => {
            debug!(osm_url = ?poi.osm_url(), cuisine = %other, "Skipping non-string cuisine");
        }
    }

    diets.extend(poi.diet_flags());
    diets
}

/// `cuisine=Thai; vegan` → `thai`, `vegan`
fn cuisine_labels(cuisine: &str) -> impl Iterator<Item = String> + '_ {
    cuisine
        .split(';')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
}
