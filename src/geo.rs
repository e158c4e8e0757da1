// Geographic boundary collaborator: a local GeoJSON file of region
// polygons, consumed read-only to resolve wage regions to map features.
// The map must keep working when this data is absent or broken, so every
// failure path degrades to an empty index instead of an error.
use crate::types::{FilterSelection, MapRow, WageRecord};
use crate::util::format_rupiah;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;

/// Feature property that names the region in the boundary file.
pub const FEATURE_NAME_KEY: &str = "Propinsi";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

/// Region names known to the boundary data, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct BoundaryIndex {
    names: HashMap<String, String>,
}

impl BoundaryIndex {
    pub fn empty() -> Self {
        BoundaryIndex::default()
    }

    /// Parse a GeoJSON feature collection and index the features by the
    /// given name property. Features without that property are skipped.
    pub fn from_file(path: &str, name_key: &str) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let collection: FeatureCollection = serde_json::from_str(&raw)?;
        let mut names = HashMap::new();
        for feature in collection.features {
            if let Some(name) = feature.properties.get(name_key).and_then(|v| v.as_str()) {
                let name = name.trim();
                if !name.is_empty() {
                    names.entry(name.to_uppercase()).or_insert_with(|| name.to_string());
                }
            }
        }
        Ok(BoundaryIndex { names })
    }

    /// Load the boundary file, degrading to an empty index (map renders
    /// unmapped) when the file is missing or malformed.
    pub fn load_or_empty(path: &str) -> Self {
        match Self::from_file(path, FEATURE_NAME_KEY) {
            Ok(index) => index,
            Err(e) => {
                eprintln!(
                    "Warning: boundary data unavailable ({}); map will render without polygons.",
                    e
                );
                BoundaryIndex::empty()
            }
        }
    }

    /// Case-insensitive lookup of a wage region in the boundary data.
    pub fn resolve(&self, region: &str) -> Option<&str> {
        self.names
            .get(&region.trim().to_uppercase())
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Choropleth projection: one row per non-national region of the whole
/// dataset (the map ignores the region selection), colored by the latest
/// in-range salary. Regions with no in-range observation carry 0.0, and a
/// boundary-data miss marks the row unmapped rather than failing.
pub fn map_rows(
    table: &[WageRecord],
    selection: &FilterSelection,
    boundaries: &BoundaryIndex,
) -> Vec<MapRow> {
    let mut regions: BTreeMap<String, String> = BTreeMap::new();
    let mut observations: HashMap<String, Vec<(i32, f64)>> = HashMap::new();
    for record in table {
        if record.is_national() {
            continue;
        }
        let key = record.region.to_uppercase();
        regions
            .entry(key.clone())
            .or_insert_with(|| record.region.clone());
        if selection.year_in_range(record.year) {
            observations.entry(key).or_default().push((record.year, record.salary));
        }
    }

    let mut rows = Vec::with_capacity(regions.len());
    for (key, region) in regions {
        let mut observed = observations.remove(&key).unwrap_or_default();
        observed.sort_by_key(|(year, _)| *year);
        let salary = observed.last().map(|(_, s)| *s).unwrap_or(0.0);
        let detail = if observed.is_empty() {
            "No data available for the selected year range".to_string()
        } else {
            observed
                .iter()
                .map(|(year, salary)| format!("{}: {}", year, format_rupiah(*salary)))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let mapped = boundaries.resolve(&region).is_some();
        rows.push(MapRow {
            hover: format!("{}\n\n{}", region, detail),
            salary_text: format_rupiah(salary),
            salary,
            mapped,
            region,
        });
    }
    rows
}
