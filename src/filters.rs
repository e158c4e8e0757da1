use crate::types::{FilterSelection, FilteredTables, WageRecord, NATIONAL_REGION};
use std::collections::{BTreeMap, HashSet};

/// Distinct non-national region names, sorted, first-seen spelling kept
/// when the same region appears with different casing.
pub fn distinct_regions(table: &[WageRecord]) -> Vec<String> {
    let mut by_key: BTreeMap<String, String> = BTreeMap::new();
    for record in table {
        if record.is_national() {
            continue;
        }
        by_key
            .entry(record.region.to_uppercase())
            .or_insert_with(|| record.region.clone());
    }
    by_key.into_values().collect()
}

/// Uppercased region keys the current selection matches. An empty selection
/// expands to every non-national region (the "no filter" policy).
pub fn selection_set(table: &[WageRecord], selection: &FilterSelection) -> HashSet<String> {
    if selection.selected_regions.is_empty() {
        distinct_regions(table)
            .iter()
            .map(|r| r.to_uppercase())
            .collect()
    } else {
        selection
            .selected_regions
            .iter()
            .map(|r| r.trim().to_uppercase())
            .collect()
    }
}

/// Smallest and largest year present in the table, or `None` when the
/// table is empty.
pub fn year_bounds(table: &[WageRecord]) -> Option<(i32, i32)> {
    let mut years = table.iter().map(|r| r.year);
    let first = years.next()?;
    let (min, max) = years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
    Some((min, max))
}

/// Bring a raw selection into a usable state: year bounds ordered, the
/// national identifier dropped from the region set, and `top_bottom_n`
/// clamped to `1..=distinct non-national regions`.
pub fn normalize(mut selection: FilterSelection, table: &[WageRecord]) -> FilterSelection {
    if selection.year_from > selection.year_to {
        std::mem::swap(&mut selection.year_from, &mut selection.year_to);
    }
    selection
        .selected_regions
        .retain(|r| !r.trim().eq_ignore_ascii_case(NATIONAL_REGION));
    let total = distinct_regions(table).len().max(1);
    selection.top_bottom_n = selection.top_bottom_n.clamp(1, total);
    selection
}

/// Derive the working sub-tables for one interaction.
pub fn apply(table: &[WageRecord], selection: &FilterSelection) -> FilteredTables {
    let selected = selection_set(table, selection);
    let mut filtered = FilteredTables::default();
    for record in table {
        if !selection.year_in_range(record.year) {
            continue;
        }
        filtered.year_rows.push(record.clone());
        if record.is_national() {
            filtered.national_rows.push(record.clone());
        } else if selected.contains(&record.region.to_uppercase()) {
            filtered.region_rows.push(record.clone());
        }
    }
    filtered
}
