// Derived-metric computation: rankings, year-over-year growth, gap and
// ratio against the national baseline, heatmap aggregation, KPI extremes.
// Every function is a pure pass over its input; outputs are fresh tables
// and never contain NaN or infinite values.
use crate::types::{
    BaselineStatus, FilterSelection, FilteredTables, GapPoint, GrowthPoint, HeatmapTable,
    RatioPoint, WageRecord,
};
use crate::util::average;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Highest-N rows by a numeric key. The sort is stable, so equal keys keep
/// their source order.
pub fn top_n_by<T, F>(rows: &[T], n: usize, key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut sorted: Vec<T> = rows.to_vec();
    sorted.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    sorted.truncate(n);
    sorted
}

/// Lowest-N rows by a numeric key, same tie-break as [`top_n_by`].
pub fn bottom_n_by<T, F>(rows: &[T], n: usize, key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut sorted: Vec<T> = rows.to_vec();
    sorted.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal));
    sorted.truncate(n);
    sorted
}

/// First row holding the maximum salary (ties keep the earliest row).
pub fn max_salary_row(rows: &[WageRecord]) -> Option<&WageRecord> {
    let mut best: Option<&WageRecord> = None;
    for record in rows {
        match best {
            Some(current) if record.salary <= current.salary => {}
            _ => best = Some(record),
        }
    }
    best
}

/// First row holding the minimum salary (ties keep the earliest row).
pub fn min_salary_row(rows: &[WageRecord]) -> Option<&WageRecord> {
    let mut best: Option<&WageRecord> = None;
    for record in rows {
        match best {
            Some(current) if record.salary >= current.salary => {}
            _ => best = Some(record),
        }
    }
    best
}

/// Year-over-year percentage and nominal change per region.
///
/// The input window is `[year_from - 1, year_to]` over the full table so
/// the first in-range year still has a predecessor to diff against; only
/// rows with `year >= year_from` survive into the output. The first
/// observation of each region has no prior value and emits nothing, as does
/// any observation whose predecessor salary is zero.
pub fn growth_points(
    table: &[WageRecord],
    selection: &FilterSelection,
    selected: &HashSet<String>,
) -> Vec<GrowthPoint> {
    let lower = selection.year_from - 1;
    let mut groups: BTreeMap<String, (String, Vec<(i32, f64)>)> = BTreeMap::new();
    for record in table {
        if record.year < lower || record.year > selection.year_to {
            continue;
        }
        let keep = if record.is_national() {
            selection.include_national
        } else {
            selected.contains(&record.region.to_uppercase())
        };
        if !keep {
            continue;
        }
        let entry = groups
            .entry(record.region.to_uppercase())
            .or_insert_with(|| (record.region.clone(), Vec::new()));
        entry.1.push((record.year, record.salary));
    }

    let mut points = Vec::new();
    for (_, (region, mut observations)) in groups {
        observations.sort_by_key(|(year, _)| *year);
        for i in 1..observations.len() {
            let (year, salary) = observations[i];
            if year < selection.year_from {
                continue;
            }
            let (_, prev_salary) = observations[i - 1];
            if prev_salary == 0.0 {
                // Undefined percent change; the row is omitted rather than
                // surfaced as an infinite value.
                continue;
            }
            let nominal_change = salary - prev_salary;
            let pct_change = nominal_change / prev_salary * 100.0;
            points.push(GrowthPoint {
                region: region.clone(),
                year,
                salary,
                pct_change,
                nominal_change,
            });
        }
    }
    points
}

fn national_by_year(filtered: &FilteredTables) -> HashMap<i32, f64> {
    let mut by_year = HashMap::new();
    for record in &filtered.national_rows {
        by_year.entry(record.year).or_insert(record.salary);
    }
    by_year
}

/// Gap of each selected-region row against the national row of the same
/// year. Rows with no matching national observation are excluded.
pub fn gap_points(filtered: &FilteredTables) -> Vec<GapPoint> {
    let national = national_by_year(filtered);
    let mut points = Vec::new();
    for record in &filtered.region_rows {
        let Some(&national_salary) = national.get(&record.year) else {
            continue;
        };
        let gap = record.salary - national_salary;
        points.push(GapPoint {
            region: record.region.clone(),
            year: record.year,
            salary: record.salary,
            national_salary,
            gap,
            status: BaselineStatus::classify(gap, 0.0),
        });
    }
    points
}

/// Ratio of each selected-region row to the national row of the same year,
/// as a percentage. Rows with no matching national observation, or a zero
/// national salary, are excluded.
pub fn ratio_points(filtered: &FilteredTables) -> Vec<RatioPoint> {
    let national = national_by_year(filtered);
    let mut points = Vec::new();
    for record in &filtered.region_rows {
        let Some(&national_salary) = national.get(&record.year) else {
            continue;
        };
        if national_salary == 0.0 {
            continue;
        }
        let ratio = record.salary / national_salary * 100.0;
        points.push(RatioPoint {
            region: record.region.clone(),
            year: record.year,
            salary: record.salary,
            national_salary,
            ratio,
            status: BaselineStatus::classify(ratio, 100.0),
        });
    }
    points
}

/// Region x year salary matrix over the selected regions (plus the national
/// aggregate when included). Duplicate observations for a cell average;
/// absent cells are rendered as 0.0.
pub fn heatmap(
    year_rows: &[WageRecord],
    selection: &FilterSelection,
    selected: &HashSet<String>,
) -> Option<HeatmapTable> {
    let mut regions: BTreeMap<String, String> = BTreeMap::new();
    let mut years: Vec<i32> = Vec::new();
    let mut cells: HashMap<(String, i32), Vec<f64>> = HashMap::new();

    for record in year_rows {
        let keep = if record.is_national() {
            selection.include_national
        } else {
            selected.contains(&record.region.to_uppercase())
        };
        if !keep {
            continue;
        }
        let key = record.region.to_uppercase();
        regions
            .entry(key.clone())
            .or_insert_with(|| record.region.clone());
        if !years.contains(&record.year) {
            years.push(record.year);
        }
        cells.entry((key, record.year)).or_default().push(record.salary);
    }
    if regions.is_empty() {
        return None;
    }
    years.sort_unstable();

    let mut values = Vec::with_capacity(regions.len());
    for key in regions.keys() {
        let row: Vec<f64> = years
            .iter()
            .map(|year| {
                cells
                    .get(&(key.clone(), *year))
                    .map(|observed| average(observed))
                    .unwrap_or(0.0)
            })
            .collect();
        values.push(row);
    }
    Some(HeatmapTable {
        regions: regions.into_values().collect(),
        years,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(region: &str, year: i32, salary: f64) -> WageRecord {
        WageRecord {
            region: region.to_string(),
            year,
            salary,
        }
    }

    fn sel(from: i32, to: i32, include_national: bool) -> FilterSelection {
        FilterSelection {
            year_from: from,
            year_to: to,
            selected_regions: vec![],
            include_national,
            top_bottom_n: 5,
        }
    }

    fn all_of(table: &[WageRecord]) -> HashSet<String> {
        crate::filters::selection_set(table, &sel(0, 9999, true))
    }

    #[test]
    fn ranking_orders_and_truncates() {
        let rows = vec![
            rec("A", 2024, 5.0),
            rec("B", 2024, 3.0),
            rec("C", 2024, 8.0),
            rec("D", 2024, 1.0),
        ];
        let top: Vec<String> = top_n_by(&rows, 2, |r| r.salary)
            .into_iter()
            .map(|r| r.region)
            .collect();
        assert_eq!(top, vec!["C".to_string(), "A".to_string()]);
        let bottom: Vec<String> = bottom_n_by(&rows, 2, |r| r.salary)
            .into_iter()
            .map(|r| r.region)
            .collect();
        assert_eq!(bottom, vec!["D".to_string(), "B".to_string()]);
    }

    #[test]
    fn ranking_ties_keep_source_order() {
        let rows = vec![rec("First", 2023, 7.0), rec("Second", 2024, 7.0)];
        let top = top_n_by(&rows, 2, |r| r.salary);
        assert_eq!(top[0].region, "First");
        assert_eq!(top[1].region, "Second");
    }

    #[test]
    fn growth_skips_first_observation_per_region() {
        let table = vec![
            rec("Bali", 2021, 100.0),
            rec("Bali", 2022, 110.0),
            rec("Bali", 2023, 121.0),
        ];
        let selected = all_of(&table);
        let points = growth_points(&table, &sel(2021, 2023, true), &selected);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].year, 2022);
        assert_eq!(points[0].nominal_change, 10.0);
        assert!((points[0].pct_change - 10.0).abs() < 1e-9);
        assert_eq!(points[1].year, 2023);
        assert_eq!(points[1].nominal_change, 11.0);
        assert!((points[1].pct_change - 10.0).abs() < 1e-9);
    }

    #[test]
    fn growth_window_reaches_one_year_before_the_range() {
        let table = vec![rec("Bali", 2023, 100.0), rec("Bali", 2024, 110.0)];
        let selected = all_of(&table);
        // Filtering to 2024 only must still diff against 2023.
        let points = growth_points(&table, &sel(2024, 2024, true), &selected);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].year, 2024);
        assert!((points[0].pct_change - 10.0).abs() < 1e-9);
    }

    #[test]
    fn growth_zero_prior_salary_emits_nothing() {
        let table = vec![rec("Bali", 2023, 0.0), rec("Bali", 2024, 110.0)];
        let selected = all_of(&table);
        let points = growth_points(&table, &sel(2024, 2024, true), &selected);
        assert!(points.is_empty());
    }

    #[test]
    fn growth_excludes_national_when_not_included() {
        let table = vec![
            rec("INDONESIA", 2023, 2_800_000.0),
            rec("INDONESIA", 2024, 3_000_000.0),
            rec("Jakarta", 2023, 4_900_000.0),
            rec("Jakarta", 2024, 5_100_000.0),
        ];
        let selected = all_of(&table);
        let with = growth_points(&table, &sel(2024, 2024, true), &selected);
        let without = growth_points(&table, &sel(2024, 2024, false), &selected);
        assert_eq!(with.len(), 2);
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].region, "Jakarta");
    }

    #[test]
    fn gap_and_ratio_against_matching_national_year() {
        let filtered = FilteredTables {
            national_rows: vec![rec("INDONESIA", 2024, 2_500_000.0)],
            region_rows: vec![rec("Jakarta", 2024, 3_000_000.0)],
            year_rows: vec![],
        };
        let gaps = gap_points(&filtered);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap, 500_000.0);
        assert_eq!(gaps[0].status, BaselineStatus::Above);

        let ratios = ratio_points(&filtered);
        assert_eq!(ratios.len(), 1);
        assert!((ratios[0].ratio - 120.0).abs() < 1e-9);
        assert_eq!(ratios[0].status, BaselineStatus::Above);
    }

    #[test]
    fn rows_without_national_match_are_excluded() {
        let filtered = FilteredTables {
            national_rows: vec![rec("INDONESIA", 2023, 2_800_000.0)],
            region_rows: vec![
                rec("Jakarta", 2023, 4_900_000.0),
                rec("Jakarta", 2024, 5_100_000.0),
            ],
            year_rows: vec![],
        };
        let gaps = gap_points(&filtered);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].year, 2023);
        let ratios = ratio_points(&filtered);
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].year, 2023);
    }

    #[test]
    fn zero_national_salary_is_guarded_in_ratio() {
        let filtered = FilteredTables {
            national_rows: vec![rec("INDONESIA", 2024, 0.0)],
            region_rows: vec![rec("Jakarta", 2024, 5_100_000.0)],
            year_rows: vec![],
        };
        let ratios = ratio_points(&filtered);
        assert!(ratios.is_empty());
        // The gap is still well-defined against a zero baseline.
        let gaps = gap_points(&filtered);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap, 5_100_000.0);
    }

    #[test]
    fn empty_inputs_yield_empty_outputs_without_panicking() {
        let filtered = FilteredTables::default();
        assert!(gap_points(&filtered).is_empty());
        assert!(ratio_points(&filtered).is_empty());
        assert!(max_salary_row(&[]).is_none());
        assert!(min_salary_row(&[]).is_none());
        let selected = HashSet::new();
        assert!(growth_points(&[], &sel(2024, 2024, true), &selected).is_empty());
        assert!(heatmap(&[], &sel(2024, 2024, true), &selected).is_none());
    }

    #[test]
    fn all_growth_outputs_are_finite() {
        let table = vec![
            rec("Bali", 2022, 0.0),
            rec("Bali", 2023, 50.0),
            rec("Bali", 2024, 75.0),
        ];
        let selected = all_of(&table);
        let points = growth_points(&table, &sel(2023, 2024, true), &selected);
        assert_eq!(points.len(), 1);
        assert!(points.iter().all(|p| p.pct_change.is_finite()));
    }

    #[test]
    fn heatmap_zero_fills_missing_cells_and_averages_duplicates() {
        let table = vec![
            rec("Bali", 2023, 100.0),
            rec("Bali", 2023, 140.0),
            rec("Bali", 2024, 120.0),
            rec("Jakarta", 2024, 200.0),
        ];
        let selected = all_of(&table);
        let heat = heatmap(&table, &sel(2023, 2024, true), &selected).unwrap();
        assert_eq!(heat.regions, vec!["Bali".to_string(), "Jakarta".to_string()]);
        assert_eq!(heat.years, vec![2023, 2024]);
        assert_eq!(heat.values[0], vec![120.0, 120.0]);
        // Jakarta has no 2023 observation: rendered as zero.
        assert_eq!(heat.values[1], vec![0.0, 200.0]);
    }

    #[test]
    fn kpi_extremes_pick_first_occurrence_on_ties() {
        let rows = vec![
            rec("Jakarta", 2023, 5.0),
            rec("Bali", 2023, 5.0),
            rec("Papua", 2023, 1.0),
            rec("Aceh", 2023, 1.0),
        ];
        assert_eq!(max_salary_row(&rows).unwrap().region, "Jakarta");
        assert_eq!(min_salary_row(&rows).unwrap().region, "Papua");
    }
}
