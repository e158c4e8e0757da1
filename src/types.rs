use serde::Serialize;
use tabled::Tabled;

/// Reserved region identifier for the national aggregate. Matched
/// case-insensitively wherever records are compared against it; stored
/// record text is never case-folded.
pub const NATIONAL_REGION: &str = "INDONESIA";

/// One wage observation: a region's minimum wage for a single year.
#[derive(Debug, Clone, PartialEq)]
pub struct WageRecord {
    pub region: String,
    pub year: i32,
    pub salary: f64,
}

impl WageRecord {
    pub fn is_national(&self) -> bool {
        self.region.trim().eq_ignore_ascii_case(NATIONAL_REGION)
    }
}

/// User-selected filter state, one per interaction. `selected_regions`
/// empty means "no region filter" (all non-national regions).
#[derive(Debug, Clone)]
pub struct FilterSelection {
    pub year_from: i32,
    pub year_to: i32,
    pub selected_regions: Vec<String>,
    pub include_national: bool,
    pub top_bottom_n: usize,
}

impl FilterSelection {
    /// Inclusive year-range test. A collapsed range (`year_from == year_to`)
    /// is an exact-year equality check.
    pub fn year_in_range(&self, year: i32) -> bool {
        if self.year_from == self.year_to {
            year == self.year_from
        } else {
            (self.year_from..=self.year_to).contains(&year)
        }
    }
}

/// The three sub-tables every dashboard pass works from.
#[derive(Debug, Clone, Default)]
pub struct FilteredTables {
    /// National-aggregate rows within the year range.
    pub national_rows: Vec<WageRecord>,
    /// Selected-region rows within the year range, national excluded.
    pub region_rows: Vec<WageRecord>,
    /// Every row within the year range (base for KPIs and the heatmap).
    pub year_rows: Vec<WageRecord>,
}

impl FilteredTables {
    /// True when the year range matched nothing at all. Callers must
    /// short-circuit to the empty dashboard state instead of computing
    /// derived metrics.
    pub fn is_empty(&self) -> bool {
        self.year_rows.is_empty()
    }
}

/// Relation of a region's wage to the national baseline for the same year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineStatus {
    Above,
    Equal,
    Below,
}

impl BaselineStatus {
    /// Classify a value against a threshold (0 for gaps, 100 for ratios).
    pub fn classify(value: f64, threshold: f64) -> Self {
        if value > threshold {
            BaselineStatus::Above
        } else if value == threshold {
            BaselineStatus::Equal
        } else {
            BaselineStatus::Below
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineStatus::Above => "Above National Average",
            BaselineStatus::Equal => "Equal to National Average",
            BaselineStatus::Below => "Below National Average",
        }
    }
}

/// Year-over-year change for one region/year, relative to the region's
/// previous observation. Rows without a usable predecessor are never
/// materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPoint {
    pub region: String,
    pub year: i32,
    pub salary: f64,
    pub pct_change: f64,
    pub nominal_change: f64,
}

/// Region wage vs the national wage of the same year, as a difference.
#[derive(Debug, Clone, PartialEq)]
pub struct GapPoint {
    pub region: String,
    pub year: i32,
    pub salary: f64,
    pub national_salary: f64,
    pub gap: f64,
    pub status: BaselineStatus,
}

/// Region wage vs the national wage of the same year, as a percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioPoint {
    pub region: String,
    pub year: i32,
    pub salary: f64,
    pub national_salary: f64,
    pub ratio: f64,
    pub status: BaselineStatus,
}

/// Region x year salary matrix. Cells with no observation hold 0.0; cells
/// with duplicate observations hold their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapTable {
    pub regions: Vec<String>,
    pub years: Vec<i32>,
    pub values: Vec<Vec<f64>>,
}

/// One KPI card: label, formatted value, secondary annotation.
#[derive(Debug, Clone, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    pub annotation: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WageRow {
    #[serde(rename = "REGION")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "SALARY")]
    #[tabled(skip)]
    pub salary: f64,
    #[serde(rename = "SALARY_TEXT")]
    #[tabled(rename = "Salary")]
    pub salary_text: String,
    #[serde(rename = "YEAR")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "LABEL")]
    #[tabled(skip)]
    pub label: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GrowthRow {
    #[serde(rename = "REGION")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "YEAR")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "PCT_CHANGE")]
    #[tabled(skip)]
    pub pct_change: f64,
    #[serde(rename = "PCT_CHANGE_TEXT")]
    #[tabled(rename = "% Increase")]
    pub pct_text: String,
    #[serde(rename = "NOMINAL_CHANGE")]
    #[tabled(skip)]
    pub nominal_change: f64,
    #[serde(rename = "NOMINAL_CHANGE_TEXT")]
    #[tabled(rename = "Nominal Increase (Rp)")]
    pub nominal_text: String,
    #[serde(rename = "LABEL")]
    #[tabled(skip)]
    pub label: String,
    #[serde(rename = "TOOLTIP")]
    #[tabled(skip)]
    pub tooltip: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GapRow {
    #[serde(rename = "REGION")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "YEAR")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "GAP")]
    #[tabled(skip)]
    pub gap: f64,
    #[serde(rename = "GAP_TEXT")]
    #[tabled(rename = "Gap")]
    pub gap_text: String,
    #[serde(rename = "SALARY")]
    #[tabled(skip)]
    pub salary: f64,
    #[serde(rename = "SALARY_TEXT")]
    #[tabled(rename = "Salary")]
    pub salary_text: String,
    #[serde(rename = "SALARY_NATIONAL")]
    #[tabled(skip)]
    pub national_salary: f64,
    #[serde(rename = "SALARY_NATIONAL_TEXT")]
    #[tabled(rename = "National Salary")]
    pub national_text: String,
    #[serde(rename = "STATUS")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "LABEL")]
    #[tabled(skip)]
    pub label: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RatioRow {
    #[serde(rename = "REGION")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "YEAR")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "RATIO")]
    #[tabled(skip)]
    pub ratio: f64,
    #[serde(rename = "RATIO_TEXT")]
    #[tabled(rename = "Ratio")]
    pub ratio_text: String,
    #[serde(rename = "SALARY")]
    #[tabled(skip)]
    pub salary: f64,
    #[serde(rename = "SALARY_TEXT")]
    #[tabled(rename = "Salary")]
    pub salary_text: String,
    #[serde(rename = "SALARY_NATIONAL")]
    #[tabled(skip)]
    pub national_salary: f64,
    #[serde(rename = "SALARY_NATIONAL_TEXT")]
    #[tabled(rename = "National Salary")]
    pub national_text: String,
    #[serde(rename = "STATUS")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "LABEL")]
    #[tabled(skip)]
    pub label: String,
}

/// One choropleth row: a region's latest in-range wage (0.0 when the range
/// holds no observation) plus whether the boundary data knows the region.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MapRow {
    #[serde(rename = "REGION")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "SALARY")]
    #[tabled(skip)]
    pub salary: f64,
    #[serde(rename = "SALARY_TEXT")]
    #[tabled(rename = "Latest Salary")]
    pub salary_text: String,
    #[serde(rename = "MAPPED")]
    #[tabled(rename = "Mapped")]
    pub mapped: bool,
    #[serde(rename = "HOVER")]
    #[tabled(skip)]
    pub hover: String,
}

/// Visual channel in a declarative chart spec.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Color,
    Text,
    Hover,
    Location,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Choropleth,
    Bar,
    HorizontalBar,
    Line,
    Heatmap,
}

#[derive(Debug, Clone, Serialize)]
pub struct Encoding {
    pub channel: Channel,
    pub column: String,
}

/// Declarative chart input for the charting collaborator: a table of rows
/// plus a mapping of columns to visual channels. Never rendered here.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub encodings: Vec<Encoding>,
    pub rows: serde_json::Value,
}

impl ChartSpec {
    pub fn new(
        title: impl Into<String>,
        kind: ChartKind,
        encodings: &[(Channel, &str)],
        rows: serde_json::Value,
    ) -> Self {
        ChartSpec {
            title: title.into(),
            kind,
            encodings: encodings
                .iter()
                .map(|(channel, column)| Encoding {
                    channel: *channel,
                    column: (*column).to_string(),
                })
                .collect(),
            rows,
        }
    }
}

/// Everything one recomputation pass produces. `has_data` is false when the
/// filtered base table was empty; all sections are then empty as well.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub filter: FilterSelection,
    pub has_data: bool,
    pub kpis: Vec<Kpi>,
    pub map_rows: Vec<MapRow>,
    pub top_salary: Vec<WageRow>,
    pub bottom_salary: Vec<WageRow>,
    pub growth: Vec<GrowthRow>,
    pub top_growth: Vec<GrowthRow>,
    pub bottom_growth: Vec<GrowthRow>,
    pub heatmap: Option<HeatmapTable>,
    pub gap: Vec<GapRow>,
    pub top_gap: Vec<GapRow>,
    pub bottom_gap: Vec<GapRow>,
    pub ratio: Vec<RatioRow>,
    pub top_ratio: Vec<RatioRow>,
    pub bottom_ratio: Vec<RatioRow>,
    pub charts: Vec<ChartSpec>,
}

impl DashboardView {
    pub fn empty(filter: FilterSelection) -> Self {
        DashboardView {
            filter,
            has_data: false,
            kpis: Vec::new(),
            map_rows: Vec::new(),
            top_salary: Vec::new(),
            bottom_salary: Vec::new(),
            growth: Vec::new(),
            top_growth: Vec::new(),
            bottom_growth: Vec::new(),
            heatmap: None,
            gap: Vec::new(),
            top_gap: Vec::new(),
            bottom_gap: Vec::new(),
            ratio: Vec::new(),
            top_ratio: Vec::new(),
            bottom_ratio: Vec::new(),
            charts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_matching_is_case_insensitive() {
        let rec = WageRecord {
            region: "indonesia".to_string(),
            year: 2024,
            salary: 3_000_000.0,
        };
        assert!(rec.is_national());
        let rec = WageRecord {
            region: "Jakarta".to_string(),
            year: 2024,
            salary: 5_100_000.0,
        };
        assert!(!rec.is_national());
    }

    #[test]
    fn collapsed_year_range_is_exact_match() {
        let sel = FilterSelection {
            year_from: 2024,
            year_to: 2024,
            selected_regions: vec![],
            include_national: true,
            top_bottom_n: 5,
        };
        assert!(sel.year_in_range(2024));
        assert!(!sel.year_in_range(2023));
        assert!(!sel.year_in_range(2025));
    }

    #[test]
    fn year_range_is_inclusive_on_both_ends() {
        let sel = FilterSelection {
            year_from: 2020,
            year_to: 2024,
            selected_regions: vec![],
            include_national: true,
            top_bottom_n: 5,
        };
        assert!(sel.year_in_range(2020));
        assert!(sel.year_in_range(2024));
        assert!(!sel.year_in_range(2019));
        assert!(!sel.year_in_range(2025));
    }

    #[test]
    fn baseline_status_classification() {
        assert_eq!(BaselineStatus::classify(500_000.0, 0.0), BaselineStatus::Above);
        assert_eq!(BaselineStatus::classify(0.0, 0.0), BaselineStatus::Equal);
        assert_eq!(BaselineStatus::classify(-1.0, 0.0), BaselineStatus::Below);
        assert_eq!(BaselineStatus::classify(120.0, 100.0), BaselineStatus::Above);
        assert_eq!(BaselineStatus::classify(100.0, 100.0), BaselineStatus::Equal);
    }
}
