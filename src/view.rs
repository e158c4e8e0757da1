// Presentation projection: one full recomputation pass from the current
// filter selection to everything the UI and charting collaborators consume.
// No business logic beyond formatting lives here; the numbers come from
// `metrics`, the shapes from `types`.
use crate::filters;
use crate::geo::{self, BoundaryIndex};
use crate::metrics;
use crate::types::{
    Channel, ChartKind, ChartSpec, DashboardView, FilterSelection, FilteredTables, GapPoint,
    GapRow, GrowthPoint, GrowthRow, HeatmapTable, Kpi, RatioPoint, RatioRow, WageRecord, WageRow,
};
use crate::util::{format_pct, format_ratio_pct, format_rupiah};
use serde::Serialize;
use serde_json::json;

fn label_of(region: &str, year: i32) -> String {
    format!("{} ({})", region, year)
}

fn wage_row(record: &WageRecord) -> WageRow {
    WageRow {
        region: record.region.clone(),
        salary: record.salary,
        salary_text: format_rupiah(record.salary),
        year: record.year,
        label: label_of(&record.region, record.year),
    }
}

fn growth_row(point: &GrowthPoint) -> GrowthRow {
    GrowthRow {
        region: point.region.clone(),
        year: point.year,
        pct_change: point.pct_change,
        pct_text: format_pct(point.pct_change, 2),
        nominal_change: point.nominal_change,
        nominal_text: format_rupiah(point.nominal_change),
        label: label_of(&point.region, point.year),
        tooltip: format!(
            "{}\nYear: {}\nIncrease: {} ({})",
            point.region,
            point.year,
            format_rupiah(point.nominal_change),
            format_pct(point.pct_change, 2)
        ),
    }
}

fn gap_row(point: &GapPoint) -> GapRow {
    GapRow {
        region: point.region.clone(),
        year: point.year,
        gap: point.gap,
        gap_text: format_rupiah(point.gap),
        salary: point.salary,
        salary_text: format_rupiah(point.salary),
        national_salary: point.national_salary,
        national_text: format_rupiah(point.national_salary),
        status: point.status.as_str().to_string(),
        label: label_of(&point.region, point.year),
    }
}

fn ratio_row(point: &RatioPoint) -> RatioRow {
    RatioRow {
        region: point.region.clone(),
        year: point.year,
        ratio: point.ratio,
        ratio_text: format_ratio_pct(point.ratio),
        salary: point.salary,
        salary_text: format_rupiah(point.salary),
        national_salary: point.national_salary,
        national_text: format_rupiah(point.national_salary),
        status: point.status.as_str().to_string(),
        label: label_of(&point.region, point.year),
    }
}

fn kpi<F>(label: &str, row: Option<&WageRecord>, annotate: F) -> Kpi
where
    F: Fn(&WageRecord) -> String,
{
    match row {
        Some(record) => Kpi {
            label: label.to_string(),
            value: format_rupiah(record.salary),
            annotation: annotate(record),
        },
        None => Kpi {
            label: label.to_string(),
            value: "Not available".to_string(),
            annotation: String::new(),
        },
    }
}

fn build_kpis(filtered: &FilteredTables) -> Vec<Kpi> {
    let by_year = |r: &WageRecord| format!("Year {}", r.year);
    let by_region_year = |r: &WageRecord| label_of(&r.region, r.year);
    vec![
        kpi(
            "Highest National Average UMR",
            metrics::max_salary_row(&filtered.national_rows),
            by_year,
        ),
        kpi(
            "Lowest National Average UMR",
            metrics::min_salary_row(&filtered.national_rows),
            by_year,
        ),
        kpi(
            "Highest Provincial UMR",
            metrics::max_salary_row(&filtered.region_rows),
            by_region_year,
        ),
        kpi(
            "Lowest Provincial UMR",
            metrics::min_salary_row(&filtered.region_rows),
            by_region_year,
        ),
    ]
}

/// Serialize rows into a chart spec, or nothing when the section is empty.
fn chart<T: Serialize>(
    title: String,
    kind: ChartKind,
    encodings: &[(Channel, &str)],
    rows: &[T],
) -> Option<ChartSpec> {
    if rows.is_empty() {
        return None;
    }
    let rows = serde_json::to_value(rows).unwrap_or_default();
    Some(ChartSpec::new(title, kind, encodings, rows))
}

/// Flatten the heatmap matrix into one row per cell for the chart spec.
fn heatmap_cells(heat: &HeatmapTable) -> serde_json::Value {
    let mut cells = Vec::new();
    for (i, region) in heat.regions.iter().enumerate() {
        for (j, year) in heat.years.iter().enumerate() {
            cells.push(json!({
                "REGION": region,
                "YEAR": year,
                "SALARY": heat.values[i][j],
            }));
        }
    }
    serde_json::Value::Array(cells)
}

/// One full synchronous recomputation pass: filters in, view model out.
/// Holds no state between invocations; the only caching lives in the
/// ingestion stage.
pub fn render(
    table: &[WageRecord],
    selection: &FilterSelection,
    boundaries: &BoundaryIndex,
) -> DashboardView {
    let selection = filters::normalize(selection.clone(), table);
    let filtered = filters::apply(table, &selection);
    if filtered.is_empty() {
        return DashboardView::empty(selection);
    }
    let selected = filters::selection_set(table, &selection);
    let n = selection.top_bottom_n;
    let range_label = format!("{}–{}", selection.year_from, selection.year_to);
    let single_year = selection.year_from == selection.year_to;

    let kpis = build_kpis(&filtered);
    let map_rows = geo::map_rows(table, &selection, boundaries);

    // Actual-value ranking runs over the selected regions plus the national
    // aggregate rows.
    let mut rank_base = filtered.region_rows.clone();
    rank_base.extend(filtered.national_rows.iter().cloned());
    let top_salary: Vec<WageRow> = metrics::top_n_by(&rank_base, n, |r| r.salary)
        .iter()
        .map(wage_row)
        .collect();
    let bottom_salary: Vec<WageRow> = metrics::bottom_n_by(&rank_base, n, |r| r.salary)
        .iter()
        .map(wage_row)
        .collect();

    let growth_points = metrics::growth_points(table, &selection, &selected);
    let growth: Vec<GrowthRow> = growth_points.iter().map(growth_row).collect();
    let top_growth: Vec<GrowthRow> = metrics::top_n_by(&growth_points, n, |p| p.pct_change)
        .iter()
        .map(growth_row)
        .collect();
    let bottom_growth: Vec<GrowthRow> = metrics::bottom_n_by(&growth_points, n, |p| p.pct_change)
        .iter()
        .map(growth_row)
        .collect();

    let heatmap = metrics::heatmap(&filtered.year_rows, &selection, &selected);

    let gap_points = metrics::gap_points(&filtered);
    let gap: Vec<GapRow> = gap_points.iter().map(gap_row).collect();
    let top_gap: Vec<GapRow> = metrics::top_n_by(&gap_points, n, |p| p.gap)
        .iter()
        .map(gap_row)
        .collect();
    let bottom_gap: Vec<GapRow> = metrics::bottom_n_by(&gap_points, n, |p| p.gap)
        .iter()
        .map(gap_row)
        .collect();

    let ratio_points = metrics::ratio_points(&filtered);
    let ratio: Vec<RatioRow> = ratio_points.iter().map(ratio_row).collect();
    let top_ratio: Vec<RatioRow> = metrics::top_n_by(&ratio_points, n, |p| p.ratio)
        .iter()
        .map(ratio_row)
        .collect();
    let bottom_ratio: Vec<RatioRow> = metrics::bottom_n_by(&ratio_points, n, |p| p.ratio)
        .iter()
        .map(ratio_row)
        .collect();

    let mut charts = Vec::new();
    charts.extend(chart(
        format!("Indonesia UMR Map ({})", range_label),
        ChartKind::Choropleth,
        &[
            (Channel::Location, "REGION"),
            (Channel::Color, "SALARY"),
            (Channel::Hover, "HOVER"),
        ],
        &map_rows,
    ));
    let ranked_bar = [
        (Channel::X, "SALARY"),
        (Channel::Y, "LABEL"),
        (Channel::Color, "SALARY"),
        (Channel::Text, "SALARY_TEXT"),
    ];
    charts.extend(chart(
        format!("Top {} by Actual UMR Value", n),
        ChartKind::HorizontalBar,
        &ranked_bar,
        &top_salary,
    ));
    charts.extend(chart(
        format!("Bottom {} by Actual UMR Value", n),
        ChartKind::HorizontalBar,
        &ranked_bar,
        &bottom_salary,
    ));
    charts.extend(chart(
        "Percentage & Nominal UMR Increase by Year".to_string(),
        ChartKind::Line,
        &[
            (Channel::X, "YEAR"),
            (Channel::Y, "PCT_CHANGE"),
            (Channel::Color, "REGION"),
            (Channel::Hover, "TOOLTIP"),
        ],
        &growth,
    ));
    let growth_bar = [
        (Channel::X, "PCT_CHANGE"),
        (Channel::Y, "LABEL"),
        (Channel::Color, "PCT_CHANGE"),
        (Channel::Text, "PCT_CHANGE_TEXT"),
    ];
    charts.extend(chart(
        format!("Top {} by Percentage Increase", n),
        ChartKind::HorizontalBar,
        &growth_bar,
        &top_growth,
    ));
    charts.extend(chart(
        format!("Bottom {} by Percentage Increase", n),
        ChartKind::HorizontalBar,
        &growth_bar,
        &bottom_growth,
    ));
    if let Some(heat) = &heatmap {
        charts.push(ChartSpec::new(
            format!("Heatmap UMR by Year ({})", range_label),
            ChartKind::Heatmap,
            &[
                (Channel::X, "YEAR"),
                (Channel::Y, "REGION"),
                (Channel::Color, "SALARY"),
            ],
            heatmap_cells(heat),
        ));
    }
    let gap_axis = if single_year { "REGION" } else { "YEAR" };
    let gap_title = if single_year {
        format!("Provincial UMR Gap vs National Average ({})", selection.year_from)
    } else {
        "Provincial UMR Gap vs National Average by Year".to_string()
    };
    charts.extend(chart(
        gap_title,
        ChartKind::Bar,
        &[
            (Channel::X, gap_axis),
            (Channel::Y, "GAP"),
            (Channel::Color, "REGION"),
            (Channel::Hover, "STATUS"),
        ],
        &gap,
    ));
    let gap_bar = [
        (Channel::X, "GAP"),
        (Channel::Y, "LABEL"),
        (Channel::Color, "GAP"),
        (Channel::Text, "GAP_TEXT"),
    ];
    charts.extend(chart(
        format!("Top {} Highest Gaps vs National Average", n),
        ChartKind::HorizontalBar,
        &gap_bar,
        &top_gap,
    ));
    charts.extend(chart(
        format!("Bottom {} Lowest Gaps vs National Average", n),
        ChartKind::HorizontalBar,
        &gap_bar,
        &bottom_gap,
    ));
    let ratio_title = if single_year {
        format!(
            "Provincial UMR Ratio to National Average ({})",
            selection.year_from
        )
    } else {
        "Provincial UMR Ratio to National Average by Year".to_string()
    };
    charts.extend(chart(
        ratio_title,
        ChartKind::Bar,
        &[
            (Channel::X, gap_axis),
            (Channel::Y, "RATIO"),
            (Channel::Color, "REGION"),
            (Channel::Hover, "STATUS"),
        ],
        &ratio,
    ));
    let ratio_bar = [
        (Channel::X, "RATIO"),
        (Channel::Y, "LABEL"),
        (Channel::Color, "RATIO"),
        (Channel::Text, "RATIO_TEXT"),
    ];
    charts.extend(chart(
        format!("Top {} Highest Ratios vs National Average", n),
        ChartKind::HorizontalBar,
        &ratio_bar,
        &top_ratio,
    ));
    charts.extend(chart(
        format!("Bottom {} Lowest Ratios vs National Average", n),
        ChartKind::HorizontalBar,
        &ratio_bar,
        &bottom_ratio,
    ));

    DashboardView {
        filter: selection,
        has_data: true,
        kpis,
        map_rows,
        top_salary,
        bottom_salary,
        growth,
        top_growth,
        bottom_growth,
        heatmap,
        gap,
        top_gap,
        bottom_gap,
        ratio,
        top_ratio,
        bottom_ratio,
        charts,
    }
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

    fn scenario_table() -> Vec<WageRecord> {
        vec![
            rec("INDONESIA", 2023, 2_800_000.0),
            rec("INDONESIA", 2024, 3_000_000.0),
            rec("Jakarta", 2023, 4_900_000.0),
            rec("Jakarta", 2024, 5_100_000.0),
        ]
    }

    fn selection(from: i32, to: i32, regions: &[&str]) -> FilterSelection {
        FilterSelection {
            year_from: from,
            year_to: to,
            selected_regions: regions.iter().map(|r| r.to_string()).collect(),
            include_national: true,
            top_bottom_n: 5,
        }
    }

    #[test]
    fn jakarta_2024_scenario() {
        let table = scenario_table();
        let view = render(
            &table,
            &selection(2024, 2024, &["Jakarta"]),
            &BoundaryIndex::empty(),
        );
        assert!(view.has_data);

        assert_eq!(view.gap.len(), 1);
        assert_eq!(view.gap[0].gap, 2_100_000.0);
        assert_eq!(view.gap[0].status, "Above National Average");
        assert_eq!(view.gap[0].gap_text, "Rp 2,100,000");

        assert_eq!(view.ratio.len(), 1);
        assert!((view.ratio[0].ratio - 170.0).abs() < 1e-9);
        assert_eq!(view.ratio[0].ratio_text, "170,0%");
        assert_eq!(view.ratio[0].status, "Above National Average");

        let jakarta_growth: Vec<&GrowthRow> = view
            .growth
            .iter()
            .filter(|g| g.region == "Jakarta")
            .collect();
        assert_eq!(jakarta_growth.len(), 1);
        assert!((jakarta_growth[0].pct_change - 4.0816).abs() < 1e-3);
        assert_eq!(jakarta_growth[0].pct_text, "4.08%");
    }

    #[test]
    fn kpis_report_extremes_with_annotations() {
        let table = scenario_table();
        let view = render(&table, &selection(2023, 2024, &[]), &BoundaryIndex::empty());
        assert_eq!(view.kpis.len(), 4);
        assert_eq!(view.kpis[0].label, "Highest National Average UMR");
        assert_eq!(view.kpis[0].value, "Rp 3,000,000");
        assert_eq!(view.kpis[0].annotation, "Year 2024");
        assert_eq!(view.kpis[2].value, "Rp 5,100,000");
        assert_eq!(view.kpis[2].annotation, "Jakarta (2024)");
    }

    #[test]
    fn national_kpis_degrade_when_no_national_rows() {
        let table = vec![rec("Jakarta", 2024, 5_100_000.0)];
        let view = render(&table, &selection(2024, 2024, &[]), &BoundaryIndex::empty());
        assert_eq!(view.kpis[0].value, "Not available");
        assert!(view.gap.is_empty());
        assert!(view.ratio.is_empty());
    }

    #[test]
    fn salary_ranking_includes_the_national_aggregate() {
        let mut table = scenario_table();
        table.push(rec("Bali", 2024, 2_000_000.0));
        let view = render(&table, &selection(2024, 2024, &[]), &BoundaryIndex::empty());
        // top_bottom_n clamps to the two distinct non-national regions.
        let regions: Vec<&str> = view.top_salary.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["Jakarta", "INDONESIA"]);
        assert_eq!(view.top_salary[0].label, "Jakarta (2024)");
        let regions: Vec<&str> = view
            .bottom_salary
            .iter()
            .map(|r| r.region.as_str())
            .collect();
        assert_eq!(regions, vec!["Bali", "INDONESIA"]);
    }

    #[test]
    fn empty_year_range_short_circuits_every_section() {
        let table = scenario_table();
        let view = render(&table, &selection(1990, 1995, &[]), &BoundaryIndex::empty());
        assert!(!view.has_data);
        assert!(view.kpis.is_empty());
        assert!(view.map_rows.is_empty());
        assert!(view.growth.is_empty());
        assert!(view.gap.is_empty());
        assert!(view.ratio.is_empty());
        assert!(view.heatmap.is_none());
        assert!(view.charts.is_empty());
    }

    #[test]
    fn charts_cover_every_populated_section() {
        let table = scenario_table();
        let view = render(&table, &selection(2023, 2024, &[]), &BoundaryIndex::empty());
        // map, 2 salary bars, growth line, 2 growth bars, heatmap, gap bar,
        // 2 gap bars, ratio bar, 2 ratio bars
        assert_eq!(view.charts.len(), 13);
        assert!(view
            .charts
            .iter()
            .any(|c| c.title == "Indonesia UMR Map (2023–2024)"));
        assert!(view
            .charts
            .iter()
            .any(|c| c.title == "Heatmap UMR by Year (2023–2024)"));
    }

    #[test]
    fn heatmap_includes_national_only_when_selected() {
        let table = scenario_table();
        let mut sel = selection(2023, 2024, &[]);
        sel.include_national = false;
        let view = render(&table, &sel, &BoundaryIndex::empty());
        let heat = view.heatmap.unwrap();
        assert_eq!(heat.regions, vec!["Jakarta".to_string()]);

        let view = render(&table, &selection(2023, 2024, &[]), &BoundaryIndex::empty());
        let heat = view.heatmap.unwrap();
        assert_eq!(
            heat.regions,
            vec!["INDONESIA".to_string(), "Jakarta".to_string()]
        );
    }
}
