// Entry point and high-level CLI flow.
//
// The binary is an interactive console dashboard over the regional
// minimum-wage table:
// - Option [1] loads and normalizes the wage data, printing diagnostics.
// - Option [2] recomputes the full dashboard for the current filters and
//   prints every section.
// - Option [3] adjusts the filter selection (year range, regions,
//   national average, top/bottom N).
// - Option [4] exports the derived tables and chart specs to files.
//
// Each "show dashboard" interaction is one synchronous recomputation pass
// from the filter selection to the complete view; nothing is carried
// between passes except the memoized source table.
mod filters;
mod geo;
mod loader;
mod metrics;
mod output;
mod types;
mod util;
mod view;

use geo::BoundaryIndex;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use types::{FilterSelection, WageRecord};

const DATA_PATH: &str = "umr.csv";
const BOUNDARY_PATH: &str = "indonesia-province-simple.json";

// Simple in-memory app state so we only load the source table once but can
// re-render the dashboard any number of times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        table: None,
        boundaries: None,
        filter: None,
    })
});

struct AppState {
    table: Option<Arc<Vec<WageRecord>>>,
    boundaries: Option<Arc<BoundaryIndex>>,
    filter: Option<FilterSelection>,
}

fn data_path() -> String {
    std::env::args().nth(1).unwrap_or_else(|| DATA_PATH.to_string())
}

fn boundary_path() -> String {
    std::env::args().nth(2).unwrap_or_else(|| BOUNDARY_PATH.to_string())
}

/// Read a single line of input after printing a prompt.
fn prompt_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt_line("Enter choice: ")
}

/// Default selection for freshly loaded data: the latest year only, all
/// regions, national average shown, top/bottom 5.
fn default_filter(table: &[WageRecord]) -> FilterSelection {
    let (_, max_year) = filters::year_bounds(table).unwrap_or((0, 0));
    filters::normalize(
        FilterSelection {
            year_from: max_year,
            year_to: max_year,
            selected_regions: Vec::new(),
            include_national: true,
            top_bottom_n: 5,
        },
        table,
    )
}

/// Handle option [1]: load the wage table (memoized by path) and the
/// boundary data, then print load diagnostics.
fn handle_load() {
    let path = data_path();
    match loader::load_cached(&path) {
        Ok((table, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} loaded)",
                util::format_int(report.total_rows as i64),
                util::format_int(report.loaded_rows as i64)
            );
            if report.bad_year_rows + report.bad_salary_rows + report.unreadable_rows > 0 {
                println!(
                    "Note: {} rows skipped ({} unreadable, {} bad year, {} bad salary).",
                    util::format_int(
                        (report.unreadable_rows + report.bad_year_rows + report.bad_salary_rows)
                            as i64
                    ),
                    util::format_int(report.unreadable_rows as i64),
                    util::format_int(report.bad_year_rows as i64),
                    util::format_int(report.bad_salary_rows as i64)
                );
            }
            if report.duplicate_rows > 0 {
                println!(
                    "Info: {} duplicate (region, year) rows ignored; first occurrence kept.",
                    util::format_int(report.duplicate_rows as i64)
                );
            }

            let boundaries = Arc::new(BoundaryIndex::load_or_empty(&boundary_path()));
            if !boundaries.is_empty() {
                println!(
                    "Boundary data: {} region polygons indexed.",
                    util::format_int(boundaries.len() as i64)
                );
            }
            println!("");

            let mut state = APP_STATE.lock().unwrap();
            if state.filter.is_none() {
                state.filter = Some(default_filter(&table));
            }
            state.table = Some(table);
            state.boundaries = Some(boundaries);
        }
        Err(e) => {
            // A broken source means no dashboard at all; the error already
            // names any missing columns.
            eprintln!("Failed to load data: {}\n", e);
        }
    }
}

/// Pull everything a recomputation pass needs out of the app state.
fn current_inputs() -> Option<(Arc<Vec<WageRecord>>, FilterSelection, Arc<BoundaryIndex>)> {
    let state = APP_STATE.lock().unwrap();
    let table = state.table.clone()?;
    let filter = state.filter.clone()?;
    let boundaries = state
        .boundaries
        .clone()
        .unwrap_or_else(|| Arc::new(BoundaryIndex::empty()));
    Some((table, filter, boundaries))
}

/// Handle option [2]: recompute the dashboard for the current filters and
/// print every section.
fn handle_show_dashboard() {
    let Some((table, filter, boundaries)) = current_inputs() else {
        println!("Error: No data loaded. Please load the wage data first (option 1).\n");
        return;
    };

    let view = view::render(&table, &filter, &boundaries);
    let range = format!("{}–{}", view.filter.year_from, view.filter.year_to);
    let n = view.filter.top_bottom_n;

    if !view.has_data {
        println!("No data available for the selected year range ({})\n", range);
        return;
    }

    output::preview_kpis(&format!("Key KPIs ({})", range), &view.kpis);
    output::preview_section(
        &format!("Interactive Map of UMR in Indonesia ({})", range),
        &view.map_rows,
        10,
    );
    let unmapped = view.map_rows.iter().filter(|r| !r.mapped).count();
    if unmapped > 0 {
        println!(
            "({} regions have no boundary polygon and render unmapped)\n",
            unmapped
        );
    }
    output::preview_section(
        &format!("Top {} by Actual UMR Value", n),
        &view.top_salary,
        n,
    );
    output::preview_section(
        &format!("Bottom {} by Actual UMR Value", n),
        &view.bottom_salary,
        n,
    );
    output::preview_section(
        "Percentage & Nominal UMR Increase by Year",
        &view.growth,
        10,
    );
    output::preview_section(
        &format!("Top {} by Percentage Increase", n),
        &view.top_growth,
        n,
    );
    output::preview_section(
        &format!("Bottom {} by Percentage Increase", n),
        &view.bottom_growth,
        n,
    );
    output::preview_heatmap(
        &format!("Heatmap UMR by Year ({})", range),
        view.heatmap.as_ref(),
    );
    output::preview_section(
        &format!("Provincial UMR Gap vs National Average ({})", range),
        &view.gap,
        10,
    );
    output::preview_section(
        &format!("Top {} Highest Gaps vs National Average", n),
        &view.top_gap,
        n,
    );
    output::preview_section(
        &format!("Bottom {} Lowest Gaps vs National Average", n),
        &view.bottom_gap,
        n,
    );
    output::preview_section(
        &format!("Provincial UMR Ratio to National Average ({})", range),
        &view.ratio,
        10,
    );
    output::preview_section(
        &format!("Top {} Highest Ratios vs National Average", n),
        &view.top_ratio,
        n,
    );
    output::preview_section(
        &format!("Bottom {} Lowest Ratios vs National Average", n),
        &view.bottom_ratio,
        n,
    );
}

/// Handle option [3]: prompt for a new filter selection. Empty answers keep
/// the current value; the result is normalized against the loaded table.
fn handle_adjust_filters() {
    let mut state = APP_STATE.lock().unwrap();
    let Some(table) = state.table.clone() else {
        println!("Error: No data loaded. Please load the wage data first (option 1).\n");
        return;
    };
    let current = state
        .filter
        .clone()
        .unwrap_or_else(|| default_filter(&table));

    let (min_year, max_year) = filters::year_bounds(&table).unwrap_or((0, 0));
    let regions = filters::distinct_regions(&table);
    println!(
        "Data covers {}–{} across {} regions.",
        min_year,
        max_year,
        util::format_int(regions.len() as i64)
    );

    let year_input = prompt_line(&format!(
        "Year or year range (e.g. `2024` or `2020 2024`) [{} {}]: ",
        current.year_from, current.year_to
    ));
    let (year_from, year_to) = parse_year_range(&year_input)
        .unwrap_or((current.year_from, current.year_to));

    println!("Available regions: {}", regions.join(", "));
    let regions_input = prompt_line("Regions, comma-separated (empty = all): ");
    let selected_regions: Vec<String> = regions_input
        .split(',')
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    let national_input = prompt_line(&format!(
        "Show National Average (INDONESIA)? (Y/N) [{}]: ",
        if current.include_national { "Y" } else { "N" }
    ));
    let include_national = match national_input.to_uppercase().as_str() {
        "Y" => true,
        "N" => false,
        _ => current.include_national,
    };

    let n_input = prompt_line(&format!(
        "Number of Top/Bottom [{}]: ",
        current.top_bottom_n
    ));
    let top_bottom_n = n_input.parse::<usize>().unwrap_or(current.top_bottom_n);

    let selection = filters::normalize(
        FilterSelection {
            year_from,
            year_to,
            selected_regions,
            include_national,
            top_bottom_n,
        },
        &table,
    );
    println!(
        "Filters set: years {}–{}, {} region(s), national {}, top/bottom {}.\n",
        selection.year_from,
        selection.year_to,
        if selection.selected_regions.is_empty() {
            "all".to_string()
        } else {
            selection.selected_regions.len().to_string()
        },
        if selection.include_national { "shown" } else { "hidden" },
        selection.top_bottom_n
    );
    state.filter = Some(selection);
}

/// Parse `"2024"` or `"2020 2024"` (also `"2020-2024"`) into an inclusive
/// year range. Returns `None` for anything else so callers keep the
/// previous selection.
fn parse_year_range(input: &str) -> Option<(i32, i32)> {
    let parts: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [single] => {
            let year = single.parse().ok()?;
            Some((year, year))
        }
        [from, to] => Some((from.parse().ok()?, to.parse().ok()?)),
        _ => None,
    }
}

/// Handle option [4]: write the derived tables as CSV and the chart specs
/// plus KPI summary as JSON, mirroring what the charting and UI
/// collaborators consume.
fn handle_export() {
    let Some((table, filter, boundaries)) = current_inputs() else {
        println!("Error: No data loaded. Please load the wage data first (option 1).\n");
        return;
    };
    let view = view::render(&table, &filter, &boundaries);
    if !view.has_data {
        println!("Nothing to export: no data for the selected year range.\n");
        return;
    }

    println!("Exporting reports...");
    let writes: [(&str, Result<(), Box<dyn std::error::Error>>); 4] = [
        ("map_rows.csv", output::write_csv("map_rows.csv", &view.map_rows)),
        ("growth_rows.csv", output::write_csv("growth_rows.csv", &view.growth)),
        ("gap_rows.csv", output::write_csv("gap_rows.csv", &view.gap)),
        ("ratio_rows.csv", output::write_csv("ratio_rows.csv", &view.ratio)),
    ];
    for (file, result) in writes {
        match result {
            Ok(()) => println!("  wrote {}", file),
            Err(e) => eprintln!("  write error for {}: {}", file, e),
        }
    }

    if let Err(e) = output::write_json("chart_specs.json", &view.charts) {
        eprintln!("  write error for chart_specs.json: {}", e);
    } else {
        println!("  wrote chart_specs.json ({} charts)", view.charts.len());
    }

    let summary = serde_json::json!({
        "year_from": view.filter.year_from,
        "year_to": view.filter.year_to,
        "top_bottom_n": view.filter.top_bottom_n,
        "include_national": view.filter.include_national,
        "kpis": view.kpis,
    });
    if let Err(e) = output::write_json("dashboard_summary.json", &summary) {
        eprintln!("  write error for dashboard_summary.json: {}", e);
    } else {
        println!("  wrote dashboard_summary.json");
    }
    println!("");
}

fn main() {
    println!("Indonesia Regional Minimum Wage (UMR) Dashboard");
    println!("");
    loop {
        println!("[1] Load wage data");
        println!("[2] Show dashboard");
        println!("[3] Adjust filters");
        println!("[4] Export reports & chart specs");
        println!("[5] Exit\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_show_dashboard();
            }
            "3" => {
                handle_adjust_filters();
            }
            "4" => {
                handle_export();
            }
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter a number between 1 and 5.\n");
            }
        }
    }
}
