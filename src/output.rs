use crate::types::{HeatmapTable, Kpi};
use crate::util::format_number;
use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print a titled dashboard section as a markdown table, or an explicit
/// "no data" line when the section is empty.
pub fn preview_section<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("### {}", title);
    if rows.is_empty() {
        println!("(no data for the selected filters)\n");
        return;
    }
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}", table_str);
    if rows.len() > max_rows {
        println!("... ({} more rows)", rows.len() - max_rows);
    }
    println!("");
}

/// Print the KPI cards as label/value/annotation lines.
pub fn preview_kpis(title: &str, kpis: &[Kpi]) {
    println!("### {}", title);
    if kpis.is_empty() {
        println!("(no data for the selected filters)\n");
        return;
    }
    for kpi in kpis {
        if kpi.annotation.is_empty() {
            println!("  {}: {}", kpi.label, kpi.value);
        } else {
            println!("  {}: {} ({})", kpi.label, kpi.value, kpi.annotation);
        }
    }
    println!("");
}

/// Print the region x year matrix as a compact grid.
pub fn preview_heatmap(title: &str, heatmap: Option<&HeatmapTable>) {
    println!("### {}", title);
    let Some(heat) = heatmap else {
        println!("(no data for the selected filters)\n");
        return;
    };
    let header: Vec<String> = heat.years.iter().map(|y| y.to_string()).collect();
    println!("  {:<24} {}", "Region", header.join("  "));
    for (region, row) in heat.regions.iter().zip(&heat.values) {
        let cells: Vec<String> = row.iter().map(|v| format_number(*v, 0)).collect();
        println!("  {:<24} {}", region, cells.join("  "));
    }
    println!("");
}
