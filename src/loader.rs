use crate::types::WageRecord;
use crate::util::{parse_f64_safe, parse_i32_safe};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Headers that must be present (compared case-insensitively after
/// trimming).
pub const REQUIRED_COLUMNS: [&str; 3] = ["REGION", "SALARY", "YEAR"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("column(s) {} not found in {path}; expected columns REGION, SALARY, YEAR", .missing.join(", "))]
    MissingColumns { path: String, missing: Vec<String> },
}

/// Counters describing one ingestion pass. Rows excluded here never reach
/// any downstream stage; the counts are surfaced as load diagnostics.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub unreadable_rows: usize,
    pub bad_year_rows: usize,
    pub bad_salary_rows: usize,
    pub duplicate_rows: usize,
}

impl LoadReport {
    pub fn skipped_rows(&self) -> usize {
        self.unreadable_rows + self.bad_year_rows + self.bad_salary_rows + self.duplicate_rows
    }
}

/// Load and normalize the wage table.
///
/// The header row is matched case-insensitively after trimming; a missing
/// required column is fatal and the error names every absent header. Rows
/// with an unparseable year or salary (or a negative salary) are excluded
/// and counted rather than carried as sentinels. Duplicate `(region, year)`
/// pairs keep the first occurrence.
pub fn read_wage_table(path: &str) -> Result<(Vec<WageRecord>, LoadReport), LoadError> {
    let read_err = |source| LoadError::Read {
        path: path.to_string(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;

    let headers = rdr.headers().map_err(read_err)?.clone();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        positions.entry(header.trim().to_uppercase()).or_insert(idx);
    }
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !positions.contains_key(**col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            path: path.to_string(),
            missing,
        });
    }
    let region_at = positions["REGION"];
    let salary_at = positions["SALARY"];
    let year_at = positions["YEAR"];

    let mut report = LoadReport::default();
    let mut seen: HashSet<(String, i32)> = HashSet::new();
    let mut records: Vec<WageRecord> = Vec::new();

    for row in rdr.records() {
        report.total_rows += 1;
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                report.unreadable_rows += 1;
                continue;
            }
        };

        let region = row.get(region_at).unwrap_or("").trim().to_string();
        if region.is_empty() {
            report.unreadable_rows += 1;
            continue;
        }
        let year = match parse_i32_safe(row.get(year_at)) {
            Some(y) => y,
            None => {
                report.bad_year_rows += 1;
                continue;
            }
        };
        let salary = match parse_f64_safe(row.get(salary_at)) {
            Some(s) if s >= 0.0 => s,
            _ => {
                report.bad_salary_rows += 1;
                continue;
            }
        };

        // At most one record per (region, year); first occurrence wins.
        if !seen.insert((region.to_uppercase(), year)) {
            report.duplicate_rows += 1;
            continue;
        }
        records.push(WageRecord {
            region,
            year,
            salary,
        });
    }

    report.loaded_rows = records.len();
    Ok((records, report))
}

// Process-lifetime ingestion cache keyed by source path. Never invalidated:
// a source file changed after the first load is not observed until restart.
static TABLE_CACHE: Lazy<Mutex<HashMap<String, (Arc<Vec<WageRecord>>, LoadReport)>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Memoized ingestion: repeated loads of the same path return the same
/// shared table without re-parsing.
pub fn load_cached(path: &str) -> Result<(Arc<Vec<WageRecord>>, LoadReport), LoadError> {
    let mut cache = TABLE_CACHE.lock().unwrap();
    if let Some((table, report)) = cache.get(path) {
        return Ok((Arc::clone(table), report.clone()));
    }
    let (records, report) = read_wage_table(path)?;
    let table = Arc::new(records);
    cache.insert(path.to_string(), (Arc::clone(&table), report.clone()));
    Ok((table, report))
}
