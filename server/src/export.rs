//! CSV export of the network analytics.
//!
//! Each report is written as one CSV file with a header row taken from the
//! serialized field names. Missing values are written as empty cells.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use airroute_vector::analytics;
use airroute_vector::RouteStore;
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

const BUSIEST_HUBS_LIMIT: usize = 20;
const HUB_LOAD_LIMIT: usize = 50;
const BUSIEST_ROUTES_LIMIT: usize = 50;
const DELAY_RISK_LIMIT: usize = 100;

/// One file written by an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub file: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub out_dir: PathBuf,
    pub files: Vec<ExportedFile>,
}

/// Write every analytics report under `out_dir`, creating it if needed
pub fn run(store: &RouteStore, out_dir: &Path) -> anyhow::Result<ExportReport> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let routes = store.routes()?;
    let airports = store.airports()?;
    let stats = store.passenger_stats()?;
    let risks = store.delay_risks()?;

    let files = vec![
        write_report(
            out_dir,
            "busiest_hubs.csv",
            &analytics::busiest_hubs(&routes, &airports, BUSIEST_HUBS_LIMIT),
        )?,
        write_report(
            out_dir,
            "hub_load_delay.csv",
            &analytics::hub_load_and_delay(&routes, &airports, &stats, HUB_LOAD_LIMIT),
        )?,
        write_report(
            out_dir,
            "busiest_routes.csv",
            &analytics::busiest_routes(&routes, &airports, BUSIEST_ROUTES_LIMIT),
        )?,
        write_report(
            out_dir,
            "delay_risk_overview.csv",
            &analytics::delay_risk_overview(&routes, &airports, &risks, DELAY_RISK_LIMIT),
        )?,
    ];

    tracing::info!("Exports written to {}", out_dir.display());
    Ok(ExportReport {
        out_dir: out_dir.to_path_buf(),
        files,
    })
}

fn write_report<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> anyhow::Result<ExportedFile> {
    let path = dir.join(name);
    let mut out = Vec::new();
    write_csv(&mut out, rows)?;
    fs::write(&path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(ExportedFile {
        file: name.to_string(),
        rows: rows.len(),
    })
}

/// Write `rows` as CSV; an empty slice produces an empty file
pub fn write_csv<T: Serialize>(out: &mut impl Write, rows: &[T]) -> anyhow::Result<()> {
    let mut header_written = false;
    for row in rows {
        let Value::Object(fields) = serde_json::to_value(row)? else {
            anyhow::bail!("Export rows must serialize to objects");
        };
        if !header_written {
            let names: Vec<String> = fields.keys().map(|k| escape(k)).collect();
            writeln!(out, "{}", names.join(","))?;
            header_written = true;
        }
        let cells: Vec<String> = fields.values().map(cell).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

fn escape(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
