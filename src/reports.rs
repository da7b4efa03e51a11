//! The report bundle written by the CLI: the flat results table, the
//! per-region summary and a JSON summary of the whole snapshot.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::dashboard::{Dashboard, DataOrigin};
use crate::error::Result;
use crate::hierarchy::BuildReport;
use crate::output::{write_csv, write_json};
use crate::types::{GlobalTotals, SlaCounters};

pub const RESULTS_FILE: &str = "results_table.csv";
pub const REGION_SUMMARY_FILE: &str = "region_summary.csv";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub source: Option<DataOrigin>,
    pub totals: GlobalTotals,
    pub sla: SlaCounters,
    pub build: BuildReport,
}

pub fn generate_summary(dashboard: &Dashboard) -> ReportSummary {
    let model = dashboard.model();
    ReportSummary {
        source: dashboard.origin().cloned(),
        totals: model.global_totals(),
        sla: *model.sla(),
        build: *model.report(),
    }
}

/// Paths of the files written by [`export_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub results: PathBuf,
    pub region_summary: PathBuf,
    pub summary: PathBuf,
}

/// Write the three report files into `out_dir`, creating it if needed.
pub fn export_reports(dashboard: &Dashboard, out_dir: &Path) -> Result<ExportedFiles> {
    fs::create_dir_all(out_dir)?;
    let files = ExportedFiles {
        results: out_dir.join(RESULTS_FILE),
        region_summary: out_dir.join(REGION_SUMMARY_FILE),
        summary: out_dir.join(SUMMARY_FILE),
    };

    let results = dashboard.flatten_results_table();
    write_csv(&files.results, &results)?;
    write_csv(&files.region_summary, &dashboard.model().region_summary_rows())?;
    write_json(&files.summary, &generate_summary(dashboard))?;

    info!(out_dir = %out_dir.display(), results = results.len(), "wrote reports");
    Ok(files)
}
