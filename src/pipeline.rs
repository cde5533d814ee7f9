// src/pipeline.rs

use anyhow::Result;
use std::time::Instant;
use tracing::info;

use crate::config::StudyConfig;
use crate::load::{load_cases, load_metadata, load_reference_names};
use crate::report::Report;

/// Load the inputs named by `cfg`, build the report and write its datasets.
pub fn run(cfg: &StudyConfig) -> Result<Report> {
    let start = Instant::now();
    let names = cfg.names()?;

    // ─── 1) load ─────────────────────────────────────────────────────
    let cases = load_cases(&cfg.cases_path)?;
    let metadata = load_metadata(&cfg.metadata_path)?;
    let reference = cfg
        .reference_path
        .as_ref()
        .map(load_reference_names)
        .transpose()?;

    // ─── 2) reconcile, aggregate, normalize, join ────────────────────
    let report = Report::build(
        &cases.records,
        &metadata,
        &cfg.study_countries,
        &names,
        reference.as_ref(),
    );

    // ─── 3) export datasets ──────────────────────────────────────────
    let written = report.export(&cfg.output_dir)?;
    info!(
        files = written.len(),
        scatter_rows = report.scatter.rows().len(),
        elapsed = ?start.elapsed(),
        "report ready"
    );
    Ok(report)
}
