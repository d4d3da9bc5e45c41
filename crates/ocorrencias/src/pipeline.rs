//! End-to-end report pipeline: fetch, aggregate, chart, assemble.
//!
//! Strictly sequential and run-to-completion; the first error aborts the run
//! with no partial report.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use log::{info, warn};

use crate::aggregate::{aggregate, normalize, Aggregation};
use crate::chart;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::OccurrenceRecord;
use crate::report;
use crate::store::OccurrenceStore;

/// File name of the bar chart image inside the assets directory.
pub const BAR_CHART_FILE: &str = "ocorrencias_por_periodo.png";

/// File name of the pie chart image inside the assets directory.
pub const PIE_CHART_FILE: &str = "ocorrencias_por_tipo.png";

/// Everything a completed run produced.
#[derive(Clone, Debug)]
pub struct ReportArtifacts {
    /// Path of the written PDF report.
    pub pdf_path: PathBuf,
    /// Path of the bar chart image.
    pub bar_chart_path: PathBuf,
    /// Path of the pie chart image.
    pub pie_chart_path: PathBuf,
    /// Number of records covered by the report.
    pub total_records: u64,
    /// Non-canonical occurrence type labels seen during aggregation.
    pub unknown_types: Vec<String>,
}

/// Runs the whole pipeline against the given store.
pub fn run(
    config: &ReportConfig,
    store: &dyn OccurrenceStore,
) -> Result<ReportArtifacts, ReportError> {
    let records = fetch_all(config, store)?;
    info!(
        "fetched {} records across {} periods",
        records.len(),
        config.periods.len()
    );

    let cleaned = normalize(records)?;
    let aggregation = aggregate(&cleaned);
    for label in &aggregation.unknown_types {
        warn!(
            "occurrence type {:?} is outside the known categories; counted separately",
            label
        );
    }

    fs::create_dir_all(&config.assets_dir)?;
    let bar_chart_path = config.assets_dir.join(BAR_CHART_FILE);
    let pie_chart_path = config.assets_dir.join(PIE_CHART_FILE);
    chart::render_period_bar_chart(&aggregation, &bar_chart_path)?;
    chart::render_type_pie_chart(&aggregation, &pie_chart_path)?;
    info!("chart images written under {}", config.assets_dir.display());

    let pdf_path = write_report(config, &aggregation, &bar_chart_path, &pie_chart_path)?;
    info!("report written to {}", pdf_path.display());

    Ok(ReportArtifacts {
        pdf_path,
        bar_chart_path,
        pie_chart_path,
        total_records: aggregation.total_records(),
        unknown_types: aggregation.unknown_types.iter().cloned().collect(),
    })
}

/// Issues one query per configured period and concatenates the results.
///
/// No cross-period order is imposed here; the aggregation tables define their
/// own ordering.
fn fetch_all(
    config: &ReportConfig,
    store: &dyn OccurrenceStore,
) -> Result<Vec<OccurrenceRecord>, ReportError> {
    let mut records = Vec::new();
    for period in &config.periods {
        let mut batch = store.fetch_period(period, config.contract)?;
        records.append(&mut batch);
    }
    Ok(records)
}

fn write_report(
    config: &ReportConfig,
    aggregation: &Aggregation,
    bar_chart_path: &std::path::Path,
    pie_chart_path: &std::path::Path,
) -> Result<PathBuf, ReportError> {
    let generated_at = Local::now();
    let bytes = report::assemble(
        config,
        aggregation,
        bar_chart_path,
        pie_chart_path,
        &generated_at,
    )?;

    fs::create_dir_all(&config.output_dir)?;
    let pdf_path = config
        .output_dir
        .join(report::report_file_name(&generated_at));
    fs::write(&pdf_path, &bytes)?;
    Ok(pdf_path)
}
