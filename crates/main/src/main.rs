use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use ocorrencias::config::{FirestoreConfig, ReportConfig, DEFAULT_BASE_URL, DEFAULT_COLLECTION};
use ocorrencias::model::PeriodCode;
use ocorrencias::pipeline;
use ocorrencias::store::FirestoreStore;

/// Generates the operational occurrence PDF report.
///
/// Fonts must be present under `assets/fonts` relative to the `ocorrencias`
/// crate or provided via the `OCORRENCIAS_FONTS_DIR` environment variable.
#[derive(Parser)]
#[command(author, version, about = "Generates the operational occurrence PDF report")]
struct Cli {
    /// Contract to filter on; omit to report across all contracts.
    #[arg(long)]
    contract: Option<i64>,

    /// Period to include, as a compact YYMM code. Repeat the flag for a range.
    #[arg(long = "period", required = true)]
    periods: Vec<PeriodCode>,

    /// Display label for the covered range, e.g. "Junho/24 - Agosto/24".
    /// Derived from the period codes when omitted.
    #[arg(long)]
    period_label: Option<String>,

    /// Leave out the six per-type columns in the per-unit table.
    #[arg(long)]
    no_breakdown: bool,

    /// Directory receiving the chart images.
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// Directory receiving the PDF report.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Logo image shown in the report header.
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Google Cloud project hosting the occurrence database.
    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    project_id: String,

    /// Collection holding the occurrence documents.
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Bearer token for the Firestore REST API.
    #[arg(long, env = "FIRESTORE_TOKEN")]
    token: Option<String>,

    /// Timeout in seconds applied to each store query.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Base URL of the Firestore REST API (emulator override).
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl Cli {
    fn resolved_period_label(&self) -> String {
        if let Some(label) = &self.period_label {
            return label.clone();
        }
        let mut sorted = self.periods.clone();
        sorted.sort();
        match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) if first != last => {
                format!("{} - {}", first.label(), last.label())
            }
            (Some(first), _) => first.label(),
            (None, _) => String::new(),
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store_config = FirestoreConfig::new(cli.project_id.clone())
        .with_collection(cli.collection.clone())
        .with_token(cli.token.clone())
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_base_url(cli.base_url.clone());
    let store = FirestoreStore::new(store_config)?;

    let report_config = ReportConfig::new(cli.periods.clone(), cli.resolved_period_label())
        .with_contract(cli.contract)
        .with_breakdown(!cli.no_breakdown)
        .with_assets_dir(cli.assets_dir.clone())
        .with_output_dir(cli.output_dir.clone())
        .with_logo(cli.logo.clone());

    let artifacts = pipeline::run(&report_config, &store)?;
    println!(
        "Generated {} covering {} records",
        artifacts.pdf_path.display(),
        artifacts.total_records
    );
    if !artifacts.unknown_types.is_empty() {
        println!(
            "Warning: {} occurrence type(s) outside the known categories: {}",
            artifacts.unknown_types.len(),
            artifacts.unknown_types.join(", ")
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
