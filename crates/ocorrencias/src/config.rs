//! Run configuration for the report pipeline.
//!
//! The original tool kept the contract, the period list and every output path
//! as hard-coded constants; here they live in explicit configuration values
//! passed into the pipeline, with documented defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::model::PeriodCode;

/// Default collection holding occurrence documents.
pub const DEFAULT_COLLECTION: &str = "dbAusencias";

/// Default Firestore database name.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Default base URL of the Firestore REST API.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

/// Default timeout applied to each store query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration of one report run.
///
/// `contract` is optional: without it the store queries filter on the period
/// alone (the original's single-period variant).  `render_breakdown` controls
/// whether the per-unit table carries the six per-type columns or only the
/// totals.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    /// Contract to filter on; `None` queries across contracts.
    pub contract: Option<i64>,
    /// Ordered list of periods to fetch, one query each.
    pub periods: Vec<PeriodCode>,
    /// Display label for the covered range, e.g. `"Junho/24 - Agosto/24"`.
    pub period_label: String,
    /// Render the six per-type columns in the per-unit table.
    pub render_breakdown: bool,
    /// Directory receiving the chart images (created if missing).
    pub assets_dir: PathBuf,
    /// Directory receiving the PDF report.
    pub output_dir: PathBuf,
    /// Logo displayed in the report header; skipped with a warning if absent.
    pub logo_path: Option<PathBuf>,
}

impl ReportConfig {
    /// Creates a configuration for the given periods with default paths.
    pub fn new(periods: Vec<PeriodCode>, period_label: impl Into<String>) -> Self {
        Self {
            contract: None,
            periods,
            period_label: period_label.into(),
            render_breakdown: true,
            assets_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("."),
            logo_path: None,
        }
    }

    /// Sets the contract filter and returns the updated configuration.
    pub fn with_contract(mut self, contract: impl Into<Option<i64>>) -> Self {
        self.contract = contract.into();
        self
    }

    /// Enables or disables the per-type breakdown columns.
    pub fn with_breakdown(mut self, render_breakdown: bool) -> Self {
        self.render_breakdown = render_breakdown;
        self
    }

    /// Sets the directory receiving the chart images.
    pub fn with_assets_dir(mut self, assets_dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    /// Sets the directory receiving the PDF report.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the header logo image.
    pub fn with_logo(mut self, logo_path: impl Into<Option<PathBuf>>) -> Self {
        self.logo_path = logo_path.into();
        self
    }
}

/// Connection settings for the Firestore-backed store.
#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    /// Google Cloud project hosting the database.
    pub project_id: String,
    /// Database name inside the project.
    pub database: String,
    /// Collection holding the occurrence documents.
    pub collection: String,
    /// Bearer token for the REST API; obtaining one is the caller's concern.
    pub token: Option<String>,
    /// Timeout applied to each query.  The original blocked indefinitely on a
    /// hung store; every query here is bounded.
    pub timeout: Duration,
    /// Base URL of the REST API; override for emulators or tests.
    pub base_url: String,
}

impl FirestoreConfig {
    /// Creates a configuration for the given project with default settings.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_owned(),
            collection: DEFAULT_COLLECTION.to_owned(),
            token: None,
            timeout: DEFAULT_QUERY_TIMEOUT,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Sets the bearer token used for authentication.
    pub fn with_token(mut self, token: impl Into<Option<String>>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the collection queried for occurrence documents.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the REST API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
