//! Error taxonomy for a report run.
//!
//! Every error is fatal: the pipeline aborts without producing a partial
//! report, and the binary reports the failure (with its source chain) to the
//! operator.

use thiserror::Error;

use crate::model::PeriodCodeError;
use crate::store::StoreError;

/// Top-level error for a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The remote document store query failed.
    #[error("document store query failed")]
    Query(#[from] StoreError),

    /// A record carried a period code that does not parse as `YYMM`.
    #[error("record with malformed period code")]
    MalformedPeriod(#[from] PeriodCodeError),

    /// Chart rendering failed.
    #[error("chart rendering failed: {0}")]
    Render(String),

    /// PDF assembly failed.
    #[error("PDF assembly failed")]
    Pdf(#[from] genpdf::error::Error),

    /// A filesystem write failed (chart image, PDF output, assets directory).
    #[error("filesystem operation failed")]
    Io(#[from] std::io::Error),
}
