//! Download orchestration: ties the search resolver, per-record enrichment
//! and the durable writer together into a single resumable run.

pub mod download;

pub use download::{DownloadReport, DownloadService, EnrichmentOutcome};

use thiserror::Error;

use crate::http::TransportError;
use crate::output::OutputError;

/// Errors that can abort a download run.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Listing or detail request failed beyond what the retry budget covers.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The artifact could not be written or finalized.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// A listing record carried no numeric `id`, so it cannot be enriched.
    #[error("listing record has no numeric 'id' field; cannot fetch detail")]
    MissingRecordId,
}

/// Convenience alias for orchestration results.
pub type DownloadResult<T> = Result<T, DownloadError>;
