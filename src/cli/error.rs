//! CLI error types and conversions

use crate::config::ConfigError;
use crate::http::TransportError;
use crate::service::DownloadError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Prompt error
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
