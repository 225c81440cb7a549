//! # Mindat Downloader Library
//!
//! A resilient library for downloading locality records from the Mindat
//! mineralogy REST API. Built for long-running bulk exports that survive flaky
//! networks, rate limits, and interrupted sessions.
//!
//! ## Features
//!
//! - **Retrying Transport**: Exponential backoff on transient HTTP failures,
//!   with immediate aborts on authentication errors
//! - **Lazy Pagination**: Cursor-driven record streams that follow server-issued
//!   `next` locators page by page
//! - **Search Strategies**: Ordered fallback queries tried until one produces
//!   results
//! - **Per-Record Enrichment**: Detail and related-mineral lookups merged into
//!   each record under namespaced keys
//! - **Durable Output**: Atomic whole-document JSON rewrites or append-only
//!   JSONL, both resumable across process restarts
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mindat_downloader::client::MindatClient;
//! use mindat_downloader::config::{self, AppConfig};
//! use mindat_downloader::endpoints::Endpoints;
//! use mindat_downloader::http::HttpClient;
//! use mindat_downloader::repo::LocalitiesRepository;
//! use mindat_downloader::service::DownloadService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let api_key = config::read_api_key(&config.api_key_file)?;
//!
//! let http = Arc::new(HttpClient::new(
//!     &config.timeouts,
//!     config.retries.clone(),
//!     &api_key,
//! )?);
//! let client = MindatClient::new(http, Endpoints::from_config(&config), config.page_size);
//! let repo = LocalitiesRepository::new(client.clone(), config.search_strategies.clone());
//!
//! let service = DownloadService::new(client, repo, config.save.clone());
//! let report = service.download_country_mines("Iran", true, |_saved| {}).await?;
//! println!(
//!     "wrote {} records to {}",
//!     report.records_written,
//!     report.output_path.display()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`http`] - Authenticated HTTP transport with retry and backoff
//! - [`endpoints`] - URL construction from the base URL and path templates
//! - [`client`] - Paginated API client producing lazy record streams
//! - [`repo`] - Search strategy resolution over the localities listing
//! - [`service`] - Download orchestration with enrichment and progress
//! - [`output`] - Durable record writers (accumulating JSON, streaming JSONL)
//! - [`config`] - YAML configuration with environment overrides
//! - [`cli`] - CLI command implementations

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Paginated API client
pub mod client;

/// Configuration loading and defaults
pub mod config;

/// URL construction for API endpoints
pub mod endpoints;

/// HTTP transport with retry and backoff
pub mod http;

/// Durable record writers
pub mod output;

/// Search strategy resolution over localities
pub mod repo;

/// Download orchestration
pub mod service;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use client::MindatClient;
pub use config::AppConfig;
pub use service::{DownloadReport, DownloadService};

/// A single API record: one JSON object with its field order preserved.
///
/// Records are kept schemaless because the Mindat API evolves its field set
/// independently of this tool. Downstream consumers get exactly what the
/// service returned, plus any enrichment keys the orchestrator merged in.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Extract the numeric `id` field that Mindat assigns to every record.
///
/// Returns `None` when the field is absent or not an unsigned integer.
pub fn record_id(record: &Record) -> Option<u64> {
    record.get("id").and_then(serde_json::Value::as_u64)
}
