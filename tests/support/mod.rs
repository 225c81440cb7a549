//! Shared fixtures for the integration suite

use std::sync::Arc;

use serde_json::json;

use mindat_downloader::client::{MindatClient, RecordStream};
use mindat_downloader::config::{AppConfig, RetryPolicy};
use mindat_downloader::endpoints::Endpoints;
use mindat_downloader::http::{HttpClient, TransportResult};
use mindat_downloader::repo::LocalitiesRepository;
use mindat_downloader::service::DownloadService;
use mindat_downloader::Record;

/// Configuration aimed at a mock server, with near-zero backoff so retry
/// tests run in milliseconds.
pub fn test_config(base_url: &str, page_size: u32) -> AppConfig {
    AppConfig {
        base_url: base_url.to_string(),
        page_size,
        retries: RetryPolicy {
            total: 3,
            backoff_factor: 0.01,
            ..RetryPolicy::default()
        },
        ..AppConfig::default()
    }
}

pub fn test_client(config: &AppConfig) -> MindatClient {
    let http = HttpClient::new(&config.timeouts, config.retries.clone(), "test-key")
        .expect("client builds from test settings");
    MindatClient::new(Arc::new(http), Endpoints::from_config(config), config.page_size)
}

pub fn test_repo(config: &AppConfig) -> LocalitiesRepository {
    LocalitiesRepository::new(test_client(config), config.search_strategies.clone())
}

pub fn test_service(config: &AppConfig) -> DownloadService {
    DownloadService::new(test_client(config), test_repo(config), config.save.clone())
}

/// Minimal locality record body
pub fn locality(id: u64, name: &str) -> serde_json::Value {
    json!({ "id": id, "name": name })
}

/// Listing envelope in the service's shape
pub fn envelope(
    records: &[serde_json::Value],
    count: u64,
    next: Option<String>,
) -> serde_json::Value {
    json!({ "count": count, "next": next, "results": records })
}

/// Pull every item out of a record stream
pub async fn drain(stream: RecordStream) -> Vec<TransportResult<Record>> {
    use futures_util::StreamExt;
    stream.collect().await
}
