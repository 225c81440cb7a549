//! Example: download every Iranian mine locality with enrichment
//!
//! Run with:
//! ```bash
//! cargo run --example download_iran_mines
//! ```
//!
//! Expects a Mindat API key in `api_key.txt` (or the file named by the
//! `MINDAT_API_KEY_FILE` environment variable). Records land in
//! `mindat_data/Iran_Mine_enriched.json`; rerunning resumes the artifact.

use std::sync::Arc;

use mindat_downloader::client::MindatClient;
use mindat_downloader::config::{self, AppConfig};
use mindat_downloader::endpoints::Endpoints;
use mindat_downloader::http::HttpClient;
use mindat_downloader::repo::LocalitiesRepository;
use mindat_downloader::service::DownloadService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("mindat_downloader=info")
        .init();

    let config = AppConfig::default();
    let api_key = config::read_api_key(&config.api_key_file)?;

    let http = Arc::new(HttpClient::new(
        &config.timeouts,
        config.retries.clone(),
        &api_key,
    )?);
    let client = MindatClient::new(http, Endpoints::from_config(&config), config.page_size);
    let repo = LocalitiesRepository::new(client.clone(), config.search_strategies.clone());
    let service = DownloadService::new(client, repo, config.save.clone());

    println!("Downloading Iranian mine localities (this can take a while)...");
    let report = service
        .download_country_mines("Iran", true, |saved| {
            if saved % 25 == 0 {
                println!("  {saved} records so far");
            }
        })
        .await?;

    println!(
        "\nDone: {} records in {}",
        report.records_written,
        report.output_path.display()
    );
    if report.enrichment_failures > 0 {
        println!(
            "{} localities were saved without their minerals list",
            report.enrichment_failures
        );
    }
    Ok(())
}
