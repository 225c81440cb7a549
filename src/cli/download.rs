//! Download command implementation

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::client::MindatClient;
use crate::config::{self, AppConfig, SaveFormat};
use crate::endpoints::Endpoints;
use crate::http::HttpClient;
use crate::repo::LocalitiesRepository;
use crate::service::{DownloadReport, DownloadService};
use crate::shutdown::SharedShutdown;

use super::prompt;
use super::CliError;

/// Parse and validate an artifact format value
fn parse_format(s: &str) -> Result<SaveFormat, String> {
    match s.to_lowercase().as_str() {
        "json" => Ok(SaveFormat::Json),
        "jsonl" => Ok(SaveFormat::Jsonl),
        _ => Err(format!("Invalid format: {s}. Valid options: json, jsonl")),
    }
}

/// Mindat mine downloader CLI
#[derive(Parser, Debug)]
#[command(name = "mindat-downloader")]
#[command(about = "Download and enrich Mindat mine localities by country", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Country to download (prompted for interactively when omitted)
    #[arg(long)]
    pub country: Option<String>,

    /// Records per listing page (overrides the configured value)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Skip per-record detail and minerals enrichment
    #[arg(long, default_value_t = false)]
    pub no_enrich: bool,

    /// Artifact format: json (single document) or jsonl (one record per line)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<SaveFormat>,

    /// Directory that receives artifacts and run logs
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    ///
    /// Called before logging starts so the run log lands in the directory
    /// the user asked for.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(format) = self.format {
            config.save.format = format;
        }
        if let Some(dir) = &self.save_dir {
            config.save.dir = dir.clone();
        }
    }

    /// Resolve the country, assemble the pipeline, and run the download.
    pub async fn execute(
        &self,
        mut config: AppConfig,
        shutdown: SharedShutdown,
    ) -> Result<DownloadReport, CliError> {
        let country = match &self.country {
            Some(country) => country.trim().to_string(),
            None => {
                let answers = prompt::ask_download_params(config.page_size)?;
                config.page_size = answers.page_size;
                answers.country
            }
        };
        if country.is_empty() {
            return Err(CliError::InvalidArgument(
                "country must not be empty".to_string(),
            ));
        }

        let api_key = config::read_api_key(&config.api_key_file)?;

        let http = Arc::new(HttpClient::new(
            &config.timeouts,
            config.retries.clone(),
            &api_key,
        )?);
        let client = MindatClient::new(http, Endpoints::from_config(&config), config.page_size);
        let repo = LocalitiesRepository::new(client.clone(), config.search_strategies.clone());
        let service =
            DownloadService::new(client, repo, config.save.clone()).with_shutdown(shutdown);

        let enrich = !self.no_enrich;
        info!(
            "Starting download: {country} mines, page size {}, enrichment {}",
            config.page_size,
            if enrich { "on" } else { "off" }
        );

        let progress = create_progress_bar(&country);
        let result = service
            .download_country_mines(&country, enrich, |saved| progress.set_position(saved))
            .await;
        progress.finish_and_clear();

        let report = result?;
        if report.interrupted {
            info!(
                "Partial download saved to {}; rerun to continue",
                report.output_path.display()
            );
        } else {
            info!(
                "Saved {} records to {}",
                report.records_written,
                report.output_path.display()
            );
        }
        Ok(report)
    }
}

fn create_progress_bar(country: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} records {msg}")
            .expect("hardcoded template is valid"),
    );
    pb.set_message(format!("Downloading {country} mines"));
    pb
}
