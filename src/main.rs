//! Main entry point for mindat-downloader CLI

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use mindat_downloader::cli::Cli;
use mindat_downloader::config::AppConfig;
use mindat_downloader::shutdown::{self, ShutdownCoordinator};

/// Initialize tracing with a stdout layer plus a per-run log file.
///
/// The file layer is skipped when the log file could not be created; the
/// run still proceeds with terminal output only.
fn init_tracing(log_file: Option<File>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mindat_downloader=info"));

    let stdout_layer = tracing_subscriber::fmt::layer();
    match log_file {
        Some(file) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
        }
    }
}

/// Create `run_<timestamp>.log` inside the save directory.
fn open_run_log(save_dir: &Path) -> Option<File> {
    if let Err(e) = std::fs::create_dir_all(save_dir) {
        eprintln!("Cannot create save directory {}: {e}", save_dir.display());
        return None;
    }
    let name = format!("run_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = save_dir.join(name);
    match File::create(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Cannot create run log {}: {e}", path.display());
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration must load before logging so the run log can land in
    // the configured save directory.
    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };
    cli.apply_overrides(&mut config);

    init_tracing(open_run_log(&config.save.dir));

    let shutdown = ShutdownCoordinator::shared();
    shutdown::listen_for_ctrl_c(shutdown.clone());

    match cli.execute(config, shutdown).await {
        Ok(report) if report.interrupted => std::process::exit(130),
        Ok(_) => {}
        Err(e) => {
            error!("Download failed: {}", e);
            std::process::exit(1);
        }
    }
}
