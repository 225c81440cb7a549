//! The download orchestrator: one country in, one durable artifact out.
//!
//! Wires the strategy resolver stream to per-record enrichment and the
//! durable writer, with cooperative shutdown between records.

use std::path::PathBuf;

use futures_util::StreamExt;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::client::MindatClient;
use crate::config::SaveConfig;
use crate::output::RecordWriter;
use crate::record_id;
use crate::repo::LocalitiesRepository;
use crate::service::{DownloadError, DownloadResult};
use crate::shutdown::SharedShutdown;
use crate::Record;

/// Outcome of the best-effort minerals lookup for one locality.
#[derive(Debug)]
pub enum EnrichmentOutcome {
    /// Related minerals fetched; attached under `locality_minerals`.
    Enriched(Vec<Record>),
    /// Lookup failed; the record is persisted without the key.
    Failed(String),
}

/// Summary of a completed (or cleanly interrupted) download run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    /// Where the artifact was written.
    pub output_path: PathBuf,
    /// Records appended during this run. Records skipped because a resumed
    /// artifact already held their id are not counted.
    pub records_written: u64,
    /// Localities whose minerals lookup failed. Their records persist
    /// without the `locality_minerals` key.
    pub enrichment_failures: u64,
    /// True when the run stopped on a shutdown request instead of
    /// exhausting the stream.
    pub interrupted: bool,
}

/// Orchestrates a full country download: resolve a search strategy, stream
/// listing records, enrich each one, and persist them durably.
pub struct DownloadService {
    client: MindatClient,
    repo: LocalitiesRepository,
    save: SaveConfig,
    shutdown: Option<SharedShutdown>,
}

impl DownloadService {
    /// Create a service without shutdown wiring. Library embeddings that
    /// handle signals themselves can attach a handle via
    /// [`with_shutdown`](Self::with_shutdown).
    pub fn new(client: MindatClient, repo: LocalitiesRepository, save: SaveConfig) -> Self {
        Self {
            client,
            repo,
            save,
            shutdown: None,
        }
    }

    /// Attach a shutdown handle that is checked between records.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Download every mine-type locality for `country` into a single
    /// artifact under the configured save directory.
    ///
    /// With `enrich` set, each listing record gets the locality detail
    /// (fatal on failure) and its related minerals (best effort) merged in
    /// under the `detail` and `locality_minerals` keys. `progress` is
    /// invoked with the cumulative appended count after every record.
    ///
    /// Re-running against an existing artifact resumes it: records whose
    /// ids are already present are skipped without any enrichment calls.
    #[instrument(skip(self, progress), fields(country = %country))]
    pub async fn download_country_mines(
        &self,
        country: &str,
        enrich: bool,
        mut progress: impl FnMut(u64),
    ) -> DownloadResult<DownloadReport> {
        let output_path = self.artifact_path(country);
        info!("Starting download to {}", output_path.display());

        let mut writer =
            RecordWriter::open(&output_path, self.save.format, self.save.checkpoint_every)?;
        let mut stream = self.repo.stream_country_mines(country);

        let mut enrichment_failures = 0u64;
        let mut interrupted = false;
        let mut run_error: Option<DownloadError> = None;

        while let Some(result) = stream.next().await {
            if self.shutdown_requested() {
                info!(
                    "Shutdown requested, stopping after {} records",
                    writer.records_written()
                );
                interrupted = true;
                break;
            }

            let mut record = match result {
                Ok(record) => record,
                Err(e) => {
                    run_error = Some(e.into());
                    break;
                }
            };

            if let Some(id) = record_id(&record) {
                if writer.already_written(id) {
                    debug!("Locality {id} already persisted, skipping");
                    continue;
                }
            }

            if enrich {
                if let Err(e) = self
                    .enrich_in_place(&mut record, &mut enrichment_failures)
                    .await
                {
                    run_error = Some(e);
                    break;
                }
            }

            if let Err(e) = writer.append(&record) {
                run_error = Some(e.into());
                break;
            }
            progress(writer.records_written());
        }

        let records_written = writer.records_written();

        if let Some(e) = run_error {
            if let Err(close_err) = writer.close() {
                warn!("Failed to finalize artifact during abort: {close_err}");
            }
            error!("Download aborted after {records_written} records: {e}");
            return Err(e);
        }

        writer.close()?;

        if interrupted {
            warn!("Download interrupted; {records_written} records saved, rerun to continue");
        } else {
            info!(
                records = records_written,
                failures = enrichment_failures,
                "Download complete"
            );
        }

        Ok(DownloadReport {
            output_path,
            records_written,
            enrichment_failures,
            interrupted,
        })
    }

    /// Merge detail and minerals into `record` under namespaced keys.
    ///
    /// A detail failure aborts the run. A minerals failure is tallied and
    /// the record keeps only its listing and detail fields.
    async fn enrich_in_place(
        &self,
        record: &mut Record,
        failures: &mut u64,
    ) -> DownloadResult<()> {
        let id = record_id(record).ok_or(DownloadError::MissingRecordId)?;

        let detail = self.client.locality_detail(id, true).await?;
        record.insert("detail".to_string(), Value::Object(detail));

        match self.fetch_minerals(id).await {
            EnrichmentOutcome::Enriched(minerals) => {
                debug!("Locality {id}: attached {} mineral entries", minerals.len());
                record.insert(
                    "locality_minerals".to_string(),
                    Value::Array(minerals.into_iter().map(Value::Object).collect()),
                );
            }
            EnrichmentOutcome::Failed(reason) => {
                warn!("Minerals lookup failed for locality {id}: {reason}");
                *failures += 1;
            }
        }
        Ok(())
    }

    /// Look up the minerals reported at a locality, folding any transport
    /// error into a best-effort outcome.
    async fn fetch_minerals(&self, locality_id: u64) -> EnrichmentOutcome {
        match self.client.locality_minerals(locality_id).await {
            Ok(minerals) => EnrichmentOutcome::Enriched(minerals),
            Err(e) => EnrichmentOutcome::Failed(e.to_string()),
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|handle| handle.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Artifact path for a country, e.g. `mindat_data/Iran_Mine_enriched.json`.
    fn artifact_path(&self, country: &str) -> PathBuf {
        let stem = country.trim().replace(' ', "_");
        let name = format!("{stem}_Mine_enriched.{}", self.save.format.extension());
        self.save.dir.join(name)
    }
}
