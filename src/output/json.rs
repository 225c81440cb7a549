//! JSON artifact writers and readers

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{record_id, Record};

use super::{OutputError, OutputResult};

/// Accumulating writer: one `{"results": [...]}` document rewritten
/// atomically as records arrive.
///
/// On open, an existing artifact is loaded so a restarted run appends
/// instead of starting over. Records whose `id` is already present are
/// skipped, which keeps re-fetched pages from duplicating entries.
pub struct JsonAccumulator {
    path: PathBuf,
    records: Vec<Record>,
    seen_ids: HashSet<u64>,
    checkpoint_every: u32,
    pending: u32,
    appended: u64,
    duplicates_skipped: u64,
}

impl JsonAccumulator {
    /// Open an accumulator that rewrites the document after every append
    pub fn open<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::with_checkpoint_every(path, 1)
    }

    /// Open an accumulator that rewrites after every `checkpoint_every`
    /// appends. A value of 0 behaves like 1.
    pub fn with_checkpoint_every<P: AsRef<Path>>(
        path: P,
        checkpoint_every: u32,
    ) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::Io(format!("Failed to create directory: {e}")))?;
        }

        let records = if path.exists() {
            match load_json_document(&path) {
                Ok(existing) => {
                    info!(
                        "Resuming into existing artifact {} with {} records",
                        path.display(),
                        existing.len()
                    );
                    existing
                }
                Err(e) => {
                    warn!(error = %e, "Existing artifact is unreadable, starting fresh");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let seen_ids = records.iter().filter_map(record_id).collect();

        Ok(Self {
            path,
            records,
            seen_ids,
            checkpoint_every: checkpoint_every.max(1),
            pending: 0,
            appended: 0,
            duplicates_skipped: 0,
        })
    }

    /// Append one record, skipping ids that are already present.
    ///
    /// Records without a numeric `id` are always appended.
    pub fn append(&mut self, record: &Record) -> OutputResult<()> {
        if let Some(id) = record_id(record) {
            if !self.seen_ids.insert(id) {
                self.duplicates_skipped += 1;
                debug!(
                    "Skipping duplicate record id {} (total duplicates: {})",
                    id, self.duplicates_skipped
                );
                return Ok(());
            }
        }

        self.records.push(record.clone());
        self.appended += 1;
        self.pending += 1;

        if self.pending >= self.checkpoint_every {
            self.rewrite()?;
        }
        Ok(())
    }

    /// Records appended during this run
    pub fn records_written(&self) -> u64 {
        self.appended
    }

    /// Records in the document, including those loaded on resume
    pub fn total_records(&self) -> u64 {
        self.records.len() as u64
    }

    /// Duplicates skipped during this run
    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }

    /// Whether a record with this id is already in the document
    pub fn contains(&self, id: u64) -> bool {
        self.seen_ids.contains(&id)
    }

    /// Write the document out if any append has not reached disk yet
    pub fn flush(&mut self) -> OutputResult<()> {
        if self.pending > 0 {
            self.rewrite()?;
        }
        Ok(())
    }

    /// Final flush and close.
    ///
    /// Always leaves a readable document behind, even for a run that
    /// appended nothing to a fresh path.
    pub fn close(mut self) -> OutputResult<()> {
        if self.pending > 0 || !self.path.exists() {
            self.rewrite()?;
        }
        info!(
            "Closed artifact {}: {} records ({} appended this run, {} duplicates skipped)",
            self.path.display(),
            self.records.len(),
            self.appended,
            self.duplicates_skipped
        );
        Ok(())
    }

    /// Rewrite the whole document atomically.
    ///
    /// Serializes to a temp file in the target directory, fsyncs, then
    /// renames over the artifact while holding an exclusive lock on the
    /// sibling `.lock` file. A crash at any point leaves either the old or
    /// the new document on disk, never a torn one.
    fn rewrite(&mut self) -> OutputResult<()> {
        let doc = json!({ "results": &self.records });
        let contents = serde_json::to_string_pretty(&doc)
            .map_err(|e| OutputError::Serialization(e.to_string()))?;

        let lock_file = open_lock_file(&self.path)?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| OutputError::Lock(format!("Failed to acquire write lock: {e}")))?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| OutputError::Io(format!("Failed to create temp file: {e}")))?;
        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| OutputError::Io(format!("Failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| OutputError::Io(format!("Failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| OutputError::Io(format!("Failed to sync temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| OutputError::Io(format!("Failed to persist temp file: {e}")))?;

        // Fsync parent directory so the rename itself is durable
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }

        self.pending = 0;
        debug!(
            "Checkpointed {} records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Streaming writer: one JSON object per line, flushed after every append.
///
/// Appends to an existing file, so a restarted run continues where the last
/// one stopped. Each line is independently complete; if the process dies
/// mid-write, only the final line can be torn, and readers discard it.
pub struct JsonlWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    lines_written: u64,
}

impl JsonlWriter {
    /// Open (or create) a line-delimited artifact for appending
    pub fn open<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::Io(format!("Failed to create directory: {e}")))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| OutputError::Io(format!("Failed to open file: {e}")))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            lines_written: 0,
        })
    }

    /// Append one record as a single line and flush it.
    pub fn append(&mut self, record: &Record) -> OutputResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| OutputError::Serialization(e.to_string()))?;

        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| OutputError::Io(format!("Failed to append record: {e}")))?;

        // Flush per record so an interrupt loses at most the line in flight
        self.writer
            .flush()
            .map_err(|e| OutputError::Io(format!("Failed to flush: {e}")))?;

        self.lines_written += 1;
        Ok(())
    }

    /// Lines appended during this run
    pub fn records_written(&self) -> u64 {
        self.lines_written
    }

    /// Flush buffered data to the OS
    pub fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::Io(format!("Failed to flush: {e}")))
    }

    /// Close the writer and sync the file to disk
    pub fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let file = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::Io(format!("Failed to get file handle: {e}")))?;
        file.sync_all()
            .map_err(|e| OutputError::Io(format!("Failed to sync file: {e}")))?;

        info!(
            "Closed artifact {}: {} lines appended this run",
            self.path.display(),
            self.lines_written
        );
        Ok(())
    }
}

fn open_lock_file(path: &Path) -> OutputResult<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path.with_extension("lock"))
        .map_err(|e| OutputError::Lock(format!("Failed to create lock file: {e}")))
}

/// Read an accumulating artifact: `{"results": [...]}` with object entries.
pub(super) fn load_json_document(path: &Path) -> OutputResult<Vec<Record>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| OutputError::Io(format!("Failed to read {}: {e}", path.display())))?;

    let doc: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
        OutputError::Deserialization(format!("{} is not valid JSON: {e}", path.display()))
    })?;

    let serde_json::Value::Object(mut map) = doc else {
        return Err(OutputError::Deserialization(format!(
            "{} is not a JSON object",
            path.display()
        )));
    };
    let Some(serde_json::Value::Array(entries)) = map.remove("results") else {
        return Err(OutputError::Deserialization(format!(
            "{} has no results array",
            path.display()
        )));
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            serde_json::Value::Object(record) => records.push(record),
            _ => {
                return Err(OutputError::Deserialization(format!(
                    "{} results contain a non-object entry",
                    path.display()
                )))
            }
        }
    }
    Ok(records)
}

/// Read a line-delimited artifact.
///
/// A final line that fails to parse is treated as a torn write and
/// discarded with a warning. A bad line anywhere else is corruption and
/// fails the read.
pub(super) fn load_jsonl_lines(path: &Path) -> OutputResult<Vec<Record>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| OutputError::Io(format!("Failed to read {}: {e}", path.display())))?;

    let lines: Vec<&str> = contents.lines().collect();
    let mut records = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                if index == lines.len() - 1 {
                    warn!("Discarding torn final line in {} ({e})", path.display());
                } else {
                    return Err(OutputError::Deserialization(format!(
                        "{} line {} is not a valid record: {e}",
                        path.display(),
                        index + 1
                    )));
                }
            }
        }
    }

    Ok(records)
}
