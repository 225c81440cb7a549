//! Durable record writers
//!
//! Two formats with different durability trade-offs:
//!
//! - [`JsonAccumulator`]: one JSON document `{"results": [...]}` rewritten
//!   atomically on a checkpoint cadence; readers always see a complete
//!   document
//! - [`JsonlWriter`]: append-only JSON Lines flushed per record; cheap at
//!   large scale, and at most the final line can be lost mid-write
//!
//! [`load_records`] reads either format back, tolerating a truncated final
//! JSONL line.

use std::path::Path;

use crate::config::SaveFormat;
use crate::Record;

pub mod json;

pub use json::{JsonAccumulator, JsonlWriter};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error while reading an artifact back
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// File lock error
    #[error("lock error: {0}")]
    Lock(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Format-dispatched writer for download artifacts
pub enum RecordWriter {
    /// Accumulating single-document writer
    Json(JsonAccumulator),
    /// Streaming line-delimited writer
    Jsonl(JsonlWriter),
}

impl RecordWriter {
    /// Open a writer for `path` in the given format.
    ///
    /// `checkpoint_every` applies to the accumulating format only.
    pub fn open(path: &Path, format: SaveFormat, checkpoint_every: u32) -> OutputResult<Self> {
        match format {
            SaveFormat::Json => Ok(RecordWriter::Json(JsonAccumulator::with_checkpoint_every(
                path,
                checkpoint_every,
            )?)),
            SaveFormat::Jsonl => Ok(RecordWriter::Jsonl(JsonlWriter::open(path)?)),
        }
    }

    /// Append one record
    pub fn append(&mut self, record: &Record) -> OutputResult<()> {
        match self {
            RecordWriter::Json(writer) => writer.append(record),
            RecordWriter::Jsonl(writer) => writer.append(record),
        }
    }

    /// Whether a record with this id is already in the artifact.
    ///
    /// Only the accumulating writer tracks ids; the streaming writer never
    /// deduplicates, so it always answers `false`.
    pub fn already_written(&self, id: u64) -> bool {
        match self {
            RecordWriter::Json(writer) => writer.contains(id),
            RecordWriter::Jsonl(_) => false,
        }
    }

    /// Records appended during this run.
    ///
    /// Duplicates skipped by the accumulating writer on resume are not
    /// counted.
    pub fn records_written(&self) -> u64 {
        match self {
            RecordWriter::Json(writer) => writer.records_written(),
            RecordWriter::Jsonl(writer) => writer.records_written(),
        }
    }

    /// Flush pending records to disk without closing
    pub fn flush(&mut self) -> OutputResult<()> {
        match self {
            RecordWriter::Json(writer) => writer.flush(),
            RecordWriter::Jsonl(writer) => writer.flush(),
        }
    }

    /// Close the writer, making all appended records durable
    pub fn close(self) -> OutputResult<()> {
        match self {
            RecordWriter::Json(writer) => writer.close(),
            RecordWriter::Jsonl(writer) => writer.close(),
        }
    }
}

/// Read an artifact back as records.
///
/// For the accumulating format the whole document must parse. For JSONL a
/// truncated final line (torn write from a dying process) is discarded with
/// a log line; corruption anywhere else is an error.
pub fn load_records(path: &Path, format: SaveFormat) -> OutputResult<Vec<Record>> {
    match format {
        SaveFormat::Json => json::load_json_document(path),
        SaveFormat::Jsonl => json::load_jsonl_lines(path),
    }
}
