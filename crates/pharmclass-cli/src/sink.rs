//! JSON-lines persistence for classification results
//!
//! One object per line: the record identity, every result field, the batch
//! run id and the time the result was written.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pharmclass_classifiers::ResultSink;
use pharmclass_core::{ClassificationResult, ProductRecord, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Flush to disk after this many results
const FLUSH_INTERVAL: usize = 10;

/// One persisted result line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedResult {
    pub run_id: String,
    pub classified_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,

    #[serde(flatten)]
    pub result: ClassificationResult,
}

/// Appends results to a JSON-lines file
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
    run_id: Uuid,
    written: usize,
}

impl JsonlSink {
    /// Open `path` for appending
    pub fn open(path: impl AsRef<Path>, run_id: Uuid) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            run_id,
            written: 0,
        })
    }

    /// Number of results written by this sink
    pub fn written(&self) -> usize {
        self.written
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonlSink {
    fn store(&mut self, record: &ProductRecord, result: &ClassificationResult) -> Result<()> {
        let line = PersistedResult {
            run_id: self.run_id.to_string(),
            classified_at: Utc::now(),
            external_id: record.external_id.clone(),
            manufacturer: record.manufacturer.clone(),
            alternate_name: record.alternate_name.clone(),
            result: result.clone(),
        };

        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;

        if self.written % FLUSH_INTERVAL == 0 {
            self.writer.flush()?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        debug!(path = %self.path.display(), written = self.written, "Flushed results");
        Ok(())
    }
}
