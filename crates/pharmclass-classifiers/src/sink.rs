//! Persistence boundary for finished classifications

use pharmclass_core::{ClassificationResult, ProductRecord, Result};

/// Destination for completed classification results
pub trait ResultSink: Send {
    /// Store `result` against the identity of `record`
    fn store(&mut self, record: &ProductRecord, result: &ClassificationResult) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps results in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub stored: Vec<(ProductRecord, ClassificationResult)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for MemorySink {
    fn store(&mut self, record: &ProductRecord, result: &ClassificationResult) -> Result<()> {
        self.stored.push((record.clone(), result.clone()));
        Ok(())
    }
}
