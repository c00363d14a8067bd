//! Append-only CSV persistence for scraped batches.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::ProductRecord;

/// Column order of the persisted dataset.
pub const DATASET_HEADER: [&str; 6] = [
    "timestamp",
    "title",
    "price",
    "original_price",
    "shipping",
    "item_url",
];

/// Appends completed batches to a CSV file, writing the header once.
///
/// Rows already persisted are never rewritten, so callers must only
/// append records whose enrichment has fully completed.
pub struct DatasetWriter {
    path: PathBuf,
}

impl DatasetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one batch, creating the file with a header row when absent.
    pub fn append(&self, records: &[ProductRecord]) -> anyhow::Result<()> {
        let exists = self.path.exists();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !exists {
            writer.write_record(DATASET_HEADER)?;
        }
        for record in records {
            writer.write_record([
                record.captured_at.as_str(),
                record.title.as_str(),
                record.price.as_str(),
                record.original_price.as_str(),
                record.shipping.as_str(),
                record.item_url.as_str(),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }
}
