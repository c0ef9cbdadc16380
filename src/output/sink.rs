//! Append-only text file sink
//!
//! Every source writes into its own directory. Records for the same output
//! file are serialized through a per-file async lock and land with a single
//! write, so concurrent workers never interleave; different files never
//! contend. The directory is created once, on the first append.

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::output::OutputUnit;
use crate::sources::ContentRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};

/// File sink rooted at one source's output directory
pub struct Sink {
    output_dir: PathBuf,
    dir_ready: OnceCell<()>,
    file_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Sink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dir_ready: OnceCell::new(),
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Full path of the file `unit` is appended to
    pub fn path_for(&self, unit: &OutputUnit) -> PathBuf {
        self.output_dir.join(unit.file_name())
    }

    /// Creates the output directory if needed; later calls are no-ops
    pub async fn ensure_dir(&self) -> OutputResult<()> {
        self.dir_ready
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.output_dir).await?;
                tracing::debug!("Output directory ready: {}", self.output_dir.display());
                Ok::<(), OutputError>(())
            })
            .await?;
        Ok(())
    }

    async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.file_locks.lock().await;
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Forgets the lock of `path` once no other append holds or awaits it
    async fn release(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.file_locks.lock().await;
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(path);
        }
    }

    async fn write_locked(&self, path: &Path, buffer: &str) -> OutputResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| OutputError::Write(format!("{}: {}", path.display(), e)))?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for Sink {
    async fn append(&self, unit: &OutputUnit, record: &ContentRecord) -> OutputResult<()> {
        if record.is_empty() {
            return Err(OutputError::EmptyRecord);
        }

        let buffer = format_record(record);
        self.ensure_dir().await?;

        let path = self.path_for(unit);
        let lock = self.lock_for(&path).await;
        let written = {
            let _guard = lock.lock().await;
            self.write_locked(&path, &buffer).await
        };
        self.release(&path, lock).await;

        written?;
        tracing::debug!("Appended {} bytes to {}", buffer.len(), path.display());
        Ok(())
    }
}

/// Formats a record as one block of text
///
/// Layout, each part optional except the body:
///
/// ```text
/// <published> <byline>
/// URL: <url>
/// <title>
/// <body>
/// <blank line>
/// ```
pub fn format_record(record: &ContentRecord) -> String {
    let mut buffer = String::new();

    let metadata: Vec<&str> = [record.published.as_deref(), record.byline.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !metadata.is_empty() {
        buffer.push_str(&metadata.join(" "));
        buffer.push('\n');
    }

    if let Some(url) = &record.url {
        buffer.push_str(&format!("URL: {}\n", url));
    }

    if let Some(title) = &record.title {
        buffer.push_str(title);
        buffer.push('\n');
    }

    buffer.push_str(record.body.trim_end());
    buffer.push_str("\n\n");
    buffer
}
