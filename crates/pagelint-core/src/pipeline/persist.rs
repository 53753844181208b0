//! Writing resized rasters back over their source files.
//!
//! Each file is encoded fully in memory, written to a temporary file in the
//! same directory and renamed over the original. A failure at any step leaves
//! the original untouched.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, Semaphore};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::codec;
use crate::pipeline::decode::format_to_string;
use crate::types::ImageRecord;

/// Overwrites source files with their current raster.
#[derive(Debug, Clone)]
pub struct Persister {
    jpeg_quality: u8,
}

/// Counters returned by [`Persister::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub persisted: usize,
    pub failed: usize,
    /// Total bytes written
    pub bytes_written: u64,
}

impl Persister {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    /// Replace the file at `record.file.path`. Blocking.
    ///
    /// Returns the number of bytes written.
    pub fn persist(&self, record: &ImageRecord) -> PipelineResult<u64> {
        let path = &record.file.path;
        if !codec::is_writable(record.format) {
            return Err(PipelineError::UnsupportedFormat {
                path: path.clone(),
                format: format_to_string(record.format),
            });
        }
        let Some(raster) = record.raster.as_ref() else {
            return Err(persist_err(path, "raster not loaded"));
        };

        let bytes = codec::encode(raster, record.format, self.jpeg_quality, path)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| persist_err(path, e))?;
        if let Ok(meta) = std::fs::metadata(path) {
            if let Err(e) = tmp.as_file().set_permissions(meta.permissions()) {
                tracing::debug!("Cannot copy permissions to {:?}: {}", tmp.path(), e);
            }
        }
        tmp.write_all(&bytes).map_err(|e| persist_err(path, e))?;
        tmp.as_file().sync_all().map_err(|e| persist_err(path, e))?;
        tmp.persist(path).map_err(|e| persist_err(path, e.error))?;

        tracing::debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(bytes.len() as u64)
    }

    /// Persist records until the input closes, `workers` writes at a time.
    ///
    /// Every write task is joined before this returns.
    pub async fn run(
        self: Arc<Self>,
        mut input: mpsc::Receiver<ImageRecord>,
        workers: usize,
    ) -> PersistStats {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::new();

        while let Some(record) = input.recv().await {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Persist semaphore closed unexpectedly; stopping");
                break;
            };
            let persister = self.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                let result = persister.persist(&record);
                drop(permit);
                result
            }));
        }

        let mut stats = PersistStats::default();
        for handle in handles {
            match handle.await {
                Ok(Ok(written)) => {
                    stats.persisted += 1;
                    stats.bytes_written += written;
                }
                Ok(Err(e)) => {
                    tracing::warn!("{e}");
                    stats.failed += 1;
                }
                Err(e) => {
                    tracing::error!("Persist task panicked: {e}");
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}

fn persist_err(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Persist {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
