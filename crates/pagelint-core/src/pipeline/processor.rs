//! Pipeline orchestration - wires together all processing stages.
//!
//! ```text
//! Scanner -> Renamer -> Decoder -> Classifier -> reports
//!                                      \-> Resizer -> Persister   (resize runs)
//! ```
//!
//! Every stage is its own task, connected by bounded channels. Each stage
//! returns its own counters; a supervisor task joins them into [`RunStats`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{ConfigError, PipelineResult, Result};
use crate::types::{FileRecord, FolderGroup, FolderReport, RunReport, RunStats};

use super::channel::{bounded_channel, PipelineStage};
use super::classify::{ClassifyStats, Classifier};
use super::decode::ImageDecoder;
use super::persist::{PersistStats, Persister};
use super::rename::Renamer;
use super::resize::{ResizeStats, Resizer};
use super::scan::{validate_root, ScanSummary, Scanner};

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Leave file names alone even when renaming is enabled in config
    pub skip_rename: bool,
    /// Downsample oversized pages and write them back
    pub resize: bool,
}

/// The main processor that orchestrates the full pipeline.
pub struct PageProcessor {
    config: Config,
}

/// A started run.
///
/// Folder reports arrive on `reports` as folders complete. The stages keep
/// running until the whole tree is processed; [`PipelineRun::finish`] waits
/// for them.
pub struct PipelineRun {
    pub reports: mpsc::Receiver<FolderReport>,
    stages: JoinHandle<RunStats>,
}

impl PipelineRun {
    /// Next folder report, or `None` once every folder is classified.
    pub async fn recv(&mut self) -> Option<FolderReport> {
        self.reports.recv().await
    }

    /// Wait for every stage and return the run counters.
    ///
    /// Reports not yet received are discarded.
    pub async fn finish(self) -> RunStats {
        let PipelineRun { reports, stages } = self;
        drop(reports);
        match stages.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!("Pipeline supervisor failed: {e}");
                RunStats::default()
            }
        }
    }
}

impl PageProcessor {
    /// Create a processor; the configuration is validated first.
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn renamer(&self, options: &ProcessOptions) -> Option<Renamer> {
        (self.config.rename.enabled && !options.skip_rename)
            .then(|| Renamer::new(self.config.rename.min_digits))
    }

    /// Start a run over `root`.
    ///
    /// Fails only when `root` cannot be used; everything after that is
    /// reported per file.
    pub fn spawn(&self, root: &Path, options: &ProcessOptions) -> PipelineResult<PipelineRun> {
        validate_root(root)?;

        let config = &self.config;
        let workers = config.processing.parallel_workers;
        let profile = *config.profile();
        tracing::info!(
            "Checking {:?} as {} (max width {}px)",
            root,
            config.processing.content_type,
            profile.max_width
        );
        let start = Instant::now();

        // Scanner
        let (scan_tx, scan_rx) = bounded_channel(&config.pipeline);
        let scanner = Scanner::new(config.naming.clone());
        let root_owned: PathBuf = root.to_path_buf();
        let scan = tokio::task::spawn_blocking(move || scanner.scan_into(&root_owned, &scan_tx));

        // Renamer
        let (renamed_tx, renamed_rx) = bounded_channel(&config.pipeline);
        let rename = tokio::spawn(rename_stage(self.renamer(options), scan_rx, renamed_tx));

        // Decoder
        let (decoded_tx, decoded_rx) = bounded_channel(&config.pipeline);
        let decoder = ImageDecoder::new(workers);
        let decode = tokio::spawn(PipelineStage::new(renamed_rx, decoded_tx).run(
            move |group: FolderGroup<FileRecord>| {
                let decoder = decoder.clone();
                async move { Some(decoder.decode_group(group).await) }
            },
        ));

        // Classifier, plus resize and persist when asked
        let (reports_tx, reports_rx) = bounded_channel(&config.pipeline);
        let classifier = Classifier::new(profile, config.report.locale);

        let (classify, resize, persist) = if options.resize {
            let (resize_tx, resize_rx) = bounded_channel(&config.pipeline);
            let (persist_tx, persist_rx) = bounded_channel(&config.pipeline);
            let resizer = Arc::new(Resizer::new(profile, config.resize.clone()));
            let persister = Arc::new(Persister::new(config.resize.jpeg_quality));

            let classify = tokio::spawn(classifier.run(decoded_rx, reports_tx, Some(resize_tx)));
            let resize = tokio::spawn(resizer.run(resize_rx, persist_tx, workers));
            let persist = tokio::spawn(persister.run(persist_rx, workers));
            (classify, Some(resize), Some(persist))
        } else {
            let classify = tokio::spawn(classifier.run(decoded_rx, reports_tx, None));
            (classify, None, None)
        };

        let stages = tokio::spawn(async move {
            let scan: ScanSummary = joined("scan", scan).await;
            let renamed: usize = joined("rename", rename).await;
            let _decoded: usize = joined("decode", decode).await;
            let classified: ClassifyStats = joined("classify", classify).await;
            let resized: ResizeStats = match resize {
                Some(handle) => joined("resize", handle).await,
                None => ResizeStats::default(),
            };
            let persisted: PersistStats = match persist {
                Some(handle) => joined("persist", handle).await,
                None => PersistStats::default(),
            };

            if scan.aborted {
                tracing::warn!(
                    "Scan stopped early; {} unfinished folder(s) were not checked",
                    scan.incomplete
                );
            }

            let stats = RunStats {
                folders: classified.folders,
                files: classified.files,
                renamed,
                decode_failures: classified.decode_failures,
                resize_candidates: classified.resize_candidates,
                resized: resized.resized,
                best_effort: resized.best_effort,
                persisted: persisted.persisted,
                persist_failures: persisted.failed + resized.failed,
                bytes_written: persisted.bytes_written,
                total_seconds: start.elapsed().as_secs_f64(),
            };
            tracing::info!(
                "Finished {} folder(s), {} file(s) in {:.2}s",
                stats.folders,
                stats.files,
                stats.total_seconds
            );
            stats
        });

        Ok(PipelineRun {
            reports: reports_rx,
            stages,
        })
    }

    /// Run to completion and collect every folder report, sorted by path.
    pub async fn run(&self, root: &Path, options: &ProcessOptions) -> Result<RunReport> {
        let mut run = self.spawn(root, options)?;

        let mut folders = Vec::new();
        while let Some(report) = run.recv().await {
            folders.push(report);
        }
        folders.sort_by(|a, b| a.path.cmp(&b.path));

        let stats = run.finish().await;
        Ok(RunReport { folders, stats })
    }

    /// Only normalize file names under `root`. Blocking.
    ///
    /// Returns the records that were renamed.
    pub fn rename_only(&self, root: &Path) -> Result<Vec<FileRecord>> {
        validate_root(root)?;

        let scanner = Scanner::new(self.config.naming.clone());
        let renamer = Renamer::new(self.config.rename.min_digits);

        let renamed = scanner
            .collect(root)
            .into_iter()
            .flat_map(|group| renamer.rename_group(group).items)
            .filter(|record| record.renamed_from.is_some())
            .collect::<Vec<_>>();

        tracing::info!("Renamed {} file(s) under {:?}", renamed.len(), root);
        Ok(renamed)
    }
}

/// Rename stage. Groups pass through unchanged when `renamer` is `None`.
async fn rename_stage(
    renamer: Option<Renamer>,
    mut input: mpsc::Receiver<FolderGroup<FileRecord>>,
    output: mpsc::Sender<FolderGroup<FileRecord>>,
) -> usize {
    let mut renamed = 0;
    while let Some(group) = input.recv().await {
        let group = match &renamer {
            Some(renamer) => {
                let renamer = renamer.clone();
                let name = group.name.clone();
                match tokio::task::spawn_blocking(move || renamer.rename_group(group)).await {
                    Ok(group) => group,
                    Err(e) => {
                        tracing::error!("Rename task failed for {}: {}", name, e);
                        continue;
                    }
                }
            }
            None => group,
        };
        renamed += group
            .items
            .iter()
            .filter(|r| r.renamed_from.is_some())
            .count();
        if output.send(group).await.is_err() {
            break;
        }
    }
    renamed
}

/// Await a stage, falling back to empty counters if it panicked.
async fn joined<T: Default>(stage: &str, handle: JoinHandle<T>) -> T {
    match handle.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("{} stage failed: {}", stage, e);
            T::default()
        }
    }
}
