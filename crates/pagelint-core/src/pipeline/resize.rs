//! Size-constrained downsampling.
//!
//! A page over its limits is scaled down in fixed percentage steps until its
//! re-encoded size fits the page size limit. If no step fits, the smallest
//! scale tried is kept anyway.

use image::imageops::FilterType;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::config::ResizeConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::codec;
use crate::profile::LimitProfile;
use crate::types::ImageRecord;

/// Upper bound on scales tried for one page.
pub const MAX_SCALES: usize = 1000;

/// Downsamples pages until they fit the size limit.
#[derive(Debug, Clone)]
pub struct Resizer {
    profile: LimitProfile,
    config: ResizeConfig,
}

/// One accepted scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeStep {
    pub percent: f64,
    pub width: u32,
    pub height: u32,
    /// Re-encoded size in bytes
    pub encoded_len: u64,
}

/// Result of resizing one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    /// Already within both width and size limits; untouched
    WithinLimits,
    /// Fits the size limit at this scale
    Fitted(ResizeStep),
    /// Never fit; kept at the smallest scale tried
    BestEffort(ResizeStep),
}

/// Counters returned by [`Resizer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeStats {
    pub resized: usize,
    pub best_effort: usize,
    pub failed: usize,
}

impl Resizer {
    pub fn new(profile: LimitProfile, config: ResizeConfig) -> Self {
        Self { profile, config }
    }

    /// Scale percentages to try, largest first.
    ///
    /// Empty when the settings are not finite. Never longer than
    /// [`MAX_SCALES`].
    pub fn scales(&self) -> Vec<f64> {
        let config = &self.config;
        let span = config.initial_percent - config.floor_percent;
        if !span.is_finite() || !config.step_percent.is_finite() {
            return Vec::new();
        }
        if config.step_percent <= 0.0 || span < 0.0 {
            return vec![config.initial_percent];
        }

        // Tolerate float drift right at the floor
        let steps = ((span + 1e-9) / config.step_percent).floor() as usize;
        let count = steps.min(MAX_SCALES - 1) + 1;
        (0..count)
            .map(|i| config.initial_percent - i as f64 * config.step_percent)
            .collect()
    }

    /// Target dimensions at `percent`, aspect ratio kept. Never zero.
    pub fn scaled_dimensions(width: u32, height: u32, percent: f64) -> (u32, u32) {
        let new_width = ((f64::from(width) * percent / 100.0).floor() as u32).max(1);
        let new_height =
            ((f64::from(height) * f64::from(new_width) / f64::from(width)).round() as u32).max(1);
        (new_width, new_height)
    }

    /// Resize one page in place. Blocking.
    ///
    /// On `Fitted` and `BestEffort` the raster is replaced. The recorded
    /// width and height keep their decoded values.
    pub fn resize(&self, record: &mut ImageRecord) -> PipelineResult<ResizeOutcome> {
        if !self.profile.exceeds(record.width, record.file.size) {
            return Ok(ResizeOutcome::WithinLimits);
        }
        let Some(raster) = record.raster.as_ref() else {
            return Err(PipelineError::Decode {
                path: record.file.path.clone(),
                message: "raster not loaded".to_string(),
            });
        };

        let limit = self.profile.image_size_limit();
        let mut smallest = None;

        for percent in self.scales() {
            let (width, height) = Self::scaled_dimensions(record.width, record.height, percent);
            let scaled = raster.resize_exact(width, height, FilterType::Triangle);
            let encoded = codec::encode(
                &scaled,
                record.format,
                self.config.jpeg_quality,
                &record.file.path,
            )?;

            let step = ResizeStep {
                percent,
                width,
                height,
                encoded_len: encoded.len() as u64,
            };
            tracing::trace!(
                "{}: {}% -> {}x{}, {} bytes",
                record.file.name,
                percent,
                width,
                height,
                step.encoded_len
            );

            if step.encoded_len <= limit {
                record.raster = Some(scaled);
                return Ok(ResizeOutcome::Fitted(step));
            }
            smallest = Some((step, scaled));
        }

        match smallest {
            Some((step, scaled)) => {
                record.raster = Some(scaled);
                Ok(ResizeOutcome::BestEffort(step))
            }
            None => Ok(ResizeOutcome::WithinLimits),
        }
    }

    /// Resize candidates until the input closes, `workers` at a time.
    ///
    /// Pages with a new raster are sent to `output`; unchanged and failed
    /// pages stop here.
    pub async fn run(
        self: Arc<Self>,
        mut input: mpsc::Receiver<ImageRecord>,
        output: mpsc::Sender<ImageRecord>,
        workers: usize,
    ) -> ResizeStats {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::new();

        while let Some(record) = input.recv().await {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Resize semaphore closed unexpectedly; stopping");
                break;
            };
            let resizer = self.clone();
            let output = output.clone();

            // The permit is held until the page is handed on, so a full
            // output queue stops intake here.
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let joined = tokio::task::spawn_blocking(move || {
                    let mut record = record;
                    let outcome = resizer.resize(&mut record);
                    (record, outcome)
                })
                .await;

                let (record, outcome) = match joined {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::error!("Resize task panicked: {e}");
                        return None;
                    }
                };
                match outcome {
                    Ok(ResizeOutcome::WithinLimits) => Some(ResizeOutcome::WithinLimits),
                    Ok(outcome) => {
                        if let ResizeOutcome::BestEffort(step) = outcome {
                            tracing::warn!(
                                "{:?} still {} bytes at {}%; keeping smallest scale",
                                record.file.path,
                                step.encoded_len,
                                step.percent
                            );
                        }
                        let _ = output.send(record).await;
                        Some(outcome)
                    }
                    Err(e) => {
                        tracing::warn!("{e}");
                        None
                    }
                }
            }));
        }
        drop(output);

        let mut stats = ResizeStats::default();
        for handle in handles {
            match handle.await {
                Ok(Some(ResizeOutcome::Fitted(_))) => stats.resized += 1,
                Ok(Some(ResizeOutcome::BestEffort(_))) => stats.best_effort += 1,
                Ok(Some(ResizeOutcome::WithinLimits)) => {}
                Ok(None) => stats.failed += 1,
                Err(e) => {
                    tracing::error!("Resize task failed: {e}");
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}
