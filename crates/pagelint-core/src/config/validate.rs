//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Smallest accepted decrement between resize attempts, in percentage points.
const MIN_STEP_PERCENT: f64 = 0.1;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.naming.thumbnail_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "naming.thumbnail_prefix must not be empty".into(),
            ));
        }
        if !(1..=9).contains(&self.rename.min_digits) {
            return Err(ConfigError::ValidationError(
                "rename.min_digits must be between 1 and 9".into(),
            ));
        }

        let resize = &self.resize;
        for (key, value) in [
            ("initial_percent", resize.initial_percent),
            ("step_percent", resize.step_percent),
            ("floor_percent", resize.floor_percent),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "resize.{key} must be a finite number"
                )));
            }
        }
        if resize.step_percent < MIN_STEP_PERCENT {
            return Err(ConfigError::ValidationError(format!(
                "resize.step_percent must be >= {MIN_STEP_PERCENT}"
            )));
        }
        if resize.floor_percent <= 0.0 {
            return Err(ConfigError::ValidationError(
                "resize.floor_percent must be > 0".into(),
            ));
        }
        if resize.initial_percent > 100.0 || resize.initial_percent < resize.floor_percent {
            return Err(ConfigError::ValidationError(
                "resize.initial_percent must be between resize.floor_percent and 100".into(),
            ));
        }
        if !(1..=100).contains(&resize.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "resize.jpeg_quality must be between 1 and 100".into(),
            ));
        }

        for (content_type, profile) in self.profiles.iter() {
            if profile.max_width == 0
                || profile.image_size_kb == 0
                || profile.thumbnail_size_kb == 0
                || profile.folder_size_kb == 0
            {
                return Err(ConfigError::ValidationError(format!(
                    "profiles.{content_type} limits must all be > 0"
                )));
            }
        }
        Ok(())
    }
}
