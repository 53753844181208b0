//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

use crate::naming::Locale;
use crate::profile::{ContentType, LimitProfile};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel decode/resize/persist workers
    pub parallel_workers: usize,

    /// Content class used to pick the limit profile
    pub content_type: ContentType,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            content_type: ContentType::Comic,
        }
    }
}

/// Pipeline settings for backpressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max messages buffered between pipeline stages
    pub buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { buffer_size: 100 }
    }
}

/// Naming convention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// File-name prefix marking an episode thumbnail
    pub thumbnail_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            thumbnail_prefix: "tmb".to_string(),
        }
    }
}

/// Page-number normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Whether to zero-pad page numbers on disk
    pub enabled: bool,

    /// Minimum digit count of the trailing page number
    pub min_digits: usize,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_digits: 3,
        }
    }
}

/// Size-constrained downsampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// First scale attempted, in percent of the original width
    pub initial_percent: f64,

    /// Scale decrement between attempts, in percentage points
    pub step_percent: f64,

    /// Smallest scale attempted, in percent
    pub floor_percent: f64,

    /// JPEG quality used when re-encoding (1-100)
    pub jpeg_quality: u8,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            initial_percent: 95.0,
            step_percent: 5.0,
            floor_percent: 50.0,
            jpeg_quality: 85,
        }
    }
}

/// Limit profile table, one entry per [`ContentType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub comic: LimitProfile,
    pub magazine_comic: LimitProfile,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            comic: LimitProfile::COMIC,
            magazine_comic: LimitProfile::MAGAZINE_COMIC,
        }
    }
}

impl ProfilesConfig {
    /// Look up the profile for a content type.
    pub fn get(&self, content_type: ContentType) -> &LimitProfile {
        match content_type {
            ContentType::Comic => &self.comic,
            ContentType::MagazineComic => &self.magazine_comic,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ContentType, &LimitProfile)> {
        ContentType::ALL.into_iter().map(move |ct| (ct, self.get(ct)))
    }
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Language of episode labels
    pub locale: Locale,

    /// Default report format ("text", "json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            format: "text".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
