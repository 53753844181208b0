//! Content-type limit profiles.
//!
//! Every archive is checked against one [`LimitProfile`], selected by a
//! [`ContentType`]. Sizes are stored in KiB to match the way scan budgets are
//! usually quoted; the accessor methods return bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Content class of an archive. Selects the limit profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Regular comic episodes
    #[default]
    Comic,
    /// Magazine-format comic episodes (wider pages, larger budget)
    MagazineComic,
}

impl ContentType {
    /// All known content types, in display order.
    pub const ALL: [ContentType; 2] = [ContentType::Comic, ContentType::MagazineComic];

    /// The key used in config files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ContentType::Comic => "comic",
            ContentType::MagazineComic => "magazine_comic",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    /// Unknown keys are an error; there is no fallback profile.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ct| ct.key() == key)
            .ok_or_else(|| ConfigError::UnknownContentType(s.to_string()))
    }
}

/// Width and byte-size thresholds for one content class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitProfile {
    /// Maximum page width in pixels
    pub max_width: u32,

    /// Maximum page file size in KiB
    pub image_size_kb: u64,

    /// Maximum thumbnail file size in KiB
    pub thumbnail_size_kb: u64,

    /// Maximum aggregate folder size in KiB
    pub folder_size_kb: u64,
}

impl LimitProfile {
    /// Defaults for regular comics.
    pub const COMIC: LimitProfile = LimitProfile {
        max_width: 1600,
        image_size_kb: 10 * 1024,
        thumbnail_size_kb: 50,
        folder_size_kb: 60 * 1024,
    };

    /// Defaults for magazine-format comics.
    pub const MAGAZINE_COMIC: LimitProfile = LimitProfile {
        max_width: 2266,
        image_size_kb: 30 * 1024,
        thumbnail_size_kb: 50,
        folder_size_kb: 150 * 1024,
    };

    /// Page size limit in bytes.
    pub fn image_size_limit(&self) -> u64 {
        self.image_size_kb * 1024
    }

    /// Thumbnail size limit in bytes.
    pub fn thumbnail_size_limit(&self) -> u64 {
        self.thumbnail_size_kb * 1024
    }

    /// Folder aggregate size limit in bytes.
    pub fn folder_size_limit(&self) -> u64 {
        self.folder_size_kb * 1024
    }

    /// Whether a page breaks the width limit or the page size limit.
    pub fn exceeds(&self, width: u32, size: u64) -> bool {
        width > self.max_width || size > self.image_size_limit()
    }
}
