//! Core data types for the pagelint pipeline.
//!
//! Records flow through the stages in [`FolderGroup`]s; the classifier turns
//! each group into a serializable [`FolderReport`].

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::naming;

/// One scanned image file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Full path to the file
    pub path: PathBuf,

    /// Name of the immediate parent folder
    pub folder: String,

    /// Base file name, extension included
    pub name: String,

    /// Lowercased extension without the dot
    pub extension: String,

    /// File size in bytes
    pub size: u64,

    /// Index parsed from the parent folder name
    pub folder_index: Option<u32>,

    /// Index parsed from the file name
    pub file_index: Option<u32>,

    /// Follows the thumbnail naming convention
    pub is_thumbnail: bool,

    /// Folder and file indices are both known and differ
    pub is_mismatch: bool,

    /// Base name before a successful rename
    pub renamed_from: Option<String>,
}

impl FileRecord {
    /// Page number from the trailing numeric token of the name.
    pub fn page_number(&self) -> Option<u32> {
        naming::page_number(&self.name)
    }
}

/// A file record with its decoded image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub file: FileRecord,

    /// Full raster; `None` for thumbnails, which are only header-probed
    pub raster: Option<DynamicImage>,

    /// Width in pixels as decoded
    pub width: u32,

    /// Height in pixels as decoded
    pub height: u32,

    /// Detected image format
    pub format: ImageFormat,
}

/// Records of one folder, in file-name order.
#[derive(Debug, Clone)]
pub struct FolderGroup<T> {
    /// Full path of the folder
    pub path: PathBuf,

    /// Folder name (last path component)
    pub name: String,

    /// Sum of the scanned file sizes in bytes
    pub total_size: u64,

    pub items: Vec<T>,

    /// Records dropped by the decoder
    pub dropped: usize,
}

impl<T> FolderGroup<T> {
    /// Create an empty group for a folder path.
    pub fn new(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            path: path.to_path_buf(),
            name,
            total_size: 0,
            items: Vec::new(),
            dropped: 0,
        }
    }

    /// Same folder, different items. Size and drop count carry over.
    pub fn with_items<U>(&self, items: Vec<U>) -> FolderGroup<U> {
        FolderGroup {
            path: self.path.clone(),
            name: self.name.clone(),
            total_size: self.total_size,
            items,
            dropped: self.dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FolderGroup<FileRecord> {
    /// Add a file, keeping the aggregate size current.
    pub fn push(&mut self, record: FileRecord) {
        self.total_size += record.size;
        self.items.push(record);
    }
}

/// Per-file verdicts assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_standard: bool,
    pub is_thumbnail: bool,
    pub is_mismatch: bool,
}

/// An image record paired with its verdict.
#[derive(Debug, Clone)]
pub struct ClassifiedImage {
    pub record: ImageRecord,
    pub verdict: Verdict,
}

/// Folder-level finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    /// Aggregate folder size over the profile limit
    OversizedFolder,
    /// Pages whose width differs from the folder's standard width
    InconsistentWidth,
    /// Pages over the page size limit
    OversizedImage,
    /// Thumbnail over the thumbnail size limit
    OversizedThumbnail,
    /// File index disagrees with the folder index
    FolderFileMismatch,
    /// No thumbnail in the folder
    MissingThumbnail,
    /// Page numbers are not an unbroken run
    NonConsecutiveNumbering,
}

impl Finding {
    /// Every finding, in report order.
    pub const ALL: [Finding; 7] = [
        Finding::OversizedFolder,
        Finding::InconsistentWidth,
        Finding::OversizedImage,
        Finding::OversizedThumbnail,
        Finding::FolderFileMismatch,
        Finding::MissingThumbnail,
        Finding::NonConsecutiveNumbering,
    ];

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Finding::OversizedFolder => "Episodes over the folder size limit",
            Finding::InconsistentWidth => "Episodes with inconsistent page widths",
            Finding::OversizedImage => "Episodes with pages over the size limit",
            Finding::OversizedThumbnail => "Episodes with an oversized thumbnail",
            Finding::FolderFileMismatch => "Episodes whose file names disagree with the folder",
            Finding::MissingThumbnail => "Episodes without a thumbnail",
            Finding::NonConsecutiveNumbering => "Episodes with gaps in page numbering",
        }
    }
}

/// Result record for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// File size in bytes
    pub size: u64,
    /// Detected format ("jpeg", "png", "gif")
    pub format: String,
    pub standard: bool,
    pub mismatch: bool,
    pub thumbnail: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
}

/// Result record for one folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderReport {
    pub path: PathBuf,
    pub folder: String,
    /// Display label ("Episode 7"), or the folder name when unnumbered
    pub episode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_index: Option<u32>,
    /// Aggregate size of the scanned files in bytes
    pub total_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_width: Option<u32>,
    pub findings: BTreeSet<Finding>,
    pub files: Vec<FileReport>,
    /// Files that could not be decoded
    pub decode_failures: usize,
}

impl FolderReport {
    pub fn has(&self, finding: Finding) -> bool {
        self.findings.contains(&finding)
    }

    /// Files flagged non-standard.
    pub fn non_standard_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.standard)
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RunStats {
    /// Folders classified
    pub folders: usize,

    /// Files decoded and classified
    pub files: usize,

    /// Files renamed on disk
    pub renamed: usize,

    /// Files dropped by the decoder
    pub decode_failures: usize,

    /// Pages handed to the resizer
    pub resize_candidates: usize,

    /// Pages that fit the size limit after downsampling
    pub resized: usize,

    /// Pages that never fit and were kept at the smallest scale
    pub best_effort: usize,

    /// Pages written back to disk
    pub persisted: usize,

    /// Pages that failed in the resizer or the persister
    pub persist_failures: usize,

    /// Bytes written by the persister
    pub bytes_written: u64,

    /// Wall-clock duration in seconds
    pub total_seconds: f64,
}

/// All folder reports of a run plus its statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunReport {
    /// Folder reports sorted by folder path
    pub folders: Vec<FolderReport>,
    pub stats: RunStats,
}

impl RunReport {
    /// Episode labels per finding. Findings no folder raised are omitted.
    pub fn findings(&self) -> BTreeMap<Finding, BTreeSet<String>> {
        let mut map: BTreeMap<Finding, BTreeSet<String>> = BTreeMap::new();
        for folder in &self.folders {
            for finding in &folder.findings {
                map.entry(*finding)
                    .or_default()
                    .insert(folder.episode.clone());
            }
        }
        map
    }

    /// Every non-standard file across all folders.
    pub fn non_standard_files(&self) -> impl Iterator<Item = &FileReport> {
        self.folders.iter().flat_map(|f| f.non_standard_files())
    }

    /// Whether no folder raised any finding.
    pub fn is_clean(&self) -> bool {
        self.folders.iter().all(|f| f.findings.is_empty())
    }
}
