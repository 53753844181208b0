//! File and folder naming conventions for episode archives.
//!
//! An archive looks like this:
//!
//! ```text
//! 007_episode/
//!     007_001.jpg     page 1 of episode 7
//!     007_002.jpg
//!     tmb_007.jpg     episode thumbnail
//! ```
//!
//! Three numbers are read from names:
//! - the **folder index**: first digit run of the folder name (`7`)
//! - the **file index**: first digit run of the file stem (`7`)
//! - the **page number**: the trailing `_`-delimited digit token of the stem (`1`)
//!
//! A name without the expected digits yields `None`; callers treat that as an
//! unknown index rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Recognized image extensions (lowercase, without the dot).
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

static FIRST_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("invalid digit-run regex"));

static TRAILING_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<head>.*_)?(?P<digits>[0-9]+)$").expect("invalid trailing-token regex")
});

/// Lowercased extension of `path` if it is one of [`SUPPORTED_EXTENSIONS`].
pub fn supported_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Folder index: the first digit run anywhere in the folder name.
pub fn folder_index(folder_name: &str) -> Option<u32> {
    first_digit_run(folder_name)
}

/// File index: the first digit run of the file stem.
pub fn file_index(file_name: &str) -> Option<u32> {
    first_digit_run(stem(file_name))
}

/// Page number: the trailing numeric token of the file stem.
pub fn page_number(file_name: &str) -> Option<u32> {
    let caps = TRAILING_TOKEN.captures(stem(file_name))?;
    caps.name("digits")?.as_str().parse().ok()
}

/// Whether a file name follows the thumbnail convention.
///
/// The prefix comparison ignores ASCII case.
pub fn is_thumbnail(file_name: &str, prefix: &str) -> bool {
    file_name
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Whether two parsed indices disagree.
///
/// An unknown index on either side never counts as a mismatch.
pub fn indices_disagree(folder: Option<u32>, file: Option<u32>) -> bool {
    matches!((folder, file), (Some(a), Some(b)) if a != b)
}

/// The file name with its trailing numeric token zero-padded to `min_digits`.
///
/// Returns `None` when the name has no trailing numeric token or the token is
/// already wide enough. The extension keeps its original case.
pub fn padded_name(file_name: &str, min_digits: usize) -> Option<String> {
    let stem = stem(file_name);
    let caps = TRAILING_TOKEN.captures(stem)?;
    let digits = caps.name("digits")?.as_str();
    if digits.len() >= min_digits {
        return None;
    }

    let head = caps.name("head").map_or("", |m| m.as_str());
    let ext = &file_name[stem.len()..];
    Some(format!("{head}{digits:0>min_digits$}{ext}"))
}

fn stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    }
}

fn first_digit_run(s: &str) -> Option<u32> {
    FIRST_DIGIT_RUN.find(s)?.as_str().parse().ok()
}

/// Language used for episode labels in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

/// Display label for an episode folder.
///
/// Folders whose index could not be parsed fall back to the folder name.
pub fn episode_label(index: Option<u32>, folder_name: &str, locale: Locale) -> String {
    match (index, locale) {
        (Some(n), Locale::En) => format!("Episode {n}"),
        (Some(n), Locale::Ja) => format!("第{n}話"),
        (None, _) => folder_name.to_string(),
    }
}

/// Format a byte count using binary units (`40.0 KB`, `2.0 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let unit = b"KMGTPE"[exp] as char;
    format!("{:.1} {unit}B", bytes as f64 / div as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extension() {
        assert_eq!(
            supported_extension(Path::new("a/007_001.JPG")).as_deref(),
            Some("jpg")
        );
        assert_eq!(
            supported_extension(Path::new("007_001.jpeg")).as_deref(),
            Some("jpeg")
        );
        assert!(supported_extension(Path::new("007_001.webp")).is_none());
        assert!(supported_extension(Path::new("notes.txt")).is_none());
        assert!(supported_extension(Path::new("README")).is_none());
    }

    #[test]
    fn test_folder_index() {
        assert_eq!(folder_index("007_episode"), Some(7));
        assert_eq!(folder_index("episode_12"), Some(12));
        assert_eq!(folder_index("extras"), None);
    }

    #[test]
    fn test_file_index() {
        assert_eq!(file_index("007_001.jpg"), Some(7));
        assert_eq!(file_index("011_001.jpg"), Some(11));
        assert_eq!(file_index("tmb_007.jpg"), Some(7));
        assert_eq!(file_index("cover.png"), None);
    }

    #[test]
    fn test_page_number() {
        assert_eq!(page_number("007_001.jpg"), Some(1));
        assert_eq!(page_number("007_12.png"), Some(12));
        assert_eq!(page_number("042.jpg"), Some(42));
        assert_eq!(page_number("007_cover.jpg"), None);
    }

    #[test]
    fn test_is_thumbnail() {
        assert!(is_thumbnail("tmb_007.jpg", "tmb"));
        assert!(is_thumbnail("TMB_007.jpg", "tmb"));
        assert!(!is_thumbnail("007_tmb.jpg", "tmb"));
        assert!(!is_thumbnail("tm", "tmb"));
    }

    #[test]
    fn test_indices_disagree() {
        assert!(indices_disagree(Some(10), Some(11)));
        assert!(!indices_disagree(Some(7), Some(7)));
        assert!(!indices_disagree(None, Some(7)));
        assert!(!indices_disagree(Some(7), None));
    }

    #[test]
    fn test_padded_name() {
        assert_eq!(padded_name("007_1.jpg", 3).as_deref(), Some("007_001.jpg"));
        assert_eq!(padded_name("007_12.JPG", 3).as_deref(), Some("007_012.JPG"));
        assert_eq!(padded_name("5.png", 3).as_deref(), Some("005.png"));
        assert_eq!(padded_name("007_001.jpg", 3), None);
        assert_eq!(padded_name("007_0001.jpg", 3), None);
        assert_eq!(padded_name("007_cover.jpg", 3), None);
    }

    #[test]
    fn test_padded_name_is_idempotent() {
        let once = padded_name("007_1.jpg", 4).unwrap();
        assert_eq!(once, "007_0001.jpg");
        assert_eq!(padded_name(&once, 4), None);
    }

    #[test]
    fn test_episode_label() {
        assert_eq!(episode_label(Some(7), "007_episode", Locale::En), "Episode 7");
        assert_eq!(episode_label(Some(7), "007_episode", Locale::Ja), "第7話");
        assert_eq!(episode_label(None, "extras", Locale::Ja), "extras");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(40 * 1024), "40.0 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(format_size(1536), "1.5 KB");
    }
}
