//! Directory scanning: finds episode images and groups them by folder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};

use crate::config::NamingConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::naming;
use crate::types::{FileRecord, FolderGroup};

/// Walks a root directory and emits one [`FolderGroup`] per parent folder.
pub struct Scanner {
    naming: NamingConfig,
}

/// Totals of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub folders: usize,
    pub files: usize,
    /// Traversal stopped on an I/O error
    pub aborted: bool,
    /// Folders left unfinished by an aborted traversal and not emitted
    pub incomplete: usize,
}

/// Check that a run can start from `root`.
pub fn validate_root(root: &Path) -> PipelineResult<()> {
    let meta = match std::fs::metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::RootNotFound(root.to_path_buf()));
        }
        Err(e) => {
            return Err(PipelineError::RootUnreadable {
                path: root.to_path_buf(),
                message: e.to_string(),
            });
        }
    };
    if !meta.is_dir() {
        return Err(PipelineError::RootNotDirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root).map_err(|e| PipelineError::RootUnreadable {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

impl Scanner {
    /// Create a new scanner.
    pub fn new(naming: NamingConfig) -> Self {
        Self { naming }
    }

    /// Scan `root` and send each folder group down `tx`.
    ///
    /// Blocking; run it on the blocking pool. Stops early if the receiver is
    /// dropped.
    pub fn scan_into(&self, root: &Path, tx: &mpsc::Sender<FolderGroup<FileRecord>>) -> ScanSummary {
        self.walk(root, |group| tx.blocking_send(group).is_ok())
    }

    /// Scan `root` and collect every folder group.
    pub fn collect(&self, root: &Path) -> Vec<FolderGroup<FileRecord>> {
        let mut groups = Vec::new();
        self.walk(root, |group| {
            groups.push(group);
            true
        });
        groups
    }

    /// Walk the tree contents-first, so a directory is yielded after
    /// everything inside it. That is the point where its group is complete.
    fn walk<F>(&self, root: &Path, mut emit: F) -> ScanSummary
    where
        F: FnMut(FolderGroup<FileRecord>) -> bool,
    {
        let mut pending: BTreeMap<PathBuf, FolderGroup<FileRecord>> = BTreeMap::new();
        let mut summary = ScanSummary::default();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .contents_first(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let err = PipelineError::Traversal {
                        path: e.path().unwrap_or(root).to_path_buf(),
                        message: e.to_string(),
                    };
                    tracing::error!("{err}");
                    summary.aborted = true;
                    break;
                }
            };

            if entry.file_type().is_dir() {
                if let Some(group) = pending.remove(entry.path()) {
                    summary.folders += 1;
                    if !emit(group) {
                        return summary;
                    }
                }
                continue;
            }

            if let Some(record) = self.file_record(&entry) {
                let Some(parent) = entry.path().parent() else {
                    continue;
                };
                summary.files += 1;
                pending
                    .entry(parent.to_path_buf())
                    .or_insert_with(|| FolderGroup::new(parent))
                    .push(record);
            }
        }

        // Leftovers only exist when the walk stopped early. Their directory
        // entry was never reached, so they may be missing siblings.
        for (path, group) in pending {
            tracing::warn!(
                "Skipping {:?}: traversal stopped after {} file(s)",
                path,
                group.len()
            );
            summary.incomplete += 1;
        }

        tracing::debug!(
            "Scanned {} file(s) in {} folder(s) under {:?}",
            summary.files,
            summary.folders,
            root
        );
        summary
    }

    /// Build a record for a supported image file, or `None` to skip it.
    fn file_record(&self, entry: &DirEntry) -> Option<FileRecord> {
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.path();
        let extension = naming::supported_extension(path)?;
        let name = path.file_name()?.to_str()?.to_string();
        let folder = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Cannot read metadata for {:?}: {}", path, e);
                return None;
            }
        };

        let folder_index = naming::folder_index(&folder);
        let file_index = naming::file_index(&name);
        let is_thumbnail = naming::is_thumbnail(&name, &self.naming.thumbnail_prefix);
        let is_mismatch = naming::indices_disagree(folder_index, file_index);

        tracing::trace!(
            "{}/{}: folder index {:?}, file index {:?}",
            folder,
            name,
            folder_index,
            file_index
        );

        Some(FileRecord {
            path: path.to_path_buf(),
            folder,
            name,
            extension,
            size,
            folder_index,
            file_index,
            is_thumbnail,
            is_mismatch,
            renamed_from: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, bytes: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    fn scanner() -> Scanner {
        Scanner::new(NamingConfig::default())
    }

    #[test]
    fn test_groups_by_parent_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("007_episode/007_002.jpg"), 20);
        touch(&root.join("007_episode/007_001.jpg"), 10);
        touch(&root.join("007_episode/tmb_007.JPG"), 5);
        touch(&root.join("008_episode/008_001.png"), 30);
        touch(&root.join("008_episode/notes.txt"), 99);

        let groups = scanner().collect(root);
        assert_eq!(groups.len(), 2);

        let ep7 = groups.iter().find(|g| g.name == "007_episode").unwrap();
        let names: Vec<&str> = ep7.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["007_001.jpg", "007_002.jpg", "tmb_007.JPG"]);
        assert_eq!(ep7.total_size, 35);
        assert!(ep7.items[2].is_thumbnail);
        assert_eq!(ep7.items[2].extension, "jpg");

        let ep8 = groups.iter().find(|g| g.name == "008_episode").unwrap();
        assert_eq!(ep8.len(), 1);
        assert_eq!(ep8.total_size, 30);
    }

    #[test]
    fn test_mismatch_flag() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("010_episode/011_001.jpg"), 1);
        touch(&dir.path().join("010_episode/010_002.jpg"), 1);

        let groups = scanner().collect(dir.path());
        let items = &groups[0].items;
        assert!(items[0].is_mismatch);
        assert_eq!(items[0].folder_index, Some(10));
        assert_eq!(items[0].file_index, Some(11));
        assert!(!items[1].is_mismatch);
    }

    #[test]
    fn test_unknown_index_is_not_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("extras/007_001.jpg"), 1);

        let groups = scanner().collect(dir.path());
        let record = &groups[0].items[0];
        assert_eq!(record.folder_index, None);
        assert!(!record.is_mismatch);
    }

    #[test]
    fn test_files_in_root_form_their_own_group() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("001_001.gif"), 1);

        let groups = scanner().collect(dir.path());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].path, dir.path());
    }

    #[tokio::test]
    async fn test_scan_into_channel() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("001_a/001_001.jpg"), 1);
        touch(&dir.path().join("002_b/002_001.jpg"), 1);

        let (tx, mut rx) = mpsc::channel(1);
        let root = dir.path().to_path_buf();
        let handle = tokio::task::spawn_blocking(move || scanner().scan_into(&root, &tx));

        let mut names = Vec::new();
        while let Some(group) = rx.recv().await {
            names.push(group.name);
        }
        let summary = handle.await.unwrap();

        assert_eq!(names, vec!["001_a", "002_b"]);
        assert_eq!(summary.folders, 2);
        assert_eq!(summary.files, 2);
        assert!(!summary.aborted);
    }

    #[test]
    fn test_validate_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_root(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        assert!(matches!(
            validate_root(&missing),
            Err(PipelineError::RootNotFound(_))
        ));

        let file = dir.path().join("file.jpg");
        touch(&file, 1);
        assert!(matches!(
            validate_root(&file),
            Err(PipelineError::RootNotDirectory(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_traversal_error_skips_unfinished_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("000_done/000_001.jpg"), 1);
        let ep = root.join("001_episode");
        touch(&ep.join("001_001.jpg"), 1);
        touch(&ep.join("001_003.jpg"), 1);
        touch(&ep.join("001_004.jpg"), 1);
        // Sorts between the pages and points back at its own folder
        std::os::unix::fs::symlink(&ep, ep.join("001_002_loop")).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let root_owned = root.to_path_buf();
        let handle = tokio::task::spawn_blocking(move || scanner().scan_into(&root_owned, &tx));

        let mut names = Vec::new();
        while let Some(group) = rx.recv().await {
            names.push(group.name);
        }
        let summary = handle.await.unwrap();

        assert!(summary.aborted);
        assert_eq!(names, vec!["000_done"]);
        assert_eq!(summary.folders, 1);
        assert_eq!(summary.incomplete, 1);
    }
}
