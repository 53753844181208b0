//! Page-number normalization: zero-pads the trailing numeric token on disk.

use crate::error::PipelineError;
use crate::naming;
use crate::types::{FileRecord, FolderGroup};

/// Renames under-width page numbers to a fixed digit count.
#[derive(Debug, Clone)]
pub struct Renamer {
    min_digits: usize,
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Already normalized, or no numeric token to pad
    Unchanged,
    Renamed,
    /// The rename failed; the record is untouched
    Failed,
}

impl Renamer {
    pub fn new(min_digits: usize) -> Self {
        Self { min_digits }
    }

    /// Normalize one record, renaming the file on disk when needed.
    ///
    /// An existing file at the target name is never overwritten; that counts
    /// as a failure and the original record is returned.
    pub fn rename_record(&self, mut record: FileRecord) -> (FileRecord, RenameOutcome) {
        let Some(new_name) = naming::padded_name(&record.name, self.min_digits) else {
            return (record, RenameOutcome::Unchanged);
        };
        let new_path = record.path.with_file_name(&new_name);

        let result = if new_path.exists() {
            Err("target already exists".to_string())
        } else {
            std::fs::rename(&record.path, &new_path).map_err(|e| e.to_string())
        };

        match result {
            Ok(()) => {
                tracing::debug!("Renamed {} -> {}", record.name, new_name);
                let old_name = std::mem::replace(&mut record.name, new_name);
                record.renamed_from = Some(old_name);
                record.path = new_path;
                (record, RenameOutcome::Renamed)
            }
            Err(message) => {
                let err = PipelineError::Rename {
                    from: record.path.clone(),
                    to: new_path,
                    message,
                };
                tracing::warn!("{err}");
                (record, RenameOutcome::Failed)
            }
        }
    }

    /// Normalize every record of a folder. Blocking.
    ///
    /// Records are re-sorted by their new names, so `_2` and `_10` end up
    /// in page order once both are padded.
    pub fn rename_group(&self, group: FolderGroup<FileRecord>) -> FolderGroup<FileRecord> {
        let mut renamed = 0usize;
        let mut failed = 0usize;
        let mut out = group.with_items(Vec::with_capacity(group.len()));

        for record in group.items {
            let (record, outcome) = self.rename_record(record);
            match outcome {
                RenameOutcome::Renamed => renamed += 1,
                RenameOutcome::Failed => failed += 1,
                RenameOutcome::Unchanged => {}
            }
            out.items.push(record);
        }
        out.items.sort_by(|a, b| a.name.cmp(&b.name));

        if renamed > 0 || failed > 0 {
            tracing::info!(
                "{}: renamed {} file(s), {} failure(s)",
                out.name,
                renamed,
                failed
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::pipeline::scan::Scanner;
    use std::fs;
    use std::path::Path;

    fn scan(root: &Path) -> Vec<FolderGroup<FileRecord>> {
        Scanner::new(NamingConfig::default()).collect(root)
    }

    #[test]
    fn test_pads_short_page_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("007_episode");
        fs::create_dir_all(&ep).unwrap();
        for name in ["007_1.jpg", "007_2.jpg", "007_10.jpg", "007_011.jpg"] {
            fs::write(ep.join(name), b"x").unwrap();
        }

        let group = scan(dir.path()).remove(0);
        let group = Renamer::new(3).rename_group(group);

        let names: Vec<&str> = group.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["007_001.jpg", "007_002.jpg", "007_010.jpg", "007_011.jpg"]
        );
        assert!(ep.join("007_001.jpg").exists());
        assert!(!ep.join("007_1.jpg").exists());
        assert_eq!(group.items[0].renamed_from.as_deref(), Some("007_1.jpg"));
        assert_eq!(group.items[0].path, ep.join("007_001.jpg"));
        assert_eq!(group.items[3].renamed_from, None);
    }

    #[test]
    fn test_second_pass_renames_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("003_episode");
        fs::create_dir_all(&ep).unwrap();
        fs::write(ep.join("003_1.png"), b"x").unwrap();
        fs::write(ep.join("003_2.png"), b"x").unwrap();

        let renamer = Renamer::new(3);
        renamer.rename_group(scan(dir.path()).remove(0));

        let second = scan(dir.path()).remove(0);
        for record in second.items {
            let (_, outcome) = renamer.rename_record(record);
            assert_eq!(outcome, RenameOutcome::Unchanged);
        }
    }

    #[test]
    fn test_existing_target_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("001_episode");
        fs::create_dir_all(&ep).unwrap();
        fs::write(ep.join("001_1.jpg"), b"short").unwrap();
        fs::write(ep.join("001_001.jpg"), b"already here").unwrap();

        let group = scan(dir.path()).remove(0);
        let short = group
            .items
            .into_iter()
            .find(|r| r.name == "001_1.jpg")
            .unwrap();

        let (record, outcome) = Renamer::new(3).rename_record(short);
        assert_eq!(outcome, RenameOutcome::Failed);
        assert_eq!(record.name, "001_1.jpg");
        assert_eq!(record.renamed_from, None);
        assert_eq!(fs::read(ep.join("001_001.jpg")).unwrap(), b"already here");
    }

    #[test]
    fn test_missing_source_fails_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("001_episode");
        fs::create_dir_all(&ep).unwrap();
        fs::write(ep.join("001_1.jpg"), b"x").unwrap();

        let record = scan(dir.path()).remove(0).items.remove(0);
        fs::remove_file(&record.path).unwrap();

        let (record, outcome) = Renamer::new(3).rename_record(record);
        assert_eq!(outcome, RenameOutcome::Failed);
        assert_eq!(record.name, "001_1.jpg");
    }
}
