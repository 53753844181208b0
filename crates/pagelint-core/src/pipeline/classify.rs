//! Per-folder classification against the dominant page width and the
//! content-type size limits.

use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc;

use crate::naming::{self, Locale};
use crate::pipeline::decode::format_to_string;
use crate::profile::LimitProfile;
use crate::types::{
    ClassifiedImage, FileReport, Finding, FolderGroup, FolderReport, ImageRecord, Verdict,
};

/// Assigns verdicts and folder findings.
#[derive(Debug, Clone)]
pub struct Classifier {
    profile: LimitProfile,
    locale: Locale,
}

/// Counters returned by [`Classifier::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub folders: usize,
    pub files: usize,
    pub decode_failures: usize,
    pub resize_candidates: usize,
}

/// The most frequent width. Ties go to the smallest width.
pub fn standard_width<I>(widths: I) -> Option<u32>
where
    I: IntoIterator<Item = u32>,
{
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for width in widths {
        *counts.entry(width).or_default() += 1;
    }
    // Ascending key order; strict `>` keeps the first (smallest) on a tie.
    let mut best: Option<(u32, usize)> = None;
    for (width, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((width, count));
        }
    }
    best.map(|(width, _)| width)
}

/// Whether the page numbers form an unbroken run once sorted.
pub fn is_consecutive(pages: &mut [u32]) -> bool {
    pages.sort_unstable();
    pages.windows(2).all(|w| w[1].checked_sub(w[0]) == Some(1))
}

impl Classifier {
    pub fn new(profile: LimitProfile, locale: Locale) -> Self {
        Self { profile, locale }
    }

    /// Classify one complete folder.
    pub fn classify(&self, group: FolderGroup<ImageRecord>) -> (FolderReport, Vec<ClassifiedImage>) {
        let standard = standard_width(
            group
                .items
                .iter()
                .filter(|r| !r.file.is_thumbnail)
                .map(|r| r.width),
        );

        let mut findings = BTreeSet::new();
        let mut pages = Vec::new();
        let mut has_thumbnail = false;
        let mut classified = Vec::with_capacity(group.items.len());

        for record in group.items {
            let file = &record.file;
            let is_standard = if file.is_thumbnail {
                has_thumbnail = true;
                let fits = file.size <= self.profile.thumbnail_size_limit();
                if !fits {
                    findings.insert(Finding::OversizedThumbnail);
                }
                fits
            } else {
                if let Some(page) = file.page_number() {
                    pages.push(page);
                }
                let width_ok = Some(record.width) == standard;
                let size_ok = file.size <= self.profile.image_size_limit();
                if !width_ok {
                    findings.insert(Finding::InconsistentWidth);
                }
                if !size_ok {
                    findings.insert(Finding::OversizedImage);
                }
                width_ok && size_ok
            };
            if file.is_mismatch {
                findings.insert(Finding::FolderFileMismatch);
            }

            let verdict = Verdict {
                is_standard,
                is_thumbnail: file.is_thumbnail,
                is_mismatch: file.is_mismatch,
            };
            classified.push(ClassifiedImage { record, verdict });
        }

        if group.total_size > self.profile.folder_size_limit() {
            findings.insert(Finding::OversizedFolder);
        }
        if !has_thumbnail {
            findings.insert(Finding::MissingThumbnail);
        }
        if !is_consecutive(&mut pages) {
            findings.insert(Finding::NonConsecutiveNumbering);
        }

        let folder_index = naming::folder_index(&group.name);
        let report = FolderReport {
            episode: naming::episode_label(folder_index, &group.name, self.locale),
            path: group.path,
            folder: group.name,
            folder_index,
            total_size: group.total_size,
            standard_width: standard,
            findings,
            files: classified.iter().map(file_report).collect(),
            decode_failures: group.dropped,
        };
        (report, classified)
    }

    /// Whether a classified page should go to the resizer.
    pub fn is_resize_candidate(&self, image: &ClassifiedImage) -> bool {
        let record = &image.record;
        !image.verdict.is_thumbnail
            && record.raster.is_some()
            && self.profile.exceeds(record.width, record.file.size)
    }

    /// Classify groups until the input closes.
    ///
    /// Reports go to `reports`; a closed report receiver is not an error.
    /// With `resize` set, candidates are forwarded and every other raster is
    /// dropped here.
    pub async fn run(
        self,
        mut input: mpsc::Receiver<FolderGroup<ImageRecord>>,
        reports: mpsc::Sender<FolderReport>,
        resize: Option<mpsc::Sender<ImageRecord>>,
    ) -> ClassifyStats {
        let mut stats = ClassifyStats::default();

        while let Some(group) = input.recv().await {
            stats.folders += 1;
            stats.files += group.items.len();
            stats.decode_failures += group.dropped;

            let (report, classified) = self.classify(group);
            tracing::debug!(
                "Classified {}: standard width {:?}, {} finding(s)",
                report.folder,
                report.standard_width,
                report.findings.len()
            );
            let _ = reports.send(report).await;

            let Some(resize_tx) = &resize else {
                continue;
            };
            for image in classified {
                if !self.is_resize_candidate(&image) {
                    continue;
                }
                stats.resize_candidates += 1;
                if resize_tx.send(image.record).await.is_err() {
                    tracing::warn!("Resizer closed; dropping remaining candidates");
                    break;
                }
            }
        }

        stats
    }
}

fn file_report(image: &ClassifiedImage) -> FileReport {
    let record = &image.record;
    FileReport {
        path: record.file.path.clone(),
        name: record.file.name.clone(),
        width: record.width,
        height: record.height,
        size: record.file.size,
        format: format_to_string(record.format),
        standard: image.verdict.is_standard,
        mismatch: image.verdict.is_mismatch,
        thumbnail: image.verdict.is_thumbnail,
        renamed_from: record.file.renamed_from.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileRecord;
    use image::{DynamicImage, ImageFormat};
    use std::path::{Path, PathBuf};

    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    fn image(folder: &str, name: &str, width: u32, height: u32, size: u64) -> ImageRecord {
        let is_thumbnail = naming::is_thumbnail(name, "tmb");
        let folder_index = naming::folder_index(folder);
        let file_index = naming::file_index(name);
        ImageRecord {
            file: FileRecord {
                path: PathBuf::from("/scans").join(folder).join(name),
                folder: folder.to_string(),
                name: name.to_string(),
                extension: "jpg".to_string(),
                size,
                folder_index,
                file_index,
                is_thumbnail,
                is_mismatch: naming::indices_disagree(folder_index, file_index),
                renamed_from: None,
            },
            raster: (!is_thumbnail).then(|| DynamicImage::new_rgb8(1, 1)),
            width,
            height,
            format: ImageFormat::Jpeg,
        }
    }

    fn group(folder: &str, items: Vec<ImageRecord>) -> FolderGroup<ImageRecord> {
        let mut group = FolderGroup::new(&Path::new("/scans").join(folder));
        group.total_size = items.iter().map(|r| r.file.size).sum();
        group.items = items;
        group
    }

    fn comic() -> Classifier {
        Classifier::new(LimitProfile::COMIC, Locale::En)
    }

    fn standard_names(report: &FolderReport) -> Vec<&str> {
        report
            .files
            .iter()
            .filter(|f| f.standard && !f.thumbnail)
            .map(|f| f.name.as_str())
            .collect()
    }

    #[test]
    fn test_episode_folder_end_to_end() {
        let folder = "007_episode";
        let (report, classified) = comic().classify(group(
            folder,
            vec![
                image(folder, "007_001.jpg", 1200, 1800, 2 * MB),
                image(folder, "007_002.jpg", 1200, 1800, 2 * MB),
                image(folder, "007_003.jpg", 800, 1800, 2 * MB),
                image(folder, "tmb_007.jpg", 500, 700, 40 * KB),
            ],
        ));

        assert_eq!(report.standard_width, Some(1200));
        assert_eq!(report.episode, "Episode 7");
        assert_eq!(report.folder_index, Some(7));

        let non_standard: Vec<&str> = report.non_standard_files().map(|f| f.name.as_str()).collect();
        assert_eq!(non_standard, vec!["007_003.jpg"]);

        assert_eq!(
            report.findings,
            BTreeSet::from([Finding::InconsistentWidth])
        );
        assert!(!report.has(Finding::OversizedImage));
        assert!(!report.has(Finding::OversizedThumbnail));
        assert!(!report.has(Finding::FolderFileMismatch));
        assert!(!report.has(Finding::MissingThumbnail));
        assert!(!report.has(Finding::NonConsecutiveNumbering));

        let thumb = classified.iter().find(|c| c.verdict.is_thumbnail).unwrap();
        assert!(thumb.verdict.is_standard);
    }

    #[test]
    fn test_standard_count_matches_majority() {
        let folder = "001_episode";
        let widths = [1200, 1200, 1000, 1200, 1000, 900];
        let items = widths
            .iter()
            .enumerate()
            .map(|(i, w)| image(folder, &format!("001_{:03}.jpg", i + 1), *w, 1800, MB))
            .collect();
        let (report, _) = comic().classify(group(folder, items));

        assert_eq!(report.standard_width, Some(1200));
        assert_eq!(standard_names(&report).len(), 3);
    }

    #[test]
    fn test_oversized_page_is_non_standard_at_standard_width() {
        let folder = "002_episode";
        let (report, _) = comic().classify(group(
            folder,
            vec![
                image(folder, "002_001.jpg", 1200, 1800, MB),
                image(folder, "002_002.jpg", 1200, 1800, 11 * MB),
                image(folder, "tmb_002.jpg", 500, 700, 10 * KB),
            ],
        ));

        assert_eq!(standard_names(&report), vec!["002_001.jpg"]);
        assert!(report.has(Finding::OversizedImage));
        assert!(!report.has(Finding::InconsistentWidth));
    }

    #[test]
    fn test_thumbnail_limits() {
        let folder = "003_episode";
        let (report, classified) = comic().classify(group(
            folder,
            vec![
                image(folder, "003_001.jpg", 1200, 1800, MB),
                image(folder, "tmb_003.jpg", 300, 300, 60 * KB),
            ],
        ));
        assert!(report.has(Finding::OversizedThumbnail));
        // Thumbnail width never takes part in the width vote
        assert_eq!(report.standard_width, Some(1200));
        assert!(!report.has(Finding::InconsistentWidth));
        assert!(!classified[1].verdict.is_standard);
    }

    #[test]
    fn test_missing_thumbnail_and_oversized_folder() {
        let folder = "004_episode";
        let items = (1..=7)
            .map(|i| image(folder, &format!("004_{i:03}.jpg"), 1200, 1800, 9 * MB))
            .collect();
        let (report, _) = comic().classify(group(folder, items));

        assert!(report.has(Finding::MissingThumbnail));
        assert!(report.has(Finding::OversizedFolder));
        assert!(!report.has(Finding::OversizedImage));
    }

    #[test]
    fn test_mismatch_is_surfaced() {
        let folder = "010_episode";
        let (report, classified) = comic().classify(group(
            folder,
            vec![
                image(folder, "011_001.jpg", 1200, 1800, MB),
                image(folder, "tmb_010.jpg", 300, 300, KB),
            ],
        ));
        assert!(classified[0].verdict.is_mismatch);
        assert!(report.files[0].mismatch);
        assert!(report.has(Finding::FolderFileMismatch));
    }

    #[test]
    fn test_numbering_gap() {
        let folder = "005_episode";
        let items = [1, 2, 4, 5]
            .iter()
            .map(|n| image(folder, &format!("005_{n:03}.jpg"), 1200, 1800, MB))
            .collect();
        let (report, _) = comic().classify(group(folder, items));
        assert!(report.has(Finding::NonConsecutiveNumbering));
    }

    #[test]
    fn test_is_consecutive() {
        assert!(!is_consecutive(&mut [1, 2, 4, 5]));
        assert!(is_consecutive(&mut [1, 2, 3, 4]));
        assert!(is_consecutive(&mut [3, 1, 2]));
        assert!(is_consecutive(&mut []));
        assert!(is_consecutive(&mut [9]));
        assert!(!is_consecutive(&mut [1, 1, 2]));
    }

    #[test]
    fn test_standard_width_ties_go_to_smallest() {
        assert_eq!(standard_width([1200, 800, 1200, 800]), Some(800));
        assert_eq!(standard_width([1600, 1200, 1600]), Some(1600));
        assert_eq!(standard_width(std::iter::empty()), None);
    }

    #[test]
    fn test_unnumbered_folder_label() {
        let (report, _) = Classifier::new(LimitProfile::COMIC, Locale::Ja).classify(group(
            "extras",
            vec![image("extras", "cover.jpg", 1200, 1800, MB)],
        ));
        assert_eq!(report.episode, "extras");
        assert_eq!(report.folder_index, None);

        let (report, _) = Classifier::new(LimitProfile::COMIC, Locale::Ja).classify(group(
            "012_episode",
            vec![image("012_episode", "012_001.jpg", 1200, 1800, MB)],
        ));
        assert_eq!(report.episode, "第12話");
    }

    #[tokio::test]
    async fn test_run_forwards_only_candidates() {
        let folder = "006_episode";
        let (in_tx, in_rx) = mpsc::channel(4);
        let (report_tx, mut report_rx) = mpsc::channel(4);
        let (resize_tx, mut resize_rx) = mpsc::channel(4);

        let mut input = group(
            folder,
            vec![
                image(folder, "006_001.jpg", 1200, 1800, MB),
                image(folder, "006_002.jpg", 2000, 1800, MB),
                image(folder, "006_003.jpg", 1200, 1800, 12 * MB),
                image(folder, "tmb_006.jpg", 2000, 2000, 99 * MB),
            ],
        );
        input.dropped = 1;
        in_tx.send(input).await.unwrap();
        drop(in_tx);

        let stats = comic().run(in_rx, report_tx, Some(resize_tx)).await;

        let mut forwarded = Vec::new();
        while let Some(record) = resize_rx.recv().await {
            forwarded.push(record.file.name);
        }
        assert_eq!(forwarded, vec!["006_002.jpg", "006_003.jpg"]);
        assert_eq!(stats.resize_candidates, 2);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.files, 4);
        assert_eq!(stats.decode_failures, 1);

        let report = report_rx.recv().await.unwrap();
        assert_eq!(report.decode_failures, 1);
    }

    #[tokio::test]
    async fn test_run_survives_closed_report_receiver() {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (report_tx, report_rx) = mpsc::channel(1);
        drop(report_rx);

        in_tx
            .send(group("001_ep", vec![image("001_ep", "001_001.jpg", 10, 10, 1)]))
            .await
            .unwrap();
        drop(in_tx);

        let stats = comic().run(in_rx, report_tx, None).await;
        assert_eq!(stats.folders, 1);
    }
}
