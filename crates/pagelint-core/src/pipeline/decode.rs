//! Image decoding with content-based format detection.
//!
//! Pages are fully decoded. Thumbnails only have their header read, since
//! nothing downstream needs their pixels.

use futures_util::stream::{self, StreamExt};
use image::{GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{FileRecord, FolderGroup, ImageRecord};

/// Decodes the files of a folder on the blocking pool.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    workers: usize,
}

impl ImageDecoder {
    /// Create a decoder running at most `workers` decodes at once.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Decode every record of a group, preserving order.
    ///
    /// Records that fail are logged and counted in `dropped`; the group is
    /// always returned, even when every record failed.
    pub async fn decode_group(&self, group: FolderGroup<FileRecord>) -> FolderGroup<ImageRecord> {
        let mut out = group.with_items(Vec::with_capacity(group.len()));

        let results: Vec<_> = stream::iter(group.items)
            .map(|record| tokio::task::spawn_blocking(move || decode_file(record)))
            .buffered(self.workers)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(Ok(image)) => out.items.push(image),
                Ok(Err(e)) => {
                    tracing::warn!("{e}");
                    out.dropped += 1;
                }
                Err(e) => {
                    tracing::error!("Decode task failed in {}: {}", out.name, e);
                    out.dropped += 1;
                }
            }
        }

        tracing::debug!(
            "Decoded {} file(s) in {} ({} dropped)",
            out.items.len(),
            out.name,
            out.dropped
        );
        out
    }
}

/// Decode one file. Blocking.
pub fn decode_file(file: FileRecord) -> PipelineResult<ImageRecord> {
    let bytes = std::fs::read(&file.path).map_err(|e| PipelineError::Decode {
        path: file.path.clone(),
        message: format!("Cannot read file: {}", e),
    })?;

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: file.path.clone(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = match reader.format() {
        Some(f) => f,
        None => detect_from_path(&file.path)?,
    };

    let decode_err = |e: image::ImageError| PipelineError::Decode {
        path: file.path.clone(),
        message: e.to_string(),
    };

    if file.is_thumbnail {
        let (width, height) = reader.into_dimensions().map_err(decode_err)?;
        return Ok(ImageRecord {
            file,
            raster: None,
            width,
            height,
            format,
        });
    }

    let image = reader.decode().map_err(decode_err)?;
    let (width, height) = image.dimensions();
    Ok(ImageRecord {
        file,
        raster: Some(image),
        width,
        height,
        format,
    })
}

fn detect_from_path(path: &Path) -> PipelineResult<ImageFormat> {
    ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    })
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::pipeline::scan::Scanner;
    use image::{DynamicImage, RgbImage};
    use std::fs;

    fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        img.save_with_format(path, format).unwrap();
    }

    fn scan_one(root: &Path) -> FolderGroup<FileRecord> {
        Scanner::new(NamingConfig::default()).collect(root).remove(0)
    }

    #[test]
    fn test_format_to_string() {
        assert_eq!(format_to_string(ImageFormat::Jpeg), "jpeg");
        assert_eq!(format_to_string(ImageFormat::Png), "png");
        assert_eq!(format_to_string(ImageFormat::Gif), "gif");
    }

    #[test]
    fn test_decode_page_keeps_raster() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("001_ep/001_001.jpg"), 64, 96, ImageFormat::Jpeg);

        let record = scan_one(dir.path()).items.remove(0);
        let image = decode_file(record).unwrap();
        assert_eq!((image.width, image.height), (64, 96));
        assert_eq!(image.format, ImageFormat::Jpeg);
        assert!(image.raster.is_some());
    }

    #[test]
    fn test_thumbnail_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("001_ep/tmb_001.png"), 40, 30, ImageFormat::Png);

        let record = scan_one(dir.path()).items.remove(0);
        assert!(record.is_thumbnail);
        let image = decode_file(record).unwrap();
        assert_eq!((image.width, image.height), (40, 30));
        assert!(image.raster.is_none());
    }

    #[test]
    fn test_format_detected_by_content() {
        // PNG bytes behind a .jpg extension
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("001_ep/001_001.jpg"), 8, 8, ImageFormat::Png);

        let record = scan_one(dir.path()).items.remove(0);
        let image = decode_file(record).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_decode_group_drops_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("002_ep");
        write_image(&ep.join("002_001.png"), 10, 10, ImageFormat::Png);
        fs::write(ep.join("002_002.jpg"), b"not an image").unwrap();
        write_image(&ep.join("002_003.png"), 12, 10, ImageFormat::Png);

        let group = scan_one(dir.path());
        let decoded = ImageDecoder::new(2).decode_group(group).await;

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.dropped, 1);
        assert_eq!(decoded.items[0].file.name, "002_001.png");
        assert_eq!(decoded.items[1].file.name, "002_003.png");
    }

    #[tokio::test]
    async fn test_decode_group_all_failed_is_still_returned() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("003_ep");
        fs::create_dir_all(&ep).unwrap();
        fs::write(ep.join("003_001.jpg"), b"junk").unwrap();

        let decoded = ImageDecoder::new(1).decode_group(scan_one(dir.path())).await;
        assert!(decoded.is_empty());
        assert_eq!(decoded.dropped, 1);
        assert_eq!(decoded.name, "003_ep");
    }
}
