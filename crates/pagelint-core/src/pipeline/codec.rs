//! In-memory re-encoding shared by the resizer and the persister.
//!
//! Both stages must produce identical bytes for the same raster, otherwise the
//! size accepted by the resize search would not be the size written to disk.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::PipelineError;

/// Formats the pipeline can write back.
pub fn is_writable(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif
    )
}

/// Encode a raster to `format` in memory.
///
/// JPEG output is 8-bit RGB or grayscale at `jpeg_quality`; GIF output is RGBA.
/// `path` is only used for error context.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
    path: &Path,
) -> Result<Vec<u8>, PipelineError> {
    let encode_err = |e: image::ImageError| PipelineError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    match format {
        ImageFormat::Jpeg => {
            let converted;
            let source = match image {
                DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => image,
                _ => {
                    converted = DynamicImage::ImageRgb8(image.to_rgb8());
                    &converted
                }
            };
            let mut buffer = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            source.write_with_encoder(encoder).map_err(encode_err)?;
            Ok(buffer)
        }
        ImageFormat::Png => {
            let mut buffer = Cursor::new(Vec::new());
            image
                .write_to(&mut buffer, ImageFormat::Png)
                .map_err(encode_err)?;
            Ok(buffer.into_inner())
        }
        ImageFormat::Gif => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            let mut buffer = Cursor::new(Vec::new());
            rgba.write_to(&mut buffer, ImageFormat::Gif)
                .map_err(encode_err)?;
            Ok(buffer.into_inner())
        }
        other => Err(PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: super::decode::format_to_string(other),
        }),
    }
}
