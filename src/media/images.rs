//! Image resize, compression and format conversion.

use crate::error::{MediabotError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_QUALITY: u8 = 85;

/// Image formats the converter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageTarget {
    #[default]
    Jpeg,
    Png,
    Webp,
    Bmp,
    Gif,
    Tiff,
}

impl ImageTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(ImageTarget::Jpeg),
            "png" => Some(ImageTarget::Png),
            "webp" => Some(ImageTarget::Webp),
            "bmp" => Some(ImageTarget::Bmp),
            "gif" => Some(ImageTarget::Gif),
            "tiff" | "tif" => Some(ImageTarget::Tiff),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageTarget::Jpeg => "jpeg",
            ImageTarget::Png => "png",
            ImageTarget::Webp => "webp",
            ImageTarget::Bmp => "bmp",
            ImageTarget::Gif => "gif",
            ImageTarget::Tiff => "tiff",
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            ImageTarget::Jpeg => ImageFormat::Jpeg,
            ImageTarget::Png => ImageFormat::Png,
            ImageTarget::Webp => ImageFormat::WebP,
            ImageTarget::Bmp => ImageFormat::Bmp,
            ImageTarget::Gif => ImageFormat::Gif,
            ImageTarget::Tiff => ImageFormat::Tiff,
        }
    }
}

/// A validated image edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOperation {
    Resize { width: u32, height: u32 },
    /// Re-encode as JPEG at `quality` (1-100).
    Compress { quality: u8 },
    Convert { target: ImageTarget },
}

/// Loose options as they arrive from a tool call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub format: Option<String>,
}

impl ImageOperation {
    /// Validate an operation name plus its options.
    ///
    /// Missing sizes default to 800x600, missing quality to 85 and a missing
    /// format to JPEG. Out-of-range values are rejected.
    pub fn from_options(operation: &str, options: &ImageOptions) -> Result<Self> {
        match operation.trim().to_lowercase().as_str() {
            "resize" => {
                let width = options.width.unwrap_or(DEFAULT_WIDTH);
                let height = options.height.unwrap_or(DEFAULT_HEIGHT);
                if width == 0 || height == 0 {
                    return Err(MediabotError::InvalidInput(
                        "Width and height must be at least 1".to_string(),
                    ));
                }
                Ok(ImageOperation::Resize { width, height })
            }
            "compress" => {
                let quality = options.quality.unwrap_or(DEFAULT_QUALITY as u32);
                if !(1..=100).contains(&quality) {
                    return Err(MediabotError::InvalidInput(format!(
                        "Quality must be between 1 and 100, got {}",
                        quality
                    )));
                }
                Ok(ImageOperation::Compress {
                    quality: quality as u8,
                })
            }
            "convert" => {
                let target = match options.format.as_deref() {
                    None => ImageTarget::default(),
                    Some(f) => ImageTarget::parse(f)
                        .ok_or_else(|| MediabotError::UnsupportedFormat(f.to_string()))?,
                };
                Ok(ImageOperation::Convert { target })
            }
            other => Err(MediabotError::InvalidInput(format!(
                "Unknown image operation: {}",
                other
            ))),
        }
    }

    /// Where the result of this operation on `source` is written.
    pub fn output_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        let name = source
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");

        match self {
            ImageOperation::Resize { .. } => output_dir.join(format!("processed_{}", name)),
            ImageOperation::Compress { .. } => output_dir.join(format!("processed_{}.jpg", stem)),
            ImageOperation::Convert { target } => {
                output_dir.join(format!("{}.{}", stem, target.extension()))
            }
        }
    }
}

/// Apply `operation` to the image at `source`, writing into `output_dir`.
///
/// Decoding and encoding run on the blocking pool.
#[instrument(skip(output_dir))]
pub async fn process(source: &Path, operation: ImageOperation, output_dir: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(MediabotError::FileNotFound(source.display().to_string()));
    }
    std::fs::create_dir_all(output_dir)?;

    let dest = operation.output_path(source, output_dir);
    let source = source.to_path_buf();
    let out = dest.clone();

    tokio::task::spawn_blocking(move || apply(&source, operation, &out))
        .await
        .map_err(|e| MediabotError::external("Image processing", e.to_string()))??;

    info!("Wrote {:?}", dest);
    Ok(dest)
}

fn apply(source: &Path, operation: ImageOperation, dest: &Path) -> Result<()> {
    let img = image::open(source)?;

    match operation {
        ImageOperation::Resize { width, height } => {
            let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
            resized.save(dest)?;
        }
        ImageOperation::Compress { quality } => write_jpeg(&img, dest, quality)?,
        ImageOperation::Convert { target } => match target {
            // JPEG has no alpha channel
            ImageTarget::Jpeg => write_jpeg(&img, dest, 90)?,
            other => img.save_with_format(dest, other.format())?,
        },
    }
    Ok(())
}

fn write_jpeg(img: &DynamicImage, dest: &Path, quality: u8) -> Result<()> {
    let mut writer = BufWriter::new(File::create(dest)?);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    Ok(())
}
