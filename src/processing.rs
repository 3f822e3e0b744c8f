use crate::atomic::{copy_once, replace_atomically};
use crate::config::PipelineOptions;
use crate::constants::{
    BACKUP_PREFIX, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, OXIPNG_PRESET, ZOPFLI_ITERATIONS,
};
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::ledger::Dimensions;
use crate::metadata::{embed_jpeg_exif, probe, ImageMetadata, ProbedImage};
use crate::utils::{backup_path, reduction_percent};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageEncoder};
use oxipng::{Deflaters, Options};
use std::fs;
use std::num::NonZeroU8;
use std::path::Path;

/// What one successful transform did.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    pub format: ImageKind,
    pub original_size: u64,
    pub compressed_size: u64,
    pub original_dimensions: Dimensions,
    pub dimensions: Dimensions,
    pub quality: u8,
    pub backup_created: bool,
}

impl TransformReport {
    /// `(1 - new/old) * 100`; negative when the file grew.
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.compressed_size)
    }

    pub fn was_resized(&self) -> bool {
        self.original_dimensions != self.dimensions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file disappeared between discovery and transform
    Vanished,
}

#[derive(Debug)]
pub enum TransformOutcome {
    Transformed(TransformReport),
    Skipped(SkipReason),
    /// The file on disk is exactly as it was before the attempt.
    Failed(CompressionError),
}

/// Size that keeps both sides within `max_dimension`.
///
/// Images already within bounds keep their size; larger ones are scaled
/// uniformly so the longer side equals `max_dimension`. Never enlarges.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let scaled = |side: u32, longest: u32| -> u32 {
        let value = (side as f64 / longest as f64) * max_dimension as f64;
        (value.round() as u32).max(1)
    };

    if width > height {
        (max_dimension, scaled(height, width))
    } else {
        (scaled(width, height), max_dimension)
    }
}

/// Backup, probe, resize, re-encode and atomically replace one stale file.
///
/// Failures are returned as [`TransformOutcome::Failed`]; the backup is
/// written before anything destructive and the original is only replaced by
/// a rename, so a failed attempt leaves the file untouched.
pub fn transform(path: &Path, options: &PipelineOptions) -> TransformOutcome {
    if let Ok(false) = path.try_exists() {
        return TransformOutcome::Skipped(SkipReason::Vanished);
    }

    match try_transform(path, options) {
        Ok(report) => TransformOutcome::Transformed(report),
        Err(e) => TransformOutcome::Failed(e),
    }
}

fn try_transform(path: &Path, options: &PipelineOptions) -> Result<TransformReport> {
    let backup = backup_path(path);
    let backup_created = copy_once(path, &backup)?;
    if backup_created {
        crate::info!(
            "  {} Backup created: {}",
            BACKUP_PREFIX,
            backup
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
    }

    let permissions = fs::metadata(path)?.permissions();
    let bytes = fs::read(path)?;
    let original_size = bytes.len() as u64;

    let ProbedImage {
        kind,
        mut image,
        metadata,
    } = probe(&bytes)?;

    let carried_exif = if kind.carries_exif() {
        metadata.embeddable_exif()
    } else {
        None
    };
    // Without EXIF in the output the pixels themselves must be upright.
    if carried_exif.is_none() {
        image.apply_orientation(metadata.orientation_or_identity());
    }

    let original_dimensions = Dimensions::new(image.width(), image.height());
    let (width, height) = target_dimensions(
        original_dimensions.width,
        original_dimensions.height,
        options.max_dimension,
    );
    if (width, height) != (original_dimensions.width, original_dimensions.height) {
        crate::verbose!(
            "Resizing {} -> {}x{}",
            original_dimensions,
            width,
            height
        );
        image = image.resize_exact(width, height, FilterType::Lanczos3);
    }

    let encoded = encode(&image, kind, &metadata, carried_exif, options.quality)?;
    replace_atomically(path, &encoded, Some(permissions))?;

    Ok(TransformReport {
        format: kind,
        original_size,
        compressed_size: encoded.len() as u64,
        original_dimensions,
        dimensions: Dimensions::new(width, height),
        quality: options.quality,
        backup_created,
    })
}

/// Encodes `image` into `kind`'s container. JPEG and WebP are lossy at
/// `quality`; PNG stays lossless and `quality` only picks the oxipng effort.
/// ICC is carried for JPEG and PNG, EXIF for JPEG only.
pub fn encode(
    image: &DynamicImage,
    kind: ImageKind,
    metadata: &ImageMetadata,
    exif: Option<&[u8]>,
    quality: u8,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match kind {
        ImageKind::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            attach_icc(&mut encoder, metadata);
            let pixels = match image.color() {
                ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                    DynamicImage::ImageLuma8(image.to_luma8())
                }
                _ => DynamicImage::ImageRgb8(image.to_rgb8()),
            };
            pixels.write_with_encoder(encoder)?;
            if let Some(exif) = exif {
                buf = embed_jpeg_exif(buf, exif)?;
            }
        }
        ImageKind::Png => {
            let mut encoder = PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                PngFilterType::Adaptive,
            );
            attach_icc(&mut encoder, metadata);
            image.write_with_encoder(encoder)?;
            buf = oxipng::optimize_from_memory(&buf, &png_options(quality))
                .map_err(|e| CompressionError::PngOptimization(e.to_string()))?;
        }
        ImageKind::WebP => {
            if metadata.icc_profile.is_some() {
                crate::verbose!("WebP encoder cannot embed ICC profile; dropped");
            }
            let (width, height) = (image.width(), image.height());
            let pixels = if image.color().has_alpha() {
                DynamicImage::ImageRgba8(image.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8())
            };
            let encoder = match &pixels {
                DynamicImage::ImageRgba8(rgba) => {
                    webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                }
                other => webp::Encoder::from_rgb(other.as_bytes(), width, height),
            };
            let encoded = encoder
                .encode_simple(false, quality as f32)
                .map_err(|e| CompressionError::WebPEncoding(format!("{:?}", e)))?;
            buf = encoded.to_vec();
        }
    }
    Ok(buf)
}

fn attach_icc<E: ImageEncoder>(encoder: &mut E, metadata: &ImageMetadata) {
    if let Some(icc) = &metadata.icc_profile {
        if encoder.set_icc_profile(icc.clone()).is_err() {
            crate::verbose!("Encoder cannot embed ICC profile; dropped");
        }
    }
}

/// oxipng effort follows quality: zopfli at >=90, strong libdeflate at >=70.
fn png_options(quality: u8) -> Options {
    let mut options = Options::from_preset(OXIPNG_PRESET);
    options.deflate = if quality >= 90 {
        Deflaters::Zopfli {
            iterations: NonZeroU8::new(ZOPFLI_ITERATIONS).unwrap_or(NonZeroU8::MIN),
        }
    } else if quality >= 70 {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };
    options
}
