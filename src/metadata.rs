//! Probing images and carrying their metadata across a re-encode.

use crate::constants::{EXIF_HEADER, MAX_JPEG_SEGMENT_PAYLOAD};
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_APP0: [u8; 2] = [0xFF, 0xE0];
const JPEG_APP1: [u8; 2] = [0xFF, 0xE1];

#[derive(Debug, Clone, Default)]
pub struct ImageMetadata {
    pub orientation: Option<Orientation>,
    pub icc_profile: Option<Vec<u8>>,
    /// Raw EXIF block as the decoder returned it.
    pub exif: Option<Vec<u8>>,
}

impl ImageMetadata {
    pub fn orientation_or_identity(&self) -> Orientation {
        self.orientation.unwrap_or(Orientation::NoTransforms)
    }

    /// EXIF that fits into a single JPEG APP1 segment.
    pub fn embeddable_exif(&self) -> Option<&[u8]> {
        self.exif
            .as_deref()
            .filter(|exif| exif_payload_len(exif) <= MAX_JPEG_SEGMENT_PAYLOAD)
    }
}

pub struct ProbedImage {
    /// Container detected from the content, not the file name.
    pub kind: ImageKind,
    pub image: DynamicImage,
    pub metadata: ImageMetadata,
}

/// Decodes `bytes` and collects orientation, ICC profile and EXIF.
pub fn probe(bytes: &[u8]) -> Result<ProbedImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        CompressionError::UnsupportedFormat("unrecognised image content".to_string())
    })?;
    let kind = ImageKind::from_image_format(format)?;

    let mut decoder = reader.into_decoder()?;
    let orientation = Some(decoder.orientation()?);
    let icc_profile = decoder.icc_profile()?;
    let exif = decoder.exif_metadata()?;
    let image = DynamicImage::from_decoder(decoder)?;

    Ok(ProbedImage {
        kind,
        image,
        metadata: ImageMetadata {
            orientation,
            icc_profile,
            exif,
        },
    })
}

fn exif_payload_len(exif: &[u8]) -> usize {
    if exif.starts_with(EXIF_HEADER) {
        exif.len()
    } else {
        exif.len() + EXIF_HEADER.len()
    }
}

/// Inserts `exif` as an APP1 segment, after the JFIF APP0 segment when the
/// encoder wrote one and right after SOI otherwise.
pub fn embed_jpeg_exif(jpeg: Vec<u8>, exif: &[u8]) -> Result<Vec<u8>> {
    if !jpeg.starts_with(&JPEG_SOI) {
        return Err(CompressionError::UnsupportedFormat(
            "encoded stream is not a JPEG".to_string(),
        ));
    }

    let payload_len = exif_payload_len(exif);
    if payload_len > MAX_JPEG_SEGMENT_PAYLOAD {
        return Err(CompressionError::MetadataTooLarge(payload_len));
    }

    let mut insert_at = JPEG_SOI.len();
    if jpeg.len() >= 6 && jpeg[2..4] == JPEG_APP0 {
        let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
        insert_at = (4 + app0_len).min(jpeg.len());
    }

    // payload_len is bounded above, so the segment length fits in a u16
    let segment_len = (payload_len + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload_len + 4);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&JPEG_APP1);
    out.extend_from_slice(&segment_len.to_be_bytes());
    if !exif.starts_with(EXIF_HEADER) {
        out.extend_from_slice(EXIF_HEADER);
    }
    out.extend_from_slice(exif);
    out.extend_from_slice(&jpeg[insert_at..]);
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageFormat, RgbImage};

    fn tiny_jpeg() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, image::Rgb([200, 30, 30])));
        let mut buf = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 85))
            .unwrap();
        buf
    }

    // Minimal little-endian TIFF block with one Orientation (0x0112) entry.
    pub(crate) fn exif_with_orientation(value: u16) -> Vec<u8> {
        let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&value.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff
    }

    #[test]
    fn test_probe_reads_kind_and_pixels() {
        let probed = probe(&tiny_jpeg()).unwrap();
        assert_eq!(probed.kind, ImageKind::Jpeg);
        assert_eq!((probed.image.width(), probed.image.height()), (8, 4));
        assert_eq!(
            probed.metadata.orientation_or_identity(),
            Orientation::NoTransforms
        );
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe(b"definitely not an image").is_err());
    }

    #[test]
    fn test_probe_rejects_unsupported_container() {
        let img = DynamicImage::new_rgb8(2, 2);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Bmp).unwrap();
        assert!(matches!(
            probe(buf.get_ref()),
            Err(CompressionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_embed_places_app1_after_jfif() {
        let jpeg = tiny_jpeg();
        let exif = exif_with_orientation(6);
        let out = embed_jpeg_exif(jpeg.clone(), &exif).unwrap();

        assert_eq!(out.len(), jpeg.len() + 4 + EXIF_HEADER.len() + exif.len());
        let app1 = out
            .windows(2 + 2 + EXIF_HEADER.len())
            .position(|w| w[..2] == JPEG_APP1 && &w[4..] == EXIF_HEADER)
            .expect("APP1 segment present");
        assert!(app1 >= 2);
        assert!(image::load_from_memory(&out).is_ok());
    }

    #[test]
    fn test_embed_does_not_double_header() {
        let mut exif = EXIF_HEADER.to_vec();
        exif.extend_from_slice(&exif_with_orientation(3));
        let out = embed_jpeg_exif(tiny_jpeg(), &exif).unwrap();
        let headers = out.windows(EXIF_HEADER.len()).filter(|w| *w == EXIF_HEADER).count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn test_embed_rejects_oversized_block() {
        let exif = vec![0u8; MAX_JPEG_SEGMENT_PAYLOAD];
        assert!(matches!(
            embed_jpeg_exif(tiny_jpeg(), &exif),
            Err(CompressionError::MetadataTooLarge(_))
        ));
        let metadata = ImageMetadata {
            exif: Some(exif),
            ..Default::default()
        };
        assert!(metadata.embeddable_exif().is_none());
    }

    #[test]
    fn test_embed_rejects_non_jpeg() {
        assert!(embed_jpeg_exif(b"\x89PNG".to_vec(), &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_orientation_read_back_from_embedded_exif() {
        let out = embed_jpeg_exif(tiny_jpeg(), &exif_with_orientation(6)).unwrap();
        let probed = probe(&out).unwrap();
        assert_eq!(probed.metadata.orientation, Some(Orientation::Rotate90));
    }
}
