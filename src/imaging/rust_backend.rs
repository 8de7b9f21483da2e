//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with content sniffing |
//! | Resample (sharp layer) | `image::imageops::resize` with `Lanczos3` filter |
//! | Blur (cover layer) | `image::imageops::fast_blur` |
//! | Encode → PNG / WebP | `image::ImageBuffer::write_to` (lossless) |

use super::backend::{BackendError, ImageBackend};
use super::compositor;
use super::export::{ExportFormat, Payload, to_encoded_image};
use super::params::Rgb;
use super::raster::{CompositeSurface, SourceImage};
use crate::types::Resolution;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Formats whose decoders are compiled in.
const DECODABLE: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// MIME types accepted as uploads.
pub fn supported_mime_types() -> Vec<&'static str> {
    DECODABLE
        .iter()
        .filter(|fmt| fmt.reading_enabled())
        .map(|fmt| fmt.to_mime_type())
        .collect()
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        // The format is sniffed from content; upload filenames are not trusted.
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format();
        let image = reader.decode()?;
        tracing::debug!(
            format = ?format,
            width = image.width(),
            height = image.height(),
            "decoded upload"
        );
        Ok(SourceImage::new(image)?)
    }

    fn composite(
        &self,
        source: &SourceImage,
        resolution: &Resolution,
        background: Rgb,
    ) -> Result<CompositeSurface, BackendError> {
        Ok(compositor::composite(source, resolution, background)?)
    }

    fn encode(
        &self,
        surface: &CompositeSurface,
        format: ExportFormat,
    ) -> Result<Payload, BackendError> {
        Ok(to_encoded_image(surface, format)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_png, patterned_image, resolution};

    #[test]
    fn decodes_png_bytes() {
        let bytes = encode_png(&patterned_image(9, 5));
        let source = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!((source.width(), source.height()), (9, 5));
        assert_eq!(source.pixels(), patterned_image(9, 5).pixels());
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = RustBackend::new().decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)), "{err:?}");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(RustBackend::new().decode(&[]).is_err());
    }

    #[test]
    fn composite_then_encode_round_trips() {
        let backend = RustBackend::new();
        let source = patterned_image(16, 12);
        let surface = backend
            .composite(&source, &resolution(32, 18), Rgb::SLATE)
            .unwrap();
        let payload = backend.encode(&surface, ExportFormat::Png).unwrap();
        let again = backend.decode(&payload.bytes).unwrap();
        assert_eq!(again.pixels(), surface.pixels());
    }

    #[test]
    fn zero_resolution_surfaces_composite_error() {
        let backend = RustBackend::new();
        let err = backend
            .composite(&patterned_image(4, 4), &resolution(16, 0), Rgb::SLATE)
            .unwrap_err();
        assert!(matches!(err, BackendError::Composite(_)));
    }

    #[test]
    fn png_and_jpeg_are_supported_uploads() {
        let mimes = supported_mime_types();
        assert!(mimes.contains(&"image/png"));
        assert!(mimes.contains(&"image/jpeg"));
    }
}
