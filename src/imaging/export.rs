//! Surface serialization.
//!
//! A frozen [`CompositeSurface`] is encoded losslessly into a [`Payload`]:
//! raw bytes tagged with their format. The payload renders itself either as
//! bare base64 (what the generation request carries) or as a `data:` URL
//! (what results are shown and downloaded as).

use super::raster::CompositeSurface;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("not a base64 data URL")]
    NotDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Lossless output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    WebP,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::WebP => "image/webp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::WebP => ImageFormat::WebP,
        }
    }
}

/// Encoded image bytes plus their format tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Payload {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Bare base64, no `data:` prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

/// Encode the surface without resizing or lossy recompression.
pub fn to_encoded_image(
    surface: &CompositeSurface,
    format: ExportFormat,
) -> Result<Payload, ExportError> {
    let mut bytes = Vec::new();
    surface
        .pixels()
        .write_to(&mut Cursor::new(&mut bytes), format.image_format())?;
    tracing::debug!(
        format = format.mime_type(),
        width = surface.width(),
        height = surface.height(),
        bytes = bytes.len(),
        "encoded composite"
    );
    Ok(Payload { format, bytes })
}

/// Wrap bare base64 image data as a PNG data URL.
pub fn png_data_url(data_base64: &str) -> String {
    format!("data:image/png;base64,{data_base64}")
}

/// Remove a `data:image/(png|jpeg|webp);base64,` prefix if present.
pub fn strip_data_url_prefix(data: &str) -> &str {
    ["png", "jpeg", "webp"]
        .iter()
        .find_map(|kind| {
            data.strip_prefix("data:image/")
                .and_then(|rest| rest.strip_prefix(kind))
                .and_then(|rest| rest.strip_prefix(";base64,"))
        })
        .unwrap_or(data)
}

/// Decode the bytes behind a `data:<mime>;base64,` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ExportError> {
    let rest = url.strip_prefix("data:").ok_or(ExportError::NotDataUrl)?;
    let (_, data) = rest.split_once(";base64,").ok_or(ExportError::NotDataUrl)?;
    Ok(STANDARD.decode(data)?)
}
