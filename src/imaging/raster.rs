//! In-memory bitmaps flowing through the compositor.

use super::calculations::Size;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("image has no pixels ({width}x{height})")]
pub struct EmptyImageError {
    pub width: u32,
    pub height: u32,
}

/// A decoded user photo.
///
/// Owned by the caller; the compositor only borrows it. Zero-sized bitmaps
/// are rejected here so the placement math never divides by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Result<Self, EmptyImageError> {
        Self::from_rgba(image.into_rgba8())
    }

    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, EmptyImageError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(EmptyImageError { width, height });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::from(self.pixels.dimensions())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// The flattened result of one compositing call.
///
/// Dimensions always equal the requested resolution. There is no public
/// mutable access: once the compositor hands a surface back it is frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSurface {
    pixels: RgbaImage,
}

impl CompositeSurface {
    pub(super) fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::from(self.pixels.dimensions())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}
