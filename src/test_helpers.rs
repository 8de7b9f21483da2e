//! Shared test utilities for the expanse test suite.
//!
//! Provides bitmap builders, resolution shorthands and a scripted
//! [`ImageGenerator`] so session and compositor tests read as scenarios
//! instead of setup code.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = solid_image(40, 30, [200, 100, 50, 255]);
//! let surface = composite(&source, &resolution(128, 72), Rgb::SLATE).unwrap();
//!
//! let generator = MockGenerator::returning("QUJD");
//! assert_eq!(generator.call_count(), 0);
//! ```

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::generation::{GeneratedImage, GenerationError, GenerationRequest, ImageGenerator};
use crate::imaging::SourceImage;
use crate::types::Resolution;

// =========================================================================
// Bitmaps
// =========================================================================

/// A `width`x`height` source filled with one RGBA color.
pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> SourceImage {
    SourceImage::from_rgba(RgbaImage::from_pixel(width, height, Rgba(rgba))).unwrap()
}

/// An opaque source where every pixel differs from its neighbours.
pub fn patterned_image(width: u32, height: u32) -> SourceImage {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 7 % 256) as u8,
            (y * 13 % 256) as u8,
            ((x + y) * 5 % 256) as u8,
            255,
        ])
    });
    SourceImage::from_rgba(pixels).unwrap()
}

/// PNG bytes for `source`, as an upload would provide them.
pub fn encode_png(source: &SourceImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    source
        .pixels()
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// A resolution with the stock `"W x H"` label and no description.
pub fn resolution(width: u32, height: u32) -> Resolution {
    Resolution::new(width, height, None)
}

// =========================================================================
// Scripted generator
// =========================================================================

/// What a [`MockGenerator`] saw for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub api_key: String,
    pub image_base64: String,
    pub mime_type: String,
    pub instruction: String,
}

/// Generator that records each request and replays queued outcomes.
///
/// Once the queue is drained every further call fails with `NoImage`.
#[derive(Default)]
pub struct MockGenerator {
    outcomes: Mutex<VecDeque<Result<GeneratedImage, GenerationError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One successful call that returns `data_base64`.
    pub fn returning(data_base64: &str) -> Self {
        Self::new().then_ok(data_base64)
    }

    /// One failed call with `error`.
    pub fn failing(error: GenerationError) -> Self {
        Self::new().then_err(error)
    }

    pub fn then_ok(self, data_base64: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(GeneratedImage {
            data_base64: data_base64.to_string(),
        }));
        self
    }

    pub fn then_err(self, error: GenerationError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ImageGenerator for MockGenerator {
    fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedImage, GenerationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            api_key: api_key.to_string(),
            image_base64: request.image_base64.to_string(),
            mime_type: request.mime_type.to_string(),
            instruction: request.instruction.to_string(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::NoImage))
    }
}
