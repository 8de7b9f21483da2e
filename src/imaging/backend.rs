//! Image processing backend trait and shared error type.
//!
//! The [`ImageBackend`] trait defines the three operations the session needs:
//! decode an upload, composite it onto a canvas, and encode the result.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests swap in a
//! recording mock so state-machine logic can be checked without pixels.

use super::compositor::CompositeError;
use super::export::{ExportError, ExportFormat, Payload};
use super::params::Rgb;
use super::raster::{CompositeSurface, EmptyImageError, SourceImage};
use crate::types::Resolution;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to decode image: {0}")]
    Empty(#[from] EmptyImageError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Decode raw upload bytes into a bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Paint `source` onto a fresh `resolution`-sized surface.
    fn composite(
        &self,
        source: &SourceImage,
        resolution: &Resolution,
        background: Rgb,
    ) -> Result<CompositeSurface, BackendError>;

    /// Serialize a finished surface.
    fn encode(
        &self,
        surface: &CompositeSurface,
        format: ExportFormat,
    ) -> Result<Payload, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::RgbaImage;
    use std::sync::Mutex;

    /// Mock backend that records operations and returns canned results.
    ///
    /// `decode` succeeds with a `decoded_size` bitmap unless `fail_decode` is
    /// set; `composite` hands out a blank surface of the requested size.
    #[derive(Default)]
    pub struct MockBackend {
        pub decoded_size: (u32, u32),
        pub fail_decode: bool,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Composite { width: u32, height: u32 },
        Encode(ExportFormat),
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                decoded_size: (40, 30),
                ..Self::default()
            }
        }

        pub fn failing_decode() -> Self {
            Self {
                fail_decode: true,
                ..Self::new()
            }
        }

        pub fn failing_encode() -> Self {
            Self {
                fail_encode: true,
                ..Self::new()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            if self.fail_decode {
                let (width, height) = (0, 0);
                return Err(EmptyImageError { width, height }.into());
            }
            let (w, h) = self.decoded_size;
            Ok(SourceImage::from_rgba(RgbaImage::new(w, h))?)
        }

        fn composite(
            &self,
            _source: &SourceImage,
            resolution: &Resolution,
            _background: Rgb,
        ) -> Result<CompositeSurface, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Composite {
                width: resolution.width,
                height: resolution.height,
            });
            Ok(CompositeSurface::new(RgbaImage::new(
                resolution.width,
                resolution.height,
            )))
        }

        fn encode(
            &self,
            _surface: &CompositeSurface,
            format: ExportFormat,
        ) -> Result<Payload, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Encode(format));
            if self.fail_encode {
                return Err(ExportError::NotDataUrl.into());
            }
            Ok(Payload {
                format,
                bytes: vec![0x89, b'P', b'N', b'G'],
            })
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::new();
        let source = backend.decode(&[1, 2, 3]).unwrap();
        assert_eq!((source.width(), source.height()), (40, 30));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(3)]);
    }

    #[test]
    fn mock_composite_matches_resolution() {
        let backend = MockBackend::new();
        let source = backend.decode(&[0]).unwrap();
        let res = crate::test_helpers::resolution(12, 8);
        let surface = backend.composite(&source, &res, Rgb::SLATE).unwrap();
        assert_eq!((surface.width(), surface.height()), (12, 8));
        assert!(matches!(
            backend.get_operations()[1],
            RecordedOp::Composite { width: 12, height: 8 }
        ));
    }

    #[test]
    fn mock_can_fail_decode() {
        let backend = MockBackend::failing_decode();
        assert!(backend.decode(&[0]).is_err());
    }
}
