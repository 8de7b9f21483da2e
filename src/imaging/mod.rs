//! Canvas compositing: pure Rust on the `image` crate.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from bytes) |
//! | **Placement** | [`fit_contain`], [`scale_cover`], [`cover_rect`] |
//! | **Paint** | [`compositor::composite`]: fill, blurred cover, sharp contain |
//! | **Export** | [`export::to_encoded_image`] → lossless PNG payload |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for placement math (unit testable)
//! - **Parameters**: Background color and the fixed filter constants
//! - **Raster**: [`SourceImage`] and the frozen [`CompositeSurface`]
//! - **Compositor**: The three-layer paint routine
//! - **Export**: Encoding and `data:` URL helpers
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod compositor;
pub mod export;
mod params;
mod raster;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{PixelRect, Rect, Size, cover_rect, fit_contain, scale_cover};
pub use compositor::{CompositeError, Layout, composite, plan_layout};
pub use export::{ExportError, ExportFormat, Payload, to_encoded_image};
pub use params::{ColorParseError, FilterParams, Rgb};
pub use raster::{CompositeSurface, EmptyImageError, SourceImage};
pub use rust_backend::RustBackend;
