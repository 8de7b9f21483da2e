//! Pure calculation functions for canvas placement.
//!
//! All functions here are pure and testable without any I/O or images. They
//! never validate their inputs: zero or negative dimensions are the caller's
//! problem (see [`SourceImage`](super::SourceImage), which rejects empty bitmaps).

/// Pixel dimensions of an image or canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        self.width / self.height
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// A placement on the canvas. Always derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Grow the rect by `pad` on every side, keeping its center.
    pub fn inflate(self, pad: f64) -> Rect {
        Rect {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + 2.0 * pad,
            height: self.height + 2.0 * pad,
        }
    }

    /// Snap to whole pixels by rounding both edges.
    ///
    /// Rounding edges (rather than origin and size independently) keeps two
    /// rects that share an edge in float space sharing it in pixel space.
    /// A positive extent narrower than a pixel still covers one pixel.
    pub fn to_pixels(self) -> PixelRect {
        let x0 = self.x.round();
        let y0 = self.y.round();
        let mut x1 = self.right().round();
        let mut y1 = self.bottom().round();
        if self.width > 0.0 {
            x1 = x1.max(x0 + 1.0);
        }
        if self.height > 0.0 {
            y1 = y1.max(y0 + 1.0);
        }
        PixelRect {
            x: x0 as i64,
            y: y0 as i64,
            width: (x1 - x0).max(0.0) as u32,
            height: (y1 - y0).max(0.0) as u32,
        }
    }
}

/// A [`Rect`] snapped to the pixel grid. The origin may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Largest rect with `source`'s aspect ratio that fits inside `target`, centered.
///
/// # Examples
/// ```
/// # use expanse::imaging::{Size, fit_contain};
/// // 4:3 photo on a 16:9 canvas: pillarboxed, full height
/// let fit = fit_contain(Size::new(400.0, 300.0), Size::new(1280.0, 720.0));
/// assert_eq!((fit.x, fit.y, fit.width, fit.height), (160.0, 0.0, 960.0, 720.0));
/// ```
pub fn fit_contain(source: Size, target: Size) -> Rect {
    let source_ratio = source.aspect();
    let target_ratio = target.aspect();

    let (width, height) = if source_ratio > target_ratio {
        // Source is relatively wider: fit to width
        (target.width, target.width / source_ratio)
    } else {
        // Source is relatively taller (or equal): fit to height
        (target.height * source_ratio, target.height)
    };

    Rect {
        x: (target.width - width) / 2.0,
        y: (target.height - height) / 2.0,
        width,
        height,
    }
}

/// Minimum uniform scale at which `source` fully covers `target`.
pub fn scale_cover(source: Size, target: Size) -> f64 {
    (target.width / source.width).max(target.height / source.height)
}

/// Centered placement of `source` scaled by [`scale_cover`].
///
/// One axis matches `target` exactly; the other overflows equally on both
/// sides, so `x` or `y` is zero or negative.
pub fn cover_rect(source: Size, target: Size) -> Rect {
    let scale = scale_cover(source, target);
    let width = source.width * scale;
    let height = source.height * scale;
    Rect {
        x: (target.width - width) / 2.0,
        y: (target.height - height) / 2.0,
        width,
        height,
    }
}
