//! The canvas paint routine.
//!
//! One call paints three layers onto a fresh surface, in this order (later
//! layers occlude earlier ones):
//!
//! 1. **Background**: solid [`Rgb`] fill, visible only where the blurred
//!    layer thins out at extreme aspect ratios.
//! 2. **Blurred cover**: the source scaled to cover the canvas, oversized by
//!    [`FilterParams::pad`], Gaussian-blurred and then darkened. This gives
//!    the generative model low-frequency color and lighting context with no
//!    hard edges.
//! 3. **Sharp contain**: the untouched source, scaled to fit and centered.
//!    These are the pixels the model must preserve.
//!
//! The blurred layer is rendered into its own transparent buffer that extends
//! [`FilterParams::blur_margin`] past every canvas edge, so the kernel sees the
//! same neighborhood a browser canvas filter would. Colors stay premultiplied
//! from resampling through blur and darkening to the final source-over, which
//! keeps transparent surroundings from bleeding black into the edge.

use super::calculations::{Rect, Size, cover_rect, fit_contain};
use super::params::{FilterParams, Rgb};
use super::raster::{CompositeSurface, SourceImage};
use crate::types::Resolution;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    #[error("invalid target resolution {width}x{height}: both dimensions must be positive")]
    InvalidResolution { width: u32, height: u32 },
}

/// Placement of both image layers on a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub canvas: Size,
    /// Blurred layer rect, already inflated by the pad.
    pub cover: Rect,
    /// Sharp layer rect.
    pub fit: Rect,
}

/// Compute where each layer lands without painting anything.
pub fn plan_layout(source: Size, canvas: Size, filter: &FilterParams) -> Layout {
    Layout {
        canvas,
        cover: cover_rect(source, canvas).inflate(filter.pad),
        fit: fit_contain(source, canvas),
    }
}

/// Composite `source` onto a `resolution`-sized canvas with the reference filters.
pub fn composite(
    source: &SourceImage,
    resolution: &Resolution,
    background: Rgb,
) -> Result<CompositeSurface, CompositeError> {
    composite_with(source, resolution, background, &FilterParams::REFERENCE)
}

/// Composite with explicit filter parameters.
pub fn composite_with(
    source: &SourceImage,
    resolution: &Resolution,
    background: Rgb,
    filter: &FilterParams,
) -> Result<CompositeSurface, CompositeError> {
    let (width, height) = (resolution.width, resolution.height);
    if width == 0 || height == 0 {
        return Err(CompositeError::InvalidResolution { width, height });
    }

    let layout = plan_layout(source.size(), Size::from((width, height)), filter);
    tracing::debug!(
        source_width = source.width(),
        source_height = source.height(),
        width,
        height,
        fit = ?layout.fit,
        cover = ?layout.cover,
        "compositing canvas"
    );

    let mut canvas = RgbaImage::from_pixel(width, height, background.to_rgba());
    paint_blurred(&mut canvas, source.pixels(), layout.cover, filter);
    paint_sharp(&mut canvas, source.pixels(), layout.fit);

    Ok(CompositeSurface::new(canvas))
}

/// Layer 2: resample into an oversized transparent layer, blur, darken, blend.
fn paint_blurred(
    canvas: &mut RgbaImage,
    source: &RgbaImage,
    placement: Rect,
    filter: &FilterParams,
) {
    let margin = filter.blur_margin();
    let (width, height) = canvas.dimensions();
    let mut layer = RgbaImage::new(width + 2 * margin, height + 2 * margin);

    let shifted = Rect {
        x: placement.x + margin as f64,
        y: placement.y + margin as f64,
        ..placement
    };
    draw_premultiplied(&mut layer, source, shifted);

    let blurred = if filter.blur_sigma > 0.0 {
        imageops::fast_blur(&layer, filter.blur_sigma)
    } else {
        layer
    };

    let brightness = filter.brightness.max(0.0);
    for (x, y, dst) in canvas.enumerate_pixels_mut() {
        let src = darken(blurred.get_pixel(x + margin, y + margin), brightness);
        source_over(dst, src);
    }
}

/// Layer 3: Lanczos3 to the snapped contain rect, then blend.
fn paint_sharp(canvas: &mut RgbaImage, source: &RgbaImage, fit: Rect) {
    let target = fit.to_pixels();
    if target.width == 0 || target.height == 0 {
        return;
    }

    let resized;
    let top = if source.dimensions() == (target.width, target.height) {
        source
    } else {
        resized = imageops::resize(source, target.width, target.height, FilterType::Lanczos3);
        &resized
    };

    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for (sx, sy, px) in top.enumerate_pixels() {
        let x = target.x + sx as i64;
        let y = target.y + sy as i64;
        if x < 0 || y < 0 || x >= cw || y >= ch {
            continue;
        }
        source_over(canvas.get_pixel_mut(x as u32, y as u32), premultiply(px));
    }
}

/// Draw `source` stretched over `dest` into a transparent layer.
///
/// Pixels whose centers fall inside `dest` are filled by bilinear sampling in
/// premultiplied space; everything else is left untouched.
fn draw_premultiplied(layer: &mut RgbaImage, source: &RgbaImage, dest: Rect) {
    if dest.width <= 0.0 || dest.height <= 0.0 {
        return;
    }
    let (src_w, src_h) = source.dimensions();
    let scale_x = src_w as f64 / dest.width;
    let scale_y = src_h as f64 / dest.height;

    let columns = covered_pixels(dest.x, dest.right(), layer.width());
    let rows = covered_pixels(dest.y, dest.bottom(), layer.height());

    let src_xs: Vec<f64> = columns
        .clone()
        .map(|x| (x as f64 + 0.5 - dest.x) * scale_x - 0.5)
        .collect();

    for y in rows {
        let sy = (y as f64 + 0.5 - dest.y) * scale_y - 0.5;
        for (x, &sx) in columns.clone().zip(&src_xs) {
            layer.put_pixel(x, y, to_pixel(sample_bilinear(source, sx, sy)));
        }
    }
}

/// Range of pixel indices in `0..limit` whose centers lie in `[start, end)`.
fn covered_pixels(start: f64, end: f64, limit: u32) -> std::ops::Range<u32> {
    let first = (start - 0.5).ceil().max(0.0);
    let last = (end - 0.5).ceil().min(limit as f64);
    if last <= first {
        return 0..0;
    }
    first as u32..last as u32
}

/// Bilinear sample at pixel-space coordinates, clamped to the image edge.
fn sample_bilinear(source: &RgbaImage, sx: f64, sy: f64) -> [f32; 4] {
    let (w, h) = source.dimensions();
    let sx = sx.clamp(0.0, (w - 1) as f64);
    let sy = sy.clamp(0.0, (h - 1) as f64);
    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = (sx - x0 as f64) as f32;
    let fy = (sy - y0 as f64) as f32;

    let at = |x, y| premultiply(source.get_pixel(x, y));
    let top = lerp(at(x0, y0), at(x1, y0), fx);
    let bottom = lerp(at(x0, y1), at(x1, y1), fx);
    lerp(top, bottom, fy)
}

fn lerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

fn premultiply(px: &Rgba<u8>) -> [f32; 4] {
    let [r, g, b, a] = px.0.map(f32::from);
    let alpha = a / 255.0;
    [r * alpha, g * alpha, b * alpha, a]
}

/// Scale premultiplied color; alpha is untouched and color never exceeds it.
fn darken(px: &Rgba<u8>, brightness: f32) -> [f32; 4] {
    let [r, g, b, a] = px.0.map(f32::from);
    let scale = |c: f32| (c * brightness).min(a);
    [scale(r), scale(g), scale(b), a]
}

/// Premultiplied source-over onto a straight-alpha destination.
fn source_over(dst: &mut Rgba<u8>, src: [f32; 4]) {
    let coverage = src[3] / 255.0;
    if coverage <= 0.0 {
        return;
    }
    let keep = 1.0 - coverage;
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = src[3] + f32::from(dst[3]) * keep;
    if out_alpha <= 0.0 {
        return;
    }
    for c in 0..3 {
        let premul = src[c] + f32::from(dst[c]) * dst_alpha * keep;
        dst[c] = to_channel(premul * 255.0 / out_alpha);
    }
    dst[3] = to_channel(out_alpha);
}

fn to_pixel(px: [f32; 4]) -> Rgba<u8> {
    Rgba(px.map(to_channel))
}

fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
