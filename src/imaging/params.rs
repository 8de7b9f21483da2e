//! Parameter types for compositing.
//!
//! These describe *what* the compositor paints, not *how*:
//!
//! - [`Rgb`]: Solid background color, parsed from `#rgb` / `#rrggbb`.
//! - [`FilterParams`]: Blur, brightness and padding of the background layer.
//!   Fixed constants; the config layer does not expose them.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}': expected #rgb or #rrggbb")]
pub struct ColorParseError(pub String);

/// Opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Slate-900, the fill shown behind the blurred layer.
    pub const SLATE: Rgb = Rgb([0x0f, 0x17, 0x2a]);

    pub fn to_rgba(self) -> image::Rgba<u8> {
        let [r, g, b] = self.0;
        image::Rgba([r, g, b, 255])
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::SLATE
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = channel(&c.to_string())?;
                    out[i] = v * 17;
                }
                Ok(Rgb(out))
            }
            6 => Ok(Rgb([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Filter settings for the blurred cover layer.
///
/// - `blur_sigma`: Gaussian standard deviation in pixels (CSS `blur()` radius)
/// - `brightness`: Multiplier applied to the blurred color (0.6 = 40% darker)
/// - `pad`: Margin added on every side of the cover placement so the blur's
///   soft edge falls outside the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub blur_sigma: f32,
    pub brightness: f32,
    pub pad: f64,
}

impl FilterParams {
    pub const REFERENCE: FilterParams = FilterParams {
        blur_sigma: 30.0,
        brightness: 0.6,
        pad: 10.0,
    };

    /// How far past the canvas edge the blur layer must extend for the
    /// kernel tail to be negligible (three standard deviations).
    pub fn blur_margin(&self) -> u32 {
        (self.blur_sigma * 3.0).ceil().max(0.0) as u32
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::REFERENCE
    }
}
