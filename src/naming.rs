//! Naming conventions shared by the CLI and the session.
//!
//! Two small grammars live here:
//!
//! - **Dimension arguments**: `1920x1080`, `1920 x 1080` or `1920X1080`, the
//!   form resolutions are picked by on the command line and in `config.toml`.
//! - **Download filenames**: `<prefix>-<unix-millis>.png`, so repeated
//!   generations never overwrite each other.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid dimensions '{0}': expected WIDTHxHEIGHT, e.g. 1920x1080")]
pub struct DimensionsError(pub String);

/// Parse `WIDTHxHEIGHT` into positive pixel dimensions.
///
/// ```
/// # use expanse::naming::parse_dimensions;
/// assert_eq!(parse_dimensions("1920x1080"), Ok((1920, 1080)));
/// assert_eq!(parse_dimensions("1080 x 1920"), Ok((1080, 1920)));
/// assert!(parse_dimensions("0x720").is_err());
/// ```
pub fn parse_dimensions(input: &str) -> Result<(u32, u32), DimensionsError> {
    let err = || DimensionsError(input.to_string());
    let (w, h) = input.split_once(['x', 'X']).ok_or_else(err)?;
    let width: u32 = w.trim().parse().map_err(|_| err())?;
    let height: u32 = h.trim().parse().map_err(|_| err())?;
    if width == 0 || height == 0 {
        return Err(err());
    }
    Ok((width, height))
}

/// `<prefix>-<timestamp_ms>.png`
pub fn download_filename(prefix: &str, timestamp_ms: i64) -> String {
    format!("{prefix}-{timestamp_ms}.png")
}
