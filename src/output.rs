//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resolutions
//!
//! ```text
//! Resolutions
//! 001 1280 x 720 (HD Landscape) [default]
//! 002 1920 x 1080 (Full HD)
//! 003 1080 x 1920 (Vertical Story)
//! 004 1080 x 1080 (Square)
//! ```
//!
//! ## Preview
//!
//! ```text
//! photo.jpg (800 x 600) → 1920 x 1080 (Full HD)
//!     Sharp: 1440 x 1080 at (240, 0)
//!     Cover: 1940 x 1460 at (-10, -190)
//!     Saved: preview.png
//! ```
//!
//! ## Generate
//!
//! ```text
//! photo.jpg (800 x 600) → 1920 x 1080 (Full HD)
//!     Prompt: A snowy mountain range
//!     Saved: ./expanse-ai-1712345678901.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure. Logging goes to stderr through `tracing`, never through here.

use crate::imaging::{Layout, PixelRect, Size};
use crate::types::{GeneratedResult, Resolution};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_size(size: Size) -> String {
    format!("{} x {}", size.width, size.height)
}

fn format_placement(rect: PixelRect) -> String {
    format!("{} x {} at ({}, {})", rect.width, rect.height, rect.x, rect.y)
}

/// `photo.jpg (800 x 600) → 1920 x 1080 (Full HD)`
fn header(input: &Path, source: Size, resolution: &Resolution) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    format!("{} ({}) → {}", name, format_size(source), resolution)
}

// ============================================================================
// resolutions
// ============================================================================

/// List the configured resolutions, marking the default.
pub fn format_resolutions(resolutions: &[Resolution], default: &Resolution) -> Vec<String> {
    let mut lines = vec!["Resolutions".to_string()];
    for (i, res) in resolutions.iter().enumerate() {
        let marker = if res == default { " [default]" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), res, marker));
    }
    lines
}

pub fn print_resolutions(resolutions: &[Resolution], default: &Resolution) {
    for line in format_resolutions(resolutions, default) {
        println!("{}", line);
    }
}

// ============================================================================
// preview
// ============================================================================

/// Describe where the layers landed and where the composite was written.
pub fn format_preview(
    input: &Path,
    resolution: &Resolution,
    layout: &Layout,
    source: Size,
    saved: &Path,
) -> Vec<String> {
    vec![
        header(input, source, resolution),
        format!("{}Sharp: {}", indent(1), format_placement(layout.fit.to_pixels())),
        format!("{}Cover: {}", indent(1), format_placement(layout.cover.to_pixels())),
        format!("{}Saved: {}", indent(1), saved.display()),
    ]
}

pub fn print_preview(
    input: &Path,
    resolution: &Resolution,
    layout: &Layout,
    source: Size,
    saved: &Path,
) {
    for line in format_preview(input, resolution, layout, source, saved) {
        println!("{}", line);
    }
}

// ============================================================================
// generate
// ============================================================================

/// Summarize a finished generation. An empty prompt is shown as `(none)`.
pub fn format_result(
    input: &Path,
    resolution: &Resolution,
    source: Size,
    result: &GeneratedResult,
    saved: &Path,
) -> Vec<String> {
    let prompt = if result.prompt.is_empty() {
        "(none)"
    } else {
        result.prompt.as_str()
    };
    vec![
        header(input, source, resolution),
        format!("{}Prompt: {}", indent(1), prompt),
        format!("{}Saved: {}", indent(1), saved.display()),
    ]
}

pub fn print_result(
    input: &Path,
    resolution: &Resolution,
    source: Size,
    result: &GeneratedResult,
    saved: &Path,
) {
    for line in format_result(input, resolution, source, result, saved) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
