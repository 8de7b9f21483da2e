//! Shared types used by the config, session and CLI layers.

use crate::imaging::export::{ExportError, decode_data_url};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A target canvas size the user can pick.
///
/// Resolutions are immutable and always come from a caller-supplied list
/// (the presets below unless `config.toml` overrides them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    /// Display label, e.g. `"1920 x 1080"`
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resolution {
    pub fn new(width: u32, height: u32, description: Option<&str>) -> Self {
        Self {
            width,
            height,
            label: format!("{width} x {height}"),
            description: description.map(str::to_string),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => write!(f, "{} ({})", self.label, d),
            None => f.write_str(&self.label),
        }
    }
}

/// The four stock resolutions. The first one is the default.
pub fn preset_resolutions() -> Vec<Resolution> {
    vec![
        Resolution::new(1280, 720, Some("HD Landscape")),
        Resolution::new(1920, 1080, Some("Full HD")),
        Resolution::new(1080, 1920, Some("Vertical Story")),
        Resolution::new(1080, 1080, Some("Square")),
    ]
}

/// What the next generation request will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub resolution: Resolution,
    /// Free-text guidance for the model; may be empty.
    pub prompt: String,
}

/// A finished outpainting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedResult {
    /// `data:image/png;base64,...`
    pub image_url: String,
    /// The prompt exactly as it was submitted.
    pub prompt: String,
    /// Unix milliseconds when the result arrived.
    pub timestamp_ms: i64,
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl GeneratedResult {
    pub fn download_name(&self, prefix: &str) -> String {
        naming::download_filename(prefix, self.timestamp_ms)
    }

    /// Decode the image and write it into `dir` under [`download_name`](Self::download_name).
    pub fn write_to(&self, dir: &Path, prefix: &str) -> Result<PathBuf, SaveError> {
        let bytes = decode_data_url(&self.image_url)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.download_name(prefix));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}
