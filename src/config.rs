//! Configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by whatever keys the user's file sets; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [canvas]
//! background = "#0f172a"          # Solid fill behind the blurred layer
//! default_resolution = "1280x720" # Must match an entry in `resolutions`
//!
//! [generation]
//! model = "gemini-2.5-flash-image"
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! api_key_env = "GEMINI_API_KEY"  # Environment variable holding the API key
//!
//! [output]
//! dir = "."                       # Where generated images are saved
//! prefix = "expanse-ai"           # Download filename prefix
//!
//! [[resolutions]]                 # Replaces the whole preset list when present
//! width = 1280
//! height = 720
//! label = "1280 x 720"
//! description = "HD Landscape"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [canvas]
//! background = "#000000"
//! ```
//!
//! Tables merge key by key; arrays (the resolution list) replace the default
//! wholesale. Unknown keys are rejected to catch typos early.
//!
//! The blur radius, darkening and padding of the background layer are not
//! configuration: they are fixed by [`FilterParams::REFERENCE`](crate::imaging::FilterParams::REFERENCE).

use crate::generation::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::imaging::Rgb;
use crate::naming::parse_dimensions;
use crate::types::{Resolution, preset_resolutions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Canvas fill and default target.
    pub canvas: CanvasConfig,
    /// Generative model settings.
    pub generation: GenerationConfig,
    /// Where results are written.
    pub output: OutputConfig,
    /// Resolutions the user may pick from.
    pub resolutions: Vec<Resolution>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            generation: GenerationConfig::default(),
            output: OutputConfig::default(),
            resolutions: preset_resolutions(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.canvas
            .background
            .parse::<Rgb>()
            .map_err(|e| ConfigError::Validation(format!("canvas.background: {e}")))?;

        if self.resolutions.is_empty() {
            return Err(ConfigError::Validation("resolutions must not be empty".into()));
        }
        if let Some(bad) = self
            .resolutions
            .iter()
            .find(|r| r.width == 0 || r.height == 0)
        {
            return Err(ConfigError::Validation(format!(
                "resolution '{}' must have positive width and height",
                bad.label
            )));
        }
        self.default_resolution()?;

        for (key, value) in [
            ("generation.model", &self.generation.model),
            ("generation.endpoint", &self.generation.endpoint),
            ("generation.api_key_env", &self.generation.api_key_env),
            ("output.prefix", &self.output.prefix),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// Parsed background color.
    pub fn background(&self) -> Result<Rgb, ConfigError> {
        self.canvas
            .background
            .parse()
            .map_err(|e| ConfigError::Validation(format!("canvas.background: {e}")))
    }

    /// The entry of `resolutions` named by `canvas.default_resolution`.
    pub fn default_resolution(&self) -> Result<&Resolution, ConfigError> {
        self.find_resolution(&self.canvas.default_resolution)
            .map_err(|e| ConfigError::Validation(format!("canvas.default_resolution: {e}")))
    }

    /// Look up a resolution by `WIDTHxHEIGHT` or by its exact label.
    pub fn find_resolution(&self, spec: &str) -> Result<&Resolution, ConfigError> {
        if let Some(res) = self.resolutions.iter().find(|r| r.label == spec) {
            return Ok(res);
        }
        let dims = parse_dimensions(spec).map_err(|e| ConfigError::Validation(e.to_string()))?;
        self.resolutions
            .iter()
            .find(|r| r.dimensions() == dims)
            .ok_or_else(|| {
                let available: Vec<&str> =
                    self.resolutions.iter().map(|r| r.label.as_str()).collect();
                ConfigError::Validation(format!(
                    "'{spec}' is not a configured resolution. Available: {available:?}"
                ))
            })
    }
}

/// Canvas settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    /// `#rgb` or `#rrggbb` fill shown where the blurred layer thins out.
    pub background: String,
    /// Resolution used when none is given on the command line.
    pub default_resolution: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            background: Rgb::SLATE.to_string(),
            default_resolution: "1280x720".to_string(),
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Model name as accepted by the endpoint.
    pub model: String,
    /// API base URL (without the `/models/...` path).
    pub endpoint: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// Read the API key from the configured environment variable.
///
/// - unset → `None`
/// - set but empty → `None` (treated as missing, same as unset)
pub fn resolve_api_key(config: &GenerationConfig) -> Option<String> {
    std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.is_empty())
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory generated images are written to.
    pub dir: PathBuf,
    /// Filename prefix; files are named `<prefix>-<unix-millis>.png`.
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "expanse-ai".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Expanse Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Canvas
# ---------------------------------------------------------------------------
[canvas]
# Solid fill painted first. It only shows through where the blurred copy of
# the photo thins out at the canvas edges. Accepts #rgb or #rrggbb.
background = "#0f172a"

# Resolution used when `--resolution` is not given. Either WIDTHxHEIGHT or
# the exact label of one of the entries below.
default_resolution = "1280x720"

# ---------------------------------------------------------------------------
# Generative model
# ---------------------------------------------------------------------------
[generation]
model = "gemini-2.5-flash-image"
endpoint = "https://generativelanguage.googleapis.com/v1beta"

# The API key is never stored in this file. It is read from this
# environment variable at generation time.
api_key_env = "GEMINI_API_KEY"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory for generated images.
dir = "."

# Generated files are named <prefix>-<unix-millis>.png
prefix = "expanse-ai"

# ---------------------------------------------------------------------------
# Resolutions
# ---------------------------------------------------------------------------
# The list of target canvases. Defining any entry replaces the whole list.

[[resolutions]]
width = 1280
height = 720
label = "1280 x 720"
description = "HD Landscape"

[[resolutions]]
width = 1920
height = 1080
label = "1920 x 1080"
description = "Full HD"

[[resolutions]]
width = 1080
height = 1920
label = "1080 x 1920"
description = "Vertical Story"

[[resolutions]]
width = 1080
height = 1080
label = "1080 x 1080"
description = "Square"
"##
}
