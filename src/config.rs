//! Gateway and compression configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! max_upload_bytes = 20971520
//!
//! [generation]
//! endpoint = "https://ark.cn-beijing.volces.com/api/v3/images/generations"
//! model = "ep-20251024232519-x4mss"
//! size = "2K"
//! response_format = "url"
//! sequential_image_generation = "disabled"
//! watermark = true
//!
//! [recognition]
//! endpoint = "https://ark.cn-beijing.volces.com/api/v3/chat/completions"
//! model = "ep-20251024223502-cb27h"
//! prompt = "识别上传的图片"
//!
//! [remove_bg]
//! endpoint = "https://api.remove.bg/v1.0/removebg"
//! size = "auto"
//!
//! [compress]
//! quality = 80
//! max_pixels = 268435456
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Credentials
//!
//! API keys never live in the config file. They are read from the process
//! environment (after `.env` is loaded) into [`Credentials`]:
//!
//! | Variable | Used by |
//! |---|---|
//! | `ARK_API_KEY` | image generation, visual recognition |
//! | `REMOVE_BG_API_KEY` | background removal |

use crate::imaging::Quality;
use crate::imaging::rust_backend::DEFAULT_MAX_PIXELS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

pub const ARK_API_KEY: &str = "ARK_API_KEY";
pub const REMOVE_BG_API_KEY: &str = "REMOVE_BG_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Inbound HTTP server settings.
    pub server: ServerConfig,
    /// Image generation relay.
    pub generation: GenerationConfig,
    /// Visual recognition relay.
    pub recognition: RecognitionConfig,
    /// Background removal relay.
    pub remove_bg: RemoveBgConfig,
    /// Local re-encode defaults.
    pub compress: CompressConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Validation(format!("server.bind: {e}")))?;
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.max_upload_bytes must be non-zero".into(),
            ));
        }
        for (key, endpoint) in [
            ("generation.endpoint", &self.generation.endpoint),
            ("recognition.endpoint", &self.recognition.endpoint),
            ("remove_bg.endpoint", &self.remove_bg.endpoint),
        ] {
            validate_endpoint(key, endpoint)?;
        }
        if self.generation.model.trim().is_empty() || self.recognition.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "generation.model and recognition.model must not be empty".into(),
            ));
        }
        if self.compress.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "compress.max_pixels must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn validate_endpoint(key: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "{key} must be an http(s) URL"
        )));
    }
    Ok(())
}

/// Inbound HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the gateway listens on.
    pub bind: String,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Image generation relay settings. Request fields override the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    /// One of `1K`, `2K`, `4K`.
    pub size: String,
    /// `url` or `b64_json`.
    pub response_format: String,
    pub sequential_image_generation: String,
    pub watermark: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ark.cn-beijing.volces.com/api/v3/images/generations".to_string(),
            model: "ep-20251024232519-x4mss".to_string(),
            size: "2K".to_string(),
            response_format: "url".to_string(),
            sequential_image_generation: "disabled".to_string(),
            watermark: true,
        }
    }
}

/// Visual recognition relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecognitionConfig {
    pub endpoint: String,
    pub model: String,
    /// Instruction text used when the form carries no `prompt`.
    pub prompt: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
            model: "ep-20251024223502-cb27h".to_string(),
            prompt: "识别上传的图片".to_string(),
        }
    }
}

/// Background removal relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoveBgConfig {
    pub endpoint: String,
    /// Size hint used when the form carries no `size`.
    pub size: String,
}

impl Default for RemoveBgConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.remove.bg/v1.0/removebg".to_string(),
            size: "auto".to_string(),
        }
    }
}

/// Local re-encode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Default quality when the command line gives none. Clamped to 1-100.
    pub quality: Quality,
    /// Largest drawing surface, in pixels.
    pub max_pixels: u64,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// A server-held API key. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// API keys for the upstream services. `None` means "not configured".
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub ark: Option<Secret>,
    pub remove_bg: Option<Secret>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`. Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(Secret::new);
        Self {
            ark: read(ARK_API_KEY),
            remove_bg: read(REMOVE_BG_API_KEY),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, or stock defaults when `path` is `None`.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgdesk Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# API keys are NOT read from this file. Set them in the environment
# (or a .env file next to the binary):
#   ARK_API_KEY        - image generation and visual recognition
#   REMOVE_BG_API_KEY  - background removal

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Address the gateway listens on.
bind = "127.0.0.1:3000"

# Largest accepted request body in bytes (uploads included).
max_upload_bytes = 20971520

# ---------------------------------------------------------------------------
# Image generation (POST /api/ai-generation)
# ---------------------------------------------------------------------------
[generation]
endpoint = "https://ark.cn-beijing.volces.com/api/v3/images/generations"
# Model used when the request names none.
model = "ep-20251024232519-x4mss"
# Output size when the request names none: "1K", "2K" or "4K".
size = "2K"
# "url" or "b64_json".
response_format = "url"
sequential_image_generation = "disabled"
watermark = true

# ---------------------------------------------------------------------------
# Visual recognition (POST /api/recognition)
# ---------------------------------------------------------------------------
[recognition]
endpoint = "https://ark.cn-beijing.volces.com/api/v3/chat/completions"
model = "ep-20251024223502-cb27h"
# Instruction sent with the image when the form has no prompt.
prompt = "识别上传的图片"

# ---------------------------------------------------------------------------
# Background removal (POST /api/remove-bg)
# ---------------------------------------------------------------------------
[remove_bg]
endpoint = "https://api.remove.bg/v1.0/removebg"
# Size hint when the form has none.
size = "auto"

# ---------------------------------------------------------------------------
# Local compression (imgdesk compress)
# ---------------------------------------------------------------------------
[compress]
# Default quality, 1 (smallest) to 100 (best). Out-of-range values are clamped.
quality = 80
# Largest image, in pixels, the encoder will draw.
max_pixels = 268435456
"##
}
