//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions do no I/O.
//!
//! ## Compress
//!
//! ```text
//! Source: photos/fox.png
//!     800×600 · 488.3 KB · image/png
//! Result: photos/fox.min.webp
//!     800×600 · 120.1 KB · WEBP (quality 80)
//!     Reduced by about 75%
//! ```
//!
//! ## Check
//!
//! ```text
//! Gateway
//!     bind: 127.0.0.1:3000
//!     generation: https://ark.cn-beijing.volces.com/api/v3/images/generations
//! Credentials
//!     ARK_API_KEY: set
//!     REMOVE_BG_API_KEY: missing
//! ```

use crate::config::{ARK_API_KEY, AppConfig, Credentials, REMOVE_BG_API_KEY};
use crate::imaging::{
    Dimensions, EncodingRequest, EncodingResult, ImageAsset, OutputFormat, human_size,
};
use std::path::{Path, PathBuf};

fn dimension_line(dims: Dimensions, size: u64, kind: &str) -> String {
    format!(
        "    {}×{} · {} · {}",
        dims.width,
        dims.height,
        human_size(size),
        kind
    )
}

/// Where `compress` writes when no output path is given: next to the input,
/// `<stem>.min.<ext>`.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}.min.{}", format.extension()))
}

pub fn format_compress_output(
    input: &Path,
    output: &Path,
    asset: &ImageAsset,
    request: &EncodingRequest,
    result: &EncodingResult,
) -> Vec<String> {
    vec![
        format!("Source: {}", input.display()),
        dimension_line(asset.dimensions(), asset.size(), asset.mime()),
        format!("Result: {}", output.display()),
        dimension_line(
            result.dimensions,
            result.size(),
            &format!("{} (quality {})", result.format, request.quality.value()),
        ),
        format!("    Reduced by about {}%", result.reduction_percent()),
    ]
}

pub fn print_compress_output(
    input: &Path,
    output: &Path,
    asset: &ImageAsset,
    request: &EncodingRequest,
    result: &EncodingResult,
) {
    for line in format_compress_output(input, output, asset, request, result) {
        println!("{}", line);
    }
}

pub fn format_check_output(config: &AppConfig, credentials: &Credentials) -> Vec<String> {
    let status = |present: bool| if present { "set" } else { "missing" };
    vec![
        "Gateway".to_string(),
        format!("    bind: {}", config.server.bind),
        format!("    generation: {}", config.generation.endpoint),
        format!("    recognition: {}", config.recognition.endpoint),
        format!("    remove-bg: {}", config.remove_bg.endpoint),
        "Credentials".to_string(),
        format!("    {}: {}", ARK_API_KEY, status(credentials.ark.is_some())),
        format!(
            "    {}: {}",
            REMOVE_BG_API_KEY,
            status(credentials.remove_bg.is_some())
        ),
    ]
}

pub fn print_check_output(config: &AppConfig, credentials: &Credentials) {
    for line in format_check_output(config, credentials) {
        println!("{}", line);
    }
}
