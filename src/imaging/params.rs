//! Parameter types for the re-encode step.
//!
//! These types describe *what* to produce, not *how*. The
//! [`operations`](super::operations) module builds them from user input and the
//! [`backend`](super::backend) does the pixel work, so the policy here stays
//! testable without touching an encoder.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`OutputFormat`]: The two lossy targets: JPEG and WebP.
//! - [`EncodingRequest`]: Target format plus quality for one re-encode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
///
/// Out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: i64) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality on the fractional `(0, 1]` scale encoders are driven with.
    pub fn fraction(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl From<i64> for Quality {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Lossy output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl OutputFormat {
    /// Pick the output format for a source MIME type.
    ///
    /// Alpha-capable sources (anything mentioning `png` or `webp`) go to WebP so
    /// transparency survives; everything else goes to JPEG.
    pub fn for_source_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("png") || mime.contains("webp") {
            Self::WebP
        } else {
            Self::Jpeg
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::WebP)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("JPEG"),
            Self::WebP => f.write_str("WEBP"),
        }
    }
}

/// One re-encode: which format to write and at what quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRequest {
    pub format: OutputFormat,
    pub quality: Quality,
}

impl EncodingRequest {
    /// Build the request for a source image.
    ///
    /// The format is a pure function of the source MIME; callers only choose
    /// the quality.
    pub fn for_source(source_mime: &str, quality: Quality) -> Self {
        Self {
            format: OutputFormat::for_source_mime(source_mime),
            quality,
        }
    }
}
