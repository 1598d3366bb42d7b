//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the re-encode engine
//! needs: identify (read pixel dimensions) and reencode (decode, rasterize,
//! encode at a quality).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` below so operation logic can be checked without encoding.

use super::params::{EncodingRequest, OutputFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error(transparent)]
    Encode(#[from] EncodeFailure),
}

/// Terminal failure of a single re-encode. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeFailure {
    #[error("Cannot acquire a {width}x{height} drawing surface")]
    SurfaceUnavailable { width: u32, height: u32 },
    #[error("Encoder returned no output")]
    EmptyOutput,
    #[error("{format} encode failed: {reason}")]
    Encoder {
        format: OutputFormat,
        reason: String,
    },
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixels(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Trait for image backends.
pub trait ImageBackend {
    /// Read the pixel dimensions of an encoded image.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode `source`, draw it onto a surface of the same size and encode it
    /// as `request.format` at `request.quality`.
    fn reencode(&self, source: &[u8], request: &EncodingRequest) -> Result<Vec<u8>, BackendError>;
}
