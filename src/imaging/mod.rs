//! Local image re-encoding, no network involved.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image::ImageReader::decode` under the pixel budget |
//! | **Encode → JPEG** | `image` JPEG encoder at the requested quality |
//! | **Encode → WebP** | libwebp lossy encoder at the requested quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for size reporting (unit testable)
//! - **Parameters**: Quality clamp and output-format policy
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`ImageAsset`] decoding and [`compress`]

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, EncodeFailure, ImageBackend};
pub use calculations::{human_size, reduction_percent, size_reduction_ratio};
pub use operations::{EncodingResult, ImageAsset, compress};
pub use params::{EncodingRequest, OutputFormat, Quality};
pub use rust_backend::RustBackend;
