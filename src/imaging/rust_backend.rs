//! Pure Rust re-encode backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader::decode` with `Limits` from the pixel budget |
//! | Rasterize | `DynamicImage::to_rgb8` / `to_rgba8` onto a same-size surface |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → WebP (lossy) | `webp::Encoder::encode_simple` |

use super::backend::{BackendError, Dimensions, EncodeFailure, ImageBackend};
use super::params::{EncodingRequest, OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader, Limits, RgbImage,
    RgbaImage,
};
use std::io::Cursor;

/// Largest surface we agree to allocate: 16384 × 16384 pixels, the canvas
/// area limit of mainstream browsers.
pub const DEFAULT_MAX_PIXELS: u64 = 16_384 * 16_384;

/// Widest decoded pixel planned for: 16-bit RGBA.
const MAX_BYTES_PER_PIXEL: u64 = 8;

/// Backend built on the `image` crate plus libwebp for lossy WebP.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend {
    max_pixels: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    /// Backend that refuses surfaces larger than `max_pixels`.
    pub fn with_max_pixels(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded image drawn at its own size, in the channel layout the target
/// format can carry.
enum Surface {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

fn decode_error(err: impl ToString) -> BackendError {
    BackendError::Decode(err.to_string())
}

/// Open `source` with its format guessed from the magic bytes.
fn open(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(decode_error)
}

/// Decode `source`, whose header reports `dims`, within the pixel budget.
///
/// The budget is checked against the header before any pixel data is read,
/// and the decoder's allocation limit is raised to match it, so an oversized
/// image always fails as `SurfaceUnavailable`.
fn decode(source: &[u8], dims: Dimensions, max_pixels: u64) -> Result<DynamicImage, BackendError> {
    let unavailable = || {
        BackendError::from(EncodeFailure::SurfaceUnavailable {
            width: dims.width,
            height: dims.height,
        })
    };
    if dims.pixels() == 0 || dims.pixels() > max_pixels {
        return Err(unavailable());
    }

    let mut limits = Limits::default();
    let budget = max_pixels.saturating_mul(MAX_BYTES_PER_PIXEL);
    limits.max_alloc = Some(limits.max_alloc.map_or(budget, |default| default.max(budget)));

    let mut reader = open(source)?;
    reader.limits(limits);
    reader.decode().map_err(|err| match err {
        ImageError::Limits(_) => unavailable(),
        err => decode_error(err),
    })
}

/// Acquire a surface for `img`. Fails when the pixel budget is exceeded or
/// the buffer size cannot be represented.
fn rasterize(
    img: &DynamicImage,
    format: OutputFormat,
    max_pixels: u64,
) -> Result<Surface, EncodeFailure> {
    let dims = Dimensions {
        width: img.width(),
        height: img.height(),
    };
    let unavailable = EncodeFailure::SurfaceUnavailable {
        width: dims.width,
        height: dims.height,
    };

    let channels: u64 = if format.supports_alpha() { 4 } else { 3 };
    let pixels = dims.pixels();
    if pixels == 0 || pixels > max_pixels {
        return Err(unavailable);
    }
    let fits = pixels
        .checked_mul(channels)
        .is_some_and(|bytes| usize::try_from(bytes).is_ok());
    if !fits {
        return Err(unavailable);
    }

    Ok(if format.supports_alpha() {
        Surface::Rgba(img.to_rgba8())
    } else {
        Surface::Rgb(img.to_rgb8())
    })
}

fn encode_jpeg(surface: &RgbImage, quality: Quality) -> Result<Vec<u8>, EncodeFailure> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.value())
        .write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeFailure::Encoder {
            format: OutputFormat::Jpeg,
            reason: e.to_string(),
        })?;
    Ok(out)
}

fn encode_webp(surface: &RgbaImage, quality: Quality) -> Result<Vec<u8>, EncodeFailure> {
    let encoder = webp::Encoder::from_rgba(surface.as_raw(), surface.width(), surface.height());
    let encoded = encoder
        .encode_simple(false, quality.fraction() * 100.0)
        .map_err(|e| EncodeFailure::Encoder {
            format: OutputFormat::WebP,
            reason: format!("{e:?}"),
        })?;
    Ok(encoded.to_vec())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = open(source)?.into_dimensions().map_err(decode_error)?;
        Ok(Dimensions { width, height })
    }

    fn reencode(&self, source: &[u8], request: &EncodingRequest) -> Result<Vec<u8>, BackendError> {
        let dims = self.identify(source)?;
        let img = decode(source, dims, self.max_pixels)?;
        let bytes = match rasterize(&img, request.format, self.max_pixels)? {
            Surface::Rgb(rgb) => encode_jpeg(&rgb, request.quality)?,
            Surface::Rgba(rgba) => encode_webp(&rgba, request.quality)?,
        };
        Ok(bytes)
    }
}
