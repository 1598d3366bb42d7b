//! High-level re-encode operations.
//!
//! These functions combine the parameter policy with backend execution: decode
//! an [`ImageAsset`], run one [`compress`], get one [`EncodingResult`].

use super::backend::{BackendError, Dimensions, EncodeFailure, ImageBackend};
use super::calculations::{reduction_percent, size_reduction_ratio};
use super::params::{EncodingRequest, OutputFormat};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// A user-supplied image: raw bytes, MIME type and pixel dimensions.
///
/// Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    mime: String,
    dimensions: Dimensions,
}

impl ImageAsset {
    /// Identify `bytes` with the backend.
    ///
    /// A missing or blank `declared_mime` is replaced by the type sniffed from
    /// the magic bytes.
    pub fn decode(
        backend: &impl ImageBackend,
        bytes: Vec<u8>,
        declared_mime: Option<&str>,
    ) -> Result<Self> {
        let dimensions = backend.identify(&bytes)?;
        let mime = match declared_mime.map(str::trim).filter(|m| !m.is_empty()) {
            Some(mime) => mime.to_string(),
            None => sniff_mime(&bytes)?,
        };
        Ok(Self {
            bytes,
            mime,
            dimensions,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn sniff_mime(bytes: &[u8]) -> Result<String> {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Output of one re-encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingResult {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Always the source dimensions.
    pub dimensions: Dimensions,
    pub source_size: u64,
}

impl EncodingResult {
    pub fn mime(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// `1 - output/source`, floored at 0.
    pub fn reduction_ratio(&self) -> f64 {
        size_reduction_ratio(self.source_size, self.size())
    }

    /// Whole-percent reduction, floored at 0.
    pub fn reduction_percent(&self) -> u32 {
        reduction_percent(self.source_size, self.size())
    }
}

/// Re-encode `asset` as described by `request`.
///
/// Produces exactly one result or fails; a failure is terminal for the
/// request.
pub fn compress(
    backend: &impl ImageBackend,
    asset: &ImageAsset,
    request: &EncodingRequest,
) -> Result<EncodingResult> {
    let bytes = backend.reencode(asset.bytes(), request)?;
    if bytes.is_empty() {
        return Err(EncodeFailure::EmptyOutput.into());
    }

    Ok(EncodingResult {
        bytes,
        format: request.format,
        dimensions: asset.dimensions(),
        source_size: asset.size(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Quality, RustBackend};
    use crate::test_helpers::{jpeg_bytes, png_bytes, png_header_bytes};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn decode_uses_declared_mime() {
        let backend = MockBackend::with_dimensions(vec![dims(10, 10)]);
        let asset = ImageAsset::decode(&backend, vec![1, 2, 3], Some("image/png")).unwrap();
        assert_eq!(asset.mime(), "image/png");
        assert_eq!(asset.dimensions(), dims(10, 10));
        assert_eq!(asset.size(), 3);
    }

    #[test]
    fn decode_sniffs_missing_mime() {
        let backend = RustBackend::new();
        let asset = ImageAsset::decode(&backend, jpeg_bytes(16, 8), None).unwrap();
        assert_eq!(asset.mime(), "image/jpeg");
        assert_eq!(asset.dimensions(), dims(16, 8));

        let asset = ImageAsset::decode(&backend, png_bytes(4, 4), Some("  ")).unwrap();
        assert_eq!(asset.mime(), "image/png");
    }

    #[test]
    fn decode_propagates_backend_error() {
        let backend = MockBackend::new();
        let result = ImageAsset::decode(&backend, vec![0; 8], Some("image/png"));
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn compress_passes_request_to_backend() {
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]).with_output(vec![7; 40]);
        let asset = ImageAsset::decode(&backend, vec![0; 100], Some("image/png")).unwrap();
        let request = EncodingRequest::for_source(asset.mime(), Quality::new(500));

        let result = compress(&backend, &asset, &request).unwrap();

        assert_eq!(result.format, OutputFormat::WebP);
        assert_eq!(result.mime(), "image/webp");
        assert_eq!(result.size(), 40);
        assert_eq!(result.reduction_percent(), 60);
        assert_eq!(
            backend.get_operations()[1],
            RecordedOp::Reencode {
                len: 100,
                format: OutputFormat::WebP,
                quality: 100,
            }
        );
    }

    #[test]
    fn compress_empty_output_is_a_failure() {
        let backend = MockBackend::with_dimensions(vec![dims(2, 2)]);
        let asset = ImageAsset::decode(&backend, vec![0; 8], Some("image/jpeg")).unwrap();
        let request = EncodingRequest::for_source(asset.mime(), Quality::default());

        let result = compress(&backend, &asset, &request);
        assert!(matches!(
            result,
            Err(BackendError::Encode(EncodeFailure::EmptyOutput))
        ));
    }

    #[test]
    fn compress_larger_output_reports_zero_reduction() {
        let backend = MockBackend::with_dimensions(vec![dims(2, 2)]).with_output(vec![1; 64]);
        let asset = ImageAsset::decode(&backend, vec![0; 16], Some("image/jpeg")).unwrap();
        let request = EncodingRequest::for_source(asset.mime(), Quality::default());

        let result = compress(&backend, &asset, &request).unwrap();
        assert_eq!(result.reduction_percent(), 0);
        assert_eq!(result.reduction_ratio(), 0.0);
    }

    #[test]
    fn png_800x600_quality_80_scenario() {
        let backend = RustBackend::new();
        let asset = ImageAsset::decode(&backend, png_bytes(800, 600), Some("image/png")).unwrap();
        let request = EncodingRequest::for_source(asset.mime(), Quality::new(80));

        let result = compress(&backend, &asset, &request).unwrap();

        assert_eq!(result.format, OutputFormat::WebP);
        assert_eq!(result.dimensions, dims(800, 600));
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));

        let expected = (100
            - (result.size() as f64 / asset.size() as f64 * 100.0).round() as i64)
            .max(0) as u32;
        assert_eq!(result.reduction_percent(), expected);
    }

    #[test]
    fn jpeg_source_stays_jpeg() {
        let backend = RustBackend::new();
        let asset = ImageAsset::decode(&backend, jpeg_bytes(300, 200), None).unwrap();
        let request = EncodingRequest::for_source(asset.mime(), Quality::new(-20));

        let result = compress(&backend, &asset, &request).unwrap();
        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(result.dimensions, asset.dimensions());
    }

    #[test]
    fn oversized_source_is_surface_unavailable() {
        let backend = RustBackend::new();
        let asset = ImageAsset::decode(&backend, png_header_bytes(20_000, 20_000), None).unwrap();
        assert_eq!(asset.mime(), "image/png");
        let request = EncodingRequest::for_source(asset.mime(), Quality::default());

        let err = compress(&backend, &asset, &request).unwrap_err();
        assert!(matches!(
            err,
            BackendError::Encode(EncodeFailure::SurfaceUnavailable {
                width: 20_000,
                height: 20_000
            })
        ));
    }
}
