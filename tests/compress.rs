//! End-to-end re-encoding with the real backend: config file on disk, source
//! image on disk, output decoded again to check what was written.

use image::{GenericImageView, ImageFormat};
use imgdesk::config;
use imgdesk::imaging::{
    EncodingRequest, ImageAsset, OutputFormat, Quality, RustBackend, compress,
};
use imgdesk::output::default_output_path;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_source(dir: &Path, name: &str, format: ImageFormat) -> std::path::PathBuf {
    let img = image::RgbaImage::from_fn(320, 240, |x, y| {
        let alpha = if x < 160 && y < 120 { 0 } else { 255 };
        image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, alpha])
    });
    let path = dir.join(name);
    match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .save_with_format(&path, format)
            .unwrap(),
        _ => img.save_with_format(&path, format).unwrap(),
    }
    path
}

fn run(path: &Path, quality: Quality) -> (ImageAsset, EncodingRequest, Vec<u8>) {
    let backend = RustBackend::new();
    let declared = ImageFormat::from_path(path).ok().map(|f| f.to_mime_type());
    let asset = ImageAsset::decode(&backend, fs::read(path).unwrap(), declared).unwrap();
    let request = EncodingRequest::for_source(asset.mime(), quality);
    let result = compress(&backend, &asset, &request).unwrap();
    assert_eq!(result.dimensions, asset.dimensions());
    (asset, request, result.bytes)
}

#[test]
fn png_source_becomes_webp_with_alpha_and_same_size() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "fox.png", ImageFormat::Png);

    let (asset, request, bytes) = run(&source, Quality::new(80));
    assert_eq!(asset.mime(), "image/png");
    assert_eq!(request.format, OutputFormat::WebP);
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    let out_path = default_output_path(&source, request.format);
    assert_eq!(out_path, tmp.path().join("fox.min.webp"));
    fs::write(&out_path, &bytes).unwrap();

    let decoded = image::open(&out_path).unwrap();
    assert_eq!(decoded.dimensions(), (320, 240));
    assert!(decoded.color().has_alpha());
    assert!(decoded.to_rgba8().get_pixel(0, 0)[3] < 16);
}

#[test]
fn jpeg_source_stays_jpeg() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "scan.jpg", ImageFormat::Jpeg);

    let (_, request, bytes) = run(&source, Quality::new(55));
    assert_eq!(request.format, OutputFormat::Jpeg);
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (320, 240));
}

#[test]
fn out_of_range_quality_still_encodes() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "edge.png", ImageFormat::Png);

    for raw in [-5, 0, 1, 100, 250] {
        let (_, request, bytes) = run(&source, Quality::new(raw));
        assert!((1..=100).contains(&request.quality.value()));
        assert!(!bytes.is_empty());
    }
}

#[test]
fn quality_from_config_file() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config.toml");
    fs::write(&config_path, "[compress]\nquality = 140\n").unwrap();

    let config = config::load_config(Some(&config_path)).unwrap();
    assert_eq!(config.compress.quality.value(), 100);
    assert_eq!(config.server.bind, "127.0.0.1:3000");
}

#[test]
fn surface_budget_rejects_large_images() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "big.png", ImageFormat::Png);

    let backend = RustBackend::with_max_pixels(1000);
    let asset = ImageAsset::decode(&backend, fs::read(&source).unwrap(), None).unwrap();
    let request = EncodingRequest::for_source(asset.mime(), Quality::default());
    let err = compress(&backend, &asset, &request).unwrap_err();
    assert!(err.to_string().contains("320"), "{err}");
}
