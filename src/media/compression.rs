use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::PickerOptions;
use crate::exif;
use crate::storage::TempStore;

/// A recompressed image written to the scratch directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub size: u64,
}

impl CompressedImage {
    pub fn mime(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Shrink to fit `max_width` first, then `max_height`, keeping the ratio.
///
/// A zero limit means unbounded on that axis. Never upscales and never
/// returns a zero dimension.
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (mut w, mut h) = (width as f64, height as f64);

    if max_width > 0 && w > max_width as f64 {
        h *= max_width as f64 / w;
        w = max_width as f64;
    }
    if max_height > 0 && h > max_height as f64 {
        w *= max_height as f64 / h;
        h = max_height as f64;
    }

    ((w as u32).max(1), (h as u32).max(1))
}

/// Rotate/flip pixels so an image with the given EXIF orientation displays upright.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Encode as baseline JPEG at the given quality (0–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let (width, height) = img.dimensions();

    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
    encoder
        .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .context("JPEG encoding failed")?;

    Ok(output)
}

fn load_upright(path: &Path) -> Result<DynamicImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_guessed_format()
        .context("Failed to detect image format")?
        .decode()
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    Ok(match exif::read_orientation(path) {
        Some(o) if o > 1 => {
            log::debug!("Applying EXIF orientation {o} to {}", path.display());
            apply_orientation(img, o)
        }
        _ => img,
    })
}

fn write_jpeg(img: &DynamicImage, quality: u8, store: &TempStore) -> Result<CompressedImage> {
    let bytes = encode_jpeg(img, quality)?;
    let path = store.persist(&bytes, "jpg")?;
    Ok(CompressedImage {
        path,
        width: img.width(),
        height: img.height(),
        size: bytes.len() as u64,
    })
}

/// Resize to the configured maximum bounds and recompress as JPEG.
pub fn compress_image(
    path: &Path,
    options: &PickerOptions,
    store: &TempStore,
) -> Result<CompressedImage> {
    let img = load_upright(path)?;
    let (w, h) = target_dimensions(
        img.width(),
        img.height(),
        options.compress_image_max_width,
        options.compress_image_max_height,
    );

    let img = if (w, h) != img.dimensions() {
        log::debug!("Resizing {}x{} -> {w}x{h}", img.width(), img.height());
        img.resize_exact(w, h, FilterType::Triangle)
    } else {
        img
    };

    write_jpeg(&img, options.jpeg_quality(), store)
}

/// Scale a cropped image to exactly `width` x `height` at full quality.
pub fn resize_to_size(
    path: &Path,
    width: u32,
    height: u32,
    store: &TempStore,
) -> Result<CompressedImage> {
    let img = load_upright(path)?;
    let img = if (width, height) != img.dimensions() {
        log::debug!("Resizing crop {}x{} -> {width}x{height}", img.width(), img.height());
        img.resize_exact(width.max(1), height.max(1), FilterType::Lanczos3)
    } else {
        img
    };
    write_jpeg(&img, 100, store)
}

/// Video "compression" hands the original file through unchanged.
pub fn compress_video(path: &Path, preset: &str) -> PathBuf {
    log::debug!(
        "Video preset {preset} requested for {}, passing file through",
        path.display()
    );
    path.to_path_buf()
}
