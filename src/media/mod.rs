//! Media normalization: from a raw [`MediaRef`] to a [`MediaItem`].
//!
//! Resolves the local path, determines the MIME type, validates image
//! bounds, runs compression, and attaches base64 data and EXIF when asked.

pub mod compression;

use anyhow::{Context, Result};
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::config::PickerOptions;
use crate::error::{ErrorKind, PickerError, PickerResult};
use crate::exif;
use crate::host::{MediaRef, VideoProbe};
use crate::item::{CropRect, MediaItem, epoch_string, strip_file_scheme};
use crate::storage::TempStore;

/// Broad kind of a media file, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Gif,
    Video,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime == "image/gif" {
            Some(Self::Gif)
        } else if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// MIME type from a file extension.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "3gp" => "video/3gpp",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => return None,
    };
    Some(mime)
}

/// MIME type from the leading byte of image data.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes.first()? {
        0xFF => Some("image/jpeg"),
        0x89 => Some("image/png"),
        0x47 => Some("image/gif"),
        0x49 | 0x4D => Some("image/tiff"),
        0x00 => Some("image/heic"),
        _ => None,
    }
}

/// Extension first, then content sniffing.
pub fn detect_mime(path: &Path) -> Result<String> {
    if let Some(mime) = mime_from_extension(path) {
        return Ok(mime.to_string());
    }
    let mut head = [0u8; 1];
    let n = {
        use std::io::Read;
        let mut f = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        f.read(&mut head).context("Failed to read file header")?
    };
    sniff_mime(&head[..n])
        .map(str::to_string)
        .with_context(|| format!("Unknown media type: {}", path.display()))
}

/// Resolve a media reference to an existing local file.
pub fn resolve_local_path(uri: &str) -> Result<PathBuf> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        anyhow::bail!("Cannot select remote files");
    }
    let path = PathBuf::from(strip_file_scheme(uri));
    if !path.is_file() {
        anyhow::bail!("File does not exist. Path: {}", path.display());
    }
    Ok(path)
}

/// Width and height of an image without decoding its pixels.
pub fn decode_bounds(path: &Path) -> Result<(u32, u32)> {
    let (w, h) = image::ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_guessed_format()
        .context("Failed to detect image format")?
        .into_dimensions()
        .context("Invalid image selected")?;
    if w == 0 || h == 0 {
        anyhow::bail!("Invalid image selected");
    }
    Ok((w, h))
}

fn base64_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn created(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.created()).ok()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Metadata about the original selection, carried from the pick step into
/// the crop step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CropSource {
    pub path: PathBuf,
    pub source_url: Option<String>,
    pub local_identifier: Option<String>,
    pub filename: Option<String>,
    pub creation_date: Option<SystemTime>,
    pub modification_date: Option<SystemTime>,
}

impl CropSource {
    pub fn new(path: &Path, media: &MediaRef) -> Self {
        Self {
            path: path.to_path_buf(),
            source_url: media.source_url.clone(),
            local_identifier: media.local_identifier.clone(),
            filename: media.filename.clone().or_else(|| file_name(path)),
            creation_date: media.creation_date.or_else(|| created(path)),
            modification_date: modified(path),
        }
    }
}

/// Turns raw media references into response items.
///
/// All methods block on file I/O and image decoding; the adapter runs them
/// on blocking workers.
pub struct MediaNormalizer {
    store: TempStore,
    video: Arc<dyn VideoProbe>,
}

impl MediaNormalizer {
    pub fn new(store: TempStore, video: Arc<dyn VideoProbe>) -> Self {
        Self { store, video }
    }

    pub fn store(&self) -> &TempStore {
        &self.store
    }

    /// Normalize one selected or captured media file.
    pub fn process(&self, media: &MediaRef, options: &PickerOptions) -> PickerResult<MediaItem> {
        let path = resolve_local_path(&media.uri)
            .map_err(|e| PickerError::from_anyhow(ErrorKind::NoImageDataFound, &e))?;
        let mime = detect_mime(&path)
            .map_err(|e| PickerError::from_anyhow(ErrorKind::NoImageDataFound, &e))?;

        let mut item = match MediaKind::from_mime(&mime) {
            Some(MediaKind::Video) => self.process_video(&path, &mime, options)?,
            Some(kind) => self.process_image(&path, &mime, kind, options)?,
            None => {
                return Err(PickerError::new(
                    ErrorKind::NoImageDataFound,
                    format!("Unsupported media type {mime}"),
                ));
            }
        };

        item.source_url = media.source_url.clone();
        item.local_identifier = media.local_identifier.clone();
        if let Some(name) = &media.filename {
            item.filename = Some(name.clone());
        }
        if let Some(created) = media.creation_date {
            item.creation_date = epoch_string(created);
        }
        Ok(item)
    }

    fn process_image(
        &self,
        path: &Path,
        mime: &str,
        kind: MediaKind,
        options: &PickerOptions,
    ) -> PickerResult<MediaItem> {
        let (orig_w, orig_h) = decode_bounds(path)
            .map_err(|e| PickerError::from_anyhow(ErrorKind::NoImageDataFound, &e))?;

        let mut item = if kind != MediaKind::Gif || options.force_jpg {
            let out = compression::compress_image(path, options, &self.store)
                .map_err(|e| PickerError::from_anyhow(ErrorKind::CannotSaveImage, &e))?;
            let mut item = MediaItem::new(&out.path, out.width, out.height, out.mime());
            item.size = Some(out.size);
            item
        } else {
            let mut item = MediaItem::new(path, orig_w, orig_h, mime);
            item.size = std::fs::metadata(path).map(|m| m.len()).ok();
            item
        };

        item.filename = file_name(path);
        item.modification_date = modified(path).and_then(epoch_string);
        item.creation_date = created(path).and_then(epoch_string);

        if options.include_base64 {
            item.data = Some(
                base64_file(Path::new(item.local_path()))
                    .map_err(|e| PickerError::from_anyhow(ErrorKind::NoImageDataFound, &e))?,
            );
        }
        if options.include_exif {
            item.exif = read_exif_lenient(path);
        }
        Ok(item)
    }

    fn process_video(
        &self,
        path: &Path,
        mime: &str,
        options: &PickerOptions,
    ) -> PickerResult<MediaItem> {
        let output = compression::compress_video(path, &options.compress_video_preset);
        let info = self
            .video
            .probe(&output)
            .map_err(|e| PickerError::from_anyhow(ErrorKind::CannotProcessVideo, &e))?;

        let mut item = MediaItem::new(&output, info.width, info.height, mime);
        item.size = std::fs::metadata(&output).map(|m| m.len()).ok();
        item.duration = Some(info.duration_ms.unwrap_or(0));
        item.filename = file_name(&output);
        item.modification_date = modified(&output).and_then(epoch_string);
        item.creation_date = created(&output).and_then(epoch_string);
        Ok(item)
    }

    /// Convert a GIF to JPEG so the crop host can work on it.
    pub fn prepare_for_crop(&self, path: &Path, options: &PickerOptions) -> PickerResult<PathBuf> {
        let mime = detect_mime(path)
            .map_err(|e| PickerError::from_anyhow(ErrorKind::CropperImageNotFound, &e))?;
        match MediaKind::from_mime(&mime) {
            Some(MediaKind::Video) | None => Err(PickerError::new(
                ErrorKind::NoImageDataFound,
                "Cannot crop video files",
            )),
            Some(MediaKind::Gif) if options.force_jpg => {
                let out = compression::compress_image(path, options, &self.store)
                    .map_err(|e| PickerError::from_anyhow(ErrorKind::CannotSaveImage, &e))?;
                Ok(out.path)
            }
            Some(_) => Ok(path.to_path_buf()),
        }
    }

    /// Build the response for an image produced by the crop host.
    pub fn process_cropped(
        &self,
        cropped: &Path,
        rect: CropRect,
        source: &CropSource,
        options: &PickerOptions,
    ) -> PickerResult<MediaItem> {
        let out = if options.has_target_size() {
            compression::resize_to_size(cropped, options.width, options.height, &self.store)
        } else {
            compression::compress_image(cropped, options, &self.store)
        }
        .map_err(|e| PickerError::from_anyhow(ErrorKind::CannotSaveImage, &e))?;

        let mut item = MediaItem::new(&out.path, out.width, out.height, out.mime());
        item.size = Some(out.size);
        item.crop_rect = Some(rect);
        item.source_url = source.source_url.clone();
        item.local_identifier = source.local_identifier.clone();
        item.filename = source.filename.clone();
        item.creation_date = source.creation_date.and_then(epoch_string);
        item.modification_date = source.modification_date.and_then(epoch_string);

        if options.include_base64 {
            item.data = Some(
                base64_file(&out.path)
                    .map_err(|e| PickerError::from_anyhow(ErrorKind::CannotSaveImage, &e))?,
            );
        }
        if options.include_exif {
            item.exif = read_exif_lenient(&source.path);
        }
        Ok(item)
    }
}

/// EXIF failures never fail the item; they are logged and the map omitted.
fn read_exif_lenient(path: &Path) -> Option<exif::ExifMap> {
    match exif::read_exif(path) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("Failed to read EXIF from {}: {e:#}", path.display());
            None
        }
    }
}

fn is_supported_media(path: &Path) -> bool {
    mime_from_extension(path).is_some()
}

/// Collect supported media files from the given paths.
///
/// Directories are walked recursively (following symlinks); files with
/// unknown extensions are skipped.
pub fn collect_media(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut media = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_media(path) {
                media.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_media(p) {
                    media.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    media
}
