use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Crop rectangle reported by the crop host, in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Normalized description of one selected or produced media asset.
///
/// This is the single result shape every operation resolves with. Optional
/// fields are omitted from the serialized form when absent, so a caller
/// only sees `data`, `exif` and `cropRect` when they were requested or
/// produced.
///
/// # Example
///
/// ```rust
/// use cropping_picker::item::MediaItem;
///
/// let item = MediaItem::new("/tmp/a.jpg", 640, 480, "image/jpeg");
/// assert_eq!(item.path, "file:///tmp/a.jpg");
/// let json = serde_json::to_value(&item).unwrap();
/// assert!(json.get("data").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// `file://` URI of the local file.
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Base64 of the file bytes, only with `includeBase64`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Only with `includeExif`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_rect: Option<CropRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    /// Milliseconds, video only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(rename = "sourceURL", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_identifier: Option<String>,
}

impl MediaItem {
    /// Build an item with the required fields; `path` is turned into a `file://` URI.
    pub fn new(path: impl AsRef<Path>, width: u32, height: u32, mime: impl Into<String>) -> Self {
        Self {
            path: file_uri(path.as_ref()),
            width,
            height,
            mime: mime.into(),
            size: None,
            data: None,
            exif: None,
            crop_rect: None,
            filename: None,
            creation_date: None,
            modification_date: None,
            duration: None,
            source_url: None,
            local_identifier: None,
        }
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }

    /// Local filesystem path behind `path`.
    pub fn local_path(&self) -> &str {
        strip_file_scheme(&self.path)
    }
}

/// Payload delivered on resolution: a bare item in single mode, the ordered
/// sequence in multiple mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Single(MediaItem),
    Multiple(Vec<MediaItem>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Multiple(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_items(self) -> Vec<MediaItem> {
        match self {
            Payload::Single(item) => vec![item],
            Payload::Multiple(items) => items,
        }
    }

    /// The single item, if this is a single-mode payload.
    pub fn into_single(self) -> Option<MediaItem> {
        match self {
            Payload::Single(item) => Some(item),
            Payload::Multiple(_) => None,
        }
    }
}

pub(crate) fn file_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.starts_with("file://") {
        s.into_owned()
    } else {
        format!("file://{s}")
    }
}

pub(crate) fn strip_file_scheme(path: &str) -> &str {
    path.strip_prefix("file://").unwrap_or(path)
}

/// Epoch seconds as a string, the way dates travel in the response.
pub(crate) fn epoch_string(time: SystemTime) -> Option<String> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs().to_string())
}
