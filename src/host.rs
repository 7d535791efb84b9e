//! Host-provided collaborators.
//!
//! The picker never draws UI itself. Presenting the media library, the
//! camera and the crop view, answering permission prompts and probing video
//! files are host capabilities, plugged in through these traits.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::{CropPresentation, MediaType};
use crate::item::CropRect;

/// A raw media reference as returned by a selection host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaRef {
    /// Local path, `file://` URI, or remote URL (rejected during normalization).
    pub uri: String,
    pub source_url: Option<String>,
    pub local_identifier: Option<String>,
    pub filename: Option<String>,
    pub creation_date: Option<SystemTime>,
}

impl MediaRef {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            uri: path.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Library,
    Camera,
}

/// What the selection host is asked to present.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub source: SelectionSource,
    pub multiple: bool,
    pub media_type: MediaType,
    /// Restrict to croppable still formats (JPEG/PNG).
    pub crop_formats_only: bool,
    pub min_files: u32,
    pub max_files: u32,
    pub use_front_camera: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Cancelled,
    Selected(Vec<MediaRef>),
}

/// Presents the media library or the camera.
#[async_trait::async_trait]
pub trait SelectionHost: Send + Sync {
    /// Whether a foreground UI context exists to present from.
    fn is_available(&self) -> bool {
        true
    }

    /// Present the picker/camera and wait for the user.
    ///
    /// An `Err` means the UI could not be shown at all.
    async fn present(&self, request: &SelectionRequest) -> Result<Selection>;
}

/// What the crop host is asked to present.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    pub source: PathBuf,
    /// Where the host should write the cropped JPEG.
    pub output: PathBuf,
    pub presentation: CropPresentation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CropOutcome {
    Cancelled,
    Cropped { path: PathBuf, rect: CropRect },
}

/// Presents the crop UI for exactly one image.
#[async_trait::async_trait]
pub trait CropHost: Send + Sync {
    async fn crop(&self, request: &CropRequest) -> Result<CropOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    Library,
}

/// Library access level reported by [`PermissionHost::access_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    Full,
    Limited,
    Denied,
    Unknown,
    Forbidden,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Full => "full",
            AccessStatus::Limited => "limited",
            AccessStatus::Denied => "denied",
            AccessStatus::Unknown => "unknown",
            AccessStatus::Forbidden => "forbidden",
        }
    }
}

#[async_trait::async_trait]
pub trait PermissionHost: Send + Sync {
    /// Check, prompting if needed. `true` when granted.
    async fn request(&self, permission: Permission) -> bool;

    fn camera_available(&self) -> bool;

    async fn access_status(&self) -> AccessStatus;
}

/// Grants everything; for desktop use where no permission model applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait::async_trait]
impl PermissionHost for AllowAll {
    async fn request(&self, _permission: Permission) -> bool {
        true
    }

    fn camera_available(&self) -> bool {
        true
    }

    async fn access_status(&self) -> AccessStatus {
        AccessStatus::Full
    }
}

/// Representative frame bounds and duration of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration_ms: Option<u64>,
}

/// Extracts a representative frame's bounds and the duration of a video.
///
/// Called from a blocking worker, never on the async executor.
pub trait VideoProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<VideoInfo>;
}

/// Used when the host provides no video support; every probe fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVideoProbe;

impl VideoProbe for NoVideoProbe {
    fn probe(&self, path: &Path) -> Result<VideoInfo> {
        anyhow::bail!("Cannot retrieve video data for {}", path.display())
    }
}
