use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Stable error kinds surfaced to the caller.
///
/// Every kind carries a stable code (e.g. `"E_PICKER_CANCELLED"`) that callers
/// branch on, and a static default message. The message attached to a
/// [`PickerError`] may be more specific than the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Cancelled,
    NoCameraPermission,
    NoLibraryPermission,
    NotGrantedAccess,
    ActivityDoesNotExist,
    CameraUnavailable,
    CannotLaunchCamera,
    FailedToOpenCamera,
    FailedToShowPicker,
    NoImageDataFound,
    CannotSaveImage,
    CannotProcessVideo,
    CleanupError,
    CropperImageNotFound,
    CallbackError,
    /// The session was replaced by a newer `begin()` before it finished.
    Superseded,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 16] = [
        ErrorKind::Cancelled,
        ErrorKind::NoCameraPermission,
        ErrorKind::NoLibraryPermission,
        ErrorKind::NotGrantedAccess,
        ErrorKind::ActivityDoesNotExist,
        ErrorKind::CameraUnavailable,
        ErrorKind::CannotLaunchCamera,
        ErrorKind::FailedToOpenCamera,
        ErrorKind::FailedToShowPicker,
        ErrorKind::NoImageDataFound,
        ErrorKind::CannotSaveImage,
        ErrorKind::CannotProcessVideo,
        ErrorKind::CleanupError,
        ErrorKind::CropperImageNotFound,
        ErrorKind::CallbackError,
        ErrorKind::Superseded,
    ];

    /// The stable code string callers branch on.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Cancelled => "E_PICKER_CANCELLED",
            ErrorKind::NoCameraPermission => "E_NO_CAMERA_PERMISSION",
            ErrorKind::NoLibraryPermission => "E_NO_LIBRARY_PERMISSION",
            ErrorKind::NotGrantedAccess => "E_NOT_GRANTED_ACCESS",
            ErrorKind::ActivityDoesNotExist => "E_ACTIVITY_DOES_NOT_EXIST",
            ErrorKind::CameraUnavailable => "E_CAMERA_IS_NOT_AVAILABLE",
            ErrorKind::CannotLaunchCamera => "E_CANNOT_LAUNCH_CAMERA",
            ErrorKind::FailedToOpenCamera => "E_FAILED_TO_OPEN_CAMERA",
            ErrorKind::FailedToShowPicker => "E_FAILED_TO_SHOW_PICKER",
            ErrorKind::NoImageDataFound => "E_NO_IMAGE_DATA_FOUND",
            ErrorKind::CannotSaveImage => "E_CANNOT_SAVE_IMAGE",
            ErrorKind::CannotProcessVideo => "E_CANNOT_PROCESS_VIDEO",
            ErrorKind::CleanupError => "E_ERROR_WHILE_CLEANING_FILES",
            ErrorKind::CropperImageNotFound => "E_CROPPER_IMAGE_NOT_FOUND",
            ErrorKind::CallbackError => "E_CALLBACK_ERROR",
            ErrorKind::Superseded => "E_SUPERSEDED",
        }
    }

    /// Default human-readable message for this kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Cancelled => "User cancelled image selection",
            ErrorKind::NoCameraPermission => "User did not grant camera permission.",
            ErrorKind::NoLibraryPermission => "User did not grant library permission.",
            ErrorKind::NotGrantedAccess => {
                "User has selected assets that have not been granted access."
            }
            ErrorKind::ActivityDoesNotExist => "Activity doesn't exist",
            ErrorKind::CameraUnavailable => "Camera not available",
            ErrorKind::CannotLaunchCamera => "Cannot launch camera",
            ErrorKind::FailedToOpenCamera => "Failed to open camera",
            ErrorKind::FailedToShowPicker => "Failed to show picker",
            ErrorKind::NoImageDataFound => "Cannot find image data",
            ErrorKind::CannotSaveImage => "Cannot save image. Unable to write to tmp location.",
            ErrorKind::CannotProcessVideo => "Cannot process video data",
            ErrorKind::CleanupError => "Error while cleaning up tmp files",
            ErrorKind::CropperImageNotFound => "Can't find the image at the specified path",
            ErrorKind::CallbackError => "Unknown error",
            ErrorKind::Superseded => "Request superseded by a newer request",
        }
    }

    /// Look a kind up by its stable code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// The single rejection a caller receives for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct PickerError {
    #[serde(rename = "code")]
    pub kind: ErrorKind,
    pub message: String,
}

impl PickerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error carrying the kind's default message.
    pub fn of(kind: ErrorKind) -> Self {
        Self::new(kind, kind.message())
    }

    /// Wrap an internal `anyhow` failure under a caller-facing kind.
    pub fn from_anyhow(kind: ErrorKind, err: &anyhow::Error) -> Self {
        Self::new(kind, format!("{err:#}"))
    }
}

impl From<ErrorKind> for PickerError {
    fn from(kind: ErrorKind) -> Self {
        Self::of(kind)
    }
}

pub type PickerResult<T> = Result<T, PickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn from_code_finds_every_kind() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("E_NOPE"), None);
    }

    #[test]
    fn default_message_used_by_of() {
        let err = PickerError::of(ErrorKind::Cancelled);
        assert_eq!(err.message, "User cancelled image selection");
        assert_eq!(err.to_string(), "E_PICKER_CANCELLED: User cancelled image selection");
    }

    #[test]
    fn missing_host_activity() {
        let err = PickerError::of(ErrorKind::ActivityDoesNotExist);
        assert_eq!(err.kind.code(), "E_ACTIVITY_DOES_NOT_EXIST");
        assert_eq!(err.message, "Activity doesn't exist");
    }

    #[test]
    fn serializes_code_and_message() {
        let err = PickerError::new(ErrorKind::NoImageDataFound, "x");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["message"], "x");
        assert_eq!(json["code"], "E_NO_IMAGE_DATA_FOUND");
    }

    #[test]
    fn anyhow_chain_is_flattened() {
        let err = anyhow::anyhow!("inner").context("outer");
        let picked = PickerError::from_anyhow(ErrorKind::CannotSaveImage, &err);
        assert_eq!(picked.message, "outer: inner");
    }
}
