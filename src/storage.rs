use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, PickerError, PickerResult};
use crate::item::strip_file_scheme;

/// Name of the scratch folder created under the temp root.
pub const TMP_DIR_NAME: &str = "cropping-image-picker";

/// Shared, append-only scratch directory for produced files.
///
/// Files get random UUID names and are only removed by [`clean`](Self::clean)
/// or [`clean_single`](Self::clean_single).
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(TMP_DIR_NAME),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The scratch directory, created if missing.
    pub fn ensure_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        Ok(&self.dir)
    }

    /// A fresh random path with the given extension. Nothing is written.
    pub fn fresh_path(&self, extension: &str) -> Result<PathBuf> {
        let dir = self.ensure_dir()?;
        Ok(dir.join(format!("{}.{extension}", uuid::Uuid::new_v4())))
    }

    /// Write bytes under a fresh random name.
    pub fn persist(&self, bytes: &[u8], extension: &str) -> Result<PathBuf> {
        let path = self.fresh_path(extension)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Persisted {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Remove everything inside the scratch directory.
    pub fn clean(&self) -> PickerResult<()> {
        if !self.dir.exists() {
            return Err(PickerError::new(ErrorKind::CleanupError, "File does not exist"));
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            log::warn!("Failed to list {}: {e}", self.dir.display());
            PickerError::of(ErrorKind::CleanupError)
        })?;

        for entry in entries {
            let path = entry
                .map_err(|_| PickerError::of(ErrorKind::CleanupError))?
                .path();
            if let Err(e) = remove_path(&path) {
                log::warn!("Failed to remove {}: {e:#}", path.display());
                return Err(PickerError::of(ErrorKind::CleanupError));
            }
        }
        log::info!("Cleaned {}", self.dir.display());
        Ok(())
    }

    /// Remove one file or directory; `file://` URIs are accepted.
    pub fn clean_single(&self, path: &str) -> PickerResult<()> {
        if path.is_empty() {
            return Err(PickerError::new(
                ErrorKind::CleanupError,
                "Cannot cleanup empty path",
            ));
        }
        let path = Path::new(strip_file_scheme(path));
        if !path.exists() {
            return Err(PickerError::new(
                ErrorKind::CleanupError,
                format!("File does not exist. Path: {}", path.display()),
            ));
        }
        remove_path(path).map_err(|e| PickerError::from_anyhow(ErrorKind::CleanupError, &e))
    }
}

fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
    .with_context(|| format!("Failed to remove {}", path.display()))
}
