//! The caller-facing adapter.
//!
//! A [`Picker`] wires the host collaborators (selection, crop, permissions,
//! video probing) to a [`ResultCollector`]. Every operation begins one
//! session, drives the hosts, dispatches per-item work to blocking workers
//! and then waits for the session's single outcome.
//!
//! ```rust,no_run
//! use cropping_picker::config::Config;
//! use cropping_picker::host::{CropHost, SelectionHost};
//! use cropping_picker::picker::Picker;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     selection: Arc<dyn SelectionHost>,
//! #     cropper: Arc<dyn CropHost>,
//! # ) -> anyhow::Result<()> {
//! let picker = Picker::builder(selection, cropper)
//!     .config(Config::load(None)?)
//!     .build();
//!
//! let payload = picker
//!     .open_picker(&serde_json::json!({ "multiple": true, "includeExif": true }))
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&payload)?);
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::collector::{ResultCollector, Session, SessionMode};
use crate::config::{Config, MediaType, PickerOptions};
use crate::error::{ErrorKind, PickerError, PickerResult};
use crate::host::{
    AccessStatus, AllowAll, CropHost, CropOutcome, CropRequest, MediaRef, NoVideoProbe,
    Permission, PermissionHost, Selection, SelectionHost, SelectionRequest, SelectionSource,
    VideoProbe,
};
use crate::item::{MediaItem, Payload};
use crate::media::{self, MediaKind, MediaNormalizer};
use crate::storage::TempStore;

pub use crate::media::CropSource;

/// Where the adapter currently is in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Idle,
    AwaitingHostSelection,
    AwaitingPerItemProcessing,
    AwaitingCrop,
}

pub struct PickerBuilder {
    config: Config,
    selection: Arc<dyn SelectionHost>,
    cropper: Arc<dyn CropHost>,
    permissions: Arc<dyn PermissionHost>,
    video: Arc<dyn VideoProbe>,
}

impl PickerBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionHost>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn video_probe(mut self, video: Arc<dyn VideoProbe>) -> Self {
        self.video = video;
        self
    }

    pub fn build(self) -> Picker {
        let store = TempStore::new(self.config.tmp_root());
        Picker {
            collector: ResultCollector::with_policy(self.config.supersede_policy),
            normalizer: Arc::new(MediaNormalizer::new(store, self.video)),
            selection: self.selection,
            cropper: self.cropper,
            permissions: self.permissions,
            config: self.config,
            state: Mutex::new(AdapterState::Idle),
            last_crop_source: Mutex::new(None),
        }
    }
}

/// Image/video picker with optional cropping.
pub struct Picker {
    collector: ResultCollector,
    normalizer: Arc<MediaNormalizer>,
    selection: Arc<dyn SelectionHost>,
    cropper: Arc<dyn CropHost>,
    permissions: Arc<dyn PermissionHost>,
    config: Config,
    state: Mutex<AdapterState>,
    last_crop_source: Mutex<Option<CropSource>>,
}

impl Picker {
    /// Start building a picker. Permissions default to [`AllowAll`] and
    /// video probing to [`NoVideoProbe`].
    pub fn builder(selection: Arc<dyn SelectionHost>, cropper: Arc<dyn CropHost>) -> PickerBuilder {
        PickerBuilder {
            config: Config::default(),
            selection,
            cropper,
            permissions: Arc::new(AllowAll),
            video: Arc::new(NoVideoProbe),
        }
    }

    pub fn collector(&self) -> &ResultCollector {
        &self.collector
    }

    pub fn store(&self) -> &TempStore {
        self.normalizer.store()
    }

    pub fn state(&self) -> AdapterState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Only the collector's current session moves the state; a superseded
    /// flow that is still running leaves it alone.
    fn set_state(&self, session: &Session, state: AdapterState) {
        let current = self.collector.current().map(|c| c.id());
        if current == Some(session.id()) {
            *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        }
    }

    /// Metadata of the image most recently handed to the crop host.
    pub fn last_crop_source(&self) -> Option<CropSource> {
        self.last_crop_source
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn options(&self, call: &Value, kind: ErrorKind) -> PickerResult<PickerOptions> {
        self.config
            .options_for(call)
            .map_err(|e| PickerError::from_anyhow(kind, &e))
    }

    // ── operations ───────────────────────────────────────────────────

    /// Pick one or more items from the media library.
    pub async fn open_picker(&self, options: &Value) -> PickerResult<Payload> {
        let opts = self.options(options, ErrorKind::FailedToShowPicker)?;
        if !self.selection.is_available() {
            return Err(PickerError::of(ErrorKind::ActivityDoesNotExist));
        }

        let (session, rx) = self
            .collector
            .begin_channel(SessionMode::from_multiple(opts.multiple));
        if let Err(err) = self.run_picker(&session, &opts).await {
            session.reject(err);
        }
        self.finish(&session, rx).await
    }

    /// Capture a photo or video with the camera.
    pub async fn open_camera(&self, options: &Value) -> PickerResult<MediaItem> {
        let opts = self.options(options, ErrorKind::CannotLaunchCamera)?;
        if !self.selection.is_available() {
            return Err(PickerError::of(ErrorKind::ActivityDoesNotExist));
        }
        if !self.permissions.camera_available() {
            return Err(PickerError::of(ErrorKind::CameraUnavailable));
        }

        let (session, rx) = self.collector.begin_channel(SessionMode::Single);
        if let Err(err) = self.run_camera(&session, &opts).await {
            session.reject(err);
        }
        single_item(self.finish(&session, rx).await?)
    }

    /// Crop an existing image given by the `path` option.
    pub async fn open_cropper(&self, options: &Value) -> PickerResult<MediaItem> {
        let opts = self.options(options, ErrorKind::CropperImageNotFound)?;
        if !self.selection.is_available() {
            return Err(PickerError::of(ErrorKind::ActivityDoesNotExist));
        }

        let (session, rx) = self.collector.begin_channel(SessionMode::Single);
        if let Err(err) = self.run_cropper(&session, &opts).await {
            session.reject(err);
        }
        single_item(self.finish(&session, rx).await?)
    }

    /// Remove every file in the scratch directory.
    pub async fn clean(&self) -> PickerResult<()> {
        self.normalizer.store().clean()
    }

    /// Remove one file produced earlier.
    pub async fn clean_single(&self, path: &str) -> PickerResult<()> {
        self.normalizer.store().clean_single(path)
    }

    pub async fn query_access_status(&self) -> AccessStatus {
        self.permissions.access_status().await
    }

    // ── flows ────────────────────────────────────────────────────────

    async fn run_picker(&self, session: &Arc<Session>, opts: &PickerOptions) -> PickerResult<()> {
        if !self.permissions.request(Permission::Library).await {
            return Err(PickerError::of(ErrorKind::NoLibraryPermission));
        }

        let request = SelectionRequest {
            source: SelectionSource::Library,
            multiple: opts.multiple,
            media_type: if opts.cropping { MediaType::Photo } else { opts.media_type },
            crop_formats_only: opts.cropping,
            min_files: opts.min_files,
            max_files: opts.max_files,
            use_front_camera: false,
        };

        self.set_state(session, AdapterState::AwaitingHostSelection);
        let selection = self.selection.present(&request).await.map_err(|e| {
            log::error!("Failed to present picker: {e:#}");
            PickerError::from_anyhow(ErrorKind::FailedToShowPicker, &e)
        })?;
        let mut refs = match selection {
            Selection::Cancelled => return Err(PickerError::of(ErrorKind::Cancelled)),
            Selection::Selected(refs) => refs,
        };
        log::info!("{} item(s) selected", refs.len());

        if opts.cropping && refs.len() == 1 {
            if let Some(path) = croppable_path(&refs[0]) {
                let media = refs.remove(0);
                if session.mode() == SessionMode::Multiple {
                    session.set_expected_count(1);
                }
                return self.crop(session, path, &media, opts).await;
            }
        }

        match session.mode() {
            SessionMode::Single => {
                if refs.len() > 1 {
                    log::warn!("Single selection returned {} items, using the first", refs.len());
                }
                let media = refs
                    .into_iter()
                    .next()
                    .ok_or_else(|| PickerError::new(ErrorKind::NoImageDataFound, "Cannot resolve image url"))?;
                self.dispatch(session, vec![media], opts);
            }
            SessionMode::Multiple => {
                session.set_expected_count(refs.len());
                self.dispatch(session, refs, opts);
            }
        }
        Ok(())
    }

    async fn run_camera(&self, session: &Arc<Session>, opts: &PickerOptions) -> PickerResult<()> {
        if !self.permissions.request(Permission::Camera).await {
            return Err(PickerError::of(ErrorKind::NoCameraPermission));
        }

        let request = SelectionRequest {
            source: SelectionSource::Camera,
            multiple: false,
            media_type: opts.media_type,
            crop_formats_only: opts.cropping,
            min_files: 0,
            max_files: 1,
            use_front_camera: opts.use_front_camera,
        };

        self.set_state(session, AdapterState::AwaitingHostSelection);
        let selection = self.selection.present(&request).await.map_err(|e| {
            log::error!("Failed to launch camera: {e:#}");
            PickerError::from_anyhow(ErrorKind::CannotLaunchCamera, &e)
        })?;
        let media = match selection {
            Selection::Cancelled => return Err(PickerError::of(ErrorKind::Cancelled)),
            Selection::Selected(refs) => refs.into_iter().next().ok_or_else(|| {
                PickerError::new(ErrorKind::NoImageDataFound, "Cannot resolve image url")
            })?,
        };

        if opts.cropping {
            if let Some(path) = croppable_path(&media) {
                return self.crop(session, path, &media, opts).await;
            }
        }
        self.dispatch(session, vec![media], opts);
        Ok(())
    }

    async fn run_cropper(&self, session: &Arc<Session>, opts: &PickerOptions) -> PickerResult<()> {
        let uri = opts.path.as_deref().unwrap_or_default();
        let path = media::resolve_local_path(uri)
            .map_err(|e| PickerError::from_anyhow(ErrorKind::CropperImageNotFound, &e))?;
        self.crop(session, path, &MediaRef::from_path(uri), opts).await
    }

    /// Normalize each reference on a blocking worker and report into the
    /// session. Results arrive in completion order.
    fn dispatch(&self, session: &Arc<Session>, refs: Vec<MediaRef>, opts: &PickerOptions) {
        self.set_state(session, AdapterState::AwaitingPerItemProcessing);

        for media in refs {
            let session = Arc::clone(session);
            let normalizer = Arc::clone(&self.normalizer);
            let opts = opts.clone();

            tokio::spawn(async move {
                let uri = media.uri.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || normalizer.process(&media, &opts)).await;
                match outcome {
                    Ok(Ok(item)) => session.report_success(item),
                    Ok(Err(err)) => {
                        log::warn!("Failed to process {uri}: {err}");
                        session.reject(err);
                    }
                    Err(e) => session.report_failure(ErrorKind::CallbackError, e.to_string()),
                }
            });
        }
    }

    /// Present the crop host for one image and report the cropped result.
    async fn crop(
        &self,
        session: &Arc<Session>,
        path: PathBuf,
        media: &MediaRef,
        opts: &PickerOptions,
    ) -> PickerResult<()> {
        let source = CropSource::new(&path, media);
        *self
            .last_crop_source
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(source.clone());

        let prepared = {
            let normalizer = Arc::clone(&self.normalizer);
            let opts = opts.clone();
            tokio::task::spawn_blocking(move || normalizer.prepare_for_crop(&path, &opts))
                .await
                .map_err(|e| PickerError::new(ErrorKind::CallbackError, e.to_string()))??
        };
        let output = self
            .normalizer
            .store()
            .fresh_path("jpg")
            .map_err(|e| PickerError::from_anyhow(ErrorKind::CannotSaveImage, &e))?;

        let request = CropRequest {
            source: prepared,
            output,
            presentation: opts.crop_presentation(),
        };

        self.set_state(session, AdapterState::AwaitingCrop);
        let outcome = self.cropper.crop(&request).await.map_err(|e| {
            log::error!("Crop failed: {e:#}");
            PickerError::from_anyhow(ErrorKind::NoImageDataFound, &e)
        })?;
        let (cropped, rect) = match outcome {
            CropOutcome::Cancelled => return Err(PickerError::of(ErrorKind::Cancelled)),
            CropOutcome::Cropped { path, rect } => (path, rect),
        };

        let normalizer = Arc::clone(&self.normalizer);
        let opts = opts.clone();
        let item = tokio::task::spawn_blocking(move || {
            normalizer.process_cropped(&cropped, rect, &source, &opts)
        })
        .await
        .map_err(|e| PickerError::new(ErrorKind::CallbackError, e.to_string()))??;

        session.report_success(item);
        Ok(())
    }

    async fn finish(
        &self,
        session: &Session,
        rx: oneshot::Receiver<PickerResult<Payload>>,
    ) -> PickerResult<Payload> {
        let outcome = rx.await.unwrap_or_else(|_| {
            log::debug!("Request superseded before completion");
            Err(PickerError::of(ErrorKind::Superseded))
        });
        self.set_state(session, AdapterState::Idle);
        outcome
    }
}

/// Local path of a reference if it is a still image the crop host can take.
fn croppable_path(media: &MediaRef) -> Option<PathBuf> {
    let path = media::resolve_local_path(&media.uri).ok()?;
    let mime = media::detect_mime(&path).ok()?;
    match MediaKind::from_mime(&mime)? {
        MediaKind::Video => None,
        _ => Some(path),
    }
}

fn single_item(payload: Payload) -> PickerResult<MediaItem> {
    payload
        .into_single()
        .ok_or_else(|| PickerError::of(ErrorKind::NoImageDataFound))
}
