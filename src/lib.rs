//! # cropping-picker
//!
//! Image and video picking, camera capture and interactive cropping behind
//! one normalized result shape.
//!
//! The actual UI (media library, camera, crop view) belongs to the host and
//! is plugged in through the traits in [`host`]. This crate owns everything
//! around it: option parsing, permission checks, path resolution, image
//! recompression, EXIF extraction, response assembly, and the exactly-once
//! delivery of results from concurrent per-item work.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cropping_picker::config::Config;
//! use cropping_picker::host::{CropHost, SelectionHost};
//! use cropping_picker::item::Payload;
//! use cropping_picker::picker::Picker;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     selection: Arc<dyn SelectionHost>,
//! #     cropper: Arc<dyn CropHost>,
//! # ) -> anyhow::Result<()> {
//! let config = Config::load(Some("picker.json".as_ref()))?;
//! let picker = Picker::builder(selection, cropper).config(config).build();
//!
//! match picker.open_picker(&serde_json::json!({ "multiple": true })).await {
//!     Ok(Payload::Multiple(items)) => {
//!         for item in items {
//!             println!("{} {}x{} {}", item.path, item.width, item.height, item.mime);
//!         }
//!     }
//!     Ok(Payload::Single(item)) => println!("{}", item.path),
//!     Err(e) => eprintln!("{} ({})", e.message, e.kind.code()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-Level Usage
//!
//! The [`collector`] can be driven directly by any concurrency model:
//!
//! ```rust
//! use cropping_picker::collector::{ResultCollector, SessionMode};
//! use cropping_picker::error::ErrorKind;
//! use cropping_picker::item::MediaItem;
//!
//! let collector = ResultCollector::new();
//! let session = collector.begin(
//!     SessionMode::Multiple,
//!     |payload| println!("resolved with {} item(s)", payload.len()),
//!     |err| println!("rejected: {err}"),
//! );
//! session.set_expected_count(2);
//! session.report_success(MediaItem::new("/tmp/a.jpg", 640, 480, "image/jpeg"));
//! session.report_failure(ErrorKind::NoImageDataFound, "decode failed");
//! // Late reports are ignored.
//! session.report_success(MediaItem::new("/tmp/b.jpg", 640, 480, "image/jpeg"));
//! ```
//!
//! ## Modules
//!
//! - [`collector`] — Exactly-once result collection (sessions, supersede policy)
//! - [`config`] — Per-call options and tool configuration
//! - [`error`] — Stable error kinds and the caller-facing error
//! - [`exif`] — EXIF attribute extraction
//! - [`host`] — Traits for host-provided UI, permissions and video probing
//! - [`item`] — Response item shape
//! - [`media`] — Path resolution, MIME detection, compression and normalization
//! - [`picker`] — The caller-facing adapter
//! - [`storage`] — Scratch directory for produced files

pub mod collector;
pub mod config;
pub mod error;
pub mod exif;
pub mod host;
pub mod item;
pub mod media;
pub mod picker;
pub mod storage;
