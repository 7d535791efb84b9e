//! EXIF metadata extraction.
//!
//! [`read_exif`] returns the flat string map attached to a response item when
//! `includeExif` is set; [`read_orientation`] feeds the compression step.

mod reader;

#[cfg(test)]
pub(crate) mod fixtures;

pub use reader::{ExifMap, read_exif, read_orientation};
