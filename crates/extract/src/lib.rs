//! Pure extraction logic for DigiVatLib catalog items: no network or disk I/O
//! happens in this crate.
//!
//! - [`TitleClassifier`] recognises catalog titles and derives the canonical
//!   title.
//! - [`find_manifest_url`] locates the IIIF manifest URL in a catalog page.
//! - [`Manifest`] parses and validates the manifest, and
//!   [`Manifest::image_list`] turns it into one image URL per page.

mod consts;
pub mod error;
mod manifest;
mod resolve;
mod title;

pub use crate::manifest::{Canvas, DroppedCanvas, ImageList, Manifest, extract_image_urls};
pub use crate::resolve::{ManifestLocation, find_manifest_url};
pub use crate::title::{BAV_PREFIX, Classification, DIGIVATLIB_MARKER, TitleClassifier};
