//! Manuscript PDF assembly.
//!
//! Page images are downloaded strictly in order and embedded as full-page
//! JPEGs. A failing page ends the run early without failing it: the pages
//! gathered so far still make a valid document.

mod assemble;
pub mod error;
mod pdf;
mod progress;

pub use crate::assemble::{Assembler, Assembly, StopReason, Stopped};
pub use crate::pdf::{ColorSpace, JpegInfo, PdfBuilder, read_jpeg_info};
pub use crate::progress::{NoProgress, ProgressReporter, Stage};
