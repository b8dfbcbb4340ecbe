//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Failures of a dependency crate are
//! kept as children in the error tree.

use derive_more::{Display, Error};
use digivat_store::ItemId;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a pipeline failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The item handed to the pipeline does not exist.
    #[display("item not found: {_0}")]
    NotFound(#[error(not(source))] ItemId),
    /// Reading or updating the item in the library database failed.
    #[display("library database operation failed")]
    Store,
    /// The catalog page or the manifest could not be fetched.
    #[display("could not fetch from the catalog")]
    Fetch,
    /// The manifest is not JSON, or lacks the expected structure.
    #[display("invalid IIIF manifest")]
    Manifest,
    /// The PDF could not be serialized.
    #[display("could not assemble PDF")]
    Render,
    /// Writing or importing the attachment failed.
    #[display("could not attach PDF")]
    Import,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch | Self::Store)
    }
}
