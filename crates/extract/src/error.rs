//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest body is not valid JSON.
    #[display("manifest is not valid JSON")]
    MalformedJson,
    /// The manifest is valid JSON but lacks a structure required for page
    /// extraction (the JSON path of the missing node is included).
    #[display("manifest is missing required structure: {_0}")]
    MissingStructure(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A manifest document either has the expected shape or it doesn't.
        false
    }
}
