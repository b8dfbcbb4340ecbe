//! Error types for the [`import`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// An import error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an import failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The PDF could not be written to the temporary directory.
    #[display("could not write PDF to temporary storage")]
    Persist,
    /// A storage backend operation (import, delete) failed.
    #[display("attachment storage operation failed")]
    Storage,
    /// Recording the attachment in the library database failed.
    #[display("could not record attachment")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Store)
    }
}
