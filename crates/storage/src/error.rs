//! Storage Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Why an attachment file could not be stored or read.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("no file at {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("not allowed to access {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Escapes the storage root, or is otherwise unusable as a storage path.
    #[display("invalid storage path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    #[display("storage I/O failed: {_0}")]
    Io(IoError),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
