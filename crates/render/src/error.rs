//! Render Error Types
//!
//! Download and decode failures of individual pages never surface here: they
//! stop the assembly early and are reported through
//! [`Assembly::stopped`](crate::Assembly::stopped) instead.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The bytes are not a JPEG image that can be embedded as-is.
    #[display("not an embeddable JPEG image")]
    Decode,
    /// The finished document could not be written out.
    #[display("could not serialize PDF document")]
    Serialize,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
