//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL could not be parsed, or is not HTTP(S).
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The HTTP client could not be constructed.
    #[display("could not build HTTP client")]
    Client,
    /// Connection, TLS or protocol failure; no response was received.
    #[display("network error")]
    Network,
    /// The request did not complete within the configured timeout.
    #[display("request timed out")]
    Timeout,
    /// The server answered with an unexpected status code.
    #[display("unexpected HTTP status: {_0}")]
    Status(#[error(not(source))] u16),
    /// The response body could not be read or decoded.
    #[display("could not read response body")]
    Body,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Timeout | Self::Body => true,
            Self::Status(code) => *code == 429 || (500..600).contains(code),
            Self::InvalidUrl(_) | Self::Client => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Network, true)]
    #[case(ErrorKind::Timeout, true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(429), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::InvalidUrl("nope".into()), false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
