//! HTTP access for the acquisition pipeline.
//!
//! The two operations are deliberately asymmetric:
//!
//! - [`fetch_text`](Fetcher::fetch_text) is *soft*: a non-success status is
//!   logged and the body is returned anyway, so callers must check the
//!   content they receive. Only transport failures are errors.
//! - [`fetch_binary`](Fetcher::fetch_binary) is *hard*: anything other than
//!   `200 OK` is an error.

pub mod error;
mod http;
#[cfg(feature = "mock")]
mod mock;

pub use crate::http::HttpFetcher;
#[cfg(feature = "mock")]
pub use crate::mock::{MockFetcher, MockResponse};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub type FetcherHandle = Arc<dyn Fetcher + Send + Sync>;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body as text, whatever the status code.
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// GET `url` and return the raw body; fails unless the status is `200`.
    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>>;
}

/// Only absolute `http` and `https` URLs are fetched.
pub(crate) fn validate_url(url: &str) -> Result<url::Url> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(parsed),
        _ => exn::bail!(ErrorKind::InvalidUrl(url.to_string())),
    }
}
