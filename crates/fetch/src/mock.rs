//! In-memory fetcher for testing.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, validate_url};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Canned response served by [`MockFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// A response with a status code and body.
    Reply { status: u16, body: Vec<u8> },
    /// No response at all: the request fails with the given error kind.
    Fail(ErrorKind),
}
impl MockResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::Reply { status: 200, body: body.into() }
    }

    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Reply { status, body: body.into() }
    }

    pub fn timeout() -> Self {
        Self::Fail(ErrorKind::Timeout)
    }

    pub fn network_error() -> Self {
        Self::Fail(ErrorKind::Network)
    }
}

/// In-memory [`Fetcher`] for tests.
///
/// Routes are matched on the exact URL. Unknown URLs answer `404` with an
/// empty body, which follows the same soft/hard rules as real responses.
/// Every requested URL is recorded in order.
///
/// # Examples
///
/// ```
/// use digivat_fetch::{Fetcher, MockFetcher, MockResponse};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = MockFetcher::with_routes([
///     ("https://example.org/page", MockResponse::ok("<html></html>")),
/// ]);
/// assert_eq!(fetcher.fetch_text("https://example.org/page").await?, "<html></html>");
/// assert!(fetcher.fetch_binary("https://example.org/other").await.is_err());
/// assert_eq!(fetcher.requests().await.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: RwLock<HashMap<String, MockResponse>>,
    requests: RwLock<Vec<String>>,
}
impl MockFetcher {
    pub fn with_routes(routes: impl IntoIterator<Item = (impl Into<String>, MockResponse)>) -> Self {
        Self {
            routes: RwLock::new(routes.into_iter().map(|(url, response)| (url.into(), response)).collect()),
            requests: RwLock::default(),
        }
    }

    /// Add (or replace) a route.
    pub fn with_route(mut self, url: impl Into<String>, response: MockResponse) -> Self {
        self.routes.get_mut().insert(url.into(), response);
        self
    }

    /// Every URL requested so far, in request order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    async fn respond(&self, url: &str) -> Result<(u16, Vec<u8>)> {
        self.requests.write().await.push(url.to_string());
        validate_url(url)?;
        match self.routes.read().await.get(url).cloned() {
            Some(MockResponse::Reply { status, body }) => Ok((status, body)),
            Some(MockResponse::Fail(kind)) => exn::bail!(kind),
            None => Ok((404, Vec::new())),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let (status, body) = self.respond(url).await?;
        if !(200..300).contains(&status) {
            tracing::warn!(url, status, "Failed to fetch data from the link; using body regardless");
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        let (status, body) = self.respond(url).await?;
        if status != 200 {
            exn::bail!(ErrorKind::Status(status));
        }
        Ok(body)
    }
}
