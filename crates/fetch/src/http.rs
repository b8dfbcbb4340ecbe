use crate::error::{Error, ErrorKind, Result};
use crate::{Fetcher, validate_url};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::instrument;

/// [`Fetcher`] backed by a pooled [`reqwest`] client.
///
/// Every request (including reading its body) is bounded by the configured
/// timeout, so a stalled server surfaces as [`Timeout`](ErrorKind::Timeout)
/// instead of hanging the pipeline.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}
impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: impl AsRef<str>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.as_ref())
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let url = validate_url(url)?;
        self.client.get(url).send().await.map_err(transport)
    }
}

fn transport(err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() { ErrorKind::Timeout } else { ErrorKind::Network };
    exn::Exn::from(err).raise(kind)
}

fn body(err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() { ErrorKind::Timeout } else { ErrorKind::Body };
    exn::Exn::from(err).raise(kind)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Failed to fetch data from the link; using body regardless");
        }
        let text = response.text().await.map_err(body)?;
        tracing::trace!(url, bytes = text.len(), "Fetched text response");
        Ok(text)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let bytes = response.bytes().await.map_err(body)?;
        tracing::trace!(url, bytes = bytes.len(), "Fetched binary response");
        Ok(bytes.to_vec())
    }
}
