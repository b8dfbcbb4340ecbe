use crate::error::Result;
use crate::pdf::{PdfBuilder, read_jpeg_info};
use crate::progress::{ProgressReporter, Stage};
use derive_more::Display;
use digivat_fetch::FetcherHandle;
use digivat_fetch::error::ErrorKind as FetchErrorKind;
use tracing::instrument;

/// Why a page could not be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StopReason {
    #[display("network error")]
    Network,
    #[display("timed out")]
    Timeout,
    #[display("HTTP status {_0}")]
    Status(u16),
    #[display("not a JPEG image")]
    Decode,
}
impl From<&FetchErrorKind> for StopReason {
    fn from(kind: &FetchErrorKind) -> Self {
        match kind {
            FetchErrorKind::Timeout => Self::Timeout,
            FetchErrorKind::Status(code) => Self::Status(*code),
            _ => Self::Network,
        }
    }
}

/// The page at which assembly stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopped {
    /// Zero-based position in the requested URL list.
    pub index: usize,
    pub url: String,
    pub reason: StopReason,
}

/// A finished document.
///
/// `pages < requested` exactly when `stopped` is set: everything before the
/// failing page is kept, nothing after it is attempted.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub pdf: Vec<u8>,
    pub pages: usize,
    pub requested: usize,
    pub stopped: Option<Stopped>,
}
impl Assembly {
    pub fn is_complete(&self) -> bool {
        self.stopped.is_none()
    }
}

/// Downloads page images one after another and binds them into a PDF.
#[derive(Clone)]
pub struct Assembler {
    fetcher: FetcherHandle,
}

impl Assembler {
    pub fn new(fetcher: FetcherHandle) -> Self {
        Self { fetcher }
    }

    /// Build a PDF with one page per URL, in order.
    ///
    /// The first page that fails to download or decode ends the loop; the
    /// document is still finished with the pages collected so far. Only a
    /// failure to serialize the document is returned as an error.
    #[instrument(skip_all, fields(requested = urls.len(), label = %label))]
    pub async fn build_pdf(&self, urls: &[String], label: &str, progress: &dyn ProgressReporter) -> Result<Assembly> {
        let total = urls.len();
        let mut builder = PdfBuilder::new();
        let mut stopped = None;
        progress.report(Stage::Starting);

        for (index, url) in urls.iter().enumerate() {
            progress.report(Stage::Downloading { index, total });
            if let Err(reason) = self.add_page(&mut builder, url).await {
                tracing::warn!(index, url, %reason, "Stopping early; keeping the pages downloaded so far");
                stopped = Some(Stopped { index, url: url.clone(), reason });
                break;
            }
            tracing::debug!(index, total, "Page embedded");
        }

        progress.report(Stage::Serializing);
        let pages = builder.len();
        let pdf = builder.finish(label)?;
        tracing::info!(pages, requested = total, bytes = pdf.len(), "PDF assembled");
        Ok(Assembly { pdf, pages, requested: total, stopped })
    }

    async fn add_page(&self, builder: &mut PdfBuilder, url: &str) -> std::result::Result<(), StopReason> {
        let bytes = self.fetcher.fetch_binary(url).await.map_err(|err| {
            tracing::debug!(url, error = ?err, "Image download failed");
            StopReason::from(&*err)
        })?;
        let info = read_jpeg_info(&bytes).map_err(|err| {
            tracing::debug!(url, error = ?err, "Image is not an embeddable JPEG");
            StopReason::Decode
        })?;
        builder.push_jpeg(bytes, info);
        Ok(())
    }
}
