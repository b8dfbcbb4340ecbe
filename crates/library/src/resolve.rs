use crate::error::{ErrorKind, Result};
use digivat_extract::{Manifest, ManifestLocation, find_manifest_url};
use digivat_fetch::Fetcher;
use exn::ResultExt;
use tracing::instrument;

/// Fetch a catalog page and find the IIIF manifest URL in its source.
///
/// A page without a manifest reference (or an error page returned with a
/// non-success status) yields [`ManifestLocation::NotFound`]; only transport
/// failures are errors.
#[instrument(skip(fetcher))]
pub async fn resolve_manifest_url(fetcher: &dyn Fetcher, page_url: &str) -> Result<ManifestLocation> {
    let html = fetcher.fetch_text(page_url).await.or_raise(|| ErrorKind::Fetch)?;
    let location = find_manifest_url(&html);
    tracing::debug!(manifest = %location, "Manifest URL resolved");
    Ok(location)
}

/// Fetch and parse the manifest at `manifest_url`.
#[instrument(skip(fetcher))]
pub async fn fetch_manifest(fetcher: &dyn Fetcher, manifest_url: &str) -> Result<Manifest> {
    let json = fetcher.fetch_text(manifest_url).await.or_raise(|| ErrorKind::Fetch)?;
    Manifest::parse(&json).or_raise(|| ErrorKind::Manifest)
}
