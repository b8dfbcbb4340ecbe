//! Locating the IIIF manifest URL inside a catalog page.

use crate::consts;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::instrument;

/// Where a catalog page says its IIIF manifest lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLocation {
    Found(String),
    /// The page source has no `iiif_manifest_url` field.
    NotFound,
}
impl ManifestLocation {
    /// The manifest URL, or `"null"` when none was found.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(url) => url,
            Self::NotFound => "null",
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Self::Found(url) => Some(url),
            Self::NotFound => None,
        }
    }
}
impl Display for ManifestLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Searches a catalog page's source for the JSON-literal field
/// `"iiif_manifest_url": "…"` and returns its value.
///
/// This is a targeted pattern match over the raw text, the page is never
/// parsed as HTML. Escaped forward slashes (`\/`) are unescaped.
///
/// # Examples
///
/// ```rust
/// use digivat_extract::{ManifestLocation, find_manifest_url};
/// let html = r#"<script>var data = {"iiif_manifest_url": "https://example/manifest.json"};</script>"#;
/// assert_eq!(find_manifest_url(html), ManifestLocation::Found("https://example/manifest.json".into()));
/// assert_eq!(find_manifest_url("<html></html>"), ManifestLocation::NotFound);
/// ```
#[instrument(level = "debug", skip(html), fields(html_size = html.len()))]
pub fn find_manifest_url(html: &str) -> ManifestLocation {
    match consts::MANIFEST_URL_REGEX.captures(html).and_then(|c| c.get(1)) {
        Some(url) => ManifestLocation::Found(url.as_str().replace("\\/", "/")),
        None => ManifestLocation::NotFound,
    }
}
