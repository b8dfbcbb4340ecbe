//! Catalog title recognition.

use tracing::instrument;

/// Title marker appended by DigiVatLib to its catalog page titles.
pub const DIGIVATLIB_MARKER: &str = "| DigiVatLib";
/// Institutional prefix (Biblioteca Apostolica Vaticana) for canonical titles.
pub const BAV_PREFIX: &str = "Vatikan, BAV, ";

/// Outcome of [`TitleClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Whether the title carried the catalog marker.
    pub is_match: bool,
    /// The rewritten title on a match, otherwise the input unchanged.
    pub canonical_title: String,
}

/// Recognises catalog page titles by a fixed marker substring and rewrites
/// them into a canonical, institution-prefixed form.
///
/// The rewrite keeps everything before the marker, inserts a space after
/// every period (so shelfmarks such as `Vat.lat.3225` read as
/// `Vat. lat. 3225`) and prepends the prefix.
///
/// # Examples
///
/// ```rust
/// use digivat_extract::TitleClassifier;
/// let classification = TitleClassifier::default().classify("Vat.lat.3225 | DigiVatLib");
/// assert!(classification.is_match);
/// assert_eq!(classification.canonical_title, "Vatikan, BAV, Vat. lat. 3225 ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleClassifier {
    marker: String,
    prefix: String,
}
impl TitleClassifier {
    pub fn new(marker: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            prefix: prefix.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    #[instrument(level = "trace", skip(self))]
    pub fn classify(&self, title: &str) -> Classification {
        // An empty marker would match every title.
        let Some(offset) = title.find(&self.marker).filter(|_| !self.marker.is_empty()) else {
            return Classification {
                is_match: false,
                canonical_title: title.to_string(),
            };
        };
        let shelfmark = title[..offset].replace('.', ". ");
        Classification {
            is_match: true,
            canonical_title: format!("{}{}", self.prefix, shelfmark),
        }
    }
}
impl Default for TitleClassifier {
    fn default() -> Self {
        Self::new(DIGIVATLIB_MARKER, BAV_PREFIX)
    }
}
