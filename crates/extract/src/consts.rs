use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// JSON-literal field embedded in the inline script of a DigiVatLib catalog page.
regex!(MANIFEST_URL_REGEX, r#""iiif_manifest_url":\s*"([^"]+)""#);

/// IIIF Image API request suffix: full region, full size, no rotation, default quality.
pub(crate) const FULL_IMAGE_SUFFIX: &str = "/full/full/0/default.jpg";
