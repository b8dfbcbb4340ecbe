//! Layered configuration for digivat.
//!
//! Values are merged, lowest priority first, from:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. the user configuration file (`config.toml` in the platform config
//!    directory, if it exists),
//! 3. an explicit configuration file passed by the caller (TOML, YAML or JSON,
//!    chosen by extension),
//! 4. environment variables prefixed with `DIGIVAT_`, using `__` to separate
//!    nested keys (e.g. `DIGIVAT_HTTP__TIMEOUT_SECS=30`).

pub mod error;

use crate::error::{ErrorKind, Result};
use digivat_extract::{BAV_PREFIX, DIGIVATLIB_MARKER};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

const ENV_PREFIX: &str = "DIGIVAT_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub http: HttpConfig,
    pub catalog: CatalogConfig,
}

/// Where the item database and the attachment files live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database holding catalog items and attachment records.
    pub database: PathBuf,
    /// Root directory of imported attachment files. Must be absolute.
    pub storage: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Upper bound for a single request, including reading the body.
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// How catalog page titles are recognised and rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub marker: String,
    pub prefix: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let data = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("digivat"));
        Self {
            database: data.join("library.sqlite"),
            storage: data.join("storage"),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: concat!("digivat/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            marker: DIGIVATLIB_MARKER.to_string(),
            prefix: BAV_PREFIX.to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "digivat", "digivat")
}

impl Config {
    /// Load the configuration from every layer, with `explicit` (if given)
    /// taking priority over the user configuration file.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user = project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE));
        let config = Self::figment(user.as_deref(), explicit)?.extract::<Self>().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(database = %config.library.database.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from defaults and a single file, ignoring the user configuration
    /// directory and the environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Self::file_provider(path.as_ref())?)
            .extract::<Self>()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn figment(user: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(user) = user
            && user.is_file()
        {
            tracing::trace!(path = %user.display(), "Merging user configuration file");
            figment = figment.merge(Toml::file(user));
        }
        if let Some(explicit) = explicit {
            figment = figment.merge(Self::file_provider(explicit)?);
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn file_provider(path: &Path) -> Result<Figment> {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        let figment = match extension.as_deref() {
            Some("toml") => Figment::from(Toml::file(path)),
            Some("yaml" | "yml") => Figment::from(Yaml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        };
        Ok(figment)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("http.timeout_secs must be greater than zero"));
        }
        if self.catalog.marker.is_empty() {
            exn::bail!(ErrorKind::Invalid("catalog.marker must not be empty"));
        }
        if !self.library.storage.is_absolute() {
            exn::bail!(ErrorKind::Invalid("library.storage must be an absolute path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(extension).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.marker, "| DigiVatLib");
        assert_eq!(config.catalog.prefix, "Vatikan, BAV, ");
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
    }

    #[rstest]
    #[case(".toml", "[http]\ntimeout_secs = 5\n")]
    #[case(".yaml", "http:\n  timeout_secs: 5\n")]
    #[case(".json", r#"{"http": {"timeout_secs": 5}}"#)]
    fn test_file_formats(#[case] extension: &str, #[case] contents: &str) {
        let file = write_config(extension, contents);
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.catalog, CatalogConfig::default());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".ini", "timeout=5");
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let file = write_config(".toml", "[http]\ntimeout_secs = 0\n");
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_relative_storage_is_rejected() {
        let file = write_config(".toml", "[library]\nstorage = \"relative/storage\"\n");
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_catalog_override() {
        let file = write_config(".toml", "[catalog]\nmarker = \"| Other\"\nprefix = \"Elsewhere, \"\n");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.catalog.marker, "| Other");
        assert_eq!(config.catalog.prefix, "Elsewhere, ");
    }
}
