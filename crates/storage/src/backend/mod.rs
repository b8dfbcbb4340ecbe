//! Where attachment files are kept.
//!
//! Every path handed to a backend is relative to the backend's root, usually
//! `{attachment id}/{file name}`.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use async_trait::async_trait;
use std::path::Path;

/// Storage for attachment files.
///
/// Paths go through [`validate_path`](crate::validate_path) inside every
/// implementation, so callers may pass them unnormalized.
///
/// ```
/// use std::path::Path;
/// use digivat_storage::{backend::StorageBackend, error::Result};
///
/// async fn attachment_size(backend: &dyn StorageBackend) -> Result<Option<u64>> {
///     let path = Path::new("17/vatikan-bav-vat-lat-3225.pdf");
///     if !backend.exists(path).await? {
///         return Ok(None);
///     }
///     Ok(Some(backend.stat(path).await?.size))
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Used in logs.
    fn name(&self) -> &str;

    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Contents of the file at `path`; [`NotFound`](ErrorKind::NotFound) if
    /// there is none.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or replace the file at `path`.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Copy `source`, a path on the local filesystem (**not** a storage
    /// path), to `path` and return the stored file's metadata.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use digivat_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let info = backend
    ///     .import(Path::new("/tmp/digivat-x1y2/manuscript.pdf"), Path::new("17/manuscript.pdf"))
    ///     .await?;
    /// println!("Stored {} bytes", info.size);
    /// # Ok(())
    /// # }
    /// ```
    async fn import(&self, source: &Path, path: &Path) -> Result<FileInfo> {
        let data = tokio::fs::read(source).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(source.to_path_buf()),
            _ => ErrorKind::Io(err),
        })?;
        self.write(path, &data).await?;
        self.stat(path).await
    }

    /// Remove the file at `path`; [`NotFound`](ErrorKind::NotFound) if there
    /// is none.
    async fn delete(&self, path: &Path) -> Result<()>;

    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
