//! Attachment storage in a directory on the local filesystem.

use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_trait::async_trait;
use std::fs::Metadata;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores each attachment at `{root}/{path}`.
///
/// ```no_run
/// use digivat_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("attachments", "/var/lib/digivat/storage")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}

impl LocalBackend {
    /// Open (and create, if missing) the storage directory `root`, which must
    /// be absolute.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || root.is_file() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Runs once at startup.
        std::fs::create_dir_all(&root).map_err(|e| io_error(e, &root))?;
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<(PathBuf, PathBuf)> {
        let relative = validate_path(path)?;
        Ok((self.root.join(&relative), relative))
    }

    fn file_info(relative: PathBuf, metadata: &Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(FileInfo::new(relative, metadata.len(), modified.into()))
    }

    async fn prepare_target(&self, path: &Path) -> Result<(PathBuf, PathBuf)> {
        let (absolute, relative) = self.resolve(path)?;
        if let Some(dir) = absolute.parent() {
            fs::create_dir_all(dir).await.map_err(|e| io_error(e, &relative))?;
        }
        Ok((absolute, relative))
    }
}

fn io_error(err: std::io::Error, path: &Path) -> ErrorKind {
    match err.kind() {
        IoErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(err),
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let (absolute, _) = self.resolve(path)?;
        Ok(fs::try_exists(&absolute).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let (absolute, relative) = self.resolve(path)?;
        Ok(fs::read(&absolute).await.map_err(|e| io_error(e, &relative))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let (absolute, relative) = self.prepare_target(path).await?;
        Ok(fs::write(&absolute, data).await.map_err(|e| io_error(e, &relative))?)
    }

    async fn import(&self, source: &Path, path: &Path) -> Result<FileInfo> {
        let (absolute, relative) = self.prepare_target(path).await?;
        let bytes = fs::copy(source, &absolute).await.map_err(|e| io_error(e, source))?;
        tracing::debug!(backend = %self.name, source = %source.display(), target = %relative.display(), bytes, "Attachment file imported");
        let metadata = fs::metadata(&absolute).await.map_err(|e| io_error(e, &relative))?;
        Self::file_info(relative, &metadata)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let (absolute, relative) = self.resolve(path)?;
        fs::remove_file(&absolute).await.map_err(|e| io_error(e, &relative))?;
        // Attachment directories hold a single file; drop the directory once
        // it is empty. Fails harmlessly if anything else is still in there.
        if let Some(dir) = absolute.parent()
            && dir != self.root
        {
            _ = fs::remove_dir(dir).await;
        }
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let (absolute, relative) = self.resolve(path)?;
        let metadata = fs::metadata(&absolute).await.map_err(|e| io_error(e, &relative))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::NotFound(relative));
        }
        Self::file_info(relative, &metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("test", temp_dir.path().join("storage")).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new() {
        let (_temp_dir, backend) = backend();
        assert!(backend.root().is_dir());
        assert!(LocalBackend::new("test", "relative/storage").is_err());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("library.sqlite");
        std::fs::write(&file, b"").unwrap();
        let err = LocalBackend::new("test", &file).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_write_read_stat() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("17/vat-lat-1.pdf"), b"%PDF-1.5").await.unwrap();
        assert_eq!(backend.read(Path::new("17/vat-lat-1.pdf")).await.unwrap(), b"%PDF-1.5");
        let info = backend.stat(Path::new("./17//vat-lat-1.pdf")).await.unwrap();
        assert_eq!(info.path, PathBuf::from("17/vat-lat-1.pdf"));
        assert_eq!(info.size, 8);
        let err = backend.stat(Path::new("17")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_import_copies_local_file() {
        let (temp_dir, backend) = backend();
        let source = temp_dir.path().join("manuscript.pdf");
        std::fs::write(&source, b"%PDF-1.5 data").unwrap();

        let info = backend.import(&source, Path::new("3/title.pdf")).await.unwrap();
        assert_eq!((info.path.as_path(), info.size), (Path::new("3/title.pdf"), 13));
        assert_eq!(backend.read(Path::new("3/title.pdf")).await.unwrap(), b"%PDF-1.5 data");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_import_missing_source() {
        let (_temp_dir, backend) = backend();
        let err = backend.import(Path::new("/definitely/not/here.pdf"), Path::new("1/x.pdf")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_attachment_directory() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("5/a.pdf"), b"data").await.unwrap();
        backend.delete(Path::new("5/a.pdf")).await.unwrap();
        assert!(!backend.exists(Path::new("5/a.pdf")).await.unwrap());
        assert!(!backend.root().join("5").exists());
        let err = backend.delete(Path::new("5/a.pdf")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_keeps_shared_directory() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("6/a.pdf"), b"a").await.unwrap();
        backend.write(Path::new("6/b.pdf"), b"b").await.unwrap();
        backend.delete(Path::new("6/a.pdf")).await.unwrap();
        assert!(backend.exists(Path::new("6/b.pdf")).await.unwrap());
    }

    #[tokio::test]
    async fn test_paths_stay_below_root() {
        let (_temp_dir, backend) = backend();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../escape.pdf"), b"data").await.is_err());
        assert!(backend.delete(Path::new("a/../../file")).await.is_err());
    }
}
