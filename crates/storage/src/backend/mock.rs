use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredFile {
    data: Vec<u8>,
    modified: UtcDateTime,
}

/// Attachment storage held in memory, for tests.
///
/// [`import`](StorageBackend::import) still reads its source from the real
/// filesystem.
///
/// ```
/// use digivat_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("1/existing.pdf", b"%PDF-1.5")]);
/// backend.write(Path::new("2/new.pdf"), b"%PDF-1.5").await?;
/// assert_eq!(backend.paths().await, vec![Path::new("1/existing.pdf"), Path::new("2/new.pdf")]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    files: RwLock<BTreeMap<PathBuf, StoredFile>>,
}

impl MockBackend {
    /// Panics on an invalid path: a broken fixture should fail the test.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let modified = UtcDateTime::now();
        let files = files
            .into_iter()
            .map(|(path, data)| {
                let path = path.into();
                let Ok(validated) = validate_path(&path) else {
                    panic!("MockBackend::with_files: invalid path {}", path.display());
                };
                (validated, StoredFile { data: data.into(), modified })
            })
            .collect();
        Self { name: "mock".to_string(), files: RwLock::new(files) }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stored paths in sorted order.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_files(Vec::<(PathBuf, Vec<u8>)>::new())
    }
}

fn not_found(path: PathBuf) -> exn::Exn<ErrorKind> {
    exn::Exn::from(ErrorKind::NotFound(path))
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.files.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let files = self.files.read().await;
        files.get(&path).map(|file| file.data.clone()).ok_or_else(|| not_found(path))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        let file = StoredFile { data: data.to_vec(), modified: UtcDateTime::now() };
        self.files.write().await.insert(path, file);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        match self.files.write().await.remove(&path) {
            Some(_) => Ok(()),
            None => Err(not_found(path)),
        }
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        let files = self.files.read().await;
        let Some(file) = files.get(&path) else {
            return Err(not_found(path));
        };
        Ok(FileInfo::new(path.clone(), file.data.len() as u64, file.modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_stat() {
        let backend = MockBackend::default().with_name("memory");
        assert_eq!(backend.name(), "memory");
        backend.write(Path::new("1/a.pdf"), b"hello").await.unwrap();
        assert_eq!(backend.read(Path::new("./1/a.pdf")).await.unwrap(), b"hello");
        assert_eq!(backend.stat(Path::new("1/a.pdf")).await.unwrap().size, 5);
    }

    #[tokio::test]
    async fn test_import_reads_local_source() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("manuscript.pdf");
        std::fs::write(&source, b"%PDF").unwrap();
        let backend = MockBackend::default();
        let info = backend.import(&source, Path::new("9/title.pdf")).await.unwrap();
        assert_eq!(info.path, PathBuf::from("9/title.pdf"));
        assert_eq!(backend.read(Path::new("9/title.pdf")).await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_not_found() {
        let backend = MockBackend::with_files([("1/a.pdf", b"a")]);
        for path in ["missing.pdf", "1"] {
            let err = backend.read(Path::new(path)).await.unwrap_err();
            assert!(matches!(&*err, ErrorKind::NotFound(_)));
        }
        let err = backend.delete(Path::new("missing.pdf")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(backend.len().await, 1);
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockBackend::with_files([("../escape", Vec::from(*b"bad"))]);
    }
}
