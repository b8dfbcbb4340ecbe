//! Attaching assembled PDFs to library items.
//!
//! The PDF is first written to a private temporary directory, then imported
//! from there into attachment storage at `{attachment id}/{slug}.pdf`. The
//! attachment row and its file record become visible together, once the file
//! is in place.

pub mod error;

use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::import::error::{ErrorKind as ImportErrorKind, Result as ImportResult};
use digivat_storage::BackendHandle;
use digivat_store::{Attachment, AttachmentFile, ItemId, Repository};
use exn::ResultExt;
use rslug::slugify;
use std::path::PathBuf;
use tracing::instrument;

/// Name of the PDF inside the temporary directory.
pub const PDF_FILE_NAME: &str = "manuscript.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Storage path of an attachment.
pub fn attachment_path(id: ItemId, title: &str) -> PathBuf {
    let slug = slugify!(title);
    let stem = if slug.is_empty() { "manuscript" } else { slug.as_str() };
    PathBuf::from(id.to_string()).join(format!("{stem}.pdf"))
}

/// Write `pdf` to a temporary file and import it as an attachment of
/// `parent` titled `title`.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Import>`](LibraryErrorKind::Import)
/// raised from an inner [`Exn<ImportErrorKind>`](ImportErrorKind).
pub async fn persist_and_attach(
    storage: &BackendHandle,
    repository: &Repository,
    pdf: &[u8],
    parent: ItemId,
    title: &str,
) -> LibraryResult<Attachment> {
    persist_and_attach_inner(storage, repository, pdf, parent, title)
        .await
        .inspect_err(|err| tracing::error!(%parent, error = ?err, "Could not attach PDF"))
        .or_raise(|| LibraryErrorKind::Import)
}

#[instrument(skip(storage, repository, pdf), fields(backend = storage.name(), bytes = pdf.len()))]
async fn persist_and_attach_inner(
    storage: &BackendHandle,
    repository: &Repository,
    pdf: &[u8],
    parent: ItemId,
    title: &str,
) -> ImportResult<Attachment> {
    // Removed (with its contents) when dropped at the end of this function.
    let temp_dir = tempfile::Builder::new().prefix("digivat-").tempdir().or_raise(|| ImportErrorKind::Persist)?;
    let source = temp_dir.path().join(PDF_FILE_NAME);
    tokio::fs::write(&source, pdf).await.or_raise(|| ImportErrorKind::Persist)?;
    let file_hash = blake3::hash(pdf).to_hex().to_string();

    let pending = repository.begin_attachment(parent, title).await.or_raise(|| ImportErrorKind::Store)?;
    let path = attachment_path(pending.id(), title);
    let info = storage.import(&source, &path).await.or_raise(|| ImportErrorKind::Storage)?;
    let file = AttachmentFile {
        path: info.path,
        content_type: PDF_CONTENT_TYPE.to_string(),
        size: info.size,
        file_hash,
    };

    match pending.commit(file).await {
        Ok(attachment) => {
            tracing::info!(attachment = %attachment.item.id, path = %attachment.file.path.display(), "PDF attached");
            Ok(attachment)
        },
        Err(err) => {
            // The row was rolled back; don't leave an orphaned file behind.
            if let Err(cleanup) = storage.delete(&path).await {
                tracing::warn!(path = %path.display(), error = ?cleanup, "Could not remove orphaned attachment file");
            }
            Err(err).or_raise(|| ImportErrorKind::Store)
        },
    }
}
