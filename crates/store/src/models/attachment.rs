use crate::error::{Error, ErrorKind};
use crate::models::{CatalogItem, ItemRow};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;

/// File record of an attachment item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// Path relative to the attachment storage root.
    pub path: PathBuf,
    pub content_type: String,
    pub size: u64,
    /// BLAKE3 hash of the stored file, hex encoded.
    pub file_hash: String,
}

/// An attachment item together with its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub item: CatalogItem,
    pub file: AttachmentFile,
}

pub(crate) struct AttachmentFileRow {
    pub(crate) path: String,
    pub(crate) content_type: String,
    pub(crate) file_size: i64,
    pub(crate) file_hash: String,
}
impl TryFrom<&AttachmentFile> for AttachmentFileRow {
    type Error = Error;
    fn try_from(file: &AttachmentFile) -> Result<Self, Self::Error> {
        Ok(Self {
            path: file.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string(),
            content_type: file.content_type.clone(),
            file_size: i64::try_from(file.size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            file_hash: file.file_hash.clone(),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AttachmentRow {
    #[sqlx(flatten)]
    item: ItemRow,
    path: String,
    content_type: String,
    file_size: i64,
    file_hash: String,
}
impl TryFrom<AttachmentRow> for Attachment {
    type Error = Error;
    fn try_from(row: AttachmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            item: row.item.try_into()?,
            file: AttachmentFile {
                path: PathBuf::from(row.path),
                content_type: row.content_type,
                size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
                file_hash: row.file_hash,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_to_row() {
        let file = AttachmentFile {
            path: PathBuf::from("12/vatikan-bav-vat-lat-3225.pdf"),
            content_type: "application/pdf".to_string(),
            size: 2048,
            file_hash: "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262".to_string(),
        };
        let row = AttachmentFileRow::try_from(&file).unwrap();
        assert_eq!(row.path, "12/vatikan-bav-vat-lat-3225.pdf");
        assert_eq!(row.file_size, 2048);
    }

    #[test]
    fn test_negative_size_is_invalid() {
        let row = AttachmentRow {
            item: ItemRow {
                id: 2,
                item_type: "attachment".to_string(),
                title: "t".to_string(),
                url: None,
                parent_id: Some(1),
                added_at: 0,
                modified_at: 0,
            },
            path: "2/t.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: -1,
            file_hash: String::new(),
        };
        let err = Attachment::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("file size")));
    }
}
