//! Repository for library items and attachments.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{
    Attachment, AttachmentFile, AttachmentFileRow, AttachmentRow, CatalogItem, ItemId, ItemRow, ItemType, NewItem,
};
use exn::ResultExt;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::UtcDateTime;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> i64 {
        UtcDateTime::now().unix_timestamp()
    }

    // =========================================================================
    // Items
    // =========================================================================

    #[instrument(skip_all, fields(item_type = %item.item_type))]
    pub async fn create_item(&self, item: &NewItem) -> Result<CatalogItem> {
        let row: ItemRow = sqlx::query_as(include_str!("../queries/insert_item.sql"))
            .bind(item.item_type.to_string())
            .bind(&item.title)
            .bind(&item.url)
            .bind(item.parent.map(ItemId::get))
            .bind(Self::now())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let created = CatalogItem::try_from(row)?;
        tracing::debug!(id = %created.id, "Item created");
        Ok(created)
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>> {
        let row: Option<ItemRow> = sqlx::query_as(include_str!("../queries/get_item.sql"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(CatalogItem::try_from).transpose()
    }

    /// Persist the mutable fields of `item` (type, title, url) and bump its
    /// modification time. Returns the item as stored.
    #[instrument(skip_all, fields(id = %item.id))]
    pub async fn save_item(&self, item: &CatalogItem) -> Result<CatalogItem> {
        let row: Option<ItemRow> = sqlx::query_as(include_str!("../queries/update_item.sql"))
            .bind(item.id.get())
            .bind(item.item_type.to_string())
            .bind(&item.title)
            .bind(&item.url)
            .bind(Self::now())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => row.try_into(),
            None => exn::bail!(ErrorKind::NotFound(item.id.get())),
        }
    }

    /// All top-level items, oldest first.
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(include_str!("../queries/list_items.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(CatalogItem::try_from).collect()
    }

    // =========================================================================
    // Attachments
    // =========================================================================

    /// Start adding an attachment item below `parent`.
    ///
    /// The attachment row is inserted inside a transaction so that its id is
    /// known (for the storage path) before the file exists. Nothing is
    /// visible to other connections until [`PendingAttachment::commit`];
    /// dropping the pending attachment rolls it back.
    #[instrument(skip(self, title))]
    pub async fn begin_attachment(&self, parent: ItemId, title: &str) -> Result<PendingAttachment> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let row: ItemRow = sqlx::query_as(include_str!("../queries/insert_item.sql"))
            .bind(ItemType::Attachment.to_string())
            .bind(title)
            .bind(Option::<String>::None)
            .bind(parent.get())
            .bind(Self::now())
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(PendingAttachment { tx, item: row.try_into()? })
    }

    /// Attachments of `parent`, oldest first.
    pub async fn attachments_for(&self, parent: ItemId) -> Result<Vec<Attachment>> {
        let rows: Vec<AttachmentRow> = sqlx::query_as(include_str!("../queries/attachments_for.sql"))
            .bind(parent.get())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Attachment::try_from).collect()
    }
}

/// An attachment item whose row exists only inside an open transaction.
pub struct PendingAttachment {
    tx: Transaction<'static, Sqlite>,
    item: CatalogItem,
}
impl PendingAttachment {
    pub fn id(&self) -> ItemId {
        self.item.id
    }

    /// Record the stored file and make the attachment visible.
    pub async fn commit(mut self, file: AttachmentFile) -> Result<Attachment> {
        let row = AttachmentFileRow::try_from(&file)?;
        sqlx::query(include_str!("../queries/insert_attachment_file.sql"))
            .bind(self.item.id.get())
            .bind(row.path)
            .bind(row.content_type)
            .bind(row.file_size)
            .bind(row.file_hash)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(id = %self.item.id, "Attachment committed");
        Ok(Attachment { item: self.item, file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn repo() -> Repository {
        Repository::from(&Database::connect_in_memory().await.unwrap())
    }

    fn pdf(path: &str) -> AttachmentFile {
        AttachmentFile {
            path: PathBuf::from(path),
            content_type: "application/pdf".to_string(),
            size: 10,
            file_hash: "abc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;
        let created = repo
            .create_item(&NewItem::webpage("Vat.lat.3225 | DigiVatLib", "https://digi.vatlib.it/view/MSS_Vat.lat.3225"))
            .await
            .unwrap();
        assert_eq!(created.item_type, ItemType::Webpage);
        assert_eq!(repo.get_item(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.get_item(ItemId::from(created.id.get() + 1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_item() {
        let repo = repo().await;
        let mut item = repo.create_item(&NewItem::webpage("title", "https://example.org")).await.unwrap();
        item.item_type = ItemType::Manuscript;
        item.title = "new title".to_string();
        let saved = repo.save_item(&item).await.unwrap();
        assert_eq!(saved.item_type, ItemType::Manuscript);
        assert_eq!(repo.get_item(item.id).await.unwrap().unwrap().title, "new title");
    }

    #[tokio::test]
    async fn test_save_unknown_item() {
        let repo = repo().await;
        let mut item = repo.create_item(&NewItem::webpage("title", "https://example.org")).await.unwrap();
        item.id = ItemId::from(999);
        let err = repo.save_item(&item).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(999)));
    }

    #[tokio::test]
    async fn test_attachment_commit() {
        let repo = repo().await;
        let parent = repo.create_item(&NewItem::webpage("title", "https://example.org")).await.unwrap();
        let pending = repo.begin_attachment(parent.id, "title").await.unwrap();
        let id = pending.id();
        let attachment = pending.commit(pdf(&format!("{id}/title.pdf"))).await.unwrap();
        assert_eq!(attachment.item.parent, Some(parent.id));
        assert!(attachment.item.is_attachment());

        assert_eq!(repo.attachments_for(parent.id).await.unwrap(), vec![attachment]);
        // Attachments are not top-level items.
        assert_eq!(repo.list_items().await.unwrap(), vec![parent]);
    }

    #[tokio::test]
    async fn test_attachment_rollback_on_drop() {
        let repo = repo().await;
        let parent = repo.create_item(&NewItem::webpage("title", "https://example.org")).await.unwrap();
        let pending = repo.begin_attachment(parent.id, "title").await.unwrap();
        let id = pending.id();
        drop(pending);
        assert_eq!(repo.get_item(id).await.unwrap(), None);
        assert!(repo.attachments_for(parent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attachment_requires_existing_parent() {
        let repo = repo().await;
        assert!(repo.begin_attachment(ItemId::from(404), "title").await.is_err());
    }
}
