//! SQLite database of the host library.
//!
//! The library holds top-level catalog items (one per catalog record) and
//! attachment items, which are children of a catalog item and point at a
//! file in attachment storage.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{Attachment, AttachmentFile, CatalogItem, ItemId, ItemType, NewItem};
pub use crate::repo::{PendingAttachment, Repository};
