mod attachment;
mod item;

pub(crate) use self::attachment::{AttachmentFileRow, AttachmentRow};
pub use self::attachment::{Attachment, AttachmentFile};
pub(crate) use self::item::ItemRow;
pub use self::item::{CatalogItem, ItemId, ItemType, NewItem};
