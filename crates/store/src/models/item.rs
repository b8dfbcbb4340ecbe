use crate::error::{Error, ErrorKind};
use derive_more::{Display, From, FromStr};
use exn::ResultExt;
use std::str::FromStr;
use time::UtcDateTime;

/// Stable handle of a library item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, FromStr)]
pub struct ItemId(i64);
impl ItemId {
    pub fn get(self) -> i64 {
        self.0
    }
}

/// Closed set of item types known to the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ItemType {
    #[display("book")]
    Book,
    #[display("document")]
    Document,
    #[display("manuscript")]
    Manuscript,
    #[display("webpage")]
    Webpage,
    #[display("attachment")]
    Attachment,
}
impl FromStr for ItemType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "book" => Self::Book,
            "document" => Self::Document,
            "manuscript" => Self::Manuscript,
            "webpage" => Self::Webpage,
            "attachment" => Self::Attachment,
            _ => exn::bail!(ErrorKind::InvalidData("item type")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub item_type: ItemType,
    pub title: String,
    /// Catalog page the item was saved from.
    pub url: Option<String>,
    /// Set for attachments only.
    pub parent: Option<ItemId>,
    pub added_at: UtcDateTime,
    pub modified_at: UtcDateTime,
}
impl CatalogItem {
    pub fn is_attachment(&self) -> bool {
        self.item_type == ItemType::Attachment
    }
}

/// An item that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub item_type: ItemType,
    pub title: String,
    pub url: Option<String>,
    pub parent: Option<ItemId>,
}
impl NewItem {
    /// A top-level item saved from a web page.
    pub fn webpage(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            item_type: ItemType::Webpage,
            title: title.into(),
            url: Some(url.into()),
            parent: None,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub(crate) id: i64,
    pub(crate) item_type: String,
    pub(crate) title: String,
    pub(crate) url: Option<String>,
    pub(crate) parent_id: Option<i64>,
    pub(crate) added_at: i64,
    pub(crate) modified_at: i64,
}
impl TryFrom<ItemRow> for CatalogItem {
    type Error = Error;
    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId(row.id),
            item_type: row.item_type.parse()?,
            title: row.title,
            url: row.url,
            parent: row.parent_id.map(ItemId),
            added_at: UtcDateTime::from_unix_timestamp(row.added_at).or_raise(|| ErrorKind::InvalidData("added date"))?,
            modified_at: UtcDateTime::from_unix_timestamp(row.modified_at)
                .or_raise(|| ErrorKind::InvalidData("modified date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ItemType::Book)]
    #[case(ItemType::Document)]
    #[case(ItemType::Manuscript)]
    #[case(ItemType::Webpage)]
    #[case(ItemType::Attachment)]
    fn test_item_type_text(#[case] item_type: ItemType) {
        assert_eq!(item_type.to_string().parse::<ItemType>().unwrap(), item_type);
    }

    #[test]
    fn test_unknown_item_type() {
        let err = "podcast".parse::<ItemType>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("item type")));
    }

    #[test]
    fn test_row_to_model() {
        let now = UtcDateTime::now();
        let row = ItemRow {
            id: 7,
            item_type: "manuscript".to_string(),
            title: "Vatikan, BAV, Vat. lat. 3225 ".to_string(),
            url: Some("https://digi.vatlib.it/view/MSS_Vat.lat.3225".to_string()),
            parent_id: None,
            added_at: now.unix_timestamp(),
            modified_at: now.unix_timestamp(),
        };
        let item = CatalogItem::try_from(row).unwrap();
        assert_eq!(item.id, ItemId::from(7));
        assert_eq!(item.item_type, ItemType::Manuscript);
        // Unix timestamps only keep whole seconds.
        assert_eq!(item.added_at, now.replace_nanosecond(0).unwrap());
    }

    #[test]
    fn test_item_id_parse() {
        assert_eq!("42".parse::<ItemId>().unwrap().get(), 42);
        assert!("forty-two".parse::<ItemId>().is_err());
    }
}
