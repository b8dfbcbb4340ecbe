use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::import::persist_and_attach;
use crate::resolve::{fetch_manifest, resolve_manifest_url};
use derive_more::Display;
use digivat_extract::ManifestLocation;
use digivat_render::{Assembler, Stage, Stopped};
use digivat_store::{Attachment, CatalogItem, ItemId, ItemType};
use exn::{OptionExt, ResultExt};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::instrument;

/// Why an item was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SkipReason {
    #[display("title is not a DigiVatLib catalog title")]
    NotMatched,
    #[display("item is an attachment")]
    Attachment,
    #[display("item is already being processed")]
    InProgress,
}

/// Why a recognised item ended without an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stop {
    #[display("item has no URL")]
    MissingUrl,
    #[display("no IIIF manifest referenced by the catalog page")]
    ManifestNotFound,
    #[display("manifest lists no page images")]
    NoImages,
    #[display("no pages selected")]
    EmptySelection,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Nothing was changed.
    Skipped(SkipReason),
    /// The item was renamed and marked as a manuscript, but nothing was
    /// attached.
    Stopped { item: CatalogItem, reason: Stop },
    /// A PDF was attached. `stopped` is set when a page failed and the PDF
    /// holds fewer pages than requested.
    Attached {
        item: CatalogItem,
        attachment: Attachment,
        pages: usize,
        requested: usize,
        stopped: Option<Stopped>,
    },
}

/// Items with a pipeline currently running.
#[derive(Debug, Default)]
pub(crate) struct InFlight(Mutex<HashSet<ItemId>>);

pub(crate) struct InFlightGuard<'a> {
    set: &'a InFlight,
    item: ItemId,
}
impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.0.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.item);
    }
}

impl InFlight {
    /// `None` if `item` is already claimed.
    pub(crate) fn acquire(&self, item: ItemId) -> Option<InFlightGuard<'_>> {
        let mut set = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        set.insert(item).then(|| InFlightGuard { set: self, item })
    }
}

/// Run the acquisition pipeline for a newly added item.
///
/// Steps stop at the first one that has nothing to work with (see
/// [`Outcome`]); only failures to talk to the catalog, an invalid manifest
/// or a failure to persist are errors.
#[instrument(skip(ctx))]
pub async fn on_add(ctx: &Context, id: ItemId) -> Result<Outcome> {
    let Some(_guard) = ctx.in_flight.acquire(id) else {
        tracing::debug!("Pipeline already running for item");
        return Ok(Outcome::Skipped(SkipReason::InProgress));
    };

    let mut item =
        ctx.repository.get_item(id).await.or_raise(|| ErrorKind::Store)?.ok_or_raise(|| ErrorKind::NotFound(id))?;
    if item.is_attachment() {
        return Ok(Outcome::Skipped(SkipReason::Attachment));
    }
    let classification = ctx.classifier.classify(&item.title);
    if !classification.is_match {
        tracing::trace!(title = %item.title, "Not a catalog title");
        return Ok(Outcome::Skipped(SkipReason::NotMatched));
    }

    item.item_type = ItemType::Manuscript;
    item.title = classification.canonical_title;
    let item = ctx.repository.save_item(&item).await.or_raise(|| ErrorKind::Store)?;
    tracing::info!(title = %item.title, "Catalog item recognised");

    let Some(page_url) = item.url.as_deref() else {
        return Ok(stopped(item, Stop::MissingUrl));
    };
    let manifest_url = match resolve_manifest_url(ctx.fetcher.as_ref(), page_url).await? {
        ManifestLocation::Found(url) => url,
        ManifestLocation::NotFound => {
            tracing::warn!(page_url, "Catalog page does not reference a IIIF manifest");
            return Ok(stopped(item, Stop::ManifestNotFound));
        },
    };
    let images = fetch_manifest(ctx.fetcher.as_ref(), &manifest_url).await?.image_list();
    if images.is_empty() {
        return Ok(stopped(item, Stop::NoImages));
    }
    if !images.dropped.is_empty() {
        tracing::warn!(dropped = images.dropped.len(), "Some canvases have no image and were left out");
    }

    let range = ctx.dialogs.prompt_page_range(id, &item.title, images.len()).await;
    if range.is_empty() {
        return Ok(stopped(item, Stop::EmptySelection));
    }
    let assembly = Assembler::new(ctx.fetcher.clone())
        .build_pdf(range.select(&images.urls), &item.title, ctx.progress.as_ref())
        .await
        .or_raise(|| ErrorKind::Render)?;

    ctx.progress.report(Stage::Writing);
    let attachment = persist_and_attach(&ctx.storage, &ctx.repository, &assembly.pdf, id, &item.title).await?;
    ctx.progress.report(Stage::Finished);
    let item = ctx.repository.save_item(&item).await.or_raise(|| ErrorKind::Store)?;

    Ok(Outcome::Attached {
        item,
        attachment,
        pages: assembly.pages,
        requested: assembly.requested,
        stopped: assembly.stopped,
    })
}

fn stopped(item: CatalogItem, reason: Stop) -> Outcome {
    tracing::info!(id = %item.id, %reason, "Nothing to attach");
    Outcome::Stopped { item, reason }
}
