use crate::Context;
use crate::error::Result;
use crate::pipeline::{Outcome, on_add};
use async_stream::stream;
use digivat_store::ItemId;
use futures::Stream;

/// Change notifications raised by the host library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    Added(Vec<ItemId>),
    Modified(Vec<ItemId>),
    Deleted(Vec<ItemId>),
}

/// Run the pipeline for every item of a [`LibraryEvent::Added`] event.
///
/// Items are processed one after the other, in the order given. A failing
/// item is logged and yielded, and the remaining items are still processed.
/// Other events yield nothing.
pub fn dispatch(ctx: &Context, event: LibraryEvent) -> impl Stream<Item = (ItemId, Result<Outcome>)> + '_ {
    stream! {
        match event {
            LibraryEvent::Added(ids) => {
                for id in ids {
                    let result = on_add(ctx, id).await;
                    if let Err(err) = &result {
                        tracing::error!(%id, error = ?err, "Pipeline failed");
                    }
                    yield (id, result);
                }
            },
            LibraryEvent::Modified(_) | LibraryEvent::Deleted(_) => {
                tracing::debug!(?event, "Ignoring library event");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::tests::{PAGE, TITLE, add, catalog, harness};
    use crate::pipeline::SkipReason;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_added_items_are_processed_in_order() {
        let harness = harness(catalog(2), None).await;
        let ctx = &harness.ctx;
        let other = add(ctx, "Something else", None).await;
        let manuscript = add(ctx, TITLE, Some(PAGE)).await;
        let missing = ItemId::from(999);

        let results: Vec<_> = dispatch(ctx, LibraryEvent::Added(vec![other, missing, manuscript])).collect().await;
        let ids: Vec<_> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![other, missing, manuscript]);
        assert!(matches!(results[0].1, Ok(Outcome::Skipped(SkipReason::NotMatched))));
        assert!(matches!(results[1].1.as_ref().map_err(|e| &**e), Err(ErrorKind::NotFound(_))));
        assert!(matches!(results[2].1, Ok(Outcome::Attached { pages: 2, .. })));
    }

    #[tokio::test]
    async fn test_other_events_are_ignored() {
        let harness = harness(catalog(1), None).await;
        let ctx = &harness.ctx;
        let id = add(ctx, TITLE, Some(PAGE)).await;
        for event in [LibraryEvent::Modified(vec![id]), LibraryEvent::Deleted(vec![id])] {
            assert_eq!(dispatch(ctx, event).count().await, 0);
        }
        assert!(harness.fetcher.requests().await.is_empty());
        assert_eq!(ctx.repository.get_item(id).await.unwrap().unwrap().title, TITLE);
    }
}
