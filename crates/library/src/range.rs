//! Page range selection.

use async_trait::async_trait;
use digivat_store::ItemId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::instrument;

/// Half-open range `start..end` of pages to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn full(total: usize) -> Self {
        Self { start: 0, end: total }
    }

    /// Clamp raw input to `total` pages: `start` into `[0, total]`, then
    /// `end` into `[start, total]`.
    ///
    /// ```
    /// use digivat_library::PageRange;
    /// assert_eq!(PageRange::clamped(-5, 999, 50), PageRange { start: 0, end: 50 });
    /// assert_eq!(PageRange::clamped(30, 10, 50), PageRange { start: 30, end: 30 });
    /// ```
    pub fn clamped(start: i64, end: i64, total: usize) -> Self {
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        let start = start.clamp(0, total);
        let end = end.clamp(start, total);
        // Both values are within [0, total], which came from a usize.
        Self { start: start as usize, end: end as usize }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The part of `items` covered by this range.
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        &items[self.start.min(end)..end]
    }
}

/// Raw range as entered by the user, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeInput {
    pub start: i64,
    pub end: i64,
}

/// What the user is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    pub item: ItemId,
    pub title: String,
    pub total: usize,
}

/// Host UI that asks the user which pages to download.
#[async_trait]
pub trait RangePrompt: Send + Sync {
    /// Returns `None` when the user dismisses the prompt.
    async fn ask(&self, request: &RangeRequest) -> Option<RangeInput>;
}

pub type RangePromptHandle = Arc<dyn RangePrompt + Send + Sync>;

/// Prompt that always selects every page.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllPages;

#[async_trait]
impl RangePrompt for AllPages {
    async fn ask(&self, request: &RangeRequest) -> Option<RangeInput> {
        Some(RangeInput { start: 0, end: i64::try_from(request.total).unwrap_or(i64::MAX) })
    }
}

/// Open range dialogs, one slot per item.
///
/// Pipelines for different items can prompt at the same time without
/// overwriting each other's state. A second prompt for an item that already
/// has an open dialog gets the full range without asking.
pub struct DialogRegistry {
    prompt: RangePromptHandle,
    open: Mutex<HashMap<ItemId, RangeRequest>>,
}

struct DialogSlot<'a> {
    registry: &'a DialogRegistry,
    item: ItemId,
}
impl Drop for DialogSlot<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.item);
    }
}

impl DialogRegistry {
    pub fn new(prompt: RangePromptHandle) -> Self {
        Self { prompt, open: Mutex::default() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ItemId, RangeRequest>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests currently waiting for an answer.
    pub fn open_dialogs(&self) -> Vec<RangeRequest> {
        self.lock().values().cloned().collect()
    }

    /// Ask which of `total` pages to download for `item`.
    ///
    /// Confirmed input is clamped; a dismissed prompt selects every page.
    #[instrument(skip(self, title))]
    pub async fn prompt_page_range(&self, item: ItemId, title: &str, total: usize) -> PageRange {
        let request = RangeRequest { item, title: title.to_string(), total };
        let slot = {
            let mut open = self.lock();
            if open.contains_key(&item) {
                tracing::warn!("A range dialog is already open for this item; selecting all pages");
                return PageRange::full(total);
            }
            open.insert(item, request.clone());
            DialogSlot { registry: self, item }
        };
        let range = match self.prompt.ask(&request).await {
            Some(input) => PageRange::clamped(input.start, input.end, total),
            None => {
                tracing::debug!("Range dialog dismissed; selecting all pages");
                PageRange::full(total)
            },
        };
        drop(slot);
        tracing::debug!(start = range.start, end = range.end, "Page range selected");
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::sync::Notify;

    struct Fixed(Option<RangeInput>);
    #[async_trait]
    impl RangePrompt for Fixed {
        async fn ask(&self, _request: &RangeRequest) -> Option<RangeInput> {
            self.0
        }
    }

    /// Waits until released, so a test can observe the open slot.
    #[derive(Default)]
    struct Blocking(Notify);
    #[async_trait]
    impl RangePrompt for Blocking {
        async fn ask(&self, _request: &RangeRequest) -> Option<RangeInput> {
            self.0.notified().await;
            Some(RangeInput { start: 1, end: 2 })
        }
    }

    #[rstest]
    #[case(-5, 999, 50, 0, 50)]
    #[case(0, 50, 50, 0, 50)]
    #[case(10, 20, 50, 10, 20)]
    #[case(60, 70, 50, 50, 50)]
    #[case(20, 10, 50, 20, 20)]
    #[case(0, 0, 0, 0, 0)]
    fn test_clamped(#[case] start: i64, #[case] end: i64, #[case] total: usize, #[case] s: usize, #[case] e: usize) {
        assert_eq!(PageRange::clamped(start, end, total), PageRange { start: s, end: e });
    }

    #[test]
    fn test_select() {
        let pages = ["a", "b", "c", "d"];
        assert_eq!(PageRange { start: 1, end: 3 }.select(&pages), &["b", "c"]);
        assert!(PageRange { start: 2, end: 2 }.select(&pages).is_empty());
        // Out of bounds ranges are cut to the slice.
        assert_eq!(PageRange { start: 3, end: 9 }.select(&pages), &["d"]);
    }

    #[tokio::test]
    async fn test_confirmed_input_is_clamped() {
        let registry = DialogRegistry::new(Arc::new(Fixed(Some(RangeInput { start: -5, end: 999 }))));
        let range = registry.prompt_page_range(ItemId::from(1), "t", 50).await;
        assert_eq!(range, PageRange { start: 0, end: 50 });
    }

    #[tokio::test]
    async fn test_dismissal_selects_everything() {
        let registry = DialogRegistry::new(Arc::new(Fixed(None)));
        assert_eq!(registry.prompt_page_range(ItemId::from(1), "t", 12).await, PageRange::full(12));
    }

    #[tokio::test]
    async fn test_slots_are_keyed_by_item() {
        let prompt = Arc::new(Blocking::default());
        let registry = DialogRegistry::new(prompt.clone());
        let first = registry.prompt_page_range(ItemId::from(1), "one", 10);
        let second = registry.prompt_page_range(ItemId::from(2), "two", 20);
        let inspect = async {
            tokio::task::yield_now().await;
            let mut open: Vec<_> = registry.open_dialogs().into_iter().map(|r| (r.item, r.total)).collect();
            open.sort();
            assert_eq!(open, vec![(ItemId::from(1), 10), (ItemId::from(2), 20)]);
            prompt.0.notify_waiters();
        };
        let (first, second, ()) = tokio::join!(first, second, inspect);
        assert_eq!(first, PageRange { start: 1, end: 2 });
        assert_eq!(second, PageRange { start: 1, end: 2 });
        assert!(registry.open_dialogs().is_empty());
    }
}
