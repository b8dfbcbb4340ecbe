//! Acquisition of DigiVatLib manuscripts for library items.
//!
//! When a catalog item is added to the library, [`on_add`] recognises
//! DigiVatLib titles, resolves the item's IIIF manifest, downloads the
//! selected pages into a PDF and attaches it to the item. [`dispatch`] feeds
//! library events to the pipeline.

pub mod error;
mod events;
pub mod import;
mod pipeline;
mod range;
mod resolve;

pub use crate::events::{LibraryEvent, dispatch};
pub use crate::import::persist_and_attach;
pub use crate::pipeline::{Outcome, SkipReason, Stop, on_add};
pub use crate::range::{
    AllPages, DialogRegistry, PageRange, RangeInput, RangePrompt, RangePromptHandle, RangeRequest,
};
pub use crate::resolve::{fetch_manifest, resolve_manifest_url};
use crate::pipeline::InFlight;
use digivat_extract::TitleClassifier;
use digivat_fetch::FetcherHandle;
use digivat_render::{NoProgress, ProgressReporter};
use digivat_storage::BackendHandle;
use digivat_store::Repository;
use std::sync::Arc;

pub type ProgressHandle = Arc<dyn ProgressReporter>;

/// Everything the pipeline talks to.
pub struct Context {
    pub repository: Repository,
    pub storage: BackendHandle,
    pub fetcher: FetcherHandle,
    pub classifier: TitleClassifier,
    pub dialogs: DialogRegistry,
    pub progress: ProgressHandle,
    in_flight: InFlight,
}

impl Context {
    pub fn new(
        repository: Repository,
        storage: BackendHandle,
        fetcher: FetcherHandle,
        prompt: RangePromptHandle,
    ) -> Self {
        Self {
            repository,
            storage,
            fetcher,
            classifier: TitleClassifier::default(),
            dialogs: DialogRegistry::new(prompt),
            progress: Arc::new(NoProgress),
            in_flight: InFlight::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: TitleClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = progress;
        self
    }
}
