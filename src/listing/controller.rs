//! Listing controller - owns the listing state and runs the remote calls
//!
//! One controller instance backs one file-listing view. All mutable state
//! (accumulated objects, continuation cursor, sort spec, load state) sits in a
//! single `ListingState` behind a mutex that is never held across an await.
//!
//! Overlapping refreshes are resolved with a request generation: every
//! `reset_and_load` takes a new generation, and a run that finds a newer one at
//! merge time drops its page and stops without touching state or notifying.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use serde::Serialize;
use tracing::{debug, info};

use super::error_classifier::{ErrorClassifier, FailureKind, Operation};
use super::pager::{ContinuationState, Pager};
use super::sorting::{sorted_view, SortKey, SortSpec};
use crate::providers::{ListPage, ListingApi, ProviderError, RemoteObject};

/// Whether a load is running or the last one failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Error,
}

/// Result of one `reset_and_load` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The whole listing was scanned
    Completed { pages: u32, objects: usize },
    /// The configured page limit stopped the scan early
    PageLimitReached { pages: u32, objects: usize },
    /// A listing call failed; objects from earlier pages are kept
    Failed(FailureKind),
    /// A newer run started; this one wrote nothing after that point
    Superseded,
}

/// Result of `delete_entry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deleted remotely, followed by a full resync
    Deleted(LoadOutcome),
    /// The delete call failed; local state is untouched
    Failed(FailureKind),
}

#[derive(Debug, Default)]
struct ListingState {
    pager: Pager,
    sort: SortSpec,
    load_state: LoadState,
    generation: u64,
}

/// What the load loop does after a page settles
enum Step {
    Fetch(Option<String>),
    Done(LoadOutcome),
    Report(ProviderError),
}

pub struct FileManageController {
    api: Arc<dyn ListingApi>,
    classifier: ErrorClassifier,
    max_pages: Option<u32>,
    state: Mutex<ListingState>,
}

impl FileManageController {
    pub fn new(api: Arc<dyn ListingApi>, classifier: ErrorClassifier) -> Self {
        Self {
            api,
            classifier,
            max_pages: None,
            state: Mutex::new(ListingState::default()),
        }
    }

    /// Stop each scan after `max_pages` pages (`None` = no limit)
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages.filter(|n| *n > 0);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============ Pager ============

    /// Discard the current listing and fetch every page again.
    ///
    /// Failures are reported through the error classifier and folded into the
    /// returned outcome; nothing is propagated to the caller.
    pub async fn reset_and_load(&self) -> LoadOutcome {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.pager.reset();
            state.load_state = LoadState::Loading;
            state.generation
        };
        debug!("Listing {} (generation {})", self.api.display_name(), generation);

        let mut token: Option<String> = None;
        loop {
            let result = self.api.list_files(token.as_deref()).await;
            match self.settle_page(generation, result) {
                Step::Fetch(next) => token = next,
                Step::Done(outcome) => return outcome,
                Step::Report(error) => {
                    return LoadOutcome::Failed(self.classifier.handle(Operation::List, &error));
                }
            }
        }
    }

    fn settle_page(&self, generation: u64, result: Result<ListPage, ProviderError>) -> Step {
        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                "Dropping listing page from generation {} (current {})",
                generation, state.generation
            );
            return Step::Done(LoadOutcome::Superseded);
        }

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                // Earlier pages stay; no further pages are requested
                state.load_state = LoadState::Error;
                return Step::Report(error);
            }
        };

        let more = state.pager.merge_page(page);
        let pages = state.pager.pages();
        let objects = state.pager.objects().len();

        if !more {
            state.load_state = LoadState::Idle;
            info!("Loaded {} objects in {} page(s)", objects, pages);
            return Step::Done(LoadOutcome::Completed { pages, objects });
        }

        if let Some(limit) = self.max_pages {
            if pages >= limit {
                state.load_state = LoadState::Idle;
                info!("Stopped listing at page limit {} ({} objects)", limit, objects);
                return Step::Done(LoadOutcome::PageLimitReached { pages, objects });
            }
        }

        Step::Fetch(state.pager.continuation().token().map(str::to_string))
    }

    /// Delete `key` remotely, then resync the whole listing on success.
    pub async fn delete_entry(&self, key: &str) -> DeleteOutcome {
        match self.api.delete_file(key).await {
            Ok(()) => {
                info!("Deleted {}", key);
                DeleteOutcome::Deleted(self.reset_and_load().await)
            }
            Err(error) => DeleteOutcome::Failed(self.classifier.handle(Operation::Delete, &error)),
        }
    }

    // ============ Sorter ============

    /// Apply a column click and return the resulting spec
    pub fn set_sort(&self, key: SortKey) -> SortSpec {
        let mut state = self.lock();
        state.sort.set_sort(key);
        state.sort
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.lock().sort
    }

    /// Accumulated objects in display order
    pub fn sorted_files(&self) -> Vec<RemoteObject> {
        let state = self.lock();
        sorted_view(state.pager.objects(), state.sort)
    }

    // ============ Read-only state ============

    /// Accumulated objects in server page order
    pub fn files(&self) -> Vec<RemoteObject> {
        self.lock().pager.objects().to_vec()
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state
    }

    pub fn continuation(&self) -> ContinuationState {
        self.lock().pager.continuation().clone()
    }
}
