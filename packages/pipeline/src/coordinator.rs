// ABOUTME: Debounced filter and search coordination for the pipeline store
// ABOUTME: Collapses rapid filter edits into a single trailing re-fetch

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dealflow_core::{Deal, DealFilters, FilterUpdate, FILTER_DEBOUNCE, SEARCH_DEBOUNCE};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::PipelineStore;

/// Trailing-edge debouncer: each schedule aborts whatever was pending, so
/// only the last task in a burst actually runs.
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Debouncer {
            pending: Mutex::new(None),
        }
    }

    /// Run `task` after `window`, cancelling the previously scheduled run
    pub fn schedule<F>(&self, window: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            task.await;
        });
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending run without scheduling a replacement
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Owns the filter lifecycle on behalf of the view layer.
///
/// Filter edits merge into the store immediately (so controls render the new
/// values without waiting), while the matching re-fetch is debounced on the
/// trailing edge. Free-text search gets a longer window than structured
/// filters so a request does not fire mid-word.
pub struct FilterCoordinator {
    store: Arc<PipelineStore>,
    debouncer: Debouncer,
}

impl FilterCoordinator {
    pub fn new(store: Arc<PipelineStore>) -> Self {
        FilterCoordinator {
            store,
            debouncer: Debouncer::new(),
        }
    }

    pub fn store(&self) -> &Arc<PipelineStore> {
        &self.store
    }

    /// Merge a filter patch and arm the trailing re-fetch. Returns the merged
    /// filter set, already visible through the store.
    pub fn set_filters(&self, update: FilterUpdate) -> DealFilters {
        let window = if update.touches_search() {
            SEARCH_DEBOUNCE
        } else {
            FILTER_DEBOUNCE
        };
        let filters = self.store.apply_filter_update(&update);
        debug!("Scheduling filtered re-fetch in {:?}", window);

        let store = self.store.clone();
        self.debouncer.schedule(window, async move {
            store.fetch(true).await;
        });
        filters
    }

    /// Cancel any pending re-fetch, reset filters to the defaults, and fetch
    /// the unfiltered collection immediately.
    pub async fn clear_filters(&self) -> Vec<Deal> {
        self.debouncer.cancel();
        self.store.reset_filters();
        self.store.fetch(true).await
    }
}
