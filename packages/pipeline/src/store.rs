// ABOUTME: The deal pipeline state container
// ABOUTME: Optimistic mutations with exact-snapshot rollback over a remote deals API

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use chrono::Utc;
use dealflow_client::{ApiError, DealApi, ListDealsQuery};
use dealflow_core::{
    ActivityEntry, ActivityInput, AnalyticsSnapshot, Deal, DealCreateInput, DealFilters, DealNote,
    DealStage, DealUpdateInput, FilterUpdate, NoteInput, PageInfo, PageRequest, CACHE_WINDOW,
};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::analytics::{compute_snapshot, StageStats};
use crate::error::{StoreError, StoreResult};
use crate::notify::{self, Notifier};
use crate::prefs::Preferences;

/// In-flight flags for view spinners and double-submit guards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub loading: bool,
    pub creating: bool,
    pub updating: bool,
    pub deleting: bool,
}

/// Everything the container owns. Guarded by one lock; actions clone out
/// what they need and never hold the guard across an await.
struct State {
    deals: Vec<Deal>,
    by_stage: HashMap<DealStage, Vec<String>>,
    filters: DealFilters,
    page: PageRequest,
    page_info: Option<PageInfo>,
    current_deal: Option<Deal>,
    analytics: Option<AnalyticsSnapshot>,
    status: StoreStatus,
    last_error: Option<StoreError>,
    cache_stamp: Option<Instant>,
    fetch_generation: u64,
}

/// Pre-mutation copy of the slices an optimistic action can touch.
/// Rollback restores this verbatim rather than re-deriving anything.
struct Snapshot {
    deals: Vec<Deal>,
    by_stage: HashMap<DealStage, Vec<String>>,
    current_deal: Option<Deal>,
}

fn empty_buckets() -> HashMap<DealStage, Vec<String>> {
    DealStage::ALL.iter().map(|stage| (*stage, Vec::new())).collect()
}

/// Detail sub-collections survive a reconcile when the server copy came from
/// a list-shaped endpoint that omits them.
fn merge_detail(mut server: Deal, local: &Deal) -> Deal {
    if server.notes.is_empty() && !local.notes.is_empty() {
        server.notes = local.notes.clone();
    }
    if server.activity.is_empty() && !local.activity.is_empty() {
        server.activity = local.activity.clone();
    }
    server
}

impl State {
    fn new() -> Self {
        State {
            deals: Vec::new(),
            by_stage: empty_buckets(),
            filters: DealFilters::default(),
            page: PageRequest::default(),
            page_info: None,
            current_deal: None,
            analytics: None,
            status: StoreStatus::default(),
            last_error: None,
            cache_stamp: None,
            fetch_generation: 0,
        }
    }

    fn deal_index(&self, id: &str) -> Option<usize> {
        self.deals.iter().position(|deal| deal.id == id)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            deals: self.deals.clone(),
            by_stage: self.by_stage.clone(),
            current_deal: self.current_deal.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.deals = snapshot.deals;
        self.by_stage = snapshot.by_stage;
        self.current_deal = snapshot.current_deal;
    }

    /// Rebucket every deal by its stage field, from scratch.
    fn rebuild_buckets(&mut self) {
        let mut buckets = empty_buckets();
        for deal in &self.deals {
            buckets.entry(deal.stage).or_default().push(deal.id.clone());
        }
        self.by_stage = buckets;
    }

    /// Pull `id` out of every bucket, then append it to `stage`'s bucket.
    /// Keeps the partition invariant no matter where the id was before.
    fn reslot(&mut self, id: &str, stage: DealStage) {
        for bucket in self.by_stage.values_mut() {
            bucket.retain(|existing| existing != id);
        }
        self.by_stage.entry(stage).or_default().push(id.to_string());
    }

    fn bucket_prepend(&mut self, stage: DealStage, id: &str) {
        self.by_stage
            .entry(stage)
            .or_default()
            .insert(0, id.to_string());
    }

    fn remove_deal(&mut self, id: &str) {
        self.deals.retain(|deal| deal.id != id);
        for bucket in self.by_stage.values_mut() {
            bucket.retain(|existing| existing != id);
        }
        if self.current_deal.as_ref().is_some_and(|deal| deal.id == id) {
            self.current_deal = None;
        }
    }

    /// Replace the optimistic entry with the authoritative server copy,
    /// fixing the bucket and the detail view in the same stroke.
    fn adopt_server_copy(&mut self, server: Deal) {
        let id = server.id.clone();
        let stage = server.stage;
        if let Some(index) = self.deal_index(&id) {
            let merged = merge_detail(server.clone(), &self.deals[index]);
            self.deals[index] = merged;
            self.reslot(&id, stage);
        }
        if let Some(current) = self.current_deal.as_mut() {
            if current.id == id {
                *current = merge_detail(server, current);
            }
        }
    }
}

/// The deal pipeline state container.
///
/// Holds the flat deal collection, a per-stage id index derived from it, the
/// active filter set and pagination, the current detail deal, and the
/// analytics snapshot. All mutation goes through the named actions below;
/// readers get cloned snapshots and never observe a half-applied mutation.
///
/// Mutating actions follow optimistic-apply, request, reconcile-or-rollback.
/// The rollback restores the exact pre-mutation snapshot. Mutations against
/// the same deal id are serialized through a per-id async lock; actions on
/// different ids interleave freely.
///
/// Constructed behind an `Arc` so background analytics refreshes can be
/// spawned without tying the store to any one task.
pub struct PipelineStore {
    api: Arc<dyn DealApi>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<State>,
    mutation_locks: Mutex<HashMap<String, Arc<TokioMutex<()>>>>,
    weak: Weak<PipelineStore>,
}

impl PipelineStore {
    pub fn new(api: Arc<dyn DealApi>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new_cyclic(|weak| PipelineStore {
            api,
            notifier,
            state: RwLock::new(State::new()),
            mutation_locks: Mutex::new(HashMap::new()),
            weak: weak.clone(),
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn id_lock(&self, id: &str) -> Arc<TokioMutex<()>> {
        let mut locks = self
            .mutation_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone()
    }

    async fn lock_id(&self, id: &str) -> OwnedMutexGuard<()> {
        self.id_lock(id).lock_owned().await
    }

    /// Acquire the per-id locks for a bulk operation in sorted order so two
    /// overlapping bulk calls cannot deadlock each other.
    async fn lock_ids(&self, ids: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            guards.push(self.id_lock(id).lock_owned().await);
        }
        guards
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// The flat deal collection, newest first
    pub fn deals(&self) -> Vec<Deal> {
        self.read_state().deals.clone()
    }

    /// Deals in one stage, in bucket order
    pub fn deals_by_stage(&self, stage: DealStage) -> Vec<Deal> {
        let state = self.read_state();
        let Some(bucket) = state.by_stage.get(&stage) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter_map(|id| state.deals.iter().find(|deal| &deal.id == id).cloned())
            .collect()
    }

    /// Summed deal value for one stage
    pub fn stage_total_value(&self, stage: DealStage) -> f64 {
        self.deals_by_stage(stage)
            .iter()
            .map(|deal| deal.value.amount)
            .sum()
    }

    /// Count, total/average value, and average age for one stage
    pub fn stage_stats(&self, stage: DealStage) -> StageStats {
        StageStats::compute(&self.deals_by_stage(stage), Utc::now())
    }

    pub fn current_deal(&self) -> Option<Deal> {
        self.read_state().current_deal.clone()
    }

    pub fn analytics(&self) -> Option<AnalyticsSnapshot> {
        self.read_state().analytics.clone()
    }

    pub fn filters(&self) -> DealFilters {
        self.read_state().filters.clone()
    }

    pub fn page(&self) -> PageRequest {
        self.read_state().page
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.read_state().page_info
    }

    pub fn status(&self) -> StoreStatus {
        self.read_state().status
    }

    /// The most recent failure, cleared by the next successful action.
    /// An empty collection plus `None` here means "no deals", not "failed".
    pub fn last_error(&self) -> Option<StoreError> {
        self.read_state().last_error.clone()
    }

    // ------------------------------------------------------------------
    // Filter and preference state
    // ------------------------------------------------------------------

    /// Merge a filter patch and reset pagination to page 1. Does not fetch;
    /// the coordinator owns the debounced re-fetch.
    pub fn apply_filter_update(&self, update: &FilterUpdate) -> DealFilters {
        let mut state = self.write_state();
        state.filters.apply(update);
        state.page = state.page.first_page();
        debug!("Filters changed, pagination reset to page 1");
        state.filters.clone()
    }

    /// Reset filters to the documented defaults and pagination to page 1
    pub fn reset_filters(&self) {
        let mut state = self.write_state();
        state.filters = DealFilters::default();
        state.page = state.page.first_page();
        debug!("Filters reset to defaults");
    }

    /// Current filter set and page, shaped for persistence
    pub fn preferences(&self) -> Preferences {
        let state = self.read_state();
        Preferences::new(state.filters.clone(), state.page)
    }

    /// Adopt persisted filter and pagination state, as at session start
    pub fn restore_preferences(&self, prefs: Preferences) {
        let mut state = self.write_state();
        state.filters = prefs.filters;
        state.page = prefs.page;
        debug!("Restored filter and pagination preferences");
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    /// Return the deal list, from cache when possible.
    ///
    /// Without `force_refresh`, a non-empty collection fetched within the
    /// cache window is served without a network call. On request failure the
    /// previous collection is preserved, the error is recorded, and an empty
    /// list is returned; check [`last_error`](Self::last_error) to tell
    /// "no deals" from "fetch failed".
    pub async fn fetch(&self, force_refresh: bool) -> Vec<Deal> {
        self.fetch_inner(force_refresh, false).await.unwrap_or_default()
    }

    /// Fetch the next page and append it to the collection. The page cursor
    /// is rolled back if the request fails.
    pub async fn fetch_next_page(&self) -> Vec<Deal> {
        let previous = {
            let mut state = self.write_state();
            let previous = state.page;
            state.page = state.page.next();
            previous
        };
        match self.fetch_inner(true, true).await {
            Ok(deals) => deals,
            Err(_) => {
                self.write_state().page = previous;
                Vec::new()
            }
        }
    }

    async fn fetch_inner(&self, force_refresh: bool, append: bool) -> StoreResult<Vec<Deal>> {
        if !append {
            let state = self.read_state();
            if !force_refresh && !state.deals.is_empty() {
                if let Some(stamp) = state.cache_stamp {
                    if stamp.elapsed() < CACHE_WINDOW {
                        debug!("Serving {} deals from cache", state.deals.len());
                        return Ok(state.deals.clone());
                    }
                }
            }
        }

        let (generation, query) = {
            let mut state = self.write_state();
            state.fetch_generation += 1;
            state.status.loading = true;
            (
                state.fetch_generation,
                ListDealsQuery::new(state.filters.clone(), state.page),
            )
        };

        match self.api.list_deals(&query).await {
            Ok(page) => {
                let mut state = self.write_state();
                if state.fetch_generation != generation {
                    warn!(
                        "Ignoring superseded list response (generation {} behind {})",
                        generation, state.fetch_generation
                    );
                    return Ok(state.deals.clone());
                }
                if append {
                    for deal in page.deals {
                        if state.deals.iter().any(|existing| existing.id == deal.id) {
                            debug!("Skipping duplicate deal {} in page append", deal.id);
                            continue;
                        }
                        state.deals.push(deal);
                    }
                } else {
                    state.deals = page.deals;
                }
                state.rebuild_buckets();
                state.page_info = page.page_info;
                if let Some(snapshot) = page.analytics {
                    state.analytics = Some(snapshot);
                }
                state.cache_stamp = Some(Instant::now());
                state.status.loading = false;
                state.last_error = None;
                debug!("Retrieved {} deals", state.deals.len());
                Ok(state.deals.clone())
            }
            Err(e) => {
                let err = StoreError::from(e);
                let superseded = {
                    let mut state = self.write_state();
                    if state.fetch_generation == generation {
                        state.status.loading = false;
                        state.last_error = Some(err.clone());
                        false
                    } else {
                        true
                    }
                };
                if superseded {
                    warn!("Ignoring superseded list failure: {}", err);
                } else {
                    error!("Failed to fetch deals: {}", err);
                    self.notifier.error(&notify::failure_message(&err));
                }
                Err(err)
            }
        }
    }

    /// Load one deal's full detail (notes and activity included) as the
    /// current deal, patching the matching list entry so list and detail
    /// views agree. Returns `None` on failure; the previous current deal is
    /// left in place and the error recorded.
    pub async fn fetch_one(&self, id: &str) -> Option<Deal> {
        match self.api.get_deal(id).await {
            Ok(deal) => {
                {
                    let mut state = self.write_state();
                    if let Some(index) = state.deal_index(&deal.id) {
                        state.deals[index] = deal.clone();
                        state.reslot(&deal.id, deal.stage);
                    }
                    state.current_deal = Some(deal.clone());
                    state.last_error = None;
                }
                debug!("Loaded deal detail for {}", id);
                Some(deal)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.write_state().last_error = Some(err.clone());
                warn!("Failed to load deal {}: {}", id, err);
                self.notifier.error(&notify::failure_message(&err));
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a deal. No client-side validation beyond the input shape; the
    /// server is the authority and its field-level rejections become one
    /// notification per field. On success the new deal is prepended to the
    /// collection and its stage bucket.
    pub async fn create(&self, input: DealCreateInput) -> StoreResult<Deal> {
        self.write_state().status.creating = true;

        match self.api.create_deal(&input).await {
            Ok(deal) => {
                {
                    let mut state = self.write_state();
                    state.deals.insert(0, deal.clone());
                    state.bucket_prepend(deal.stage, &deal.id);
                    state.status.creating = false;
                    state.last_error = None;
                }
                info!("Created deal '{}' with ID {}", deal.title, deal.id);
                self.notifier.success("Deal created");
                self.schedule_analytics_refresh();
                Ok(deal)
            }
            Err(e) => {
                let err = StoreError::from(e);
                {
                    let mut state = self.write_state();
                    state.status.creating = false;
                    state.last_error = Some(err.clone());
                }
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Apply a patch to a deal, optimistically.
    ///
    /// The merge is visible to readers before the request resolves. Success
    /// swaps in the server's authoritative copy; failure restores the exact
    /// pre-mutation snapshot and rethrows.
    pub async fn update(&self, id: &str, patch: DealUpdateInput) -> StoreResult<Deal> {
        let _guard = self.lock_id(id).await;

        let snapshot = {
            let mut state = self.write_state();
            let Some(index) = state.deal_index(id) else {
                drop(state);
                let err = StoreError::DealNotFound(id.to_string());
                self.record_failure(&err);
                return Err(err);
            };
            if patch.is_empty() {
                debug!("Ignoring empty update for deal {}", id);
                return Ok(state.deals[index].clone());
            }
            let snapshot = state.snapshot();
            let previous_stage = state.deals[index].stage;
            patch.apply_to(&mut state.deals[index]);
            let new_stage = state.deals[index].stage;
            if new_stage != previous_stage {
                state.reslot(id, new_stage);
            }
            if let Some(current) = state.current_deal.as_mut() {
                if current.id == id {
                    patch.apply_to(current);
                }
            }
            state.status.updating = true;
            snapshot
        };

        match self.api.update_deal(id, &patch).await {
            Ok(server) => {
                {
                    let mut state = self.write_state();
                    state.adopt_server_copy(server.clone());
                    state.status.updating = false;
                    state.last_error = None;
                }
                info!("Updated deal '{}' (ID: {})", server.title, server.id);
                self.notifier.success("Deal updated");
                if patch.touches_value_or_stage() {
                    self.schedule_analytics_refresh();
                }
                Ok(server)
            }
            Err(e) => {
                let err = StoreError::from(e);
                {
                    let mut state = self.write_state();
                    state.restore(snapshot);
                    state.status.updating = false;
                    state.last_error = Some(err.clone());
                }
                warn!("Rolling back update for deal {}: {}", id, err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Move a deal to another stage.
    ///
    /// The bucket move happens before the network call; failure fully
    /// reverses it (re-appending to the original bucket). A stage-change
    /// activity entry is recorded best-effort after a successful move.
    pub async fn move_to_stage(&self, id: &str, new_stage: DealStage) -> StoreResult<Deal> {
        let _guard = self.lock_id(id).await;

        let (snapshot, from_stage) = {
            let mut state = self.write_state();
            let Some(index) = state.deal_index(id) else {
                drop(state);
                let err = StoreError::DealNotFound(id.to_string());
                self.record_failure(&err);
                return Err(err);
            };
            let from_stage = state.deals[index].stage;
            if from_stage == new_stage {
                debug!("Deal {} already in {}", id, new_stage);
                return Ok(state.deals[index].clone());
            }
            let snapshot = state.snapshot();
            state.deals[index].stage = new_stage;
            state.reslot(id, new_stage);
            if let Some(current) = state.current_deal.as_mut() {
                if current.id == id {
                    current.stage = new_stage;
                }
            }
            state.status.updating = true;
            (snapshot, from_stage)
        };

        match self.api.update_stage(id, new_stage).await {
            Ok(server) => {
                {
                    let mut state = self.write_state();
                    state.adopt_server_copy(server.clone());
                    state.status.updating = false;
                    state.last_error = None;
                }
                info!("Moved deal '{}' to {} (ID: {})", server.title, new_stage, id);
                self.notifier
                    .success(&format!("Deal moved to {}", new_stage.display_name()));
                self.record_stage_change(id, from_stage, new_stage).await;
                self.schedule_analytics_refresh();
                Ok(server)
            }
            Err(e) => {
                let err = StoreError::from(e);
                {
                    let mut state = self.write_state();
                    state.restore(snapshot);
                    state.status.updating = false;
                    state.last_error = Some(err.clone());
                }
                warn!("Rolling back stage move for deal {}: {}", id, err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    async fn record_stage_change(&self, id: &str, from: DealStage, to: DealStage) {
        match self
            .api
            .add_activity(id, &ActivityInput::stage_change(from, to))
            .await
        {
            Ok(entry) => {
                let mut state = self.write_state();
                if let Some(current) = state.current_deal.as_mut() {
                    if current.id == id {
                        current.activity.push(entry);
                    }
                }
            }
            Err(e) => warn!("Could not record stage change for deal {}: {}", id, e),
        }
    }

    /// Delete a deal, optimistically removing it from the collection and its
    /// bucket. Failure restores the prior state verbatim.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let _guard = self.lock_id(id).await;

        let snapshot = {
            let mut state = self.write_state();
            let snapshot = state.snapshot();
            state.remove_deal(id);
            state.status.deleting = true;
            snapshot
        };

        match self.api.delete_deal(id).await {
            Ok(()) => {
                {
                    let mut state = self.write_state();
                    state.status.deleting = false;
                    state.last_error = None;
                }
                info!("Deleted deal (ID: {})", id);
                self.notifier.success("Deal deleted");
                self.schedule_analytics_refresh();
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                {
                    let mut state = self.write_state();
                    state.restore(snapshot);
                    state.status.deleting = false;
                    state.last_error = Some(err.clone());
                }
                warn!("Rolling back delete for deal {}: {}", id, err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Delete several deals in one request, with the same optimistic
    /// semantics as [`delete`](Self::delete).
    pub async fn bulk_delete(&self, ids: &[String]) -> StoreResult<()> {
        if ids.is_empty() {
            debug!("Ignoring empty bulk delete");
            return Ok(());
        }
        let _guards = self.lock_ids(ids).await;

        let snapshot = {
            let mut state = self.write_state();
            let snapshot = state.snapshot();
            for id in ids {
                state.remove_deal(id);
            }
            state.status.deleting = true;
            snapshot
        };

        match self.api.bulk_delete(ids).await {
            Ok(()) => {
                {
                    let mut state = self.write_state();
                    state.status.deleting = false;
                    state.last_error = None;
                }
                info!("Deleted {} deals", ids.len());
                self.notifier.success(&format!("{} deals deleted", ids.len()));
                self.schedule_analytics_refresh();
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                {
                    let mut state = self.write_state();
                    state.restore(snapshot);
                    state.status.deleting = false;
                    state.last_error = Some(err.clone());
                }
                warn!("Rolling back bulk delete of {} deals: {}", ids.len(), err);
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Patch several deals in one request. Deliberately not optimistic: a
    /// partial bulk failure cannot be reconciled client-side, so the request
    /// goes first and success triggers a full forced re-fetch instead of
    /// patching in place. Failure leaves local state untouched.
    pub async fn bulk_update(&self, ids: &[String], patch: DealUpdateInput) -> StoreResult<()> {
        if ids.is_empty() || patch.is_empty() {
            debug!("Ignoring empty bulk update");
            return Ok(());
        }
        self.write_state().status.updating = true;

        let result = {
            let _guards = self.lock_ids(ids).await;
            self.api.bulk_update(ids, &patch).await
        };

        match result {
            Ok(()) => {
                {
                    let mut state = self.write_state();
                    state.status.updating = false;
                    state.last_error = None;
                }
                info!("Updated {} deals, re-syncing the collection", ids.len());
                self.notifier.success(&format!("{} deals updated", ids.len()));
                self.fetch(true).await;
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                {
                    let mut state = self.write_state();
                    state.status.updating = false;
                    state.last_error = Some(err.clone());
                }
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Create a copy of a loaded deal: identity, notes, and activity are
    /// stripped and the copy starts at the top of the pipeline. The source
    /// must be in the local collection; no lookup request is made.
    pub async fn duplicate(&self, id: &str) -> StoreResult<Deal> {
        let source = {
            let state = self.read_state();
            state.deals.iter().find(|deal| deal.id == id).cloned()
        };
        let Some(source) = source else {
            let err = StoreError::DealNotFound(id.to_string());
            self.record_failure(&err);
            return Err(err);
        };
        debug!("Duplicating deal '{}' (ID: {})", source.title, source.id);
        self.create(DealCreateInput::duplicate_of(&source)).await
    }

    /// Append a note to a deal. On success the current deal's note list is
    /// updated in place; nothing is applied optimistically, so failure has
    /// nothing to roll back.
    pub async fn add_note(&self, id: &str, input: NoteInput) -> StoreResult<DealNote> {
        match self.api.add_note(id, &input).await {
            Ok(note) => {
                {
                    let mut state = self.write_state();
                    if let Some(current) = state.current_deal.as_mut() {
                        if current.id == id {
                            current.notes.push(note.clone());
                        }
                    }
                    state.last_error = None;
                }
                debug!("Added note to deal {}", id);
                Ok(note)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.write_state().last_error = Some(err.clone());
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    /// Append an activity entry to a deal. Same semantics as
    /// [`add_note`](Self::add_note).
    pub async fn add_activity(&self, id: &str, input: ActivityInput) -> StoreResult<ActivityEntry> {
        match self.api.add_activity(id, &input).await {
            Ok(entry) => {
                {
                    let mut state = self.write_state();
                    if let Some(current) = state.current_deal.as_mut() {
                        if current.id == id {
                            current.activity.push(entry.clone());
                        }
                    }
                    state.last_error = None;
                }
                debug!("Added activity entry to deal {}", id);
                Ok(entry)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.write_state().last_error = Some(err.clone());
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    /// Refresh the analytics snapshot: adopt the dedicated endpoint's answer
    /// when it responds, otherwise recompute every figure from the loaded
    /// collection. Background-safe; never records a user-facing error.
    pub async fn refresh_analytics(&self) {
        let snapshot = match self.api.fetch_analytics().await {
            Ok(snapshot) => {
                debug!("Adopted server analytics snapshot");
                snapshot
            }
            Err(e) => {
                debug!("Analytics endpoint unavailable, recomputing locally: {}", e);
                let state = self.read_state();
                compute_snapshot(&state.deals, Utc::now())
            }
        };
        self.write_state().analytics = Some(snapshot);
    }

    /// Fire-and-forget analytics refresh, spawned so the triggering action
    /// settles without waiting on it.
    fn schedule_analytics_refresh(&self) {
        let Some(store) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            store.refresh_analytics().await;
        });
    }

    // ------------------------------------------------------------------
    // Failure plumbing
    // ------------------------------------------------------------------

    fn record_failure(&self, err: &StoreError) {
        self.write_state().last_error = Some(err.clone());
        self.notify_failure(err);
    }

    fn notify_failure(&self, err: &StoreError) {
        if let StoreError::Api(ApiError::Validation(issues)) = err {
            if issues.is_empty() {
                self.notifier.error(&notify::failure_message(err));
                return;
            }
            for message in notify::validation_messages(issues) {
                self.notifier.error(&message);
            }
        } else {
            self.notifier.error(&notify::failure_message(err));
        }
    }
}
