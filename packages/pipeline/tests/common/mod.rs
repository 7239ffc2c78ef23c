// ABOUTME: Common test utilities for pipeline integration tests
// ABOUTME: Provides a scripted DealApi double, deal fixtures, and invariant helpers
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dealflow_pipeline::{
    ActivityEntry, ActivityInput, AnalyticsSnapshot, ApiError, ApiResult, Brand, Deal, DealApi,
    DealCreateInput, DealNote, DealPage, DealStage, DealStatus, DealUpdateInput, DealValue,
    ListDealsQuery, NoteInput, PipelineStore, Priority, RecordingNotifier,
};
use tokio::sync::Semaphore;

/// Let spawned background work (debounced fetches, analytics refreshes) run
/// to completion on the current-thread test runtime.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}

/// A deal fixture `age_days` old, in the given stage
pub fn deal_fixture(id: &str, stage: DealStage, amount: f64, age_days: i64) -> Deal {
    let created_at = Utc::now() - Duration::days(age_days);
    Deal {
        id: id.to_string(),
        title: format!("Deal {}", id),
        brand: Brand::named("Acme"),
        value: DealValue::usd(amount),
        stage,
        deliverables: Vec::new(),
        deadline: None,
        campaign_start: None,
        campaign_end: None,
        payment_due: None,
        payment_terms: None,
        tags: Vec::new(),
        priority: Priority::Medium,
        status: DealStatus::Active,
        brief: None,
        created_at,
        updated_at: created_at,
        notes: Vec::new(),
        activity: Vec::new(),
    }
}

pub fn page_of(deals: Vec<Deal>) -> DealPage {
    DealPage {
        deals,
        page_info: None,
        analytics: None,
    }
}

pub fn note_fixture(body: &str) -> DealNote {
    DealNote {
        id: Some("note-1".to_string()),
        body: body.to_string(),
        author: None,
        created_at: Utc::now(),
    }
}

pub fn stage_activity(from: DealStage, to: DealStage) -> ActivityEntry {
    ActivityEntry {
        id: Some("act-1".to_string()),
        action: "stage_change".to_string(),
        from_stage: Some(from),
        to_stage: Some(to),
        detail: None,
        timestamp: Utc::now(),
    }
}

pub fn store_with(api: Arc<FakeApi>) -> (Arc<PipelineStore>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = PipelineStore::new(api, notifier.clone());
    (store, notifier)
}

/// Every deal appears in exactly one stage bucket, the one matching its
/// stage field.
pub fn assert_partition(store: &PipelineStore) {
    let deals = store.deals();
    let mut bucketed = 0;
    for stage in DealStage::ALL {
        let bucket = store.deals_by_stage(stage);
        for deal in &bucket {
            assert_eq!(
                deal.stage, stage,
                "Deal {} sits in the {} bucket but carries stage {}",
                deal.id, stage, deal.stage
            );
        }
        bucketed += bucket.len();
    }
    assert_eq!(
        bucketed,
        deals.len(),
        "Each deal should appear in exactly one stage bucket"
    );
}

/// Releases a request held open by [`FakeApi::gate_next_list`] or
/// [`FakeApi::gate_next_update`].
pub struct GateHandle(Arc<Semaphore>);

impl GateHandle {
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

type Queue<T> = Mutex<VecDeque<ApiResult<T>>>;

fn push<T>(queue: &Queue<T>, response: ApiResult<T>) {
    queue.lock().expect("queue lock").push_back(response);
}

fn pop<T>(queue: &Queue<T>, method: &str) -> ApiResult<T> {
    queue
        .lock()
        .expect("queue lock")
        .pop_front()
        .unwrap_or_else(|| panic!("FakeApi: unexpected {} call", method))
}

async fn wait(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let taken = gate.lock().expect("gate lock").take();
    if let Some(semaphore) = taken {
        let permit = semaphore.acquire().await.expect("gate semaphore closed");
        permit.forget();
    }
}

/// Scripted stand-in for the deals API.
///
/// Responses are queued per method and handed out in call order; a call on an
/// empty queue panics so a test notices unexpected traffic. Counters record
/// how often each method fired. The analytics and activity endpoints default
/// to an HTTP failure instead of panicking, since the store calls them
/// best-effort in the background of other actions.
///
/// `gate_next_list` / `gate_next_update` hold the next matching request open
/// (after its response is bound, so ordering stays scripted) until the
/// returned handle releases it.
#[derive(Default)]
pub struct FakeApi {
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub stage_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub bulk_update_calls: AtomicUsize,
    pub bulk_delete_calls: AtomicUsize,
    pub note_calls: AtomicUsize,
    pub activity_calls: AtomicUsize,
    pub analytics_calls: AtomicUsize,

    list_queue: Queue<DealPage>,
    get_queue: Queue<Deal>,
    create_queue: Queue<Deal>,
    update_queue: Queue<Deal>,
    stage_queue: Queue<Deal>,
    delete_queue: Queue<()>,
    bulk_update_queue: Queue<()>,
    bulk_delete_queue: Queue<()>,
    note_queue: Queue<DealNote>,
    activity_queue: Queue<ActivityEntry>,
    analytics_queue: Queue<AnalyticsSnapshot>,

    list_gate: Mutex<Option<Arc<Semaphore>>>,
    update_gate: Mutex<Option<Arc<Semaphore>>>,

    pub last_create: Mutex<Option<DealCreateInput>>,
    pub last_bulk_update: Mutex<Option<(Vec<String>, DealUpdateInput)>>,
    pub last_query: Mutex<Option<ListDealsQuery>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeApi::default())
    }

    pub fn queue_list(&self, response: ApiResult<DealPage>) {
        push(&self.list_queue, response);
    }

    pub fn queue_get(&self, response: ApiResult<Deal>) {
        push(&self.get_queue, response);
    }

    pub fn queue_create(&self, response: ApiResult<Deal>) {
        push(&self.create_queue, response);
    }

    pub fn queue_update(&self, response: ApiResult<Deal>) {
        push(&self.update_queue, response);
    }

    pub fn queue_stage(&self, response: ApiResult<Deal>) {
        push(&self.stage_queue, response);
    }

    pub fn queue_delete(&self, response: ApiResult<()>) {
        push(&self.delete_queue, response);
    }

    pub fn queue_bulk_update(&self, response: ApiResult<()>) {
        push(&self.bulk_update_queue, response);
    }

    pub fn queue_bulk_delete(&self, response: ApiResult<()>) {
        push(&self.bulk_delete_queue, response);
    }

    pub fn queue_note(&self, response: ApiResult<DealNote>) {
        push(&self.note_queue, response);
    }

    pub fn queue_activity(&self, response: ApiResult<ActivityEntry>) {
        push(&self.activity_queue, response);
    }

    pub fn queue_analytics(&self, response: ApiResult<AnalyticsSnapshot>) {
        push(&self.analytics_queue, response);
    }

    pub fn gate_next_list(&self) -> GateHandle {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.list_gate.lock().expect("gate lock") = Some(semaphore.clone());
        GateHandle(semaphore)
    }

    pub fn gate_next_update(&self) -> GateHandle {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.update_gate.lock().expect("gate lock") = Some(semaphore.clone());
        GateHandle(semaphore)
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn analytics_count(&self) -> usize {
        self.analytics_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DealApi for FakeApi {
    async fn list_deals(&self, query: &ListDealsQuery) -> ApiResult<DealPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().expect("capture lock") = Some(query.clone());
        let response = pop(&self.list_queue, "list_deals");
        wait(&self.list_gate).await;
        response
    }

    async fn get_deal(&self, _id: &str) -> ApiResult<Deal> {
        pop(&self.get_queue, "get_deal")
    }

    async fn create_deal(&self, input: &DealCreateInput) -> ApiResult<Deal> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_create.lock().expect("capture lock") = Some(input.clone());
        pop(&self.create_queue, "create_deal")
    }

    async fn update_deal(&self, _id: &str, _patch: &DealUpdateInput) -> ApiResult<Deal> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let response = pop(&self.update_queue, "update_deal");
        wait(&self.update_gate).await;
        response
    }

    async fn update_stage(&self, _id: &str, _stage: DealStage) -> ApiResult<Deal> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.stage_queue, "update_stage")
    }

    async fn delete_deal(&self, _id: &str) -> ApiResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.delete_queue, "delete_deal")
    }

    async fn bulk_update(&self, ids: &[String], patch: &DealUpdateInput) -> ApiResult<()> {
        self.bulk_update_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_bulk_update.lock().expect("capture lock") =
            Some((ids.to_vec(), patch.clone()));
        pop(&self.bulk_update_queue, "bulk_update")
    }

    async fn bulk_delete(&self, _ids: &[String]) -> ApiResult<()> {
        self.bulk_delete_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.bulk_delete_queue, "bulk_delete")
    }

    async fn add_note(&self, _id: &str, _input: &NoteInput) -> ApiResult<DealNote> {
        self.note_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.note_queue, "add_note")
    }

    async fn add_activity(&self, _id: &str, _input: &ActivityInput) -> ApiResult<ActivityEntry> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.activity_queue.lock().expect("queue lock").pop_front();
        queued.unwrap_or_else(|| {
            Err(ApiError::Http {
                status: 501,
                message: "activity log disabled".to_string(),
            })
        })
    }

    async fn fetch_analytics(&self) -> ApiResult<AnalyticsSnapshot> {
        self.analytics_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.analytics_queue.lock().expect("queue lock").pop_front();
        queued.unwrap_or_else(|| {
            Err(ApiError::Http {
                status: 501,
                message: "analytics disabled".to_string(),
            })
        })
    }
}
