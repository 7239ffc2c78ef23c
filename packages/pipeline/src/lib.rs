// ABOUTME: Deal pipeline state management for Dealflow
// ABOUTME: Optimistic store, debounced filter coordination, analytics, and preference persistence

pub mod analytics;
pub mod coordinator;
pub mod error;
pub mod notify;
pub mod prefs;
pub mod store;

// Re-export main types from core
pub use dealflow_core::{
    ActivityEntry, ActivityInput, AnalyticsSnapshot, Brand, BrandContact, Deal, DealCreateInput,
    DealFilters, DealNote, DealStage, DealStatus, DealUpdateInput, DealValue, Deliverable,
    FilterUpdate, NoteInput, PageInfo, PageRequest, Priority, SortKey, SortOrder, SortSpec,
    StageFilter, StatusFilter, ValueRange,
};

// Re-export the API surface the store is wired against
pub use dealflow_client::{
    ApiError, ApiResult, DealApi, DealPage, HttpDealApi, ListDealsQuery, ValidationIssue,
};

// Re-export the store
pub use store::{PipelineStore, StoreStatus};

// Re-export filter coordination
pub use coordinator::{Debouncer, FilterCoordinator};

// Re-export error types
pub use error::{StoreError, StoreResult};

// Re-export notifications
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};

// Re-export preference persistence
pub use prefs::{PreferenceStore, Preferences};

// Re-export derived analytics
pub use analytics::{compute_snapshot, StageStats};
