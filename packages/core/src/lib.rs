// ABOUTME: Core types and constants for Dealflow
// ABOUTME: Foundational package providing the deal domain model shared across all Dealflow packages

pub mod analytics;
pub mod constants;
pub mod filters;
pub mod pagination;
pub mod types;

// Re-export main types
pub use types::{
    ActivityEntry, ActivityInput, Brand, BrandContact, Deal, DealCreateInput, DealNote, DealStage,
    DealStatus, DealUpdateInput, DealValue, Deliverable, NoteInput, Priority,
};

// Re-export filter state
pub use filters::{
    DateRange, DealFilters, FilterUpdate, SortKey, SortOrder, SortSpec, StageFilter, StatusFilter,
    ValueRange,
};

// Re-export pagination
pub use pagination::{PageInfo, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE};

// Re-export analytics
pub use analytics::{AnalyticsSnapshot, StageMetrics};

// Re-export constants
pub use constants::{
    dealflow_dir, preferences_file, CACHE_WINDOW, FILTER_DEBOUNCE, PREFERENCES_VERSION,
    SEARCH_DEBOUNCE,
};
