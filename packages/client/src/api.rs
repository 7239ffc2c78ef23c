use async_trait::async_trait;
use dealflow_core::{
    ActivityEntry, ActivityInput, AnalyticsSnapshot, Deal, DealCreateInput, DealFilters, DealNote,
    DealStage, DealUpdateInput, NoteInput, PageInfo, PageRequest, StageFilter, StatusFilter,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// Everything a list request carries: the active filter set plus the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ListDealsQuery {
    pub filters: DealFilters,
    pub page: PageRequest,
}

impl ListDealsQuery {
    pub fn new(filters: DealFilters, page: PageRequest) -> Self {
        ListDealsQuery { filters, page }
    }

    /// Encode as query-string pairs. Defaulted constraints are omitted so the
    /// request stays readable in server logs; page/limit and sort are always
    /// present.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let filters = &self.filters;
        let mut pairs = Vec::new();

        if !filters.search.is_empty() {
            pairs.push(("search".to_string(), filters.search.clone()));
        }
        if let StageFilter::Only(stage) = filters.stage {
            pairs.push(("stage".to_string(), stage.key().to_string()));
        }
        if let Some(brand) = &filters.brand {
            pairs.push(("brand".to_string(), brand.clone()));
        }
        if let Some(min) = filters.value_range.min {
            pairs.push(("minValue".to_string(), min.to_string()));
        }
        if let Some(max) = filters.value_range.max {
            pairs.push(("maxValue".to_string(), max.to_string()));
        }
        if let Some(from) = filters.date_range.from {
            pairs.push(("createdFrom".to_string(), from.to_rfc3339()));
        }
        if let Some(to) = filters.date_range.to {
            pairs.push(("createdTo".to_string(), to.to_rfc3339()));
        }
        if !filters.tags.is_empty() {
            pairs.push(("tags".to_string(), filters.tags.join(",")));
        }
        if filters.status != StatusFilter::Active {
            pairs.push(("status".to_string(), filters.status.key().to_string()));
        }
        pairs.push(("sortBy".to_string(), filters.sort.key.key().to_string()));
        pairs.push(("sortOrder".to_string(), filters.sort.order.key().to_string()));
        pairs.push(("page".to_string(), self.page.page().to_string()));
        pairs.push(("limit".to_string(), self.page.limit().to_string()));

        pairs
    }
}

/// One page of the deal list, with whatever metadata the server included
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DealPage {
    pub deals: Vec<Deal>,
    pub page_info: Option<PageInfo>,
    pub analytics: Option<AnalyticsSnapshot>,
}

/// The deals REST API, one method per resource verb.
///
/// The pipeline store talks only to this trait; tests swap in fakes and the
/// production wiring hands it an [`HttpDealApi`](crate::HttpDealApi).
#[async_trait]
pub trait DealApi: Send + Sync {
    async fn list_deals(&self, query: &ListDealsQuery) -> ApiResult<DealPage>;

    async fn get_deal(&self, id: &str) -> ApiResult<Deal>;

    async fn create_deal(&self, input: &DealCreateInput) -> ApiResult<Deal>;

    async fn update_deal(&self, id: &str, patch: &DealUpdateInput) -> ApiResult<Deal>;

    async fn update_stage(&self, id: &str, stage: DealStage) -> ApiResult<Deal>;

    async fn delete_deal(&self, id: &str) -> ApiResult<()>;

    async fn bulk_update(&self, ids: &[String], patch: &DealUpdateInput) -> ApiResult<()>;

    async fn bulk_delete(&self, ids: &[String]) -> ApiResult<()>;

    async fn add_note(&self, id: &str, input: &NoteInput) -> ApiResult<DealNote>;

    async fn add_activity(&self, id: &str, input: &ActivityInput) -> ApiResult<ActivityEntry>;

    async fn fetch_analytics(&self) -> ApiResult<AnalyticsSnapshot>;
}
