use crate::types::DealStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stage constraint: everything, or exactly one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFilter {
    All,
    Only(DealStage),
}

impl StageFilter {
    /// Wire/query key: `all` or the stage key.
    pub fn key(&self) -> &'static str {
        match self {
            StageFilter::All => "all",
            StageFilter::Only(stage) => stage.key(),
        }
    }
}

impl Default for StageFilter {
    fn default() -> Self {
        StageFilter::All
    }
}

impl Serialize for StageFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for StageFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == "all" {
            return Ok(StageFilter::All);
        }
        DealStage::from_key(&raw)
            .map(StageFilter::Only)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown stage filter '{}'", raw)))
    }
}

/// Archived-state constraint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Active,
    Archived,
    All,
}

impl StatusFilter {
    pub fn key(&self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Archived => "archived",
            StatusFilter::All => "all",
        }
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::Active
    }
}

/// Inclusive bounds on deal value. Unset ends are unbounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Inclusive bounds on creation date. Unset ends are unbounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Field the deal list is ordered by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Value,
    Deadline,
    Title,
}

impl SortKey {
    pub fn key(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::Value => "value",
            SortKey::Deadline => "deadline",
            SortKey::Title => "title",
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::CreatedAt
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn key(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

/// Sort field plus direction. Defaults to newest-first by creation date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        SortSpec { key, order }
    }
}

/// The active filter set for the deal list.
///
/// The default set is the documented reset target: empty search, all stages,
/// active deals only, no other constraints, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub stage: StageFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "valueRange", default)]
    pub value_range: ValueRange,
    #[serde(rename = "dateRange", default)]
    pub date_range: DateRange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub sort: SortSpec,
}

impl Default for DealFilters {
    fn default() -> Self {
        DealFilters {
            search: String::new(),
            stage: StageFilter::All,
            brand: None,
            value_range: ValueRange::default(),
            date_range: DateRange::default(),
            tags: Vec::new(),
            status: StatusFilter::Active,
            sort: SortSpec::default(),
        }
    }
}

impl DealFilters {
    /// Merge a partial update into this set. Unset patch fields leave the
    /// current value alone; empty-string search/brand and empty tag lists
    /// clear their constraint rather than matching nothing.
    pub fn apply(&mut self, update: &FilterUpdate) {
        if let Some(search) = &update.search {
            self.search = search.trim().to_string();
        }
        if let Some(stage) = update.stage {
            self.stage = stage;
        }
        if let Some(brand) = &update.brand {
            let trimmed = brand.trim();
            self.brand = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let Some(range) = update.value_range {
            self.value_range = range;
        }
        if let Some(range) = update.date_range {
            self.date_range = range;
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(sort) = update.sort {
            self.sort = sort;
        }
    }

    pub fn is_default(&self) -> bool {
        self == &DealFilters::default()
    }
}

/// Partial filter update. Every field is optional; set fields replace the
/// current value wholesale (ranges included), unset fields are untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterUpdate {
    pub search: Option<String>,
    pub stage: Option<StageFilter>,
    pub brand: Option<String>,
    pub value_range: Option<ValueRange>,
    pub date_range: Option<DateRange>,
    pub tags: Option<Vec<String>>,
    pub status: Option<StatusFilter>,
    pub sort: Option<SortSpec>,
}

impl FilterUpdate {
    /// The free-text search gets the longer debounce window.
    pub fn touches_search(&self) -> bool {
        self.search.is_some()
    }

    pub fn search(text: impl Into<String>) -> Self {
        FilterUpdate {
            search: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn stage(stage: StageFilter) -> Self {
        FilterUpdate {
            stage: Some(stage),
            ..Default::default()
        }
    }
}
