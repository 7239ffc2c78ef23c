use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Pipeline stages, in funnel order.
///
/// The stage set is fixed and not user-editable; views derive column order,
/// labels, and colors from it but the stage key is the only identity that
/// crosses the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Lead,
    Negotiation,
    Confirmed,
    ContentCreation,
    Delivered,
    Paid,
}

impl DealStage {
    /// Every stage, in pipeline order.
    pub const ALL: [DealStage; 6] = [
        DealStage::Lead,
        DealStage::Negotiation,
        DealStage::Confirmed,
        DealStage::ContentCreation,
        DealStage::Delivered,
        DealStage::Paid,
    ];

    /// The stage newly created deals land in when none is given.
    pub fn initial() -> Self {
        DealStage::Lead
    }

    /// Stable wire key for this stage.
    pub fn key(&self) -> &'static str {
        match self {
            DealStage::Lead => "lead",
            DealStage::Negotiation => "negotiation",
            DealStage::Confirmed => "confirmed",
            DealStage::ContentCreation => "content_creation",
            DealStage::Delivered => "delivered",
            DealStage::Paid => "paid",
        }
    }

    /// Parse a wire key. Unknown keys return `None`; callers decide the
    /// fallback (the store buckets unknowns into the initial stage).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "lead" => Some(DealStage::Lead),
            "negotiation" => Some(DealStage::Negotiation),
            "confirmed" => Some(DealStage::Confirmed),
            "content_creation" => Some(DealStage::ContentCreation),
            "delivered" => Some(DealStage::Delivered),
            "paid" => Some(DealStage::Paid),
            _ => None,
        }
    }

    /// Human-readable name for column headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            DealStage::Lead => "Lead",
            DealStage::Negotiation => "Negotiation",
            DealStage::Confirmed => "Confirmed",
            DealStage::ContentCreation => "Content Creation",
            DealStage::Delivered => "Delivered",
            DealStage::Paid => "Paid",
        }
    }

    /// Accent color used by board views.
    pub fn color(&self) -> &'static str {
        match self {
            DealStage::Lead => "#94a3b8",
            DealStage::Negotiation => "#f59e0b",
            DealStage::Confirmed => "#3b82f6",
            DealStage::ContentCreation => "#8b5cf6",
            DealStage::Delivered => "#14b8a6",
            DealStage::Paid => "#22c55e",
        }
    }

    /// Zero-based position in the pipeline.
    pub fn order(&self) -> usize {
        match self {
            DealStage::Lead => 0,
            DealStage::Negotiation => 1,
            DealStage::Confirmed => 2,
            DealStage::ContentCreation => 3,
            DealStage::Delivered => 4,
            DealStage::Paid => 5,
        }
    }
}

impl Default for DealStage {
    fn default() -> Self {
        DealStage::initial()
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Deserialize a stage, falling back to the initial stage when the payload
/// carries an unknown key, `null`, or nothing at all.
fn stage_or_initial<'de, D>(deserializer: D) -> Result<DealStage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(DealStage::from_key)
        .unwrap_or_else(DealStage::initial))
}

/// Deserialize an optional stage, dropping unknown keys instead of failing.
fn lenient_stage_opt<'de, D>(deserializer: D) -> Result<Option<DealStage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(DealStage::from_key))
}

/// Active/archived flag on a deal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Active,
    Archived,
}

impl Default for DealStatus {
    fn default() -> Self {
        DealStatus::Active
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealStatus::Active => write!(f, "Active"),
            DealStatus::Archived => write!(f, "Archived"),
        }
    }
}

/// Priority levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// Contact sub-record on a brand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BrandContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The brand a deal is signed with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Brand {
    pub name: String,
    #[serde(default)]
    pub contact: Option<BrandContact>,
}

impl Brand {
    pub fn named(name: impl Into<String>) -> Self {
        Brand {
            name: name.into(),
            contact: None,
        }
    }
}

/// Monetary value of a deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealValue {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl DealValue {
    pub fn usd(amount: f64) -> Self {
        DealValue {
            amount,
            currency: default_currency(),
        }
    }
}

impl Default for DealValue {
    fn default() -> Self {
        DealValue::usd(0.0)
    }
}

/// One contracted deliverable (a post, video, story, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deliverable {
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

/// A free-text note attached to a deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealNote {
    #[serde(default)]
    pub id: Option<String>,
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// An entry in a deal's activity log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub action: String,
    #[serde(rename = "fromStage", default, deserialize_with = "lenient_stage_opt")]
    pub from_stage: Option<DealStage>,
    #[serde(rename = "toStage", default, deserialize_with = "lenient_stage_opt")]
    pub to_stage: Option<DealStage>,
    #[serde(default)]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Input for appending a note to a deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteInput {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl NoteInput {
    pub fn new(body: impl Into<String>) -> Self {
        NoteInput {
            body: body.into(),
            author: None,
        }
    }
}

/// Input for appending an activity-log entry to a deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityInput {
    pub action: String,
    #[serde(rename = "fromStage", skip_serializing_if = "Option::is_none")]
    pub from_stage: Option<DealStage>,
    #[serde(rename = "toStage", skip_serializing_if = "Option::is_none")]
    pub to_stage: Option<DealStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityInput {
    /// The entry recorded alongside every stage move.
    pub fn stage_change(from: DealStage, to: DealStage) -> Self {
        ActivityInput {
            action: "stage_change".to_string(),
            from_stage: Some(from),
            to_stage: Some(to),
            detail: None,
            timestamp: Utc::now(),
        }
    }
}

/// A deal
///
/// List responses omit `notes` and `activity`; both default to empty and are
/// filled in by a detail fetch. `stage` tolerates unknown wire values by
/// falling back to the initial stage so a single bad payload cannot wedge a
/// whole list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub brand: Brand,
    #[serde(default)]
    pub value: DealValue,
    #[serde(default, deserialize_with = "stage_or_initial")]
    pub stage: DealStage,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(rename = "campaignStart", default)]
    pub campaign_start: Option<DateTime<Utc>>,
    #[serde(rename = "campaignEnd", default)]
    pub campaign_end: Option<DateTime<Utc>>,
    #[serde(rename = "paymentDue", default)]
    pub payment_due: Option<DateTime<Utc>>,
    #[serde(rename = "paymentTerms", default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: DealStatus,
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<DealNote>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

/// Input for creating a new deal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealCreateInput {
    pub title: String,
    pub brand: Brand,
    pub value: DealValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<DealStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<Vec<Deliverable>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(rename = "campaignStart", skip_serializing_if = "Option::is_none")]
    pub campaign_start: Option<DateTime<Utc>>,
    #[serde(rename = "campaignEnd", skip_serializing_if = "Option::is_none")]
    pub campaign_end: Option<DateTime<Utc>>,
    #[serde(rename = "paymentDue", skip_serializing_if = "Option::is_none")]
    pub payment_due: Option<DateTime<Utc>>,
    #[serde(rename = "paymentTerms", skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
}

impl DealCreateInput {
    /// Minimal input: title, brand, and amount, everything else server-side
    /// defaults.
    pub fn new(title: impl Into<String>, brand: Brand, value: DealValue) -> Self {
        DealCreateInput {
            title: title.into(),
            brand,
            value,
            stage: None,
            deliverables: None,
            deadline: None,
            campaign_start: None,
            campaign_end: None,
            payment_due: None,
            payment_terms: None,
            tags: None,
            priority: None,
            brief: None,
        }
    }

    /// Build the creation input for a copy of `source`: identity, audit
    /// history, notes, and activity are stripped and the stage resets to the
    /// start of the pipeline.
    pub fn duplicate_of(source: &Deal) -> Self {
        DealCreateInput {
            title: source.title.clone(),
            brand: source.brand.clone(),
            value: source.value.clone(),
            stage: Some(DealStage::initial()),
            deliverables: Some(source.deliverables.clone()),
            deadline: source.deadline,
            campaign_start: source.campaign_start,
            campaign_end: source.campaign_end,
            payment_due: source.payment_due,
            payment_terms: source.payment_terms.clone(),
            tags: Some(source.tags.clone()),
            priority: Some(source.priority),
            brief: source.brief.clone(),
        }
    }
}

/// Patch for updating an existing deal. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DealUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<DealValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<DealStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<Vec<Deliverable>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(rename = "campaignStart", skip_serializing_if = "Option::is_none")]
    pub campaign_start: Option<DateTime<Utc>>,
    #[serde(rename = "campaignEnd", skip_serializing_if = "Option::is_none")]
    pub campaign_end: Option<DateTime<Utc>>,
    #[serde(rename = "paymentDue", skip_serializing_if = "Option::is_none")]
    pub payment_due: Option<DateTime<Utc>>,
    #[serde(rename = "paymentTerms", skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DealStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
}

impl DealUpdateInput {
    pub fn is_empty(&self) -> bool {
        self == &DealUpdateInput::default()
    }

    /// Whether applying this patch can change analytics output.
    pub fn touches_value_or_stage(&self) -> bool {
        self.value.is_some() || self.stage.is_some()
    }

    /// Merge the patch into `deal`, overwriting only the fields that are set.
    pub fn apply_to(&self, deal: &mut Deal) {
        if let Some(title) = &self.title {
            deal.title = title.clone();
        }
        if let Some(brand) = &self.brand {
            deal.brand = brand.clone();
        }
        if let Some(value) = &self.value {
            deal.value = value.clone();
        }
        if let Some(stage) = self.stage {
            deal.stage = stage;
        }
        if let Some(deliverables) = &self.deliverables {
            deal.deliverables = deliverables.clone();
        }
        if let Some(deadline) = self.deadline {
            deal.deadline = Some(deadline);
        }
        if let Some(start) = self.campaign_start {
            deal.campaign_start = Some(start);
        }
        if let Some(end) = self.campaign_end {
            deal.campaign_end = Some(end);
        }
        if let Some(due) = self.payment_due {
            deal.payment_due = Some(due);
        }
        if let Some(terms) = &self.payment_terms {
            deal.payment_terms = Some(terms.clone());
        }
        if let Some(tags) = &self.tags {
            deal.tags = tags.clone();
        }
        if let Some(priority) = self.priority {
            deal.priority = priority;
        }
        if let Some(status) = self.status {
            deal.status = status;
        }
        if let Some(brief) = &self.brief {
            deal.brief = Some(brief.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_deal_json() -> serde_json::Value {
        json!({
            "id": "d-100",
            "title": "Spring launch",
            "brand": {"name": "Acme", "contact": {"email": "hi@acme.test"}},
            "value": {"amount": 2500.0, "currency": "EUR"},
            "stage": "confirmed",
            "deliverables": [
                {"type": "video", "quantity": 2, "completed": false}
            ],
            "createdAt": "2026-05-01T09:00:00Z",
            "updatedAt": "2026-05-02T10:30:00Z"
        })
    }

    #[test]
    fn deal_deserializes_with_defaults_for_missing_collections() {
        let deal: Deal = serde_json::from_value(sample_deal_json()).unwrap();
        assert_eq!(deal.stage, DealStage::Confirmed);
        assert_eq!(deal.value.currency, "EUR");
        assert_eq!(deal.deliverables.len(), 1);
        assert!(deal.notes.is_empty());
        assert!(deal.activity.is_empty());
        assert_eq!(deal.priority, Priority::Medium);
        assert_eq!(deal.status, DealStatus::Active);
    }

    #[test]
    fn unknown_stage_falls_back_to_initial() {
        let mut body = sample_deal_json();
        body["stage"] = json!("pitched");
        let deal: Deal = serde_json::from_value(body).unwrap();
        assert_eq!(deal.stage, DealStage::Lead);

        let mut body = sample_deal_json();
        body.as_object_mut().unwrap().remove("stage");
        let deal: Deal = serde_json::from_value(body).unwrap();
        assert_eq!(deal.stage, DealStage::Lead);

        let mut body = sample_deal_json();
        body["stage"] = json!(null);
        let deal: Deal = serde_json::from_value(body).unwrap();
        assert_eq!(deal.stage, DealStage::Lead);
    }

    #[test]
    fn stage_keys_round_trip() {
        for stage in DealStage::ALL {
            assert_eq!(DealStage::from_key(stage.key()), Some(stage));
            let encoded = serde_json::to_value(stage).unwrap();
            assert_eq!(encoded, json!(stage.key()));
        }
        assert_eq!(DealStage::from_key("in_talks"), None);
    }

    #[test]
    fn stage_order_matches_all() {
        for (index, stage) in DealStage::ALL.iter().enumerate() {
            assert_eq!(stage.order(), index);
        }
        assert_eq!(DealStage::initial(), DealStage::Lead);
    }

    #[test]
    fn activity_entry_tolerates_unknown_stage_vocabulary() {
        let entry: ActivityEntry = serde_json::from_value(json!({
            "action": "stage_change",
            "fromStage": "pitched",
            "toStage": "negotiation",
            "timestamp": "2026-05-03T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.from_stage, None);
        assert_eq!(entry.to_stage, Some(DealStage::Negotiation));
    }

    #[test]
    fn update_patch_merges_only_set_fields() {
        let mut deal: Deal = serde_json::from_value(sample_deal_json()).unwrap();
        let before_brand = deal.brand.clone();

        let patch = DealUpdateInput {
            title: Some("Spring launch v2".to_string()),
            value: Some(DealValue::usd(3000.0)),
            ..Default::default()
        };
        patch.apply_to(&mut deal);

        assert_eq!(deal.title, "Spring launch v2");
        assert_eq!(deal.value.amount, 3000.0);
        assert_eq!(deal.brand, before_brand);
        assert_eq!(deal.stage, DealStage::Confirmed);
    }

    #[test]
    fn update_patch_serializes_only_set_fields() {
        let patch = DealUpdateInput {
            stage: Some(DealStage::Paid),
            ..Default::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, json!({"stage": "paid"}));
    }

    #[test]
    fn touches_value_or_stage_flags_analytics_relevance() {
        assert!(!DealUpdateInput::default().touches_value_or_stage());
        let title_only = DealUpdateInput {
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert!(!title_only.touches_value_or_stage());
        let stage = DealUpdateInput {
            stage: Some(DealStage::Delivered),
            ..Default::default()
        };
        assert!(stage.touches_value_or_stage());
    }

    #[test]
    fn duplicate_input_strips_identity_and_resets_stage() {
        let mut deal: Deal = serde_json::from_value(sample_deal_json()).unwrap();
        deal.notes.push(DealNote {
            id: Some("n-1".to_string()),
            body: "call notes".to_string(),
            author: None,
            created_at: Utc::now(),
        });
        deal.activity.push(ActivityEntry {
            id: Some("a-1".to_string()),
            action: "stage_change".to_string(),
            from_stage: Some(DealStage::Lead),
            to_stage: Some(DealStage::Confirmed),
            detail: None,
            timestamp: Utc::now(),
        });

        let input = DealCreateInput::duplicate_of(&deal);
        assert_eq!(input.title, deal.title);
        assert_eq!(input.stage, Some(DealStage::Lead));
        assert_eq!(input.value, deal.value);

        // Nothing identity-bearing survives into the serialized payload.
        let body = serde_json::to_value(&input).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("notes").is_none());
        assert!(body.get("activity").is_none());
    }

    #[test]
    fn stage_change_activity_carries_both_ends() {
        let input = ActivityInput::stage_change(DealStage::Lead, DealStage::Confirmed);
        assert_eq!(input.action, "stage_change");
        assert_eq!(input.from_stage, Some(DealStage::Lead));
        assert_eq!(input.to_stage, Some(DealStage::Confirmed));
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["fromStage"], json!("lead"));
        assert_eq!(body["toStage"], json!("confirmed"));
    }
}
