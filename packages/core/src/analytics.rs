use crate::types::DealStage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-stage aggregate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct StageMetrics {
    pub count: i64,
    #[serde(rename = "totalValue")]
    pub total_value: f64,
    #[serde(rename = "averageAgeDays")]
    pub average_age_days: f64,
}

/// Derived pipeline totals. Comes back from the analytics endpoint or is
/// recomputed locally from the loaded collection; never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalyticsSnapshot {
    #[serde(rename = "totalDeals")]
    pub total_deals: i64,
    #[serde(rename = "totalValue")]
    pub total_value: f64,
    #[serde(rename = "averageDealSize")]
    pub average_deal_size: f64,
    /// Fraction of deals that reached the paid stage, 0.0 to 1.0
    #[serde(rename = "conversionRate")]
    pub conversion_rate: f64,
    #[serde(rename = "byStage", default)]
    pub by_stage: HashMap<DealStage, StageMetrics>,
}

impl AnalyticsSnapshot {
    /// Metrics for one stage; zeroed when the stage has no entry.
    pub fn stage(&self, stage: DealStage) -> StageMetrics {
        self.by_stage.get(&stage).copied().unwrap_or_default()
    }
}
