// ABOUTME: Local analytics aggregation over the loaded deal collection
// ABOUTME: Fallback for when the analytics endpoint is unavailable, plus per-stage stats

use chrono::{DateTime, Utc};
use dealflow_core::{AnalyticsSnapshot, Deal, DealStage, StageMetrics};
use std::collections::HashMap;

/// Per-stage figures handed to board column headers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageStats {
    pub count: usize,
    pub total_value: f64,
    pub average_value: f64,
    pub average_age_days: f64,
}

impl StageStats {
    /// Compute stats over the deals of one stage.
    pub fn compute(deals: &[Deal], now: DateTime<Utc>) -> Self {
        if deals.is_empty() {
            return StageStats::default();
        }
        let count = deals.len();
        let total_value: f64 = deals.iter().map(|deal| deal.value.amount).sum();
        let total_age: f64 = deals.iter().map(|deal| age_days(deal, now)).sum();
        StageStats {
            count,
            total_value,
            average_value: total_value / count as f64,
            average_age_days: round1(total_age / count as f64),
        }
    }
}

/// Recompute the full snapshot from the loaded collection.
///
/// Every stage gets an entry, including empty ones, so board columns never
/// have to special-case a missing key. Conversion rate is the fraction of
/// deals that reached the paid stage.
pub fn compute_snapshot(deals: &[Deal], now: DateTime<Utc>) -> AnalyticsSnapshot {
    let total_deals = deals.len() as i64;
    let total_value: f64 = deals.iter().map(|deal| deal.value.amount).sum();
    let average_deal_size = if total_deals > 0 {
        total_value / total_deals as f64
    } else {
        0.0
    };

    let paid = deals
        .iter()
        .filter(|deal| deal.stage == DealStage::Paid)
        .count();
    let conversion_rate = if total_deals > 0 {
        round4(paid as f64 / total_deals as f64)
    } else {
        0.0
    };

    let mut by_stage: HashMap<DealStage, StageMetrics> = DealStage::ALL
        .iter()
        .map(|stage| (*stage, StageMetrics::default()))
        .collect();
    let mut age_sums: HashMap<DealStage, f64> = HashMap::new();

    for deal in deals {
        let metrics = by_stage.entry(deal.stage).or_default();
        metrics.count += 1;
        metrics.total_value += deal.value.amount;
        *age_sums.entry(deal.stage).or_insert(0.0) += age_days(deal, now);
    }
    for (stage, metrics) in by_stage.iter_mut() {
        if metrics.count > 0 {
            let age_sum = age_sums.get(stage).copied().unwrap_or(0.0);
            metrics.average_age_days = round1(age_sum / metrics.count as f64);
        }
    }

    AnalyticsSnapshot {
        total_deals,
        total_value,
        average_deal_size,
        conversion_rate,
        by_stage,
    }
}

/// Days since creation, never negative (clock skew on server timestamps)
fn age_days(deal: &Deal, now: DateTime<Utc>) -> f64 {
    let seconds = (now - deal.created_at).num_seconds();
    (seconds.max(0) as f64) / 86_400.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
