//! Timeline samples, per-region counters, and the end-of-run metric set.

use serde::{Deserialize, Serialize};

/// One per-second timeline point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub time: u64,
    pub cache_size: usize,
    /// Cumulative query hits up to and including this second.
    pub hits: u64,
    pub misses: u64,
}

impl Sample {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-region delivery and retrieval counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    pub region_id: u32,
    pub delivered: u64,
    pub dropped: u64,
    pub first_retrievals: u64,
    pub first_lat_sum: u64,
    pub avg_first_retrieval_latency: f64,
}

impl RegionStats {
    pub fn new(region_id: u32) -> Self {
        Self {
            region_id,
            delivered: 0,
            dropped: 0,
            first_retrievals: 0,
            first_lat_sum: 0,
            avg_first_retrieval_latency: 0.0,
        }
    }
}

/// Aggregated end-of-run metrics. All rate metrics lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub cache_hit_rate: f64,
    pub delivery_rate: f64,
    pub avg_freshness: f64,
    pub stale_access_rate: f64,
    pub redundancy_index: f64,
    pub actionability_first_ratio: f64,
    pub timeliness_consistency: f64,
    pub pushes_sent: u64,
    pub push_suppress_rate: f64,
    pub push_duplicate_rate: f64,
    pub push_timely_first_ratio: f64,
}

impl Metrics {
    /// Aggregation and CSV column order.
    pub const KEYS: [&'static str; 11] = [
        "cacheHitRate",
        "deliveryRate",
        "avgFreshness",
        "staleAccessRate",
        "redundancyIndex",
        "actionabilityFirstRatio",
        "timelinessConsistency",
        "pushesSent",
        "pushSuppressRate",
        "pushDuplicateRate",
        "pushTimelyFirstRatio",
    ];

    /// Metric value by serialized key name.
    pub fn value(&self, key: &str) -> Option<f64> {
        Some(match key {
            "cacheHitRate" => self.cache_hit_rate,
            "deliveryRate" => self.delivery_rate,
            "avgFreshness" => self.avg_freshness,
            "staleAccessRate" => self.stale_access_rate,
            "redundancyIndex" => self.redundancy_index,
            "actionabilityFirstRatio" => self.actionability_first_ratio,
            "timelinessConsistency" => self.timeliness_consistency,
            "pushesSent" => self.pushes_sent as f64,
            "pushSuppressRate" => self.push_suppress_rate,
            "pushDuplicateRate" => self.push_duplicate_rate,
            "pushTimelyFirstRatio" => self.push_timely_first_ratio,
            _ => return None,
        })
    }
}
