//! Metric aggregation across replicate runs.

use alertsim_engine::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean and sample standard deviation per metric key.
///
/// Keyed maps stay ordered so serialized aggregates are stable. Sums are
/// left-folded in replicate order so aggregation is bit-reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub count: usize,
    pub mean: BTreeMap<String, f64>,
    pub stdev: BTreeMap<String, f64>,
}

/// Aggregate the fixed metric keys over the given runs.
///
/// Standard deviation is Bessel-corrected (`n - 1`); a single replicate
/// reports zero spread.
pub fn aggregate_metrics(metrics: &[Metrics]) -> AggregateMetrics {
    let count = metrics.len();
    let mut mean = BTreeMap::new();
    let mut stdev = BTreeMap::new();
    for key in Metrics::KEYS {
        let values: Vec<f64> = metrics
            .iter()
            .filter_map(|m| m.value(key))
            .collect();
        let n = values.len();
        if n == 0 {
            mean.insert(key.to_string(), 0.0);
            stdev.insert(key.to_string(), 0.0);
            continue;
        }
        let sum: f64 = values.iter().fold(0.0, |acc, v| acc + v);
        let avg = sum / n as f64;
        let spread = if n > 1 {
            let ss: f64 = values
                .iter()
                .fold(0.0, |acc, v| acc + (v - avg) * (v - avg));
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        mean.insert(key.to_string(), avg);
        stdev.insert(key.to_string(), spread);
    }
    AggregateMetrics { count, mean, stdev }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with_hit_rate(rate: f64) -> Metrics {
        Metrics {
            cache_hit_rate: rate,
            delivery_rate: 0.9,
            avg_freshness: 0.5,
            stale_access_rate: 0.0,
            redundancy_index: 0.1,
            actionability_first_ratio: 0.5,
            timeliness_consistency: 0.5,
            pushes_sent: 4,
            push_suppress_rate: 0.0,
            push_duplicate_rate: 0.0,
            push_timely_first_ratio: 0.0,
        }
    }

    #[test]
    fn mean_and_stdev_match_hand_computation() {
        let runs = [
            metrics_with_hit_rate(0.2),
            metrics_with_hit_rate(0.4),
            metrics_with_hit_rate(0.6),
        ];
        let agg = aggregate_metrics(&runs);
        assert_eq!(agg.count, 3);
        assert!((agg.mean["cacheHitRate"] - 0.4).abs() < 1e-12);
        // Sample stdev of {0.2, 0.4, 0.6} is 0.2.
        assert!((agg.stdev["cacheHitRate"] - 0.2).abs() < 1e-12);
        // Constant metrics have zero spread.
        assert_eq!(agg.stdev["deliveryRate"], 0.0);
    }

    #[test]
    fn single_replicate_has_zero_spread() {
        let agg = aggregate_metrics(&[metrics_with_hit_rate(0.7)]);
        for key in Metrics::KEYS {
            assert_eq!(agg.stdev[key], 0.0, "{key}");
        }
    }

    #[test]
    fn every_key_is_aggregated() {
        let agg = aggregate_metrics(&[metrics_with_hit_rate(0.5)]);
        for key in Metrics::KEYS {
            assert!(agg.mean.contains_key(key));
            assert!(agg.stdev.contains_key(key));
            assert!(agg.stdev[key] >= 0.0);
        }
    }

    #[test]
    fn empty_input_is_well_defined() {
        let agg = aggregate_metrics(&[]);
        assert_eq!(agg.count, 0);
        assert_eq!(agg.mean["cacheHitRate"], 0.0);
    }
}
