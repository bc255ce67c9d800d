//! Priority-and-freshness replacement, optionally boosted by the forecast
//! model.

use crate::forecast::PfModel;
use alertsim_core::Alert;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Decay constant for the eviction-score freshness term (1/600 per second,
/// independent of the alert's own TTL).
const SCORE_LAMBDA: f64 = 1.0 / 600.0;

/// Weights of the severity, urgency, and freshness terms of the eviction
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub severity: f64,
    pub urgency: f64,
    pub freshness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            severity: 2.0,
            urgency: 3.0,
            freshness: 4.0,
        }
    }
}

/// Bounded cache evicting the lowest-scoring entry on overflow.
///
/// `score(a, t) = w_S·sev + w_U·urg + w_F·exp(-λ(t - issued))`, plus the
/// forecast boost when a model is attached. Ties keep the first-seen entry.
#[derive(Debug)]
pub struct PriorityFreshPolicy {
    capacity: usize,
    weights: ScoreWeights,
    entries: HashMap<String, Arc<Alert>>,
    /// Alert ids in insertion order; scans run in this order so score ties
    /// resolve to the earliest insertion.
    order: Vec<String>,
    forecast: Option<PfModel>,
}

impl PriorityFreshPolicy {
    pub fn new(capacity: usize, weights: ScoreWeights, forecast: Option<PfModel>) -> Self {
        Self {
            capacity,
            weights,
            entries: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            forecast,
        }
    }

    pub fn forecast(&self) -> Option<&PfModel> {
        self.forecast.as_ref()
    }

    pub fn forecast_mut(&mut self) -> Option<&mut PfModel> {
        self.forecast.as_mut()
    }

    /// Eviction score of one alert at time `now`.
    pub fn score(&mut self, alert: &Alert, now: u64) -> f64 {
        let age = now.saturating_sub(alert.issued_at) as f64;
        let mut score = self.weights.severity * alert.severity.rank()
            + self.weights.urgency * alert.urgency.rank()
            + self.weights.freshness * (-SCORE_LAMBDA * age).exp();
        if let Some(model) = self.forecast.as_mut() {
            score += model.score(alert, now, false).boost;
        }
        score
    }

    fn purge_expired(&mut self, now: u64) {
        let entries = &mut self.entries;
        self.order.retain(|id| {
            if entries.get(id).is_some_and(|a| a.is_expired(now)) {
                entries.remove(id);
                false
            } else {
                true
            }
        });
    }

    pub fn put(&mut self, alert: Arc<Alert>, now: u64) {
        self.purge_expired(now);
        let id = alert.id.clone();
        if self.entries.insert(id.clone(), alert).is_some() {
            return;
        }
        self.order.push(id);
        // The candidate competes in its own admission: if it scores lowest
        // it is the eviction victim and the cache is effectively unchanged.
        if self.entries.len() > self.capacity {
            if let Some(victim) = self.lowest_scoring(now) {
                self.entries.remove(&victim);
                if let Some(pos) = self.order.iter().position(|o| *o == victim) {
                    self.order.remove(pos);
                }
            }
        }
    }

    /// Id of the first entry, in insertion order, attaining the lowest
    /// score.
    fn lowest_scoring(&mut self, now: u64) -> Option<String> {
        let ids: Vec<String> = self.order.clone();
        let mut worst: Option<(String, f64)> = None;
        for id in ids {
            let Some(alert) = self.entries.get(&id).cloned() else {
                continue;
            };
            let score = self.score(&alert, now);
            match &worst {
                Some((_, best)) if score >= *best => {}
                _ => worst = Some((id, score)),
            }
        }
        worst.map(|(id, _)| id)
    }

    pub fn get(&mut self, id: &str, now: u64) -> Option<Arc<Alert>> {
        self.purge_expired(now);
        self.entries.get(id).cloned()
    }

    pub fn has(&mut self, id: &str, now: u64) -> bool {
        self.purge_expired(now);
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order.
    pub fn entries(&mut self, now: u64) -> Vec<Arc<Alert>> {
        self.purge_expired(now);
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }
}
