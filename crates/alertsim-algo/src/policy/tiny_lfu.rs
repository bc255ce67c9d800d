//! Frequency-gated admission over a recency-ordered store.

use alertsim_core::{Alert, FrequencySketch};
use std::collections::HashMap;
use std::sync::Arc;

/// How many of the coldest entries are sampled for the victim.
const VICTIM_SAMPLE: usize = 8;

/// TinyLFU-style admission: a count-min sketch tracks thread popularity;
/// a full cache only admits a candidate at least as popular as the victim.
#[derive(Debug)]
pub struct TinyLfuPolicy {
    capacity: usize,
    entries: HashMap<String, Arc<Alert>>,
    /// Alert ids, coldest (oldest untouched) at the front; `get` promotes
    /// to the back, so the victim sample reads from the front.
    order: Vec<String>,
    sketch: FrequencySketch,
}

/// Sketch key: the thread groups popularity; standalone alerts fall back
/// to their own id.
fn sketch_key(alert: &Alert) -> &str {
    if alert.thread_key.is_empty() {
        &alert.id
    } else {
        &alert.thread_key
    }
}

impl TinyLfuPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            sketch: FrequencySketch::new(capacity * 4),
        }
    }

    pub fn sketch(&self) -> &FrequencySketch {
        &self.sketch
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
        self.sketch.increment(sketch_key(&alert));

        let id = alert.id.clone();
        if self.entries.contains_key(&id) {
            self.entries.insert(id.clone(), alert);
            self.promote(&id);
            return;
        }
        if self.entries.len() < self.capacity {
            self.entries.insert(id.clone(), alert);
            self.order.push(id);
            return;
        }

        // Full: pick the least-frequent of the coldest entries and admit
        // only if the candidate is at least as popular.
        let Some(victim) = self.coldest_victim() else {
            return;
        };
        let candidate_freq = self.sketch.estimate(sketch_key(&alert));
        let victim_freq = self
            .entries
            .get(&victim)
            .map_or(0, |v| self.sketch.estimate(sketch_key(v)));
        if candidate_freq >= victim_freq {
            self.entries.remove(&victim);
            if let Some(pos) = self.order.iter().position(|o| *o == victim) {
                self.order.remove(pos);
            }
            self.entries.insert(id.clone(), alert);
            self.order.push(id);
        }
    }

    /// Lowest-estimate id among the first `VICTIM_SAMPLE` of the order;
    /// the earliest entry wins ties.
    fn coldest_victim(&self) -> Option<String> {
        let mut victim: Option<(String, u32)> = None;
        for id in self.order.iter().take(VICTIM_SAMPLE) {
            let Some(alert) = self.entries.get(id) else {
                continue;
            };
            let freq = self.sketch.estimate(sketch_key(alert));
            match &victim {
                Some((_, best)) if freq >= *best => {}
                _ => victim = Some((id.clone(), freq)),
            }
        }
        victim.map(|(id, _)| id)
    }

    fn promote(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            let id = self.order.remove(pos);
            self.order.push(id);
        }
    }

    pub fn get(&mut self, id: &str, now: u64) -> Option<Arc<Alert>> {
        self.purge_expired(now);
        let alert = self.entries.get(id)?.clone();
        self.sketch.increment(sketch_key(&alert));
        self.promote(id);
        Some(alert)
    }

    pub fn has(&mut self, id: &str, now: u64) -> bool {
        self.purge_expired(now);
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries ordered coldest first.
    pub fn entries(&mut self, now: u64) -> Vec<Arc<Alert>> {
        self.purge_expired(now);
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }
}
