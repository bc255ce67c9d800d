//! Insertion-order replacement with lazy expiry.

use alertsim_core::Alert;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Bounded FIFO cache: overflow evicts the oldest insertion; reads drop
/// expired entries lazily.
#[derive(Debug)]
pub struct TtlOnlyPolicy {
    capacity: usize,
    entries: HashMap<String, Arc<Alert>>,
    /// Alert ids in insertion order, oldest at the front.
    order: VecDeque<String>,
}

impl TtlOnlyPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
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
            // Re-inserting an id refreshes the value but keeps its slot.
            return;
        }
        if self.entries.len() > self.capacity {
            if let Some(victim) = self.order.pop_front() {
                self.entries.remove(&victim);
            }
        }
        self.order.push_back(id);
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
