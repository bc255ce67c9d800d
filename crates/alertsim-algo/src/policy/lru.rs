//! Recency-only replacement.

use alertsim_core::Alert;
use std::collections::HashMap;
use std::sync::Arc;

/// Bounded cache evicting the least recently used entry on overflow.
#[derive(Debug)]
pub struct LruPolicy {
    capacity: usize,
    entries: HashMap<String, Arc<Alert>>,
    /// Alert ids, least recently used at the front.
    recency: Vec<String>,
}

impl LruPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: Vec::with_capacity(capacity),
        }
    }

    fn purge_expired(&mut self, now: u64) {
        let entries = &mut self.entries;
        self.recency.retain(|id| {
            if entries.get(id).is_some_and(|a| a.is_expired(now)) {
                entries.remove(id);
                false
            } else {
                true
            }
        });
    }

    fn touch(&mut self, id: &str) {
        if let Some(pos) = self.recency.iter().position(|r| r == id) {
            let id = self.recency.remove(pos);
            self.recency.push(id);
        }
    }

    pub fn put(&mut self, alert: Arc<Alert>, now: u64) {
        self.purge_expired(now);
        let id = alert.id.clone();
        if self.entries.insert(id.clone(), alert).is_some() {
            self.touch(&id);
            return;
        }
        if self.entries.len() > self.capacity {
            let victim = self.recency.remove(0);
            self.entries.remove(&victim);
        }
        self.recency.push(id);
    }

    pub fn get(&mut self, id: &str, now: u64) -> Option<Arc<Alert>> {
        self.purge_expired(now);
        let alert = self.entries.get(id)?.clone();
        self.touch(id);
        Some(alert)
    }

    pub fn has(&mut self, id: &str, now: u64) -> bool {
        self.purge_expired(now);
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries ordered least to most recently used.
    pub fn entries(&mut self, now: u64) -> Vec<Arc<Alert>> {
        self.purge_expired(now);
        self.recency
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }
}
