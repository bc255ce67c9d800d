//! Cache replacement disciplines.
//!
//! A policy is a capacity-bounded mapping from alert id to a shared alert,
//! with TTL-aware reads: expired entries are purged before any lookup or
//! enumeration. The four disciplines are a closed sum type so the engine
//! can treat them uniformly without open dispatch.

mod lru;
mod priority_fresh;
mod tiny_lfu;
mod ttl_only;

pub use lru::LruPolicy;
pub use priority_fresh::{PriorityFreshPolicy, ScoreWeights};
pub use tiny_lfu::TinyLfuPolicy;
pub use ttl_only::TtlOnlyPolicy;

use crate::forecast::PfModel;
use alertsim_core::{Alert, SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The four replacement disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    Lru,
    TtlOnly,
    PriorityFresh,
    PafTinyLfu,
}

impl PolicyKind {
    /// Comparison and CSV output order.
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Lru,
        PolicyKind::TtlOnly,
        PolicyKind::PriorityFresh,
        PolicyKind::PafTinyLfu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Lru => "LRU",
            PolicyKind::TtlOnly => "TTLOnly",
            PolicyKind::PriorityFresh => "PriorityFresh",
            PolicyKind::PafTinyLfu => "PAFTinyLFU",
        }
    }

    pub fn parse(name: &str) -> SimResult<Self> {
        let trimmed = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SimError::Config(format!("unknown policy '{name}'")))
    }
}

/// A capacity-bounded alert cache under one of the four disciplines.
#[derive(Debug)]
pub enum CachePolicy {
    Lru(LruPolicy),
    TtlOnly(TtlOnlyPolicy),
    PriorityFresh(PriorityFreshPolicy),
    PafTinyLfu(TinyLfuPolicy),
}

impl CachePolicy {
    /// Build a policy. `weights` and `pf` only apply to PriorityFresh; the
    /// forecast model is dropped for other kinds.
    pub fn new(
        kind: PolicyKind,
        capacity: usize,
        weights: ScoreWeights,
        pf: Option<PfModel>,
    ) -> SimResult<Self> {
        if capacity == 0 {
            return Err(SimError::Config("cache capacity must be positive".into()));
        }
        Ok(match kind {
            PolicyKind::Lru => CachePolicy::Lru(LruPolicy::new(capacity)),
            PolicyKind::TtlOnly => CachePolicy::TtlOnly(TtlOnlyPolicy::new(capacity)),
            PolicyKind::PriorityFresh => {
                CachePolicy::PriorityFresh(PriorityFreshPolicy::new(capacity, weights, pf))
            }
            PolicyKind::PafTinyLfu => CachePolicy::PafTinyLfu(TinyLfuPolicy::new(capacity)),
        })
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            CachePolicy::Lru(_) => PolicyKind::Lru,
            CachePolicy::TtlOnly(_) => PolicyKind::TtlOnly,
            CachePolicy::PriorityFresh(_) => PolicyKind::PriorityFresh,
            CachePolicy::PafTinyLfu(_) => PolicyKind::PafTinyLfu,
        }
    }

    /// Admit an alert, evicting per discipline when full.
    pub fn put(&mut self, alert: Arc<Alert>, now: u64) {
        match self {
            CachePolicy::Lru(p) => p.put(alert, now),
            CachePolicy::TtlOnly(p) => p.put(alert, now),
            CachePolicy::PriorityFresh(p) => p.put(alert, now),
            CachePolicy::PafTinyLfu(p) => p.put(alert, now),
        }
    }

    /// Look up an unexpired alert, updating recency bookkeeping.
    pub fn get(&mut self, id: &str, now: u64) -> Option<Arc<Alert>> {
        match self {
            CachePolicy::Lru(p) => p.get(id, now),
            CachePolicy::TtlOnly(p) => p.get(id, now),
            CachePolicy::PriorityFresh(p) => p.get(id, now),
            CachePolicy::PafTinyLfu(p) => p.get(id, now),
        }
    }

    pub fn has(&mut self, id: &str, now: u64) -> bool {
        match self {
            CachePolicy::Lru(p) => p.has(id, now),
            CachePolicy::TtlOnly(p) => p.has(id, now),
            CachePolicy::PriorityFresh(p) => p.has(id, now),
            CachePolicy::PafTinyLfu(p) => p.has(id, now),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CachePolicy::Lru(p) => p.len(),
            CachePolicy::TtlOnly(p) => p.len(),
            CachePolicy::PriorityFresh(p) => p.len(),
            CachePolicy::PafTinyLfu(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unexpired entries in the policy's internal order.
    pub fn entries(&mut self, now: u64) -> Vec<Arc<Alert>> {
        match self {
            CachePolicy::Lru(p) => p.entries(now),
            CachePolicy::TtlOnly(p) => p.entries(now),
            CachePolicy::PriorityFresh(p) => p.entries(now),
            CachePolicy::PafTinyLfu(p) => p.entries(now),
        }
    }

    /// The composed forecast model, when this is PriorityFresh with one
    /// attached.
    pub fn forecast_mut(&mut self) -> Option<&mut PfModel> {
        match self {
            CachePolicy::PriorityFresh(p) => p.forecast_mut(),
            _ => None,
        }
    }

    pub fn forecast(&self) -> Option<&PfModel> {
        match self {
            CachePolicy::PriorityFresh(p) => p.forecast(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names_round_trip() {
        for kind in PolicyKind::ALL {
            assert_eq!(PolicyKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert_eq!(PolicyKind::parse("lru").unwrap(), PolicyKind::Lru);
        assert_eq!(
            PolicyKind::parse("paftinylfu").unwrap(),
            PolicyKind::PafTinyLfu
        );
        assert!(PolicyKind::parse("ARC").is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err =
            CachePolicy::new(PolicyKind::Lru, 0, ScoreWeights::default(), None).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}
