//! The alert data model: the fundamental unit moving through the simulator.

use serde::{Deserialize, Serialize};

/// Event category. The set is open in principle; the synthesizer only
/// emits these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Flood,
    Shelter,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Flood => "flood",
            EventType::Shelter => "shelter",
            EventType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    Extreme,
    Unknown,
}

impl Severity {
    /// Eviction-score and query-weight rank.
    pub fn rank(&self) -> f64 {
        match self {
            Severity::Extreme => 4.0,
            Severity::Severe => 3.0,
            Severity::Moderate => 2.0,
            Severity::Minor => 1.0,
            Severity::Unknown => 2.0,
        }
    }

    /// Unit-interval encoding used by the forecast features.
    pub fn unit(&self) -> f64 {
        match self {
            Severity::Extreme => 1.0,
            Severity::Severe => 0.75,
            Severity::Moderate => 0.45,
            Severity::Minor => 0.25,
            Severity::Unknown => 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Immediate,
    Expected,
    Future,
    Past,
    Unknown,
}

impl Urgency {
    /// Eviction-score and query-weight rank.
    pub fn rank(&self) -> f64 {
        match self {
            Urgency::Immediate => 3.0,
            Urgency::Expected => 2.0,
            Urgency::Future => 1.5,
            Urgency::Past => 0.5,
            Urgency::Unknown => 1.5,
        }
    }
}

/// A time-bounded emergency notification.
///
/// Alerts sharing a `thread_key` form a logical thread of updates over the
/// same (event type, region) pair; `update_no` counts position within the
/// thread. An alert is expired at wall time `t >= issued_at + ttl_sec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub urgency: Urgency,
    /// Seconds since the start of the run.
    pub issued_at: u64,
    pub ttl_sec: u64,
    pub headline: Option<String>,
    pub instruction: Option<String>,
    pub sender: Option<String>,
    pub region_id: u32,
    pub size_bytes: Option<u32>,
    pub thread_key: String,
    pub update_no: u32,
}

impl Alert {
    pub fn expires_at(&self) -> u64 {
        self.issued_at + self.ttl_sec
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at()
    }

    /// `exp(-age/ttl)` in `(0, 1]` while the alert lives, 0 past expiry.
    pub fn freshness(&self, now: u64) -> f64 {
        if self.is_expired(now) {
            return 0.0;
        }
        let age = now.saturating_sub(self.issued_at) as f64;
        (-age / self.ttl_sec as f64).exp()
    }

    /// Immediate urgency or Severe/Extreme severity.
    pub fn is_high_impact(&self) -> bool {
        self.urgency == Urgency::Immediate
            || matches!(self.severity, Severity::Extreme | Severity::Severe)
    }
}
