//! The built-in scenario catalogue.
//!
//! A scenario bundles an alert arrival rate, a mean TTL, a first-delivery
//! SLA target, a region-count target for environment generation, and a
//! piecewise timeline of segments carrying reliability and rate
//! multipliers.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Default plane dimensions for environment generation.
pub const PLANE_WIDTH: f64 = 960.0;
pub const PLANE_HEIGHT: f64 = 540.0;

/// A half-open interval `[start_sec, end_sec)` of the run timeline.
/// `end_sec = None` means the segment runs to the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_sec: u64,
    pub end_sec: Option<u64>,
    /// Network reliability multiplier during this segment.
    pub reliability: f64,
    pub alert_rate_mul: f64,
    pub query_rate_mul: f64,
}

impl Segment {
    const fn new(
        start_sec: u64,
        end_sec: Option<u64>,
        reliability: f64,
        alert_rate_mul: f64,
        query_rate_mul: f64,
    ) -> Self {
        Self {
            start_sec,
            end_sec,
            reliability,
            alert_rate_mul,
            query_rate_mul,
        }
    }

    pub fn contains(&self, t: u64) -> bool {
        t >= self.start_sec && self.end_sec.map_or(true, |end| t < end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub base_alert_rate_per_min: f64,
    pub mean_ttl_sec: f64,
    /// SLA for first retrieval/push latency per thread.
    pub target_first_delivery_sec: u64,
    /// Region count handed to the environment generator.
    pub region_target: usize,
    pub segments: Vec<Segment>,
}

impl Scenario {
    /// The segment active at time `t`. Segments tile the timeline, so the
    /// final open-ended segment catches everything past the last boundary.
    pub fn active_segment(&self, t: u64) -> &Segment {
        self.segments
            .iter()
            .find(|seg| seg.contains(t))
            .unwrap_or_else(|| {
                self.segments
                    .last()
                    .expect("scenario has at least one segment")
            })
    }

    /// Case-insensitive catalogue lookup.
    pub fn by_name(name: &str) -> Option<&'static Scenario> {
        CATALOG
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn all() -> &'static [Scenario] {
        &CATALOG
    }
}

static CATALOG: Lazy<Vec<Scenario>> = Lazy::new(|| {
    vec![
        Scenario {
            name: "Urban".into(),
            base_alert_rate_per_min: 36.0,
            mean_ttl_sec: 900.0,
            target_first_delivery_sec: 120,
            region_target: 18,
            segments: vec![
                Segment::new(0, Some(180), 0.95, 1.0, 1.0),
                Segment::new(180, Some(420), 0.6, 1.5, 1.0),
                Segment::new(420, Some(900), 0.88, 1.0, 1.8),
                Segment::new(900, None, 0.96, 1.0, 1.0),
            ],
        },
        Scenario {
            name: "Suburban".into(),
            base_alert_rate_per_min: 12.0,
            mean_ttl_sec: 1200.0,
            target_first_delivery_sec: 180,
            region_target: 12,
            segments: vec![
                Segment::new(0, Some(240), 0.92, 1.0, 1.0),
                Segment::new(240, Some(720), 0.75, 1.2, 1.0),
                Segment::new(720, Some(1200), 0.85, 1.0, 1.4),
                Segment::new(1200, None, 0.93, 1.0, 1.0),
            ],
        },
        Scenario {
            name: "Rural".into(),
            base_alert_rate_per_min: 6.0,
            mean_ttl_sec: 1800.0,
            target_first_delivery_sec: 300,
            region_target: 8,
            segments: vec![
                Segment::new(0, Some(300), 0.9, 1.0, 1.0),
                Segment::new(300, Some(900), 0.55, 1.2, 0.8),
                Segment::new(900, Some(1500), 0.8, 1.0, 1.5),
                Segment::new(1500, None, 0.92, 1.0, 1.0),
            ],
        },
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(Scenario::by_name("urban").is_some());
        assert!(Scenario::by_name("RURAL").is_some());
        assert!(Scenario::by_name(" Suburban ").is_some());
        assert!(Scenario::by_name("Coastal").is_none());
    }

    #[test]
    fn catalogue_has_three_scenarios() {
        let names: Vec<&str> = Scenario::all().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Urban", "Suburban", "Rural"]);
    }

    #[test]
    fn active_segment_selects_by_time() {
        let urban = Scenario::by_name("Urban").unwrap();
        assert_eq!(urban.active_segment(0).reliability, 0.95);
        assert_eq!(urban.active_segment(179).reliability, 0.95);
        assert_eq!(urban.active_segment(180).reliability, 0.6);
        assert_eq!(urban.active_segment(419).alert_rate_mul, 1.5);
        assert_eq!(urban.active_segment(420).query_rate_mul, 1.8);
        assert_eq!(urban.active_segment(900).reliability, 0.96);
        assert_eq!(urban.active_segment(1_000_000).reliability, 0.96);
    }

    #[test]
    fn region_targets_match_catalogue() {
        assert_eq!(Scenario::by_name("Urban").unwrap().region_target, 18);
        assert_eq!(Scenario::by_name("Suburban").unwrap().region_target, 12);
        assert_eq!(Scenario::by_name("Rural").unwrap().region_target, 8);
    }
}
