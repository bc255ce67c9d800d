//! Alert stream synthesis.
//!
//! Produces the finite ordered alert sequence for a run: exponential
//! inter-arrival gaps scaled by the active segment, TTLs from a truncated
//! normal, severity draws biased by the issuing region's hazard class, and
//! a thread/update model that reuses or salts thread keys.

use crate::catalog::Scenario;
use alertsim_core::{Alert, Environment, EventType, Mulberry32, Severity, Urgency};
use std::collections::HashMap;

/// Synthesize at most `target_count` alerts over `[0, horizon_sec)`.
///
/// Draw order per alert: inter-arrival gap (1), TTL (2), region (1),
/// severity (1), urgency (1), event type (1), thread decision (1-3).
pub fn synthesize_alerts(
    rng: &mut Mulberry32,
    scenario: &Scenario,
    env: &Environment,
    target_count: usize,
    horizon_sec: u64,
) -> Vec<Alert> {
    let mut alerts = Vec::with_capacity(target_count.min(16_384));
    let mut threads: HashMap<String, u32> = HashMap::new();
    let mut t: u64 = 0;
    let mut next_id: u64 = 1;

    while alerts.len() < target_count {
        let segment = scenario.active_segment(t);
        let rate_per_sec =
            scenario.base_alert_rate_per_min / 60.0 * segment.alert_rate_mul;
        let gap = rng.exponential(1.0 / rate_per_sec).round().max(1.0) as u64;
        t += gap;
        if t >= horizon_sec {
            break;
        }

        let ttl_sec = rng
            .normal(scenario.mean_ttl_sec, scenario.mean_ttl_sec * 0.25)
            .round()
            .max(120.0) as u64;
        let region = &env.regions[rng.index(env.regions.len())];
        let severity = draw_severity(rng, region.severity);
        let urgency = draw_urgency(rng);
        let event_type = draw_event_type(rng);

        let (thread_key, update_no) =
            assign_thread(rng, &mut threads, event_type, region.id);

        let size_bytes = alert_size(event_type, severity);
        alerts.push(Alert {
            id: format!("a-{next_id}"),
            event_type,
            severity,
            urgency,
            issued_at: t,
            ttl_sec,
            headline: Some(format!(
                "{} warning for region {}",
                event_type.as_str(),
                region.id
            )),
            instruction: None,
            sender: None,
            region_id: region.id,
            size_bytes: Some(size_bytes),
            thread_key,
            update_no,
        });
        next_id += 1;
    }

    alerts
}

/// Severity distribution shifted by the region's hazard class:
/// 5% Unknown, (0.20 + bias) Extreme, (0.35 + 0.5 bias) Severe,
/// 0.30 Moderate, remainder Minor.
fn draw_severity(rng: &mut Mulberry32, region_severity: Severity) -> Severity {
    let bias = match region_severity {
        Severity::Extreme => 0.15,
        Severity::Severe => 0.08,
        _ => 0.0,
    };
    let u = rng.next_f64();
    let mut threshold = 0.05;
    if u < threshold {
        return Severity::Unknown;
    }
    threshold += 0.20 + bias;
    if u < threshold {
        return Severity::Extreme;
    }
    threshold += 0.35 + 0.5 * bias;
    if u < threshold {
        return Severity::Severe;
    }
    threshold += 0.30;
    if u < threshold {
        return Severity::Moderate;
    }
    Severity::Minor
}

fn draw_urgency(rng: &mut Mulberry32) -> Urgency {
    match rng.next_f64() {
        u if u < 0.45 => Urgency::Immediate,
        u if u < 0.85 => Urgency::Expected,
        u if u < 0.95 => Urgency::Future,
        u if u < 0.98 => Urgency::Past,
        _ => Urgency::Unknown,
    }
}

fn draw_event_type(rng: &mut Mulberry32) -> EventType {
    match rng.next_f64() {
        u if u < 0.70 => EventType::Flood,
        u if u < 0.85 => EventType::Shelter,
        _ => EventType::Other,
    }
}

/// Thread assignment: with probability 0.3 an alert extends the region's
/// existing base thread; otherwise with probability 0.4 it opens a salted
/// thread, else it lands on the base thread. Untaken branches consume no
/// draws.
fn assign_thread(
    rng: &mut Mulberry32,
    threads: &mut HashMap<String, u32>,
    event_type: EventType,
    region_id: u32,
) -> (String, u32) {
    let base_key = format!("{}:{}", event_type.as_str(), region_id);
    let u = rng.next_f64();
    let key = if u < 0.3 && threads.contains_key(&base_key) {
        base_key
    } else if rng.next_f64() < 0.4 {
        let salt = (rng.next_f64() * 1000.0).floor() as u32;
        format!("{base_key}:{salt}")
    } else {
        base_key
    };
    let counter = threads.entry(key.clone()).or_insert(0);
    *counter += 1;
    (key, *counter)
}

fn alert_size(event_type: EventType, severity: Severity) -> u32 {
    let base: f64 = match event_type {
        EventType::Flood => 1800.0,
        EventType::Shelter => 1200.0,
        EventType::Other => 900.0,
    };
    let scale: f64 = match severity {
        Severity::Extreme => 1.3,
        Severity::Severe => 1.15,
        _ => 1.0,
    };
    (base * scale).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::generate_environment;

    fn fixture(seed: &str) -> (Scenario, Environment) {
        let scenario = Scenario::by_name("Urban").unwrap().clone();
        let mut env_rng = Mulberry32::fork(seed, "env");
        let env =
            generate_environment(&mut env_rng, 960.0, 540.0, scenario.region_target);
        (scenario, env)
    }

    fn synthesize(seed: &str, count: usize, horizon: u64) -> Vec<Alert> {
        let (scenario, env) = fixture(seed);
        let mut rng = Mulberry32::from_seed_str(seed);
        synthesize_alerts(&mut rng, &scenario, &env, count, horizon)
    }

    #[test]
    fn respects_count_and_horizon_bounds() {
        let alerts = synthesize("demo", 400, 900);
        assert!(alerts.len() <= 400);
        assert!(!alerts.is_empty());
        for alert in &alerts {
            assert!(alert.issued_at < 900);
        }
    }

    #[test]
    fn identical_seeds_yield_identical_streams() {
        assert_eq!(synthesize("demo", 200, 900), synthesize("demo", 200, 900));
    }

    #[test]
    fn issue_times_strictly_increase() {
        let alerts = synthesize("demo", 400, 900);
        for pair in alerts.windows(2) {
            assert!(pair[0].issued_at < pair[1].issued_at);
        }
    }

    #[test]
    fn ttls_have_a_floor() {
        for alert in synthesize("demo", 400, 900) {
            assert!(alert.ttl_sec >= 120);
        }
    }

    #[test]
    fn regions_and_threads_are_consistent() {
        let (_, env) = fixture("demo");
        let alerts = synthesize("demo", 400, 900);
        for alert in &alerts {
            assert!(env.region(alert.region_id).is_some());
            assert!(alert
                .thread_key
                .starts_with(&format!("{}:{}", alert.event_type.as_str(), alert.region_id)));
            assert!(alert.update_no >= 1);
        }
    }

    #[test]
    fn update_numbers_increase_within_a_thread() {
        let alerts = synthesize("demo", 400, 900);
        let mut seen: HashMap<&str, u32> = HashMap::new();
        for alert in &alerts {
            let prev = seen.insert(alert.thread_key.as_str(), alert.update_no);
            if let Some(prev) = prev {
                assert_eq!(alert.update_no, prev + 1);
            } else {
                assert_eq!(alert.update_no, 1);
            }
        }
    }

    #[test]
    fn sizes_follow_event_and_severity() {
        for alert in synthesize("demo", 400, 900) {
            let size = alert.size_bytes.unwrap();
            match (alert.event_type, alert.severity) {
                (EventType::Flood, Severity::Extreme) => assert_eq!(size, 2340),
                (EventType::Flood, Severity::Severe) => assert_eq!(size, 2070),
                (EventType::Shelter, Severity::Extreme) => assert_eq!(size, 1560),
                (EventType::Other, Severity::Extreme) => assert_eq!(size, 1170),
                _ => assert!(size >= 900 && size <= 2340),
            }
        }
    }
}
