//! Shared behavioral contracts across the four cache policies.

use alertsim_algo::{CachePolicy, PolicyKind, ScoreWeights};
use alertsim_core::{Alert, EventType, Severity, Urgency};
use std::sync::Arc;

fn alert(id: &str, severity: Severity, urgency: Urgency, issued_at: u64, ttl_sec: u64) -> Arc<Alert> {
    Arc::new(Alert {
        id: id.into(),
        event_type: EventType::Flood,
        severity,
        urgency,
        issued_at,
        ttl_sec,
        headline: None,
        instruction: None,
        sender: None,
        region_id: 0,
        size_bytes: Some(1800),
        thread_key: format!("flood:0:{id}"),
        update_no: 1,
    })
}

fn plain(id: &str, issued_at: u64) -> Arc<Alert> {
    alert(id, Severity::Moderate, Urgency::Expected, issued_at, 600)
}

fn policy(kind: PolicyKind, capacity: usize) -> CachePolicy {
    CachePolicy::new(kind, capacity, ScoreWeights::default(), None).unwrap()
}

#[test]
fn size_never_exceeds_capacity() {
    for kind in PolicyKind::ALL {
        let mut cache = policy(kind, 8);
        for i in 0..100 {
            cache.put(plain(&format!("a-{i}"), i), i);
            assert!(
                cache.len() <= 8,
                "{} grew past capacity at put {i}",
                kind.as_str()
            );
        }
    }
}

#[test]
fn absent_ids_return_none() {
    for kind in PolicyKind::ALL {
        let mut cache = policy(kind, 4);
        cache.put(plain("a-1", 0), 0);
        assert!(cache.get("a-999", 0).is_none(), "{}", kind.as_str());
        assert!(!cache.has("a-999", 0));
    }
}

#[test]
fn put_then_get_round_trips_while_fresh() {
    for kind in PolicyKind::ALL {
        let mut cache = policy(kind, 4);
        let a = plain("a-1", 0);
        cache.put(a.clone(), 0);
        let got = cache.get("a-1", 10).expect(kind.as_str());
        assert_eq!(got.as_ref(), a.as_ref());
        assert!(cache.has("a-1", 10));
    }
}

#[test]
fn expired_entries_vanish_from_reads() {
    for kind in PolicyKind::ALL {
        let mut cache = policy(kind, 4);
        cache.put(alert("a-1", Severity::Severe, Urgency::Immediate, 0, 100), 0);
        assert!(cache.get("a-1", 99).is_some());
        // Expiry boundary is inclusive.
        assert!(cache.get("a-1", 100).is_none(), "{}", kind.as_str());
        assert!(cache.entries(200).is_empty());
        assert_eq!(cache.len(), 0);
    }
}

#[test]
fn entries_exclude_expired_but_keep_fresh() {
    for kind in PolicyKind::ALL {
        let mut cache = policy(kind, 4);
        cache.put(alert("short", Severity::Moderate, Urgency::Expected, 0, 120), 0);
        cache.put(alert("long", Severity::Moderate, Urgency::Expected, 0, 5000), 0);
        let listed = cache.entries(150);
        assert_eq!(listed.len(), 1, "{}", kind.as_str());
        assert_eq!(listed[0].id, "long");
    }
}

#[test]
fn lru_evicts_least_recently_used() {
    let mut cache = policy(PolicyKind::Lru, 2);
    cache.put(plain("a-1", 0), 0);
    cache.put(plain("a-2", 1), 1);
    // Touch a-1 so a-2 becomes the coldest.
    assert!(cache.get("a-1", 2).is_some());
    cache.put(plain("a-3", 3), 3);
    assert!(cache.has("a-1", 3));
    assert!(!cache.has("a-2", 3));
    assert!(cache.has("a-3", 3));
}

#[test]
fn ttl_only_evicts_in_insertion_order() {
    let mut cache = policy(PolicyKind::TtlOnly, 2);
    cache.put(plain("a-1", 0), 0);
    cache.put(plain("a-2", 1), 1);
    // Unlike LRU, a lookup must not save the oldest entry.
    assert!(cache.get("a-1", 2).is_some());
    cache.put(plain("a-3", 3), 3);
    assert!(!cache.has("a-1", 3));
    assert!(cache.has("a-2", 3));
    assert!(cache.has("a-3", 3));
}

#[test]
fn priority_fresh_keeps_higher_scoring_entries() {
    let mut cache = policy(PolicyKind::PriorityFresh, 2);
    cache.put(alert("high-1", Severity::Extreme, Urgency::Immediate, 0, 3600), 0);
    cache.put(alert("high-2", Severity::Extreme, Urgency::Immediate, 0, 3600), 0);
    // A stale, minor, past alert must not displace either resident.
    cache.put(alert("low", Severity::Minor, Urgency::Past, 0, 3600), 0);
    assert!(cache.has("high-1", 1));
    assert!(cache.has("high-2", 1));
    assert!(!cache.has("low", 1));
}

#[test]
fn priority_fresh_evicts_the_lowest_scorer() {
    let mut cache = policy(PolicyKind::PriorityFresh, 2);
    cache.put(alert("low", Severity::Minor, Urgency::Past, 0, 3600), 0);
    cache.put(alert("mid", Severity::Moderate, Urgency::Expected, 0, 3600), 0);
    cache.put(alert("high", Severity::Extreme, Urgency::Immediate, 0, 3600), 0);
    assert!(!cache.has("low", 1));
    assert!(cache.has("mid", 1));
    assert!(cache.has("high", 1));
}

#[test]
fn tiny_lfu_rejects_unpopular_candidates() {
    let mut cache = policy(PolicyKind::PafTinyLfu, 2);
    let hot_a = alert("hot-a", Severity::Severe, Urgency::Immediate, 0, 3600);
    let hot_b = alert("hot-b", Severity::Severe, Urgency::Immediate, 0, 3600);
    cache.put(hot_a, 0);
    cache.put(hot_b, 0);
    // Repeated hits drive the residents' thread frequencies up.
    for _ in 0..6 {
        assert!(cache.get("hot-a", 1).is_some());
        assert!(cache.get("hot-b", 1).is_some());
    }
    cache.put(alert("cold", Severity::Extreme, Urgency::Immediate, 2, 3600), 2);
    assert!(!cache.has("cold", 2), "one-hit candidate displaced a hot entry");
    assert!(cache.has("hot-a", 2));
    assert!(cache.has("hot-b", 2));
}

#[test]
fn tiny_lfu_admits_once_candidate_is_popular() {
    let mut cache = policy(PolicyKind::PafTinyLfu, 2);
    cache.put(alert("res-a", Severity::Moderate, Urgency::Expected, 0, 3600), 0);
    cache.put(alert("res-b", Severity::Moderate, Urgency::Expected, 0, 3600), 0);
    for _ in 0..3 {
        assert!(cache.get("res-a", 0).is_some());
        assert!(cache.get("res-b", 0).is_some());
    }
    // Each rejected put still counts the candidate's thread in the
    // sketch; persistence eventually wins admission.
    for attempt in 0..4 {
        cache.put(
            alert("cand", Severity::Moderate, Urgency::Expected, attempt, 3600),
            attempt,
        );
    }
    assert!(cache.has("cand", 4));
    assert_eq!(cache.len(), 2);
}

#[test]
fn tiny_lfu_admission_respects_sketch_ordering() {
    let mut cache = policy(PolicyKind::PafTinyLfu, 4);
    for i in 0..4 {
        cache.put(plain(&format!("seed-{i}"), 0), 0);
    }
    for i in 0..50 {
        let candidate = plain(&format!("a-{i}"), i);
        let before: Vec<String> = cache.entries(i).iter().map(|a| a.id.clone()).collect();
        cache.put(candidate.clone(), i);
        let after: Vec<String> = cache.entries(i).iter().map(|a| a.id.clone()).collect();
        // If the candidate displaced someone, its estimate was at least
        // the victim's at decision time; the weaker invariant checked
        // here is that membership only changes when the candidate landed.
        if before != after {
            assert!(after.iter().any(|id| *id == candidate.id) || before.len() != after.len());
        }
        assert!(cache.len() <= 4);
    }
}
