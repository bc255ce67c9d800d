//! End-to-end engine runs on the literal seeds the simulator's behavior
//! is pinned to.

use alertsim_engine::{run_simulation, PfOptions, PushOptions, RunOptions};

fn urban_demo() -> RunOptions {
    // The defaults are exactly the demo configuration.
    RunOptions::default()
}

fn rural_lru() -> RunOptions {
    RunOptions {
        scenario: "Rural".into(),
        policy: "LRU".into(),
        cache_size: 32,
        target_alerts: 150,
        baseline_reliability: 0.55,
        duration_sec: 1500,
        seed: "rural-lru-1".into(),
        ..RunOptions::default()
    }
}

#[test]
fn urban_priority_fresh_demo_run() {
    let result = run_simulation(&urban_demo()).unwrap();

    assert_eq!(result.environment.regions.len(), 18);
    assert_eq!(result.timeline.len(), 900);
    assert!(
        result.issued_alerts.len() == 400 || result.issued_alerts.len() >= 200,
        "unexpected issue volume {}",
        result.issued_alerts.len()
    );
    assert!(
        result.metrics.delivery_rate >= 0.55,
        "delivery rate {}",
        result.metrics.delivery_rate
    );
    assert!(result.metrics.cache_hit_rate > 0.0);
    assert_eq!(result.scenario, "Urban");
    assert_eq!(result.seed, "demo");
}

#[test]
fn identical_options_reproduce_identical_results() {
    let options = urban_demo();
    let a = run_simulation(&options).unwrap();
    let b = run_simulation(&options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn pf_runs_reproduce_identical_weights() {
    let options = RunOptions {
        pf: Some(PfOptions::default()),
        ..urban_demo()
    };
    let a = run_simulation(&options).unwrap();
    let b = run_simulation(&options).unwrap();
    let wa = &a.pf_state.as_ref().unwrap().weights;
    let wb = &b.pf_state.as_ref().unwrap().weights;
    assert_eq!(wa.len(), 23 + 32);
    for (x, y) in wa.iter().zip(wb.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    assert_eq!(a, b);
}

#[test]
fn rural_lru_accounts_for_every_alert() {
    let result = run_simulation(&rural_lru()).unwrap();

    assert_eq!(result.timeline.len(), 1500);
    assert!(result.timeline[1499].cache_size <= 32);
    let delivered: u64 = result.region_stats.iter().map(|r| r.delivered).sum();
    let dropped: u64 = result.region_stats.iter().map(|r| r.dropped).sum();
    assert_eq!(delivered + dropped, result.issued_alerts.len() as u64);
    assert_eq!(delivered, result.delivered_alerts.len() as u64);
    // Push is off by default.
    assert_eq!(result.metrics.pushes_sent, 0);
    assert_eq!(result.metrics.push_suppress_rate, 0.0);
}

#[test]
fn suburban_tinylfu_respects_capacity_at_every_sample() {
    let options = RunOptions {
        scenario: "Suburban".into(),
        policy: "PAFTinyLFU".into(),
        cache_size: 64,
        target_alerts: 300,
        duration_sec: 1200,
        seed: "s#1".into(),
        ..RunOptions::default()
    };
    let result = run_simulation(&options).unwrap();
    for sample in &result.timeline {
        assert!(sample.cache_size <= 64, "cache overflow at t={}", sample.time);
    }
}

#[test]
fn cumulative_counters_never_decrease() {
    let result = run_simulation(&urban_demo()).unwrap();
    for pair in result.timeline.windows(2) {
        assert!(pair[1].hits >= pair[0].hits);
        assert!(pair[1].misses >= pair[0].misses);
        assert_eq!(pair[1].time, pair[0].time + 1);
    }
}

#[test]
fn metrics_stay_in_bounds() {
    for options in [urban_demo(), rural_lru()] {
        let m = run_simulation(&options).unwrap().metrics;
        for (name, value) in [
            ("cacheHitRate", m.cache_hit_rate),
            ("deliveryRate", m.delivery_rate),
            ("avgFreshness", m.avg_freshness),
            ("staleAccessRate", m.stale_access_rate),
            ("redundancyIndex", m.redundancy_index),
            ("actionabilityFirstRatio", m.actionability_first_ratio),
            ("timelinessConsistency", m.timeliness_consistency),
            ("pushSuppressRate", m.push_suppress_rate),
            ("pushDuplicateRate", m.push_duplicate_rate),
            ("pushTimelyFirstRatio", m.push_timely_first_ratio),
        ] {
            assert!((0.0..=1.0).contains(&value), "{name} = {value}");
        }
        // At least one delivery per thread is unique.
        assert!(m.redundancy_index < 1.0);
    }
}

#[test]
fn push_rate_limit_bounds_push_volume() {
    let options = RunOptions {
        push: PushOptions {
            rate_limit_per_min: 10,
            dedup_window_sec: 60,
            threshold: 0.9,
        },
        pf: Some(PfOptions::default()),
        ..urban_demo()
    };
    let result = run_simulation(&options).unwrap();
    let ceiling = options.duration_sec.div_ceil(60) * 10;
    assert!(
        result.metrics.pushes_sent <= ceiling,
        "pushes {} exceed rate ceiling {ceiling}",
        result.metrics.pushes_sent
    );
    // A high threshold with a fresh model suppresses at least something.
    assert!(result.metrics.pushes_sent > 0);
    assert!(result.metrics.push_duplicate_rate <= 1.0);
}

#[test]
fn configuration_errors_fail_fast() {
    let mut options = urban_demo();
    options.seed = "".into();
    assert!(run_simulation(&options).is_err());

    let mut options = urban_demo();
    options.policy = "MRU".into();
    assert!(run_simulation(&options).is_err());

    let mut options = urban_demo();
    options.baseline_reliability = 2.0;
    assert!(run_simulation(&options).is_err());
}
