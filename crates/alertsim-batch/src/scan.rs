//! Randomized option scans.
//!
//! Explores the option space with freshly randomized runs. Unlike the
//! other batch operations the scan is intentionally unrepeatable: its
//! generator seeds from a fresh UUID, and each run's seed records that
//! identity so any individual run can still be replayed exactly.

use alertsim_algo::{PfHyper, PolicyKind, ScoreWeights};
use alertsim_core::{Mulberry32, SimError, SimResult};
use alertsim_engine::{run_simulation, PfOptions, PushOptions, RunOptions, RunResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const SCENARIOS: [&str; 3] = ["Rural", "Suburban", "Urban"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRun {
    pub options: RunOptions,
    pub result: Option<RunResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizedScan {
    pub scan_id: String,
    pub runs: Vec<ScanRun>,
    pub failed_cells: usize,
}

/// Run `count` randomized simulations.
pub fn run_randomized_scan(count: usize) -> SimResult<RandomizedScan> {
    if count == 0 {
        return Err(SimError::Config("scan run count must be at least 1".into()));
    }
    let scan_id = Uuid::new_v4().to_string();
    let mut rng = Mulberry32::from_seed_str(&scan_id);

    let mut runs = Vec::with_capacity(count);
    let mut failed_cells = 0;
    for index in 0..count {
        let options = random_options(&mut rng, &scan_id, index);
        match run_simulation(&options) {
            Ok(result) => runs.push(ScanRun {
                options,
                result: Some(result),
                error: None,
            }),
            Err(err) => {
                failed_cells += 1;
                runs.push(ScanRun {
                    options,
                    result: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }
    info!(runs = count, failed = failed_cells, scan_id = %scan_id, "randomized scan complete");
    Ok(RandomizedScan {
        scan_id,
        runs,
        failed_cells,
    })
}

/// Draw one option set within the documented ranges: scenario from the
/// catalogue, cache size a power of two in 16..=2048, alerts in
/// [80, 2000], reliability in [0.3, 1.0], duration in [300, 3600] seconds,
/// query rate in [10, 300] per minute, randomized eviction weights, and
/// push controls enabled with probability 0.6.
fn random_options(rng: &mut Mulberry32, scan_id: &str, index: usize) -> RunOptions {
    let scenario = SCENARIOS[rng.index(SCENARIOS.len())];
    let policy = PolicyKind::ALL[rng.index(PolicyKind::ALL.len())];
    let cache_size = 16usize << rng.index(8);
    let target_alerts = rng.range(80.0, 2000.0).round() as usize;
    let baseline_reliability = rng.range(0.3, 1.0);
    let duration_sec = rng.range(300.0, 3600.0).round() as u64;
    let query_rate_per_min = rng.range(10.0, 300.0);
    let priority_weights = ScoreWeights {
        severity: rng.range(0.0, 6.0),
        urgency: rng.range(0.0, 6.0),
        freshness: rng.range(0.0, 6.0),
    };
    let push = if rng.chance(0.6) {
        PushOptions {
            rate_limit_per_min: 5 + rng.index(15) as u32,
            dedup_window_sec: 30 + rng.index(90) as u64,
            threshold: rng.range(0.5, 0.9),
        }
    } else {
        PushOptions::default()
    };
    let pf = if policy == PolicyKind::PriorityFresh {
        Some(PfOptions {
            hyper: PfHyper::default(),
            ..PfOptions::default()
        })
    } else {
        None
    };

    RunOptions {
        scenario: scenario.to_string(),
        policy: policy.as_str().to_string(),
        cache_size,
        target_alerts,
        baseline_reliability,
        duration_sec,
        query_rate_per_min,
        seed: format!("scan-{scan_id}-{index}"),
        priority_weights,
        pf,
        push,
        delivery: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawn_options_stay_in_documented_ranges() {
        let mut rng = Mulberry32::from_seed_str("scan-test");
        for index in 0..200 {
            let options = random_options(&mut rng, "scan-test", index);
            assert!(options.validate().is_ok(), "index {index} invalid");
            assert!(options.cache_size.is_power_of_two());
            assert!((16..=2048).contains(&options.cache_size));
            assert!((80..=2000).contains(&options.target_alerts));
            assert!((0.3..=1.0).contains(&options.baseline_reliability));
            assert!((300..=3600).contains(&options.duration_sec));
            assert!((10.0..=300.0).contains(&options.query_rate_per_min));
            assert!(options.priority_weights.severity <= 6.0);
            if options.pf.is_some() {
                assert_eq!(options.policy, "PriorityFresh");
            }
        }
    }

    #[test]
    fn scan_runs_complete() {
        // A tiny scan; results may legitimately vary, but every cell must
        // either carry a result or an error.
        let scan = run_randomized_scan(2).unwrap();
        assert_eq!(scan.runs.len(), 2);
        for run in &scan.runs {
            assert!(run.result.is_some() ^ run.error.is_some());
            assert!(run.options.seed.starts_with(&format!("scan-{}", scan.scan_id)));
        }
    }
}
