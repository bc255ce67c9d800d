//! Replicated batches: the same options run N times under a seed
//! derivation mode.

use crate::aggregate::{aggregate_metrics, AggregateMetrics};
use alertsim_core::{SimError, SimResult};
use alertsim_engine::{run_simulation, RunOptions, RunResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// How per-replicate seeds derive from the base seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeedMode {
    /// Every replicate reuses the base seed unchanged.
    Fixed,
    /// `base#1`, `base#2`, ... - distinct but reproducible.
    DeterministicJitter,
    /// `base#<uuid4>` - distinct and unrepeatable.
    Randomized,
}

impl SeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedMode::Fixed => "fixed",
            SeedMode::DeterministicJitter => "jitter",
            SeedMode::Randomized => "random",
        }
    }

    pub fn parse(name: &str) -> SimResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(SeedMode::Fixed),
            "jitter" | "deterministic-jitter" => Ok(SeedMode::DeterministicJitter),
            "random" | "randomized" => Ok(SeedMode::Randomized),
            other => Err(SimError::Config(format!("unknown seed mode '{other}'"))),
        }
    }

    /// The seed for replicate `index` (zero-based).
    pub fn derive(&self, base: &str, index: usize) -> String {
        match self {
            SeedMode::Fixed => base.to_string(),
            SeedMode::DeterministicJitter => format!("{base}#{}", index + 1),
            SeedMode::Randomized => format!("{base}#{}", Uuid::new_v4()),
        }
    }
}

/// One replicate's outcome; failed cells carry the error instead of a
/// result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateRun {
    pub replicate_index: usize,
    pub seed: String,
    pub result: Option<RunResult>,
    pub error: Option<String>,
}

/// Outcome of a replicated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedBatch {
    pub base_seed: String,
    pub seed_mode: SeedMode,
    pub replicates: Vec<ReplicateRun>,
    pub aggregate: AggregateMetrics,
    pub failed_cells: usize,
}

/// Run `count` replicates of `options` under `mode`.
///
/// Replicates execute on the rayon pool; the output order is by replicate
/// index regardless of scheduling, and the aggregate folds in that order.
pub fn run_replicated_batch(
    options: &RunOptions,
    count: usize,
    mode: SeedMode,
) -> SimResult<ReplicatedBatch> {
    if count == 0 {
        return Err(SimError::Config("replicate count must be at least 1".into()));
    }
    options.validate()?;

    let seeds: Vec<String> = (0..count).map(|i| mode.derive(&options.seed, i)).collect();
    let runs: Vec<ReplicateRun> = seeds
        .into_par_iter()
        .enumerate()
        .map(|(index, seed)| {
            let cell_options = RunOptions {
                seed: seed.clone(),
                ..options.clone()
            };
            match run_simulation(&cell_options) {
                Ok(result) => ReplicateRun {
                    replicate_index: index,
                    seed,
                    result: Some(result),
                    error: None,
                },
                Err(err) => ReplicateRun {
                    replicate_index: index,
                    seed,
                    result: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();

    let metrics: Vec<_> = runs
        .iter()
        .filter_map(|r| r.result.as_ref().map(|res| res.metrics))
        .collect();
    let failed_cells = runs.len() - metrics.len();
    let aggregate = aggregate_metrics(&metrics);
    info!(
        replicates = count,
        mode = mode.as_str(),
        failed = failed_cells,
        "replicated batch complete"
    );

    Ok(ReplicatedBatch {
        base_seed: options.seed.clone(),
        seed_mode: mode,
        replicates: runs,
        aggregate,
        failed_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_options() -> RunOptions {
        RunOptions {
            scenario: "Rural".into(),
            policy: "LRU".into(),
            cache_size: 16,
            target_alerts: 40,
            duration_sec: 300,
            query_rate_per_min: 30.0,
            seed: "b".into(),
            ..RunOptions::default()
        }
    }

    #[test]
    fn jitter_mode_derives_numbered_seeds() {
        let batch =
            run_replicated_batch(&quick_options(), 3, SeedMode::DeterministicJitter).unwrap();
        let seeds: Vec<&str> = batch.replicates.iter().map(|r| r.seed.as_str()).collect();
        assert_eq!(seeds, vec!["b#1", "b#2", "b#3"]);
        for key in alertsim_engine::Metrics::KEYS {
            assert!(batch.aggregate.stdev[key] >= 0.0);
        }
    }

    #[test]
    fn fixed_mode_repeats_the_base_seed_exactly() {
        let batch = run_replicated_batch(&quick_options(), 3, SeedMode::Fixed).unwrap();
        for run in &batch.replicates {
            assert_eq!(run.seed, "b");
        }
        // Identical seeds mean identical runs, so spread collapses.
        let reference = batch.replicates[0].result.as_ref().unwrap();
        for run in &batch.replicates[1..] {
            assert_eq!(run.result.as_ref().unwrap().metrics, reference.metrics);
        }
        for key in alertsim_engine::Metrics::KEYS {
            assert!(batch.aggregate.stdev[key] < 1e-12, "{key}");
        }
    }

    #[test]
    fn single_replicate_has_zero_stdev() {
        let batch =
            run_replicated_batch(&quick_options(), 1, SeedMode::DeterministicJitter).unwrap();
        for key in alertsim_engine::Metrics::KEYS {
            assert_eq!(batch.aggregate.stdev[key], 0.0, "{key}");
        }
    }

    #[test]
    fn randomized_mode_prefixes_the_base() {
        let batch = run_replicated_batch(&quick_options(), 2, SeedMode::Randomized).unwrap();
        for run in &batch.replicates {
            assert!(run.seed.starts_with("b#"));
        }
        assert_ne!(batch.replicates[0].seed, batch.replicates[1].seed);
    }

    #[test]
    fn zero_replicates_is_a_configuration_error() {
        let err = run_replicated_batch(&quick_options(), 0, SeedMode::Fixed).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn seed_mode_parsing() {
        assert_eq!(SeedMode::parse("fixed").unwrap(), SeedMode::Fixed);
        assert_eq!(
            SeedMode::parse("JITTER").unwrap(),
            SeedMode::DeterministicJitter
        );
        assert_eq!(SeedMode::parse("randomized").unwrap(), SeedMode::Randomized);
        assert!(SeedMode::parse("other").is_err());
    }
}
