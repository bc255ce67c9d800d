//! Comparison matrices: policies, device profiles, network profiles, and
//! their cross-product.

use alertsim_algo::PolicyKind;
use alertsim_core::SimResult;
use alertsim_engine::{run_simulation, RunOptions, RunResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Cache sizes for the device comparison.
pub const DEVICE_PROFILES: [usize; 5] = [32, 128, 256, 512, 1024];
/// Baseline reliabilities for the network comparison.
pub const NETWORK_PROFILES: [f64; 8] = [1.0, 0.95, 0.9, 0.85, 0.7, 0.6, 0.5, 0.3];

/// One policy's run inside a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRun {
    pub policy: String,
    pub result: Option<RunResult>,
    pub error: Option<String>,
}

/// The four policies on identical options and seed, in catalogue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyComparison {
    pub seed: String,
    pub scenario: String,
    pub cache_size: usize,
    pub baseline_reliability: f64,
    pub runs: Vec<PolicyRun>,
    pub failed_cells: usize,
}

/// One device or network profile's comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCell {
    /// Cache size (device sweeps) or reliability (network sweeps),
    /// stringified for the label column.
    pub profile: String,
    pub comparison: PolicyComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileComparison {
    pub cells: Vec<ProfileCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedCell {
    pub cache_size: usize,
    pub reliability: f64,
    pub comparison: PolicyComparison,
}

/// The Cartesian product of device and network profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedComparison {
    pub cells: Vec<CombinedCell>,
}

/// Run the same options under each policy with a deterministic seed.
///
/// Cells run concurrently but are reported in the fixed policy order;
/// the identical seed means every cell sees the same alert stream.
pub fn run_policy_comparison(options: &RunOptions) -> SimResult<PolicyComparison> {
    options.validate()?;
    let runs: Vec<PolicyRun> = PolicyKind::ALL
        .as_slice()
        .par_iter()
        .map(|kind| {
            let cell_options = RunOptions {
                policy: kind.as_str().to_string(),
                ..options.clone()
            };
            match run_simulation(&cell_options) {
                Ok(result) => PolicyRun {
                    policy: kind.as_str().to_string(),
                    result: Some(result),
                    error: None,
                },
                Err(err) => PolicyRun {
                    policy: kind.as_str().to_string(),
                    result: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();
    let failed_cells = runs.iter().filter(|r| r.error.is_some()).count();
    Ok(PolicyComparison {
        seed: options.seed.clone(),
        scenario: options.scenario.clone(),
        cache_size: options.cache_size,
        baseline_reliability: options.baseline_reliability,
        runs,
        failed_cells,
    })
}

/// Multi-policy comparison at each device profile (cache size).
pub fn run_device_comparison(options: &RunOptions) -> SimResult<ProfileComparison> {
    options.validate()?;
    let cells = DEVICE_PROFILES
        .iter()
        .map(|&cache_size| {
            let cell_options = RunOptions {
                cache_size,
                ..options.clone()
            };
            Ok(ProfileCell {
                profile: cache_size.to_string(),
                comparison: run_policy_comparison(&cell_options)?,
            })
        })
        .collect::<SimResult<Vec<_>>>()?;
    info!(cells = cells.len(), "device comparison complete");
    Ok(ProfileComparison { cells })
}

/// Multi-policy comparison at each network profile (reliability).
pub fn run_network_comparison(options: &RunOptions) -> SimResult<ProfileComparison> {
    options.validate()?;
    let cells = NETWORK_PROFILES
        .iter()
        .map(|&reliability| {
            let cell_options = RunOptions {
                baseline_reliability: reliability,
                ..options.clone()
            };
            Ok(ProfileCell {
                profile: format!("{reliability}"),
                comparison: run_policy_comparison(&cell_options)?,
            })
        })
        .collect::<SimResult<Vec<_>>>()?;
    info!(cells = cells.len(), "network comparison complete");
    Ok(ProfileComparison { cells })
}

/// Device x Network cross-product, each cell a multi-policy comparison.
pub fn run_combined_comparison(options: &RunOptions) -> SimResult<CombinedComparison> {
    options.validate()?;
    let mut cells = Vec::with_capacity(DEVICE_PROFILES.len() * NETWORK_PROFILES.len());
    for &cache_size in &DEVICE_PROFILES {
        for &reliability in &NETWORK_PROFILES {
            let cell_options = RunOptions {
                cache_size,
                baseline_reliability: reliability,
                ..options.clone()
            };
            cells.push(CombinedCell {
                cache_size,
                reliability,
                comparison: run_policy_comparison(&cell_options)?,
            });
        }
    }
    info!(cells = cells.len(), "combined comparison complete");
    Ok(CombinedComparison { cells })
}

impl PolicyComparison {
    /// A configuration error in one cell is a batch-level error only when
    /// every cell failed; otherwise failures ride along per cell.
    pub fn all_failed(&self) -> bool {
        self.failed_cells == self.runs.len()
    }
}
