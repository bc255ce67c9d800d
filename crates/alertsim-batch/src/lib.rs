//! Batch orchestration over the simulation engine.
//!
//! Runs are pure functions of their options, so the orchestrator composes
//! them freely: replicated batches with seed derivation modes, the four
//! comparison matrices, and randomized scans. Cells run on the rayon pool
//! where ordering does not matter; outputs are always reported in input
//! order. Per-cell failures are captured in the outcome records rather
//! than aborting the batch.

pub mod aggregate;
pub mod compare;
pub mod manifest;
pub mod record;
pub mod replicate;
pub mod scan;

pub use aggregate::{aggregate_metrics, AggregateMetrics};
pub use compare::{
    run_combined_comparison, run_device_comparison, run_network_comparison,
    run_policy_comparison, CombinedCell, CombinedComparison, PolicyComparison, PolicyRun,
    ProfileCell, ProfileComparison, DEVICE_PROFILES, NETWORK_PROFILES,
};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest, CellRecord};
pub use record::RunRecord;
pub use replicate::{run_replicated_batch, ReplicateRun, ReplicatedBatch, SeedMode};
pub use scan::{run_randomized_scan, RandomizedScan, ScanRun};

use serde::{Deserialize, Serialize};

/// Discriminated union over every batch operation's outcome, tagged with
/// `kind` for sinks and exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BatchOutcome {
    #[serde(rename = "replicatedBatch")]
    Replicated(ReplicatedBatch),
    #[serde(rename = "policyComparison")]
    PolicyComparison(PolicyComparison),
    #[serde(rename = "deviceComparison")]
    DeviceComparison(ProfileComparison),
    #[serde(rename = "networkComparison")]
    NetworkComparison(ProfileComparison),
    #[serde(rename = "combinedComparison")]
    CombinedComparison(CombinedComparison),
    #[serde(rename = "randomizedScan")]
    RandomizedScan(RandomizedScan),
}

impl BatchOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            BatchOutcome::Replicated(_) => "replicatedBatch",
            BatchOutcome::PolicyComparison(_) => "policyComparison",
            BatchOutcome::DeviceComparison(_) => "deviceComparison",
            BatchOutcome::NetworkComparison(_) => "networkComparison",
            BatchOutcome::CombinedComparison(_) => "combinedComparison",
            BatchOutcome::RandomizedScan(_) => "randomizedScan",
        }
    }
}
