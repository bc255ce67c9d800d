//! Persisted per-run records.
//!
//! The shape handed to record sinks; everything past the metrics is
//! optional so single runs and batch replicates share one record type.
//! Sinks overwrite on duplicate id.

use crate::replicate::SeedMode;
use alertsim_engine::{Metrics, RunResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub scenario: String,
    pub policy: String,
    pub seed: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: Metrics,
    pub samples_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_results: Option<RunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_mode: Option<SeedMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicate_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicates: Option<usize>,
}

impl RunRecord {
    /// Record a standalone run. `policy` comes from the caller because the
    /// result does not carry the policy name redundantly with options.
    pub fn from_result(result: &RunResult, policy: &str, include_full: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scenario: result.scenario.clone(),
            policy: policy.to_string(),
            seed: result.seed.clone(),
            timestamp: Utc::now(),
            metrics: result.metrics,
            samples_count: result.timeline.len(),
            full_results: include_full.then(|| result.clone()),
            batch_id: None,
            seed_mode: None,
            replicate_index: None,
            replicates: None,
        }
    }

    /// Attach batch provenance to a record.
    pub fn with_batch(
        mut self,
        batch_id: &str,
        seed_mode: SeedMode,
        replicate_index: usize,
        replicates: usize,
    ) -> Self {
        self.batch_id = Some(batch_id.to_string());
        self.seed_mode = Some(seed_mode);
        self.replicate_index = Some(replicate_index);
        self.replicates = Some(replicates);
        self
    }
}
