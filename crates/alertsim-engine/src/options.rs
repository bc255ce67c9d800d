//! Run options: everything a simulation is a pure function of.

use alertsim_algo::{PfHyper, PfSample, PfState, PolicyKind, ScoreWeights};
use alertsim_core::{SimError, SimResult};
use alertsim_scenarios::Scenario;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Push decisioning controls. `rate_limit_per_min = 0` disables push
/// entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushOptions {
    pub rate_limit_per_min: u32,
    pub dedup_window_sec: u64,
    /// Forecast probability needed for a non-high-impact push.
    pub threshold: f64,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            rate_limit_per_min: 0,
            dedup_window_sec: 60,
            threshold: 0.6,
        }
    }
}

/// Delivery retry controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeliveryOptions {
    /// Clamped to at least 1 second when retries are enabled.
    pub retry_interval_sec: u64,
    pub max_attempts: u32,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            retry_interval_sec: 30,
            max_attempts: 3,
        }
    }
}

/// Forecast-model attachment for PriorityFresh runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PfOptions {
    pub hyper: PfHyper,
    /// Seed weights, overriding zeros (length must be 23 + hash buckets).
    pub initial_weights: Option<Vec<f64>>,
    /// Resume from a previous run's persisted state.
    pub resume_state: Option<PfState>,
    /// Samples replayed through training before the clock starts.
    pub historical_samples: Option<Vec<PfSample>>,
}

/// Options for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunOptions {
    pub scenario: String,
    pub policy: String,
    pub cache_size: usize,
    pub target_alerts: usize,
    pub baseline_reliability: f64,
    pub duration_sec: u64,
    pub query_rate_per_min: f64,
    pub seed: String,
    pub priority_weights: ScoreWeights,
    pub pf: Option<PfOptions>,
    pub push: PushOptions,
    pub delivery: DeliveryOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            scenario: "Urban".into(),
            policy: "PriorityFresh".into(),
            cache_size: 128,
            target_alerts: 400,
            baseline_reliability: 0.85,
            duration_sec: 900,
            query_rate_per_min: 60.0,
            seed: "demo".into(),
            priority_weights: ScoreWeights::default(),
            pf: None,
            push: PushOptions::default(),
            delivery: DeliveryOptions::default(),
        }
    }
}

impl RunOptions {
    /// Fail fast on anything that would make the run meaningless. Called
    /// before any state is built, so a configuration error has no side
    /// effects.
    pub fn validate(&self) -> SimResult<()> {
        if self.seed.trim().is_empty() {
            return Err(SimError::Config("seed cannot be empty".into()));
        }
        if self.cache_size == 0 {
            return Err(SimError::Config("cache size must be positive".into()));
        }
        if self.target_alerts == 0 {
            return Err(SimError::Config("target alert count must be positive".into()));
        }
        if self.duration_sec == 0 {
            return Err(SimError::Config("duration must be positive".into()));
        }
        if !self.baseline_reliability.is_finite()
            || !(0.0..=1.0).contains(&self.baseline_reliability)
        {
            return Err(SimError::Config(format!(
                "baseline reliability {} outside [0, 1]",
                self.baseline_reliability
            )));
        }
        if !self.query_rate_per_min.is_finite() || self.query_rate_per_min < 0.0 {
            return Err(SimError::Config(format!(
                "query rate {} must be a nonnegative finite number",
                self.query_rate_per_min
            )));
        }
        if Scenario::by_name(&self.scenario).is_none() {
            return Err(SimError::Config(format!(
                "unknown scenario '{}'",
                self.scenario
            )));
        }
        PolicyKind::parse(&self.policy)?;
        if !self.push.threshold.is_finite() {
            return Err(SimError::Config("push threshold must be finite".into()));
        }
        if let Some(pf) = &self.pf {
            if pf.hyper.hash_buckets == 0 {
                return Err(SimError::Config("hash bucket count must be positive".into()));
            }
            for (name, value) in [
                ("learning rate", pf.hyper.learning_rate),
                ("regularization", pf.hyper.regularization),
                ("decay", pf.hyper.decay),
                ("temperature", pf.hyper.temperature),
                ("epsilon", pf.hyper.epsilon),
            ] {
                if !value.is_finite() {
                    return Err(SimError::Config(format!("{name} must be finite")));
                }
            }
        }
        Ok(())
    }

    /// Load options from a YAML or JSON document, by extension with a
    /// fallback parse.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading run options '{}'", path.display()))?;
        let options: RunOptions = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                serde_yaml::from_str(&data).context("parsing run options yaml")?
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                serde_json::from_str(&data).context("parsing run options json")?
            }
            _ => serde_yaml::from_str(&data)
                .or_else(|_| serde_json::from_str(&data))
                .context("parsing run options")?,
        };
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_options_validate() {
        assert!(RunOptions::default().validate().is_ok());
    }

    #[test]
    fn bad_options_are_rejected() {
        let cases: Vec<(&str, Box<dyn Fn(&mut RunOptions)>)> = vec![
            ("empty seed", Box::new(|o| o.seed = "  ".into())),
            ("zero cache", Box::new(|o| o.cache_size = 0)),
            ("zero alerts", Box::new(|o| o.target_alerts = 0)),
            ("zero duration", Box::new(|o| o.duration_sec = 0)),
            ("reliability > 1", Box::new(|o| o.baseline_reliability = 1.5)),
            ("nan reliability", Box::new(|o| o.baseline_reliability = f64::NAN)),
            ("negative qpm", Box::new(|o| o.query_rate_per_min = -1.0)),
            ("unknown scenario", Box::new(|o| o.scenario = "Coastal".into())),
            ("unknown policy", Box::new(|o| o.policy = "ARC".into())),
        ];
        for (label, mutate) in cases {
            let mut options = RunOptions::default();
            mutate(&mut options);
            assert!(
                matches!(options.validate(), Err(SimError::Config(_))),
                "{label} was accepted"
            );
        }
    }

    #[test]
    fn loads_yaml_and_json() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "scenario: Rural\npolicy: LRU\ncacheSize: 32\nseed: rural-lru-1").unwrap();
        let from_yaml = RunOptions::load_from_path(yaml.path()).unwrap();
        assert_eq!(from_yaml.scenario, "Rural");
        assert_eq!(from_yaml.cache_size, 32);
        // Unspecified fields fall back to defaults.
        assert_eq!(from_yaml.duration_sec, 900);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json, "{{\"scenario\": \"Urban\", \"queryRatePerMin\": 120}}").unwrap();
        let from_json = RunOptions::load_from_path(json.path()).unwrap();
        assert_eq!(from_json.query_rate_per_min, 120.0);
    }
}
