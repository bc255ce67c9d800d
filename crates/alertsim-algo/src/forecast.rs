//! The priority-forecast (PF) model.
//!
//! An online logistic regressor over hand-crafted and hashed features of an
//! (alert, context) pair. Its probability output boosts the PriorityFresh
//! eviction score and gates push admission. Training uses a squared-error
//! gradient on the linear output with an AdaGrad-style per-feature
//! accumulator, L2 weight shrink, and accumulator decay.
//!
//! The model owns the per-region weather and anomaly tables it features on,
//! plus its own forked RNG for exploration, so a run's engine can hand the
//! whole thing to the cache policy as a single capability value.

use alertsim_core::{
    fnv1a32, Alert, AnomalyRecord, Environment, Mulberry32, Severity, SimError, SimResult,
    Urgency, WeatherRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of hand-crafted features ahead of the hash buckets.
pub const BASE_FEATURES: usize = 23;
/// Normalizer for the heuristic base score.
const BASE_NORM: f64 = 15.0;
/// Sigmoid input clip; beyond this the output saturates anyway.
const MAX_LOGIT: f64 = 40.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// PF hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PfHyper {
    pub learning_rate: f64,
    pub regularization: f64,
    pub decay: f64,
    pub temperature: f64,
    /// Exploration probability for score boosts and push gating.
    pub epsilon: f64,
    pub hash_buckets: usize,
}

impl Default for PfHyper {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            regularization: 0.0005,
            decay: 0.99,
            temperature: 1.0,
            epsilon: 0.0,
            hash_buckets: 32,
        }
    }
}

/// Resumable model state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfState {
    pub weights: Vec<f64>,
    pub g2: Vec<f64>,
    pub temperature: f64,
    pub learning_rate: f64,
    pub regularization: f64,
    pub decay: f64,
    pub hash_buckets: usize,
    pub feature_count: usize,
}

/// Detailed eviction-score contribution for one alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PfScore {
    pub base: f64,
    pub boost: f64,
    pub total: f64,
    pub probability: f64,
    pub exploration: f64,
}

/// A pre-run training sample: an alert observed at a time with an outcome
/// label in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfSample {
    pub alert: Alert,
    pub observed_at: u64,
    pub label: f64,
}

#[derive(Debug, Clone)]
struct RegionContext {
    local_factor: f64,
    severity: Severity,
}

/// Online logistic priority forecaster.
#[derive(Debug, Clone)]
pub struct PfModel {
    weights: Vec<f64>,
    g2: Vec<f64>,
    hyper: PfHyper,
    rng: Mulberry32,
    regions: HashMap<u32, RegionContext>,
    weather: HashMap<u32, WeatherRecord>,
    anomaly: HashMap<u32, AnomalyRecord>,
}

impl PfModel {
    pub fn new(
        env: &Environment,
        weather: &[WeatherRecord],
        anomaly: &[AnomalyRecord],
        hyper: PfHyper,
        rng: Mulberry32,
    ) -> SimResult<Self> {
        if hyper.hash_buckets == 0 {
            return Err(SimError::Config("hash bucket count must be positive".into()));
        }
        let feature_count = BASE_FEATURES + hyper.hash_buckets;
        Ok(Self {
            weights: vec![0.0; feature_count],
            g2: vec![0.0; feature_count],
            hyper,
            rng,
            regions: env
                .regions
                .iter()
                .map(|r| {
                    (
                        r.id,
                        RegionContext {
                            local_factor: r.local_factor,
                            severity: r.severity,
                        },
                    )
                })
                .collect(),
            weather: weather.iter().map(|w| (w.region_id, w.clone())).collect(),
            anomaly: anomaly.iter().map(|a| (a.region_id, a.clone())).collect(),
        })
    }

    /// Replace the weight vector, e.g. to seed a run from a prior run's
    /// state. Length must match the configured feature count.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> SimResult<()> {
        if weights.len() != self.weights.len() {
            return Err(SimError::Invariant(format!(
                "weight vector length {} does not match feature count {}",
                weights.len(),
                self.weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(SimError::Numeric("non-finite weight".into()));
        }
        self.weights = weights;
        Ok(())
    }

    /// Rebuild a model from persisted state.
    pub fn from_state(
        env: &Environment,
        weather: &[WeatherRecord],
        anomaly: &[AnomalyRecord],
        state: &PfState,
        rng: Mulberry32,
    ) -> SimResult<Self> {
        let expected = BASE_FEATURES + state.hash_buckets;
        if state.feature_count != expected
            || state.weights.len() != expected
            || state.g2.len() != expected
        {
            return Err(SimError::Invariant(format!(
                "forecast state expects {} features, got weights={} g2={} feature_count={}",
                expected,
                state.weights.len(),
                state.g2.len(),
                state.feature_count
            )));
        }
        let hyper = PfHyper {
            learning_rate: state.learning_rate,
            regularization: state.regularization,
            decay: state.decay,
            temperature: state.temperature,
            epsilon: 0.0,
            hash_buckets: state.hash_buckets,
        };
        let mut model = Self::new(env, weather, anomaly, hyper, rng)?;
        model.weights = state.weights.clone();
        model.g2 = state.g2.clone();
        Ok(model)
    }

    pub fn hyper(&self) -> &PfHyper {
        &self.hyper
    }

    pub fn epsilon(&self) -> f64 {
        self.hyper.epsilon
    }

    /// Exploration probability is not part of persisted state; restored
    /// models get it from the run options.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.hyper.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn state(&self) -> PfState {
        PfState {
            weights: self.weights.clone(),
            g2: self.g2.clone(),
            temperature: self.hyper.temperature,
            learning_rate: self.hyper.learning_rate,
            regularization: self.hyper.regularization,
            decay: self.hyper.decay,
            hash_buckets: self.hyper.hash_buckets,
            feature_count: self.weights.len(),
        }
    }

    /// The ordered feature vector for an (alert, time) pair.
    pub fn features(&self, alert: &Alert, now: u64) -> Vec<f64> {
        let region = self.regions.get(&alert.region_id);
        let weather = self.weather.get(&alert.region_id);
        let anomaly = self.anomaly.get(&alert.region_id);

        let sev = alert.severity.unit();
        let urg = if alert.urgency == Urgency::Immediate {
            1.0
        } else {
            0.0
        };
        let local_factor = region.map_or(1.0, |r| r.local_factor);
        let region_sev = region.map_or(0.45, |r| r.severity.unit());
        let tod = (now as f64) % SECONDS_PER_DAY;
        let phase = std::f64::consts::TAU * tod / SECONDS_PER_DAY;

        let mut x = Vec::with_capacity(BASE_FEATURES + self.hyper.hash_buckets);
        x.push(1.0);
        x.push(sev);
        x.push(urg);
        x.push(alert.ttl_sec as f64 / 3600.0);
        x.push(alert.freshness(now));
        x.push(region_sev);
        x.push((local_factor - 0.7) / 0.6);
        x.push(weather.map_or(0.0, |w| w.flood_frequency));
        x.push(weather.map_or(0.0, |w| w.rainfall_mean_mm / 160.0));
        x.push(weather.map_or(0.0, |w| w.rainfall_volatility));
        x.push(weather.map_or(0.0, |w| 1.0 - w.drainage_score));
        x.push(weather.map_or(0.0, |w| w.shelter_demand_index));
        x.push(base_score(alert) / BASE_NORM);
        x.push(anomaly.map_or(0.0, |a| a.false_alarm_rate));
        x.push(anomaly.map_or(0.0, |a| a.last_minute_diversion_rate));
        x.push(anomaly.map_or(0.0, |a| a.historical_accuracy));
        x.push(anomaly.map_or(0.0, |a| a.typical_lead_time_sec / 3600.0));
        x.push(anomaly.map_or(0.0, |a| a.underestimation_rate));
        x.push(anomaly.map_or(0.0, |a| a.overestimation_rate));
        x.push(anomaly.map_or(0.5, reliability_composite));
        x.push(phase.sin());
        x.push(phase.cos());
        x.push(f64::from(alert.update_no) / 4.0);

        let buckets = self.hyper.hash_buckets;
        let start = x.len();
        x.resize(start + buckets, 0.0);
        let items = [
            alert.event_type.as_str().to_string(),
            alert.region_id.to_string(),
            alert.thread_key.clone(),
        ];
        let present: Vec<&String> = items.iter().filter(|i| !i.is_empty()).collect();
        let share = 1.0 / present.len() as f64;
        for item in present {
            let bucket = fnv1a32(item) as usize % buckets;
            x[start + bucket] += share;
        }

        debug_assert_eq!(x.len(), self.weights.len());
        x
    }

    /// Probability in `(0, 1)` from a feature vector.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(x.iter())
            .map(|(w, xi)| w * xi)
            .sum();
        sigmoid(z / self.hyper.temperature)
    }

    /// Probability for an (alert, time) pair.
    pub fn probability(&self, alert: &Alert, now: u64) -> f64 {
        self.predict(&self.features(alert, now))
    }

    /// Detailed score used by the PriorityFresh eviction ranking.
    ///
    /// `boost = base * (p - 0.5)`, plus an exploration term
    /// `(u - 0.5) * base * 0.6` with probability epsilon when exploration
    /// is requested. `total = base + boost`.
    pub fn score(&mut self, alert: &Alert, now: u64, explore: bool) -> PfScore {
        let p = self.probability(alert, now);
        let base = base_score(alert);
        let mut exploration = 0.0;
        if explore && self.hyper.epsilon > 0.0 && self.rng.chance(self.hyper.epsilon) {
            exploration = (self.rng.next_f64() - 0.5) * base * 0.6;
        }
        let boost = base * (p - 0.5) + exploration;
        PfScore {
            base,
            boost,
            total: base + boost,
            probability: p,
            exploration,
        }
    }

    /// One AdaGrad step toward `label` on feature vector `x`.
    ///
    /// Squared-error gradient on the linear output: `g_i = (label - p)·x_i`.
    /// A step that would produce a non-finite weight or accumulator is
    /// discarded whole.
    pub fn train(&mut self, x: &[f64], label: f64) {
        debug_assert_eq!(x.len(), self.weights.len());
        let p = self.predict(x);
        let err = label - p;

        let mut new_weights = Vec::with_capacity(self.weights.len());
        let mut new_g2 = Vec::with_capacity(self.g2.len());
        for i in 0..self.weights.len() {
            let g = err * x[i];
            let g2 = self.hyper.decay * self.g2[i] + g * g;
            let step = self.hyper.learning_rate / (g2 + 1e-6).sqrt() * g;
            let w = (1.0 - self.hyper.regularization) * self.weights[i] + step;
            if !w.is_finite() || !g2.is_finite() {
                return;
            }
            new_weights.push(w);
            new_g2.push(g2);
        }
        self.weights = new_weights;
        self.g2 = new_g2;
    }

    /// Retrieval observation: label rewards severity, immediacy, freshness,
    /// and timeliness of the first retrieval against the SLA.
    pub fn observe_retrieval(
        &mut self,
        alert: &Alert,
        now: u64,
        latency_sec: f64,
        sla_sec: Option<f64>,
    ) {
        let timeliness = match sla_sec {
            Some(sla) if sla > 0.0 => (1.0 - latency_sec / (1.5 * sla)).clamp(0.0, 1.0),
            _ => 0.6,
        };
        let urg = if alert.urgency == Urgency::Immediate {
            1.0
        } else {
            0.0
        };
        let label = (0.4 * alert.severity.unit()
            + 0.2 * urg
            + 0.25 * alert.freshness(now)
            + 0.15 * timeliness)
            .clamp(0.0, 1.0);
        let x = self.features(alert, now);
        self.train(&x, label);
    }

    /// Drop observation: the alert was wanted but gone. Label 0.
    pub fn observe_drop(&mut self, alert: &Alert, now: u64) {
        let x = self.features(alert, now);
        self.train(&x, 0.0);
    }

    /// Replay historical samples through `train` before a run starts.
    pub fn ingest_historical_samples(&mut self, samples: &[PfSample]) {
        for sample in samples {
            let x = self.features(&sample.alert, sample.observed_at);
            self.train(&x, sample.label.clamp(0.0, 1.0));
        }
    }
}

/// Heuristic priority score independent of the learner:
/// `base_norm·0.6 + sev·3 + (Immediate ? 2 : 0)`.
fn base_score(alert: &Alert) -> f64 {
    let urgency_bonus = if alert.urgency == Urgency::Immediate {
        2.0
    } else {
        0.0
    };
    BASE_NORM * 0.6 + alert.severity.unit() * 3.0 + urgency_bonus
}

fn reliability_composite(a: &AnomalyRecord) -> f64 {
    (a.historical_accuracy * 0.5
        + (1.0 - a.false_alarm_rate) * 0.25
        + (1.0 - a.last_minute_diversion_rate) * 0.15
        + a.accuracy_trend * 0.1)
        .clamp(0.0, 1.0)
}

fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-MAX_LOGIT, MAX_LOGIT);
    1.0 / (1.0 + (-z).exp())
}
