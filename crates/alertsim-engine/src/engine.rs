//! The fixed-step simulation loop.
//!
//! One run: synthesize the world from the seed, then walk integer seconds
//! from 0 to the horizon driving arrivals, delivery retries, the query
//! load, push decisioning, and metric accumulation. A run is a pure
//! function of its options; every random decision draws from the base
//! seeded stream or one of its labelled forks, in a fixed order.

use crate::metrics::{Metrics, RegionStats, Sample};
use crate::options::RunOptions;
use alertsim_algo::{CachePolicy, PfModel, PfState, PolicyKind};
use alertsim_core::{Alert, Environment, Mulberry32, SimError, SimResult};
use alertsim_scenarios::{
    generate_environment, synthesize_alerts, synthesize_anomaly, synthesize_weather, Scenario,
    PLANE_HEIGHT, PLANE_WIDTH,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub metrics: Metrics,
    pub timeline: Vec<Sample>,
    pub issued_alerts: Vec<Alert>,
    pub delivered_alerts: Vec<Alert>,
    pub environment: Environment,
    pub region_stats: Vec<RegionStats>,
    pub scenario: String,
    pub baseline_reliability: f64,
    pub seed: String,
    pub pf_state: Option<PfState>,
    pub info: String,
}

/// A failed delivery waiting for its next attempt.
struct PendingDelivery {
    idx: usize,
    next_attempt_at: u64,
    attempts_left: u32,
}

/// First-retrieval bookkeeping per thread.
struct ThreadFirst {
    latency: u64,
    actionable: bool,
}

/// Run one simulation to completion.
pub fn run_simulation(options: &RunOptions) -> SimResult<RunResult> {
    options.validate()?;
    let scenario = Scenario::by_name(&options.scenario)
        .ok_or_else(|| SimError::Config(format!("unknown scenario '{}'", options.scenario)))?;
    let policy_kind = PolicyKind::parse(&options.policy)?;

    debug!(
        scenario = %scenario.name,
        policy = policy_kind.as_str(),
        seed = %options.seed,
        "starting simulation run"
    );

    let mut env_rng = Mulberry32::fork(&options.seed, "env");
    let environment =
        generate_environment(&mut env_rng, PLANE_WIDTH, PLANE_HEIGHT, scenario.region_target);

    // The base stream synthesizes the alerts, then keeps driving the loop.
    let mut rng = Mulberry32::from_seed_str(&options.seed);
    let issued: Vec<Arc<Alert>> = synthesize_alerts(
        &mut rng,
        scenario,
        &environment,
        options.target_alerts,
        options.duration_sec,
    )
    .into_iter()
    .map(Arc::new)
    .collect();

    let forecast = build_forecast(options, policy_kind, &environment)?;
    let policy = CachePolicy::new(
        policy_kind,
        options.cache_size,
        options.priority_weights,
        forecast,
    )?;

    let mut arrivals: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, alert) in issued.iter().enumerate() {
        arrivals.entry(alert.issued_at).or_default().push(idx);
    }

    let retry_interval = options.delivery.retry_interval_sec.max(1);
    let mut pending: Vec<PendingDelivery> = Vec::new();
    let mut sim = SimState::new(options, scenario, &environment, issued, policy, rng);

    for t in 0..options.duration_sec {
        if let Some(indices) = arrivals.get(&t) {
            for &idx in indices {
                let alert = sim.issued[idx].clone();
                if sim.attempt_delivery(&alert, t) {
                    continue;
                }
                if options.delivery.max_attempts > 1 {
                    pending.push(PendingDelivery {
                        idx,
                        next_attempt_at: t + retry_interval,
                        attempts_left: options.delivery.max_attempts - 1,
                    });
                } else {
                    sim.record_drop(&alert);
                }
            }
        }

        let mut keep = Vec::with_capacity(pending.len());
        for mut entry in pending.drain(..) {
            let alert = sim.issued[entry.idx].clone();
            if alert.is_expired(t) {
                sim.record_drop(&alert);
                continue;
            }
            if t >= entry.next_attempt_at {
                if sim.attempt_delivery(&alert, t) {
                    continue;
                }
                entry.attempts_left -= 1;
                if entry.attempts_left == 0 {
                    sim.record_drop(&alert);
                    continue;
                }
                entry.next_attempt_at = t + retry_interval;
            }
            keep.push(entry);
        }
        pending = keep;

        sim.run_queries(t);
        sim.sample(t);
    }

    // Alerts still awaiting a retry at the horizon never made it.
    for entry in pending {
        let alert = sim.issued[entry.idx].clone();
        sim.record_drop(&alert);
    }

    sim.finalize()
}

/// Build the forecast model when the run wants one. Only PriorityFresh
/// composes it; the weather and anomaly histories plus the model RNG all
/// fork from the run seed.
fn build_forecast(
    options: &RunOptions,
    kind: PolicyKind,
    environment: &Environment,
) -> SimResult<Option<PfModel>> {
    let Some(pf) = &options.pf else {
        return Ok(None);
    };
    if kind != PolicyKind::PriorityFresh {
        return Ok(None);
    }
    let weather = synthesize_weather(environment, &options.seed);
    let anomaly = synthesize_anomaly(environment, &options.seed);
    let rng = Mulberry32::fork(&options.seed, "pf");
    let mut model = match &pf.resume_state {
        Some(state) => {
            let mut restored = PfModel::from_state(environment, &weather, &anomaly, state, rng)?;
            restored.set_epsilon(pf.hyper.epsilon);
            restored
        }
        None => PfModel::new(environment, &weather, &anomaly, pf.hyper, rng)?,
    };
    if let Some(weights) = &pf.initial_weights {
        model.set_weights(weights.clone())?;
    }
    if let Some(samples) = &pf.historical_samples {
        model.ingest_historical_samples(samples);
    }
    Ok(Some(model))
}

struct SimState<'a> {
    options: &'a RunOptions,
    scenario: &'a Scenario,
    environment: &'a Environment,
    issued: Vec<Arc<Alert>>,
    policy: CachePolicy,
    rng: Mulberry32,

    timeline: Vec<Sample>,
    delivered_alerts: Vec<Alert>,
    region_stats: Vec<RegionStats>,

    delivered: u64,
    dropped: u64,
    duplicate_delivered: u64,
    hits: u64,
    misses: u64,
    stale_hits: u64,
    freshness_sum: f64,

    thread_deliveries: HashMap<String, u32>,
    retrieved_alerts: HashSet<String>,
    thread_first: HashMap<String, ThreadFirst>,

    push_window: VecDeque<u64>,
    last_push: HashMap<String, u64>,
    /// Thread -> latency of its first push.
    first_push: HashMap<String, u64>,
    pushes_sent: u64,
    push_suppress: u64,
    push_duplicates: u64,
}

impl<'a> SimState<'a> {
    fn new(
        options: &'a RunOptions,
        scenario: &'a Scenario,
        environment: &'a Environment,
        issued: Vec<Arc<Alert>>,
        policy: CachePolicy,
        rng: Mulberry32,
    ) -> Self {
        Self {
            options,
            scenario,
            environment,
            issued,
            policy,
            rng,
            timeline: Vec::with_capacity(options.duration_sec as usize),
            delivered_alerts: Vec::new(),
            region_stats: environment
                .regions
                .iter()
                .map(|r| RegionStats::new(r.id))
                .collect(),
            delivered: 0,
            dropped: 0,
            duplicate_delivered: 0,
            hits: 0,
            misses: 0,
            stale_hits: 0,
            freshness_sum: 0.0,
            thread_deliveries: HashMap::new(),
            retrieved_alerts: HashSet::new(),
            thread_first: HashMap::new(),
            push_window: VecDeque::new(),
            last_push: HashMap::new(),
            first_push: HashMap::new(),
            pushes_sent: 0,
            push_suppress: 0,
            push_duplicates: 0,
        }
    }

    /// One Bernoulli delivery trial against the effective reliability.
    /// Success admits the alert to the cache and runs push decisioning.
    fn attempt_delivery(&mut self, alert: &Arc<Alert>, t: u64) -> bool {
        let segment = self.scenario.active_segment(t);
        let local_factor = self
            .environment
            .region(alert.region_id)
            .map_or(1.0, |r| r.local_factor);
        let effective = (self.options.baseline_reliability * segment.reliability * local_factor)
            .clamp(0.0, 1.0);
        if self.rng.next_f64() >= effective {
            return false;
        }

        self.delivered += 1;
        self.region_stats[alert.region_id as usize].delivered += 1;
        self.delivered_alerts.push((**alert).clone());
        let count = self
            .thread_deliveries
            .entry(alert.thread_key.clone())
            .or_insert(0);
        *count += 1;
        if *count >= 2 {
            self.duplicate_delivered += 1;
        }
        self.policy.put(alert.clone(), t);
        if self.options.push.rate_limit_per_min > 0 {
            self.decide_push(alert, t);
        }
        true
    }

    /// Push decisioning on a successful delivery: rate window, thread
    /// dedup, and the forecast/high-impact gate.
    fn decide_push(&mut self, alert: &Arc<Alert>, t: u64) {
        let push = &self.options.push;
        // Prune before the rate check: the window is (t-60, t].
        while let Some(&oldest) = self.push_window.front() {
            if oldest + 60 <= t {
                self.push_window.pop_front();
            } else {
                break;
            }
        }
        let within_rate = (self.push_window.len() as u32) < push.rate_limit_per_min;
        let not_duplicate = push.dedup_window_sec == 0
            || self
                .last_push
                .get(&alert.thread_key)
                .map_or(true, |&last| t - last > push.dedup_window_sec);

        let (probability, epsilon) = match self.policy.forecast_mut() {
            Some(model) => (model.probability(alert, t), model.epsilon()),
            None => (0.0, 0.0),
        };
        let explore = epsilon > 0.0 && self.rng.chance(epsilon);
        let high_impact = alert.is_high_impact();

        if within_rate && not_duplicate && (probability >= push.threshold || explore || high_impact)
        {
            self.pushes_sent += 1;
            self.push_window.push_back(t);
            let previous = self.last_push.insert(alert.thread_key.clone(), t);
            if previous.is_some() {
                self.push_duplicates += 1;
            }
            self.first_push
                .entry(alert.thread_key.clone())
                .or_insert(t - alert.issued_at);
        } else {
            self.push_suppress += 1;
        }
    }

    fn record_drop(&mut self, alert: &Alert) {
        self.dropped += 1;
        self.region_stats[alert.region_id as usize].dropped += 1;
    }

    /// Poisson-many weighted queries against the cache.
    fn run_queries(&mut self, t: u64) {
        let segment = self.scenario.active_segment(t);
        let rate = self.options.query_rate_per_min / 60.0 * segment.query_rate_mul;
        let count = poisson(&mut self.rng, rate);
        for _ in 0..count {
            let entries = self.policy.entries(t);
            if entries.is_empty() {
                self.misses += 1;
                continue;
            }
            let target = entries[self.weighted_index(&entries, t)].clone();
            match self.policy.get(&target.id, t) {
                Some(alert) => self.record_hit(&alert, t),
                None => {
                    self.misses += 1;
                    if let Some(model) = self.policy.forecast_mut() {
                        model.observe_drop(&target, t);
                    }
                }
            }
        }
    }

    /// Weighted choice over cache entries by urgency, severity, and
    /// freshness. Consumes exactly one uniform.
    fn weighted_index(&mut self, entries: &[Arc<Alert>], now: u64) -> usize {
        let weights: Vec<f64> = entries
            .iter()
            .map(|a| a.urgency.rank() * a.severity.rank() * a.freshness(now))
            .collect();
        let total: f64 = weights.iter().sum();
        let mut remaining = self.rng.next_f64() * total;
        if total > 0.0 {
            for (i, w) in weights.iter().enumerate() {
                remaining -= w;
                if remaining <= 0.0 {
                    return i;
                }
            }
        }
        entries.len() - 1
    }

    fn record_hit(&mut self, alert: &Arc<Alert>, t: u64) {
        self.hits += 1;
        let freshness = alert.freshness(t);
        self.freshness_sum += freshness;
        if freshness == 0.0 {
            self.stale_hits += 1;
        }

        let latency = t.saturating_sub(alert.issued_at);
        if self.retrieved_alerts.insert(alert.id.clone()) {
            let stats = &mut self.region_stats[alert.region_id as usize];
            stats.first_retrievals += 1;
            stats.first_lat_sum += latency;
        }
        self.thread_first
            .entry(alert.thread_key.clone())
            .or_insert_with(|| ThreadFirst {
                latency,
                actionable: alert.is_high_impact(),
            });

        let sla = self.scenario.target_first_delivery_sec as f64;
        if let Some(model) = self.policy.forecast_mut() {
            model.observe_retrieval(alert, t, latency as f64, Some(sla));
        }
    }

    fn sample(&mut self, t: u64) {
        self.timeline.push(Sample {
            time: t,
            cache_size: self.policy.len(),
            hits: self.hits,
            misses: self.misses,
        });
    }

    fn finalize(mut self) -> SimResult<RunResult> {
        let issued_count = self.issued.len() as u64;
        if self.delivered + self.dropped != issued_count {
            return Err(SimError::Invariant(format!(
                "delivered {} + dropped {} != issued {issued_count}",
                self.delivered, self.dropped
            )));
        }

        for stats in &mut self.region_stats {
            stats.avg_first_retrieval_latency = if stats.first_retrievals > 0 {
                stats.first_lat_sum as f64 / stats.first_retrievals as f64
            } else {
                0.0
            };
        }

        let total_threads = self
            .issued
            .iter()
            .map(|a| a.thread_key.as_str())
            .collect::<HashSet<_>>()
            .len();
        let threads_with_first = self.thread_first.len();
        let actionable_first = self
            .thread_first
            .values()
            .filter(|f| f.actionable)
            .count();
        let sla = self.scenario.target_first_delivery_sec;
        let timely_first = self
            .thread_first
            .values()
            .filter(|f| f.latency <= sla)
            .count();
        let pushed_threads = self.first_push.len();
        let timely_pushes = self.first_push.values().filter(|&&lat| lat <= sla).count();

        let metrics = Metrics {
            cache_hit_rate: ratio(self.hits, self.hits + self.misses),
            delivery_rate: self.delivered as f64 / self.options.target_alerts as f64,
            avg_freshness: if self.hits > 0 {
                self.freshness_sum / self.hits as f64
            } else {
                0.0
            },
            stale_access_rate: ratio(self.stale_hits, self.hits),
            redundancy_index: ratio(self.duplicate_delivered, self.delivered),
            actionability_first_ratio: actionable_first as f64
                / threads_with_first.max(1) as f64,
            timeliness_consistency: timely_first as f64 / total_threads.max(1) as f64,
            pushes_sent: self.pushes_sent,
            push_suppress_rate: ratio(self.push_suppress, self.delivered),
            push_duplicate_rate: ratio(self.push_duplicates, self.pushes_sent),
            push_timely_first_ratio: timely_pushes as f64 / pushed_threads.max(1) as f64,
        };
        for key in Metrics::KEYS {
            let value = metrics.value(key).unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(SimError::Numeric(format!("metric {key} is {value}")));
            }
        }

        let info = format!(
            "{} / {} seed '{}': issued {}, delivered {} ({:.1}%), dropped {}, hits {}, misses {}, pushes {}",
            self.scenario.name,
            self.policy.kind().as_str(),
            self.options.seed,
            issued_count,
            self.delivered,
            100.0 * metrics.delivery_rate,
            self.dropped,
            self.hits,
            self.misses,
            self.pushes_sent,
        );
        debug!(info = %info, "simulation run complete");

        let pf_state = self.policy.forecast().map(|m| m.state());
        Ok(RunResult {
            metrics,
            timeline: self.timeline,
            issued_alerts: self.issued.iter().map(|a| (**a).clone()).collect(),
            delivered_alerts: self.delivered_alerts,
            environment: Environment::clone(self.environment),
            region_stats: self.region_stats,
            scenario: self.scenario.name.clone(),
            baseline_reliability: self.options.baseline_reliability,
            seed: self.options.seed.clone(),
            pf_state,
            info,
        })
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Knuth's multiplicative Poisson sampler.
fn poisson(rng: &mut Mulberry32, mean: f64) -> u64 {
    if mean <= 0.0 {
        return 0;
    }
    let limit = (-mean).exp();
    let mut k: u64 = 0;
    let mut product = 1.0;
    loop {
        k += 1;
        product *= rng.next_f64();
        if product <= limit {
            break;
        }
    }
    k - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisson_zero_rate_yields_zero() {
        let mut rng = Mulberry32::from_seed_str("poisson");
        assert_eq!(poisson(&mut rng, 0.0), 0);
        assert_eq!(poisson(&mut rng, -1.0), 0);
    }

    #[test]
    fn poisson_mean_is_roughly_right() {
        let mut rng = Mulberry32::from_seed_str("poisson-mean");
        let n = 20_000;
        let total: u64 = (0..n).map(|_| poisson(&mut rng, 2.5)).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 2.5).abs() < 0.1, "empirical mean {mean}");
    }
}
