//! Seeded per-region weather and anomaly history synthesis.
//!
//! Both synthesizers consume independent RNG streams forked from the base
//! seed (`|weather` and `|anomaly`) and visit regions in index order with a
//! fixed number of draws per region, so the records bit-match across runs
//! with the same seed.

use alertsim_core::{AnomalyRecord, Environment, Mulberry32, Severity, WeatherRecord};

fn clip01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Flood-propensity bias by region hazard class.
fn severity_bias(severity: Severity) -> f64 {
    match severity {
        Severity::Extreme => 0.35,
        Severity::Severe => 0.2,
        _ => 0.05,
    }
}

/// Unit-interval hazard scale used by rainfall volatility.
fn severity_scale(severity: Severity) -> f64 {
    match severity {
        Severity::Extreme => 1.0,
        Severity::Severe => 0.66,
        _ => 0.33,
    }
}

/// Synthesize weather history for every region.
///
/// Per region, draws five uniforms in order: flood, rainfall, volatility,
/// drainage, shelter demand.
pub fn synthesize_weather(env: &Environment, seed: &str) -> Vec<WeatherRecord> {
    let mut rng = Mulberry32::fork(seed, "weather");
    env.regions
        .iter()
        .map(|region| {
            let bias = severity_bias(region.severity);
            let u_flood = rng.next_f64();
            let u_rain = rng.next_f64();
            let u_vol = rng.next_f64();
            let u_drain = rng.next_f64();
            let u_shelter = rng.next_f64();

            let flood_frequency = clip01(0.25 + bias + (u_flood - 0.5) * 0.2);
            WeatherRecord {
                region_id: region.id,
                flood_frequency,
                rainfall_mean_mm: (80.0 + (u_rain - 0.5) * 60.0 + flood_frequency * 45.0)
                    .clamp(10.0, 160.0),
                rainfall_volatility: clip01(
                    0.3 + (u_vol - 0.5) * 0.2 + severity_scale(region.severity) * 0.3,
                ),
                drainage_score: clip01(
                    0.5 + (region.local_factor - 1.0) * 0.4 + (u_drain - 0.5) * 0.3,
                ),
                shelter_demand_index: clip01(
                    0.35 + flood_frequency * 0.5 + (u_shelter - 0.5) * 0.2,
                ),
            }
        })
        .collect()
}

/// Typical warning lead time anchor by hazard class: harsher regions get
/// less warning.
fn lead_time_base(severity: Severity) -> f64 {
    match severity {
        Severity::Extreme => 900.0,
        Severity::Severe => 1200.0,
        _ => 1800.0,
    }
}

/// Synthesize alerting-quality history for every region.
///
/// Per region, draws eight uniforms in order: accuracy, false alarm,
/// diversion gate, diversion, lead time, underestimation, overestimation,
/// trend.
pub fn synthesize_anomaly(env: &Environment, seed: &str) -> Vec<AnomalyRecord> {
    let mut rng = Mulberry32::fork(seed, "anomaly");
    env.regions
        .iter()
        .map(|region| {
            let u_acc = rng.next_f64();
            let u_falarm = rng.next_f64();
            let u_gate = rng.next_f64();
            let u_divert = rng.next_f64();
            let u_lead = rng.next_f64();
            let u_under = rng.next_f64();
            let u_over = rng.next_f64();
            let u_trend = rng.next_f64();

            let base_accuracy =
                0.65 + (region.local_factor - 1.0) * 0.15 + (u_acc - 0.5) * 0.2;
            // Low-accuracy regions cry wolf more often.
            let false_alarm_rate =
                clip01(0.08 + (1.0 - clip01(base_accuracy)) * 0.3 + (u_falarm - 0.5) * 0.1);
            // ~30% of regions have terrain that diverts storms late.
            let topographic = if u_gate < 0.3 { 0.15 } else { 0.0 };
            let last_minute_diversion_rate =
                clip01(0.05 + (u_divert - 0.5) * 0.06 + topographic);

            AnomalyRecord {
                region_id: region.id,
                false_alarm_rate,
                last_minute_diversion_rate,
                historical_accuracy: clip01(
                    base_accuracy
                        - 0.3 * false_alarm_rate
                        - 0.2 * last_minute_diversion_rate,
                ),
                typical_lead_time_sec: lead_time_base(region.severity) * (0.8 + u_lead * 0.4),
                underestimation_rate: clip01(0.12 + (u_under - 0.5) * 0.12),
                overestimation_rate: clip01(0.1 + (u_over - 0.5) * 0.12),
                accuracy_trend: trend_from_uniform(u_trend),
            }
        })
        .collect()
}

/// Accuracy trend around 1.0: a 15% improving tail in `[1.1, 1.25]`, a 15%
/// degrading tail in `[0.75, 0.9]`, and a flat middle near 1.0.
fn trend_from_uniform(u: f64) -> f64 {
    if u < 0.15 {
        1.1 + (u / 0.15) * 0.15
    } else if u > 0.85 {
        0.9 - ((u - 0.85) / 0.15) * 0.15
    } else {
        0.95 + ((u - 0.15) / 0.7) * 0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::generate_environment;

    fn env(seed: &str) -> Environment {
        let mut rng = Mulberry32::fork(seed, "env");
        generate_environment(&mut rng, 960.0, 540.0, 12)
    }

    #[test]
    fn weather_is_deterministic_and_bounded() {
        let environment = env("demo");
        let a = synthesize_weather(&environment, "demo");
        let b = synthesize_weather(&environment, "demo");
        assert_eq!(a, b);
        for record in &a {
            assert!((0.0..=1.0).contains(&record.flood_frequency));
            assert!((10.0..=160.0).contains(&record.rainfall_mean_mm));
            assert!((0.0..=1.0).contains(&record.rainfall_volatility));
            assert!((0.0..=1.0).contains(&record.drainage_score));
            assert!((0.0..=1.0).contains(&record.shelter_demand_index));
        }
    }

    #[test]
    fn anomaly_is_deterministic_and_bounded() {
        let environment = env("demo");
        let a = synthesize_anomaly(&environment, "demo");
        let b = synthesize_anomaly(&environment, "demo");
        assert_eq!(a, b);
        for record in &a {
            assert!((0.0..=1.0).contains(&record.false_alarm_rate));
            assert!((0.0..=1.0).contains(&record.last_minute_diversion_rate));
            assert!((0.0..=1.0).contains(&record.historical_accuracy));
            assert!(record.typical_lead_time_sec > 0.0);
            assert!((0.75..=1.25).contains(&record.accuracy_trend));
        }
    }

    #[test]
    fn streams_are_independent_of_each_other() {
        let environment = env("demo");
        // Synthesizing anomaly first must not disturb weather output.
        let anomaly_first = synthesize_anomaly(&environment, "demo");
        let weather = synthesize_weather(&environment, "demo");
        let anomaly_second = synthesize_anomaly(&environment, "demo");
        assert_eq!(anomaly_first, anomaly_second);
        assert_eq!(weather, synthesize_weather(&environment, "demo"));
    }

    #[test]
    fn trend_tails_cover_documented_range() {
        assert!(trend_from_uniform(0.0) >= 1.1);
        assert!(trend_from_uniform(0.14) <= 1.25);
        assert!(trend_from_uniform(0.5) > 0.9 && trend_from_uniform(0.5) < 1.1);
        assert!(trend_from_uniform(0.99) <= 0.9);
        assert!(trend_from_uniform(1.0 - f64::EPSILON) >= 0.75);
    }
}
