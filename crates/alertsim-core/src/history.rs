//! Per-region synthesized history records.
//!
//! These feed the forecast model's feature vector; the synthesizers that
//! populate them live in the scenarios crate so that draw order stays next
//! to the rest of the seeded generation code.

use serde::{Deserialize, Serialize};

/// Weather history for one region. Ratios are in `[0, 1]`; rainfall is in
/// millimetres, clipped to `[10, 160]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub region_id: u32,
    pub flood_frequency: f64,
    pub rainfall_mean_mm: f64,
    pub rainfall_volatility: f64,
    pub drainage_score: f64,
    pub shelter_demand_index: f64,
}

/// Alerting-quality history for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub region_id: u32,
    pub false_alarm_rate: f64,
    pub last_minute_diversion_rate: f64,
    pub historical_accuracy: f64,
    pub typical_lead_time_sec: f64,
    pub underestimation_rate: f64,
    pub overestimation_rate: f64,
    /// Around 1.0; improving tail above 1.1, degrading tail below 0.9.
    pub accuracy_trend: f64,
}
