//! # alertsim-core: Alert Simulation Data Model
//!
//! Fundamental types shared by every layer of the simulator: the alert and
//! region model, the seeded RNG every run derives its randomness from, the
//! count-min frequency sketch, and the unified error type.
//!
//! ## Reproducibility
//!
//! A simulation run is a pure function of its options and seed string.
//! Everything in this crate is deterministic: the RNG is a fixed Mulberry32
//! with a fixed string hash, the sketch ages as a pure function of its
//! increment sequence, and the model types carry no hidden state. Higher
//! layers keep that property by threading [`rng::Mulberry32`] explicitly
//! rather than reaching for ambient randomness.

pub mod alert;
pub mod error;
pub mod history;
pub mod region;
pub mod rng;
pub mod sketch;

pub use alert::{Alert, EventType, Severity, Urgency};
pub use error::{SimError, SimResult};
pub use history::{AnomalyRecord, WeatherRecord};
pub use region::{Environment, Point, Region};
pub use rng::{hash_seed, Mulberry32};
pub use sketch::{fnv1a32, FrequencySketch};
