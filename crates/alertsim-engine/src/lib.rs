//! # alertsim-engine: The Simulation Engine
//!
//! Drives one reproducible run: seeded world synthesis, a fixed-step
//! integer-second loop of arrivals, retries, queries, and push decisions,
//! and end-of-run metric aggregation.
//!
//! The entry point is [`run_simulation`]; it is a pure function of
//! [`RunOptions`], so callers may replicate or parallelize runs freely.

pub mod engine;
pub mod metrics;
pub mod options;

pub use engine::{run_simulation, RunResult};
pub use metrics::{Metrics, RegionStats, Sample};
pub use options::{DeliveryOptions, PfOptions, PushOptions, RunOptions};
