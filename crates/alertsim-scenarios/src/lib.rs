//! Scenario catalogue and seeded world synthesis.
//!
//! Everything a run needs before its clock starts: the named scenario
//! bundles (rates, TTLs, SLA targets, temporal segments), the polygonal
//! environment, the per-region weather and anomaly histories, and the
//! ordered alert stream. All of it derives from the run's seed string and
//! its labelled forks, so two runs with equal options see the same world.

pub mod catalog;
pub mod environment;
pub mod history;
pub mod stream;

pub use catalog::{Scenario, Segment, PLANE_HEIGHT, PLANE_WIDTH};
pub use environment::generate_environment;
pub use history::{synthesize_anomaly, synthesize_weather};
pub use stream::synthesize_alerts;
