//! Export surfaces: CSV tables and record sinks.

pub mod csv;
pub mod sink;

pub use crate::csv::{
    write_combined_comparison_csv, write_device_comparison_csv, write_network_comparison_csv,
    write_policy_comparison_csv, write_timeline_csv,
};
pub use sink::{JsonDirSink, MemorySink, RecordSink};
