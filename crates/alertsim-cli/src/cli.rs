//! Command-line definitions for the `alertsim` binary.

use alertsim_engine::{PfOptions, RunOptions};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "alertsim",
    author,
    version,
    about = "Reproducible simulator for priority-aware emergency-alert caching",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Worker threads for batch operations ("auto" = CPU count)
    #[arg(long, default_value = "auto")]
    pub threads: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Run-option flags shared by every simulating subcommand. Flags override
/// the options file; the file overrides built-in defaults.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Base options document (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Scenario name (Urban, Suburban, Rural)
    #[arg(long)]
    pub scenario: Option<String>,

    /// Policy name (LRU, TTLOnly, PriorityFresh, PAFTinyLFU)
    #[arg(long)]
    pub policy: Option<String>,

    /// Cache capacity in entries
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Target alert count
    #[arg(long)]
    pub alerts: Option<usize>,

    /// Baseline delivery reliability in [0, 1]
    #[arg(long)]
    pub reliability: Option<f64>,

    /// Run horizon in seconds
    #[arg(long)]
    pub duration_sec: Option<u64>,

    /// Query rate per minute
    #[arg(long)]
    pub query_rate: Option<f64>,

    /// Seed string
    #[arg(long)]
    pub seed: Option<String>,

    /// Attach the priority-forecast model (PriorityFresh runs only)
    #[arg(long)]
    pub forecast: bool,

    /// Forecast exploration probability
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Push rate limit per minute (0 disables push decisioning)
    #[arg(long)]
    pub push_rate: Option<u32>,

    /// Push dedup window per thread, in seconds
    #[arg(long)]
    pub push_dedup_sec: Option<u64>,

    /// Forecast probability threshold for push admission
    #[arg(long)]
    pub push_threshold: Option<f64>,

    /// Delivery retry interval in seconds
    #[arg(long)]
    pub retry_interval_sec: Option<u64>,

    /// Delivery attempts per alert
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl RunArgs {
    /// Resolve flags and the optional options file into run options.
    pub fn to_options(&self) -> Result<RunOptions> {
        let mut options = match &self.options {
            Some(path) => RunOptions::load_from_path(path)?,
            None => RunOptions::default(),
        };
        if let Some(scenario) = &self.scenario {
            options.scenario = scenario.clone();
        }
        if let Some(policy) = &self.policy {
            options.policy = policy.clone();
        }
        if let Some(cache_size) = self.cache_size {
            options.cache_size = cache_size;
        }
        if let Some(alerts) = self.alerts {
            options.target_alerts = alerts;
        }
        if let Some(reliability) = self.reliability {
            options.baseline_reliability = reliability;
        }
        if let Some(duration) = self.duration_sec {
            options.duration_sec = duration;
        }
        if let Some(query_rate) = self.query_rate {
            options.query_rate_per_min = query_rate;
        }
        if let Some(seed) = &self.seed {
            options.seed = seed.clone();
        }
        if self.forecast && options.pf.is_none() {
            options.pf = Some(PfOptions::default());
        }
        if let Some(epsilon) = self.epsilon {
            let pf = options.pf.get_or_insert_with(PfOptions::default);
            pf.hyper.epsilon = epsilon;
        }
        if let Some(rate) = self.push_rate {
            options.push.rate_limit_per_min = rate;
        }
        if let Some(dedup) = self.push_dedup_sec {
            options.push.dedup_window_sec = dedup;
        }
        if let Some(threshold) = self.push_threshold {
            options.push.threshold = threshold;
        }
        if let Some(interval) = self.retry_interval_sec {
            options.delivery.retry_interval_sec = interval;
        }
        if let Some(attempts) = self.max_attempts {
            options.delivery.max_attempts = attempts;
        }
        Ok(options)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulation and export its timeline
    Run {
        #[command(flatten)]
        args: RunArgs,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Also write the full result JSON
        #[arg(long)]
        full: bool,
        /// Persist a run record into this directory
        #[arg(long)]
        record_dir: Option<PathBuf>,
    },
    /// Compare the four policies on identical options and seed
    Compare {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Replicated batch under a seed derivation mode
    Batch {
        #[command(flatten)]
        args: RunArgs,
        /// Number of replicates
        #[arg(long, default_value_t = 3)]
        replicates: usize,
        /// Seed mode: fixed, jitter, or random
        #[arg(long, default_value = "jitter")]
        seed_mode: String,
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Persist per-replicate records into this directory
        #[arg(long)]
        record_dir: Option<PathBuf>,
    },
    /// Multi-policy comparison across device profiles (cache sizes)
    Devices {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Multi-policy comparison across network profiles (reliabilities)
    Networks {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Device x network cross-product comparison
    Combined {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Randomized option scan
    Scan {
        /// Number of randomized runs
        #[arg(long, default_value_t = 10)]
        runs: usize,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// List the scenario catalogue
    Scenarios,
}
