use alertsim_batch::{
    run_combined_comparison, run_device_comparison, run_network_comparison,
    run_policy_comparison, run_randomized_scan, run_replicated_batch, write_batch_manifest,
    BatchManifest, BatchOutcome, CellRecord, RunRecord, SeedMode,
};
use alertsim_engine::{run_simulation, RunOptions};
use alertsim_io::{
    write_combined_comparison_csv, write_device_comparison_csv, write_network_comparison_csv,
    write_policy_comparison_csv, write_timeline_csv, JsonDirSink, RecordSink,
};
use alertsim_scenarios::Scenario;
use anyhow::{Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use alertsim_cli::cli::{Cli, Commands};

fn configure_threads(spec: &str) {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serializing output JSON")?;
    fs::write(path, json).with_context(|| format!("writing '{}'", path.display()))?;
    Ok(())
}

fn ensure_out(out: &Path) -> Result<()> {
    fs::create_dir_all(out)
        .with_context(|| format!("creating output directory '{}'", out.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    configure_threads(&cli.threads);

    match cli.command {
        Commands::Run {
            args,
            out,
            full,
            record_dir,
        } => cmd_run(&args.to_options()?, &out, full, record_dir.as_deref()),
        Commands::Compare { args, out } => cmd_compare(&args.to_options()?, &out),
        Commands::Batch {
            args,
            replicates,
            seed_mode,
            out,
            record_dir,
        } => cmd_batch(
            &args.to_options()?,
            replicates,
            &seed_mode,
            &out,
            record_dir.as_deref(),
        ),
        Commands::Devices { args, out } => cmd_devices(&args.to_options()?, &out),
        Commands::Networks { args, out } => cmd_networks(&args.to_options()?, &out),
        Commands::Combined { args, out } => cmd_combined(&args.to_options()?, &out),
        Commands::Scan { runs, out } => cmd_scan(runs, &out),
        Commands::Scenarios => cmd_scenarios(),
    }
}

fn cmd_run(
    options: &RunOptions,
    out: &Path,
    full: bool,
    record_dir: Option<&Path>,
) -> Result<()> {
    ensure_out(out)?;
    let result = run_simulation(options)?;
    info!("{}", result.info);

    write_timeline_csv(&out.join("timeline.csv"), &result.timeline)?;
    if full {
        write_json(&out.join("result.json"), &result)?;
    }
    if let Some(dir) = record_dir {
        let record = RunRecord::from_result(&result, &options.policy, full);
        let mut sink = JsonDirSink::new(dir)?;
        sink.put(&record)?;
        info!(record = %record.id, "run record persisted");
    }
    println!("{}", result.info);
    Ok(())
}

fn cmd_compare(options: &RunOptions, out: &Path) -> Result<()> {
    ensure_out(out)?;
    let comparison = run_policy_comparison(options)?;
    write_policy_comparison_csv(&out.join("comparison.csv"), &comparison, options)?;
    write_json(
        &out.join("comparison.json"),
        &BatchOutcome::PolicyComparison(comparison.clone()),
    )?;

    let cells = comparison
        .runs
        .iter()
        .map(|run| match &run.error {
            None => CellRecord::ok(run.policy.as_str()),
            Some(err) => CellRecord::failed(run.policy.as_str(), err.clone()),
        })
        .collect();
    write_batch_manifest(
        &out.join("batch_manifest.json"),
        &BatchManifest::new("policyComparison", cells),
    )?;
    println!(
        "compared {} policies on seed '{}' -> {}",
        comparison.runs.len(),
        comparison.seed,
        out.display()
    );
    Ok(())
}

fn cmd_batch(
    options: &RunOptions,
    replicates: usize,
    seed_mode: &str,
    out: &Path,
    record_dir: Option<&Path>,
) -> Result<()> {
    ensure_out(out)?;
    let mode = SeedMode::parse(seed_mode)?;
    let batch = run_replicated_batch(options, replicates, mode)?;
    write_json(
        &out.join("batch.json"),
        &BatchOutcome::Replicated(batch.clone()),
    )?;

    let cells = batch
        .replicates
        .iter()
        .map(|run| match &run.error {
            None => CellRecord::ok(run.seed.as_str()),
            Some(err) => CellRecord::failed(run.seed.as_str(), err.clone()),
        })
        .collect();
    write_batch_manifest(
        &out.join("batch_manifest.json"),
        &BatchManifest::new("replicatedBatch", cells),
    )?;

    if let Some(dir) = record_dir {
        let mut sink = JsonDirSink::new(dir)?;
        let batch_id = format!("{}-{}", batch.base_seed, mode.as_str());
        for replicate in &batch.replicates {
            if let Some(result) = &replicate.result {
                let record = RunRecord::from_result(result, &options.policy, false).with_batch(
                    &batch_id,
                    mode,
                    replicate.replicate_index,
                    replicates,
                );
                sink.put(&record)?;
            }
        }
    }
    println!(
        "batch of {} replicates ({}) -> {}",
        replicates,
        mode.as_str(),
        out.display()
    );
    Ok(())
}

fn cmd_devices(options: &RunOptions, out: &Path) -> Result<()> {
    ensure_out(out)?;
    let sweep = run_device_comparison(options)?;
    write_device_comparison_csv(&out.join("devices.csv"), &sweep, options)?;
    write_json(
        &out.join("devices.json"),
        &BatchOutcome::DeviceComparison(sweep.clone()),
    )?;
    write_batch_manifest(
        &out.join("batch_manifest.json"),
        &BatchManifest::new("deviceComparison", profile_cells(&sweep)),
    )?;
    println!("device sweep ({} cells) -> {}", sweep.cells.len(), out.display());
    Ok(())
}

fn cmd_networks(options: &RunOptions, out: &Path) -> Result<()> {
    ensure_out(out)?;
    let sweep = run_network_comparison(options)?;
    write_network_comparison_csv(&out.join("networks.csv"), &sweep, options)?;
    write_json(
        &out.join("networks.json"),
        &BatchOutcome::NetworkComparison(sweep.clone()),
    )?;
    write_batch_manifest(
        &out.join("batch_manifest.json"),
        &BatchManifest::new("networkComparison", profile_cells(&sweep)),
    )?;
    println!("network sweep ({} cells) -> {}", sweep.cells.len(), out.display());
    Ok(())
}

fn profile_cells(sweep: &alertsim_batch::ProfileComparison) -> Vec<CellRecord> {
    sweep
        .cells
        .iter()
        .map(|cell| {
            if cell.comparison.failed_cells == 0 {
                CellRecord::ok(cell.profile.as_str())
            } else {
                CellRecord::failed(
                    cell.profile.as_str(),
                    format!("{} policy cells failed", cell.comparison.failed_cells),
                )
            }
        })
        .collect()
}

fn cmd_combined(options: &RunOptions, out: &Path) -> Result<()> {
    ensure_out(out)?;
    let combined = run_combined_comparison(options)?;
    write_combined_comparison_csv(&out.join("combined.csv"), &combined, options)?;
    write_json(
        &out.join("combined.json"),
        &BatchOutcome::CombinedComparison(combined.clone()),
    )?;
    let cells = combined
        .cells
        .iter()
        .map(|cell| {
            let label = format!("{}x{}", cell.cache_size, cell.reliability);
            if cell.comparison.failed_cells == 0 {
                CellRecord::ok(label)
            } else {
                CellRecord::failed(
                    label,
                    format!("{} policy cells failed", cell.comparison.failed_cells),
                )
            }
        })
        .collect();
    write_batch_manifest(
        &out.join("batch_manifest.json"),
        &BatchManifest::new("combinedComparison", cells),
    )?;
    println!(
        "combined sweep ({} cells) -> {}",
        combined.cells.len(),
        out.display()
    );
    Ok(())
}

fn cmd_scan(runs: usize, out: &Path) -> Result<()> {
    ensure_out(out)?;
    let scan = run_randomized_scan(runs)?;
    write_json(&out.join("scan.json"), &BatchOutcome::RandomizedScan(scan.clone()))?;
    let cells = scan
        .runs
        .iter()
        .map(|run| match &run.error {
            None => CellRecord::ok(run.options.seed.as_str()),
            Some(err) => CellRecord::failed(run.options.seed.as_str(), err.clone()),
        })
        .collect();
    write_batch_manifest(
        &out.join("batch_manifest.json"),
        &BatchManifest::new("randomizedScan", cells),
    )?;
    println!(
        "scan '{}' with {} runs ({} failed) -> {}",
        scan.scan_id,
        scan.runs.len(),
        scan.failed_cells,
        out.display()
    );
    Ok(())
}

fn cmd_scenarios() -> Result<()> {
    for scenario in Scenario::all() {
        println!(
            "{:<10} rate {:>5.1}/min  ttl {:>6.0}s  sla {:>4}s  regions {:>2}  segments {}",
            scenario.name,
            scenario.base_alert_rate_per_min,
            scenario.mean_ttl_sec,
            scenario.target_first_delivery_sec,
            scenario.region_target,
            scenario.segments.len(),
        );
    }
    Ok(())
}
