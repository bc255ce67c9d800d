//! CSV exporters for timelines and comparison tables.

use alertsim_batch::{CombinedComparison, PolicyComparison, ProfileComparison};
use alertsim_engine::{Metrics, RunOptions, RunResult, Sample};
use anyhow::{Context, Result};
use std::path::Path;

/// Shared metric column block, in the canonical key order.
fn metric_columns(metrics: &Metrics) -> Vec<String> {
    Metrics::KEYS
        .iter()
        .map(|key| metrics.value(key).unwrap_or(0.0).to_string())
        .collect()
}

/// `time,cacheSize,hits,misses,hitRate` for one run's timeline.
pub fn write_timeline_csv(path: &Path, timeline: &[Sample]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating timeline csv '{}'", path.display()))?;
    writer.write_record(["time", "cacheSize", "hits", "misses", "hitRate"])?;
    for sample in timeline {
        writer.write_record([
            sample.time.to_string(),
            sample.cache_size.to_string(),
            sample.hits.to_string(),
            sample.misses.to_string(),
            sample.hit_rate().to_string(),
        ])?;
    }
    writer.flush().context("flushing timeline csv")?;
    Ok(())
}

fn comparison_header(prefix: &[&str]) -> Vec<String> {
    let mut header: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
    header.extend(
        [
            "policy",
            "seed",
            "scenario",
            "cacheSize",
            "alerts",
            "reliability",
            "durationSec",
            "queryRatePerMin",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    header.extend(Metrics::KEYS.iter().map(|s| s.to_string()));
    header
}

fn comparison_row(
    prefix: &[String],
    policy: &str,
    result: &RunResult,
    cache_size: usize,
    reliability: f64,
    options: &RunOptions,
) -> Vec<String> {
    let mut row = prefix.to_vec();
    row.push(policy.to_string());
    row.push(result.seed.clone());
    row.push(result.scenario.clone());
    row.push(cache_size.to_string());
    row.push(options.target_alerts.to_string());
    row.push(reliability.to_string());
    row.push(options.duration_sec.to_string());
    row.push(options.query_rate_per_min.to_string());
    row.extend(metric_columns(&result.metrics));
    row
}

fn write_comparison_rows(
    writer: &mut csv::Writer<std::fs::File>,
    prefix: &[String],
    comparison: &PolicyComparison,
    options: &RunOptions,
) -> Result<()> {
    for run in &comparison.runs {
        // Failed cells are recorded in the manifest, not the table.
        let Some(result) = &run.result else {
            continue;
        };
        writer.write_record(comparison_row(
            prefix,
            &run.policy,
            result,
            comparison.cache_size,
            comparison.baseline_reliability,
            options,
        ))?;
    }
    Ok(())
}

/// Multi-policy comparison rows.
pub fn write_policy_comparison_csv(
    path: &Path,
    comparison: &PolicyComparison,
    options: &RunOptions,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating comparison csv '{}'", path.display()))?;
    writer.write_record(comparison_header(&[]))?;
    write_comparison_rows(&mut writer, &[], comparison, options)?;
    writer.flush().context("flushing comparison csv")?;
    Ok(())
}

/// Device sweep rows, `device` column first.
pub fn write_device_comparison_csv(
    path: &Path,
    sweep: &ProfileComparison,
    options: &RunOptions,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating device csv '{}'", path.display()))?;
    writer.write_record(comparison_header(&["device"]))?;
    for cell in &sweep.cells {
        write_comparison_rows(
            &mut writer,
            &[cell.profile.clone()],
            &cell.comparison,
            options,
        )?;
    }
    writer.flush().context("flushing device csv")?;
    Ok(())
}

/// Network sweep rows, `network` column first.
pub fn write_network_comparison_csv(
    path: &Path,
    sweep: &ProfileComparison,
    options: &RunOptions,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating network csv '{}'", path.display()))?;
    writer.write_record(comparison_header(&["network"]))?;
    for cell in &sweep.cells {
        write_comparison_rows(
            &mut writer,
            &[cell.profile.clone()],
            &cell.comparison,
            options,
        )?;
    }
    writer.flush().context("flushing network csv")?;
    Ok(())
}

/// Combined sweep rows, `device,network` columns first.
pub fn write_combined_comparison_csv(
    path: &Path,
    combined: &CombinedComparison,
    options: &RunOptions,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating combined csv '{}'", path.display()))?;
    writer.write_record(comparison_header(&["device", "network"]))?;
    for cell in &combined.cells {
        write_comparison_rows(
            &mut writer,
            &[cell.cache_size.to_string(), cell.reliability.to_string()],
            &cell.comparison,
            options,
        )?;
    }
    writer.flush().context("flushing combined csv")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertsim_batch::run_policy_comparison;
    use alertsim_engine::run_simulation;

    fn quick_options() -> RunOptions {
        RunOptions {
            scenario: "Rural".into(),
            policy: "LRU".into(),
            cache_size: 16,
            target_alerts: 30,
            duration_sec: 240,
            seed: "csv-test".into(),
            ..RunOptions::default()
        }
    }

    #[test]
    fn timeline_csv_has_expected_shape() {
        let result = run_simulation(&quick_options()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.csv");
        write_timeline_csv(&path, &result.timeline).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "time,cacheSize,hits,misses,hitRate");
        assert_eq!(lines.count(), result.timeline.len());
        assert!(text.lines().nth(1).unwrap().starts_with("0,"));
    }

    #[test]
    fn comparison_csv_lists_all_policies() {
        let options = quick_options();
        let comparison = run_policy_comparison(&options).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.csv");
        write_policy_comparison_csv(&path, &comparison, &options).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("policy,seed,scenario,cacheSize,alerts"));
        assert!(lines[0].ends_with("pushTimelyFirstRatio"));
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("LRU,csv-test,Rural,16,30,"));
        assert!(lines[4].starts_with("PAFTinyLFU,"));
    }
}
