//! Record sinks: where per-run records land.
//!
//! The engine knows nothing about persistence; orchestrators hand
//! [`RunRecord`]s to a sink with put-by-id semantics. Duplicate ids
//! overwrite.

use alertsim_batch::RunRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub trait RecordSink {
    fn put(&mut self, record: &RunRecord) -> Result<()>;
}

/// Stores each record as `<id>.json` under a directory.
#[derive(Debug)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating record directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl RecordSink for JsonDirSink {
    fn put(&mut self, record: &RunRecord) -> Result<()> {
        let path = self.path_for(&record.id);
        let json = serde_json::to_string_pretty(record).context("serializing run record")?;
        fs::write(&path, json)
            .with_context(|| format!("writing run record '{}'", path.display()))?;
        Ok(())
    }
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<RunRecord>,
}

impl RecordSink for MemorySink {
    fn put(&mut self, record: &RunRecord) -> Result<()> {
        if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
            *existing = record.clone();
        } else {
            self.records.push(record.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertsim_engine::{run_simulation, RunOptions};

    fn sample_record(id: &str) -> RunRecord {
        let options = RunOptions {
            scenario: "Rural".into(),
            policy: "LRU".into(),
            cache_size: 16,
            target_alerts: 30,
            duration_sec: 240,
            seed: "sink-test".into(),
            ..RunOptions::default()
        };
        let result = run_simulation(&options).unwrap();
        let mut record = RunRecord::from_result(&result, "LRU", false);
        record.id = id.to_string();
        record
    }

    #[test]
    fn json_sink_writes_and_overwrites_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonDirSink::new(dir.path().join("records")).unwrap();

        let first = sample_record("fixed-id");
        sink.put(&first).unwrap();
        let mut second = sample_record("fixed-id");
        second.policy = "TTLOnly".into();
        sink.put(&second).unwrap();

        let path = sink.path_for("fixed-id");
        let text = std::fs::read_to_string(path).unwrap();
        let parsed: RunRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.policy, "TTLOnly");
    }

    #[test]
    fn memory_sink_deduplicates_by_id() {
        let mut sink = MemorySink::default();
        sink.put(&sample_record("a")).unwrap();
        sink.put(&sample_record("a")).unwrap();
        sink.put(&sample_record("b")).unwrap();
        assert_eq!(sink.records.len(), 2);
    }
}
