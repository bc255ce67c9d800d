//! Batch manifests: a JSON summary written into each batch output root.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-cell status line in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub label: String,
    pub status: String,
    pub error: Option<String>,
}

impl CellRecord {
    pub fn ok(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: "ok".into(),
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: "error".into(),
            error: Some(error.into()),
        }
    }
}

/// Summary of one batch operation, for downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    pub operation: String,
    pub num_cells: usize,
    pub success: usize,
    pub failure: usize,
    pub cells: Vec<CellRecord>,
}

impl BatchManifest {
    pub fn new(operation: impl Into<String>, cells: Vec<CellRecord>) -> Self {
        let success = cells.iter().filter(|c| c.status == "ok").count();
        Self {
            created_at: Utc::now(),
            operation: operation.into(),
            num_cells: cells.len(),
            success,
            failure: cells.len() - success,
            cells,
        }
    }
}

pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(manifest).context("serializing batch manifest to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("writing batch manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_batch_manifest(path: &Path) -> Result<BatchManifest> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("opening batch manifest '{}'", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("parsing batch manifest '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn manifest_writes_and_reads_back() {
        let cells = vec![
            CellRecord::ok("LRU"),
            CellRecord::failed("PAFTinyLFU", "boom"),
        ];
        let manifest = BatchManifest::new("policyComparison", cells);
        assert_eq!(manifest.success, 1);
        assert_eq!(manifest.failure, 1);

        let tmp = NamedTempFile::new().unwrap();
        write_batch_manifest(tmp.path(), &manifest).unwrap();
        let parsed = load_batch_manifest(tmp.path()).unwrap();
        assert_eq!(parsed.operation, "policyComparison");
        assert_eq!(parsed.cells, manifest.cells);
    }
}
