//! Structured pipeline snapshots produced by CI simulators.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;
use wfs_core::{ErrorInfo, JobRecord, WfsError};

/// One job of a snapshot pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotJob {
    pub id: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub runner: Option<String>,
}

/// Stage membership by job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStage {
    pub name: String,
    #[serde(default)]
    pub jobs: Vec<String>,
}

/// A `pipeline*.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub id: String,
    #[serde(default)]
    pub jobs: Vec<SnapshotJob>,
    #[serde(default)]
    pub stages: Vec<SnapshotStage>,
}

impl PipelineSnapshot {
    pub fn load(path: &Path) -> Result<Self, WfsError> {
        let contents =
            fs::read_to_string(path).map_err(|err| WfsError::io("snapshot-read", path, err))?;
        serde_json::from_str(&contents).map_err(|err| {
            WfsError::Serde(
                ErrorInfo::new("snapshot-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Jobs as provider-neutral records with their stage resolved.
    ///
    /// The job id doubles as its name; label trimming happens in the builder.
    pub fn job_records(&self) -> Vec<JobRecord> {
        let mut stage_of: HashMap<&str, &str> = HashMap::new();
        for stage in &self.stages {
            for job in &stage.jobs {
                stage_of.insert(job.as_str(), stage.name.as_str());
            }
        }
        self.jobs
            .iter()
            .map(|job| JobRecord {
                id: job.id.clone(),
                name: job.id.clone(),
                started_at: job.started_at,
                completed_at: job.finished_at,
                runner: job.runner.clone(),
                stage: stage_of.get(job.id.as_str()).map(|name| name.to_string()),
            })
            .collect()
    }
}

/// Lists `pipeline*.json` files directly inside `dir`, sorted by name.
pub fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>, WfsError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| WfsError::io("snapshot-dir", dir, err))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && name.starts_with("pipeline") && name.ends_with(".json")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}
