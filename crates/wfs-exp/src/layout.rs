use std::path::{Path, PathBuf};

use wfs_core::RunId;

use crate::ledger::RunLedger;

/// Directory layout of experiments: `<root>/<platform>/<workflow>/experiment_<n>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentLayout {
    root: PathBuf,
    platform: String,
    workflow: String,
}

impl ExperimentLayout {
    pub fn new(root: impl Into<PathBuf>, platform: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            platform: platform.into(),
            workflow: workflow.into(),
        }
    }

    pub fn workflow_dir(&self) -> PathBuf {
        self.root.join(&self.platform).join(&self.workflow)
    }

    pub fn experiment_dir(&self, number: usize) -> PathBuf {
        self.workflow_dir().join(format!("experiment_{number}"))
    }

    /// First experiment number whose directory does not exist yet.
    pub fn fresh_number(&self) -> usize {
        let mut number = 0;
        while self.experiment_dir(number).exists() {
            number += 1;
        }
        number
    }

    /// Most recent existing experiment, if any.
    pub fn latest_number(&self) -> Option<usize> {
        self.fresh_number().checked_sub(1)
    }

    pub fn ledger(&self, number: usize) -> RunLedger {
        RunLedger::open(self.experiment_dir(number).join("run_ids.json"))
    }

    pub fn run_log_dir(&self, number: usize, run_id: &RunId) -> PathBuf {
        self.experiment_dir(number).join(format!("logs_{}", run_id.path_fragment()))
    }

    pub fn jobs_snapshot_path(&self, number: usize, run_id: &RunId) -> PathBuf {
        self.experiment_dir(number).join(format!("run{}.json", run_id.path_fragment()))
    }

    pub fn gantt_path(&self, number: usize, run_id: &RunId) -> PathBuf {
        self.experiment_dir(number).join(format!("gantt_run{}.svg", run_id.path_fragment()))
    }

    pub fn aggregate_gantt_path(&self, number: usize) -> PathBuf {
        self.experiment_dir(number).join("gantt_run_all_jobs.svg")
    }

    pub fn correlation_path(&self, number: usize) -> PathBuf {
        self.experiment_dir(number).join("step-index-and-durations.svg")
    }

    pub fn durations_chart_path(&self, number: usize) -> PathBuf {
        self.experiment_dir(number).join("workflow_durations.svg")
    }

    pub fn durations_csv_path(&self, number: usize) -> PathBuf {
        self.experiment_dir(number).join("durations.csv")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
