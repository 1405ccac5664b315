//! N trigger/poll cycles of one experiment.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use wfs_core::{CiClient, ErrorInfo, RunRecord, WfsError};

use crate::config::AggregatePolicy;
use crate::ledger::RunLedger;
use crate::orchestrator::{run_failure, RunOrchestrator};

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunSample {
    Finished { attempt: usize, record: RunRecord },
    Aborted { attempt: usize, error: WfsError },
}

impl RunSample {
    pub fn attempt(&self) -> usize {
        match self {
            RunSample::Finished { attempt, .. } | RunSample::Aborted { attempt, .. } => *attempt,
        }
    }

    pub fn record(&self) -> Option<&RunRecord> {
        match self {
            RunSample::Finished { record, .. } => Some(record),
            RunSample::Aborted { .. } => None,
        }
    }
}

/// Everything one session observed, in attempt order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub experiment: usize,
    pub samples: Vec<RunSample>,
}

impl SessionReport {
    /// Records that count under `policy`, in attempt order.
    pub fn counted(&self, policy: AggregatePolicy) -> Vec<&RunRecord> {
        self.samples
            .iter()
            .filter_map(RunSample::record)
            .filter(|record| policy.include_unsuccessful || record.status.is_success())
            .collect()
    }

    /// Durations in seconds of the counted runs.
    pub fn durations(&self, policy: AggregatePolicy) -> Vec<f64> {
        self.counted(policy)
            .into_iter()
            .map(RunRecord::duration_seconds)
            .collect()
    }

    pub fn aborted(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| matches!(sample, RunSample::Aborted { .. }))
            .count()
    }

    /// Writes `attempt,run_id,status,duration_seconds` rows for finished runs.
    pub fn write_csv(&self, path: &Path) -> Result<(), WfsError> {
        let rows: Vec<DurationRow> = self
            .samples
            .iter()
            .filter_map(|sample| {
                sample.record().map(|record| DurationRow {
                    index: sample.attempt(),
                    run_id: record.id.to_string(),
                    status: record.status.to_string(),
                    duration_seconds: record.duration_seconds(),
                })
            })
            .collect();
        write_durations_csv(path, &rows)
    }
}

/// One line of `durations.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRow {
    pub index: usize,
    pub run_id: String,
    pub status: String,
    pub duration_seconds: f64,
}

pub fn write_durations_csv(path: &Path, rows: &[DurationRow]) -> Result<(), WfsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| WfsError::io("csv-mkdir", parent, err))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|err| wrap_csv("csv-open", path, err))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| wrap_csv("csv-row", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| WfsError::io("csv-flush", path, err))?;
    Ok(())
}

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> WfsError {
    WfsError::Io(
        ErrorInfo::new(code, "CSV export failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

/// Owns the experiment number and its ledger and drives the orchestrator.
pub struct ExperimentSession<C> {
    number: usize,
    ledger: RunLedger,
    orchestrator: RunOrchestrator<C>,
    branch: String,
    run_name: String,
}

impl<C: CiClient> ExperimentSession<C> {
    pub fn new(
        number: usize,
        ledger: RunLedger,
        orchestrator: RunOrchestrator<C>,
        branch: impl Into<String>,
        run_name: impl Into<String>,
    ) -> Self {
        Self {
            number,
            ledger,
            orchestrator,
            branch: branch.into(),
            run_name: run_name.into(),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    /// Runs `runs` attempts. Each located id is persisted before polling;
    /// a failed attempt is reported and the remaining attempts continue.
    pub fn run(&mut self, runs: usize) -> SessionReport {
        let mut samples = Vec::with_capacity(runs);
        for attempt in 0..runs {
            info!(experiment = self.number, attempt, "starting run attempt");
            let ledger = &self.ledger;
            let result = self.orchestrator.trigger_and_wait_with(
                &self.branch,
                &self.run_name,
                |run_id| {
                    let receipt = ledger.append(run_id)?;
                    if let Some(moved) = &receipt.quarantined {
                        warn!(attempt, moved = %moved.display(), "ledger was corrupt and has been reset");
                    }
                    Ok(())
                },
            );
            match result {
                Ok(record) => {
                    if let Some(failure) = run_failure(&record) {
                        warn!(attempt, run_id = %record.id, error = %failure, "run counted as unsuccessful");
                    }
                    samples.push(RunSample::Finished { attempt, record });
                }
                Err(err) => {
                    error!(attempt, error = %err, "run attempt failed");
                    samples.push(RunSample::Aborted { attempt, error: err });
                }
            }
        }
        SessionReport {
            experiment: self.number,
            samples,
        }
    }
}
