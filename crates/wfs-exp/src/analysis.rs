//! Passes that run after an experiment: log download and timeline collection.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wfs_core::{path_fragment, CiClient, ErrorInfo, JobRecord, LogDelivery, RunId, RunStatus, WfsError};
use wfs_timeline::{Timeline, TimelineBuilder};

use crate::config::AggregatePolicy;
use crate::layout::ExperimentLayout;

/// Summary of a log download pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadReport {
    pub downloaded: Vec<RunId>,
    pub failed: Vec<(RunId, WfsError)>,
}

/// Fetches the logs of every run in the experiment's ledger into
/// `logs_<run_id>/`. One run's failure does not stop the pass.
pub fn download_logs<C: CiClient>(
    client: &C,
    layout: &ExperimentLayout,
    number: usize,
) -> Result<DownloadReport, WfsError> {
    let run_ids = layout.ledger(number).read_all()?;
    let mut report = DownloadReport::default();
    for run_id in run_ids {
        let out_dir = layout.run_log_dir(number, &run_id);
        let result = match client.log_delivery() {
            LogDelivery::Archive => client
                .download_log_archive(&run_id)
                .and_then(|bytes| extract_archive(&bytes, &out_dir)),
            LogDelivery::PerJobTrace => save_job_traces(client, &run_id, &out_dir),
        };
        match result {
            Ok(files) => {
                info!(run_id = %run_id, files, dir = %out_dir.display(), "logs saved");
                report.downloaded.push(run_id);
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "failed to fetch logs");
                report.failed.push((run_id, err));
            }
        }
    }
    Ok(report)
}

/// Unpacks a zip archive into `out_dir`, returning the number of files written.
///
/// Entries whose path would leave `out_dir` are skipped.
pub fn extract_archive(bytes: &[u8], out_dir: &Path) -> Result<usize, WfsError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| {
        WfsError::Io(
            ErrorInfo::new("archive-open", err.to_string())
                .with_context("path", out_dir.display().to_string()),
        )
    })?;
    fs::create_dir_all(out_dir).map_err(|err| WfsError::io("archive-mkdir", out_dir, err))?;
    let mut written = 0;
    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).map_err(|err| {
            WfsError::Io(ErrorInfo::new("archive-entry", err.to_string()).with_context("index", idx.to_string()))
        })?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(name = entry.name(), "skipping archive entry outside the target directory");
            continue;
        };
        let target = out_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|err| WfsError::io("archive-mkdir", &target, err))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| WfsError::io("archive-mkdir", parent, err))?;
        }
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|err| WfsError::io("archive-read", &target, err))?;
        fs::write(&target, contents).map_err(|err| WfsError::io("archive-write", &target, err))?;
        written += 1;
    }
    Ok(written)
}

fn save_job_traces<C: CiClient>(client: &C, run_id: &RunId, out_dir: &Path) -> Result<usize, WfsError> {
    let jobs = client.list_jobs(run_id)?;
    fs::create_dir_all(out_dir).map_err(|err| WfsError::io("trace-mkdir", out_dir, err))?;
    for job in &jobs {
        let trace = client.get_job_trace(&job.id)?;
        let path = out_dir.join(format!("{}.log", path_fragment(&job.id)));
        fs::write(&path, trace).map_err(|err| WfsError::io("trace-write", &path, err))?;
    }
    Ok(jobs.len())
}

/// Timeline of one ledger entry, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTimeline {
    pub run_id: RunId,
    /// Terminal status when known (API mode only).
    pub status: Option<RunStatus>,
    pub timeline: Option<Timeline>,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

impl RunTimeline {
    /// Whether this run enters aggregate views under `policy`. Runs with an
    /// unknown status (log mode) always count.
    pub fn counts(&self, policy: AggregatePolicy) -> bool {
        policy.include_unsuccessful || self.status.map_or(true, RunStatus::is_success)
    }
}

/// Builds per-run timelines from the provider's job listings.
pub fn collect_api_timelines<C: CiClient>(
    client: &C,
    run_ids: &[RunId],
    builder: &TimelineBuilder,
) -> Vec<RunTimeline> {
    run_ids
        .iter()
        .map(|run_id| {
            let status = match client.get_run(run_id) {
                Ok(detail) => Some(detail.status),
                Err(err) => {
                    warn!(run_id = %run_id, error = %err, "could not fetch run status");
                    None
                }
            };
            match client.list_jobs(run_id) {
                Ok(jobs) => RunTimeline {
                    run_id: run_id.clone(),
                    status,
                    timeline: Some(builder.from_jobs(&jobs)).filter(|timeline| !timeline.is_empty()),
                    jobs,
                },
                Err(err) => {
                    warn!(run_id = %run_id, error = %err, "could not list jobs");
                    RunTimeline {
                        run_id: run_id.clone(),
                        status,
                        timeline: None,
                        jobs: Vec::new(),
                    }
                }
            }
        })
        .collect()
}

/// Builds per-run timelines from the downloaded `logs_<run_id>/` directories.
pub fn collect_log_timelines(
    layout: &ExperimentLayout,
    number: usize,
    run_ids: &[RunId],
    builder: &TimelineBuilder,
) -> Vec<RunTimeline> {
    run_ids
        .iter()
        .map(|run_id| {
            let dir = layout.run_log_dir(number, run_id);
            let timeline = log_timeline(&dir, builder);
            RunTimeline {
                run_id: run_id.clone(),
                status: None,
                timeline,
                jobs: Vec::new(),
            }
        })
        .collect()
}

fn log_timeline(dir: &Path, builder: &TimelineBuilder) -> Option<Timeline> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "no downloaded logs for run");
        return None;
    }
    match builder.from_log_dir(dir) {
        Ok(timeline) if !timeline.is_empty() => Some(timeline),
        Ok(_) => {
            warn!(dir = %dir.display(), "logs carried no timing data");
            None
        }
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "could not scan logs");
            None
        }
    }
}

/// Saves the job list a chart was built from as `run<id>.json`.
pub fn write_jobs_snapshot(path: &Path, jobs: &[JobRecord]) -> Result<(), WfsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| WfsError::io("snapshot-mkdir", parent, err))?;
    }
    let json = serde_json::to_string_pretty(jobs)
        .map_err(|err| WfsError::Serde(ErrorInfo::new("snapshot-encode", err.to_string())))?;
    fs::write(path, json).map_err(|err| WfsError::io("snapshot-write", path, err))
}
