//! Ordered interval sets and the builders that produce them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;
use wfs_core::{ErrorInfo, JobRecord, WfsError};

use crate::interval::Interval;
use crate::snapshot::PipelineSnapshot;
use crate::timestamp::TimestampParser;

/// Row order used when a timeline is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayOrder {
    /// Sorted by start, most recent first.
    #[default]
    ReverseChronological,
    /// The caller's order, reversed. For inputs that arrive pre-sorted.
    ReversedInput,
}

/// Intervals of one run or one aggregate view, in display order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    intervals: Vec<Interval>,
    #[serde(default)]
    dropped: Vec<String>,
    #[serde(default)]
    order: DisplayOrder,
}

impl Timeline {
    /// Arranges `intervals` according to `order`.
    pub fn arrange(mut intervals: Vec<Interval>, order: DisplayOrder) -> Self {
        match order {
            DisplayOrder::ReverseChronological => {
                intervals.sort_by(|a, b| b.start.cmp(&a.start));
            }
            DisplayOrder::ReversedInput => intervals.reverse(),
        }
        Self {
            intervals,
            dropped: Vec::new(),
            order,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Labels of units that were skipped for lack of timing data.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Earliest start over all intervals.
    pub fn origin(&self) -> Option<DateTime<Utc>> {
        self.intervals.iter().map(|interval| interval.start).min()
    }

    /// Latest end over all intervals.
    pub fn finish(&self) -> Option<DateTime<Utc>> {
        self.intervals.iter().map(|interval| interval.end).max()
    }

    /// Aggregate duration: last end minus first start.
    pub fn span(&self) -> Option<Duration> {
        Some(self.finish()? - self.origin()?)
    }

    /// Intervals sorted ascending by start, ties kept in display order.
    pub fn chronological(&self) -> Vec<&Interval> {
        let mut sorted: Vec<&Interval> = self.intervals.iter().collect();
        sorted.sort_by_key(|interval| interval.start);
        sorted
    }

    /// Position of the first interval matching `predicate` in chronological order.
    pub fn chronological_position(&self, predicate: impl Fn(&Interval) -> bool) -> Option<usize> {
        self.chronological()
            .into_iter()
            .position(|interval| predicate(interval))
    }

    pub fn order(&self) -> DisplayOrder {
        self.order
    }

    /// Intervals in the order they were handed to [`Timeline::arrange`].
    ///
    /// Only recoverable for [`DisplayOrder::ReversedInput`]; a start-sorted
    /// timeline returns its display order, which re-sorts identically.
    pub fn input_intervals(&self) -> Vec<Interval> {
        let mut intervals = self.intervals.clone();
        if self.order == DisplayOrder::ReversedInput {
            intervals.reverse();
        }
        intervals
    }
}

/// Turns job records or per-unit log files into a [`Timeline`].
#[derive(Debug, Clone, Default)]
pub struct TimelineBuilder {
    order: DisplayOrder,
    pipeline_prefix: Option<String>,
    parser: TimestampParser,
}

impl TimelineBuilder {
    pub fn new(order: DisplayOrder) -> Self {
        Self {
            order,
            pipeline_prefix: None,
            parser: TimestampParser::new(),
        }
    }

    /// Strips `prefix` (and the separator after it) from job labels.
    pub fn with_pipeline_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.pipeline_prefix = Some(prefix.into());
        self
    }

    pub fn order(&self) -> DisplayOrder {
        self.order
    }

    /// Maps structured job records. Jobs without both instants are dropped.
    pub fn from_jobs(&self, jobs: &[JobRecord]) -> Timeline {
        let mut intervals = Vec::with_capacity(jobs.len());
        let mut dropped = Vec::new();
        for job in jobs {
            let label = self.trim_label(&job.name);
            match job_interval(&label, job) {
                Ok(interval) => intervals.push(interval),
                Err(err) => {
                    warn!(job = %job.id, error = %err, "dropping job from timeline");
                    dropped.push(label);
                }
            }
        }
        self.assemble(intervals, dropped)
    }

    /// Maps a pipeline snapshot, using its id as the label prefix to trim.
    pub fn from_snapshot(&self, snapshot: &PipelineSnapshot) -> Timeline {
        let builder = self.clone().with_pipeline_prefix(snapshot.id.clone());
        builder.from_jobs(&snapshot.job_records())
    }

    /// Scans in-memory `(label, text)` pairs, one per job or step.
    pub fn from_log_texts<'a, I>(&self, sources: I) -> Timeline
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut intervals = Vec::new();
        let mut dropped = Vec::new();
        for (label, text) in sources {
            let bounds = self.parser.scan_str(text);
            match bounded_interval(label, bounds) {
                Ok(interval) => intervals.push(interval),
                Err(err) => {
                    debug!(unit = label, error = %err, "no timing data");
                    dropped.push(label.to_string());
                }
            }
        }
        self.assemble(intervals, dropped)
    }

    /// Scans log files; each file's stem becomes its label.
    ///
    /// Unreadable or timestamp-free files are dropped, never fatal.
    pub fn from_log_files(&self, paths: &[PathBuf]) -> Timeline {
        let mut intervals = Vec::new();
        let mut dropped = Vec::new();
        for path in paths {
            let label = file_label(path);
            let result = self
                .parser
                .scan_file(path)
                .and_then(|bounds| bounded_interval(&label, bounds));
            match result {
                Ok(interval) => intervals.push(interval),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "dropping log file from timeline");
                    dropped.push(label);
                }
            }
        }
        self.assemble(intervals, dropped)
    }

    /// Scans the `.txt` and `.log` files directly inside `dir`.
    pub fn from_log_dir(&self, dir: &Path) -> Result<Timeline, WfsError> {
        Ok(self.from_log_files(&log_files(dir)?))
    }

    /// Arranges already-built intervals.
    pub fn from_intervals(&self, intervals: Vec<Interval>) -> Timeline {
        self.assemble(intervals, Vec::new())
    }

    /// Merges per-run timelines into one view.
    ///
    /// Each timeline contributes its intervals in input order, runs follow the
    /// iteration order, and the display order is applied once to the whole.
    pub fn aggregate<'a, I>(&self, timelines: I) -> Timeline
    where
        I: IntoIterator<Item = &'a Timeline>,
    {
        let mut intervals = Vec::new();
        let mut dropped = Vec::new();
        for timeline in timelines {
            intervals.extend(timeline.input_intervals());
            dropped.extend(timeline.dropped.iter().cloned());
        }
        self.assemble(intervals, dropped)
    }

    fn assemble(&self, intervals: Vec<Interval>, dropped: Vec<String>) -> Timeline {
        let mut timeline = Timeline::arrange(intervals, self.order);
        timeline.dropped = dropped;
        timeline
    }

    fn trim_label(&self, label: &str) -> String {
        match &self.pipeline_prefix {
            Some(prefix) => trim_pipeline_prefix(label, prefix),
            None => label.to_string(),
        }
    }
}

/// Removes a leading pipeline id and the separator that follows it.
pub fn trim_pipeline_prefix(label: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return label.to_string();
    }
    match label.strip_prefix(prefix) {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| matches!(c, '-' | '_' | ':' | '/' | '.' | ' '));
            if rest.is_empty() {
                label.to_string()
            } else {
                rest.to_string()
            }
        }
        None => label.to_string(),
    }
}

/// Lists the log files directly inside `dir`, sorted by name.
pub fn log_files(dir: &Path) -> Result<Vec<PathBuf>, WfsError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| WfsError::io("log-dir", dir, err))?;
        let path = entry.path();
        let is_log = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("txt") | Some("log")
        );
        if entry.file_type().is_file() && is_log {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn job_interval(label: &str, job: &JobRecord) -> Result<Interval, WfsError> {
    let (Some(start), Some(end)) = (job.started_at, job.completed_at) else {
        return Err(WfsError::NoTimingData(
            ErrorInfo::new("job-unfinished", "job lacks a start or completion instant")
                .with_context("job", job.id.clone()),
        ));
    };
    Ok(Interval::new(label, start, end)?
        .with_runner(job.runner.clone())
        .with_stage(job.stage.clone()))
}

fn bounded_interval(
    label: &str,
    bounds: (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
) -> Result<Interval, WfsError> {
    match bounds {
        (Some(first), Some(last)) => Interval::new(label, first, last),
        _ => Err(WfsError::NoTimingData(
            ErrorInfo::new("log-no-timestamps", "no line carried a leading timestamp")
                .with_context("unit", label),
        )),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn prefix_trimming_keeps_unrelated_labels() {
        assert_eq!(trim_pipeline_prefix("p17-build", "p17"), "build");
        assert_eq!(trim_pipeline_prefix("p17", "p17"), "p17");
        assert_eq!(trim_pipeline_prefix("deploy", "p17"), "deploy");
    }

    #[test]
    fn reversed_input_keeps_caller_order_backwards() {
        let a = Interval::new("a", at(10, 0, 5), at(10, 0, 6)).unwrap();
        let b = Interval::new("b", at(10, 0, 0), at(10, 0, 1)).unwrap();
        let timeline = Timeline::arrange(vec![a, b], DisplayOrder::ReversedInput);
        let labels: Vec<_> = timeline.intervals().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["b", "a"]);
    }

    #[test]
    fn unfinished_jobs_are_dropped() {
        let jobs = vec![JobRecord {
            id: "1".into(),
            name: "queued".into(),
            started_at: Some(at(10, 0, 0)),
            completed_at: None,
            runner: None,
            stage: None,
        }];
        let timeline = TimelineBuilder::default().from_jobs(&jobs);
        assert!(timeline.is_empty());
        assert_eq!(timeline.dropped(), ["queued".to_string()]);
    }
}
