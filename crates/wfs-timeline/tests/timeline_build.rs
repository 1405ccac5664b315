use std::fs;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::tempdir;
use wfs_core::JobRecord;
use wfs_timeline::{DisplayOrder, PipelineSnapshot, TimelineBuilder};

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, h, m, s).unwrap()
}

fn job(name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> JobRecord {
    JobRecord {
        id: format!("id-{name}"),
        name: name.to_string(),
        started_at: Some(start),
        completed_at: Some(end),
        runner: None,
        stage: None,
    }
}

#[test]
fn three_job_pipeline_spans_seventy_five_seconds() {
    let jobs = vec![
        job("build", at(10, 0, 0), at(10, 0, 30)),
        job("test", at(10, 0, 30), at(10, 1, 10)),
        job("deploy", at(10, 1, 10), at(10, 1, 15)),
    ];
    let timeline = TimelineBuilder::new(DisplayOrder::ReverseChronological).from_jobs(&jobs);
    assert_eq!(timeline.origin(), Some(at(10, 0, 0)));
    assert_eq!(timeline.span().unwrap().num_seconds(), 75);
    let labels: Vec<_> = timeline.intervals().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["deploy", "test", "build"]);
    let chrono_labels: Vec<_> = timeline.chronological().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(chrono_labels, ["build", "test", "deploy"]);
    assert_eq!(timeline.chronological_position(|i| i.label == "test"), Some(1));
}

#[test]
fn log_directory_skips_files_without_timestamps() {
    let dir = tempdir().expect("dir");
    fs::write(
        dir.path().join("0_build.txt"),
        "2025-06-01T10:00:00.0000000Z start\n2025-06-01T10:00:30.0000000Z end\n",
    )
    .unwrap();
    fs::write(dir.path().join("1_wait (120).txt"), "2025-06-01T10:00:31Z a\n2025-06-01T10:02:31Z b\n").unwrap();
    fs::write(dir.path().join("2_empty.txt"), "no timestamps here\n").unwrap();
    fs::write(dir.path().join("notes.md"), "2025-06-01T10:00:00Z ignored\n").unwrap();

    let timeline = TimelineBuilder::default()
        .from_log_dir(dir.path())
        .expect("timeline");
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.dropped(), ["2_empty".to_string()]);
    assert_eq!(timeline.intervals()[0].label, "1_wait (120)");
    assert_eq!(timeline.span().unwrap().num_seconds(), 151);
}

#[test]
fn snapshot_resolves_stage_and_trims_pipeline_id() {
    let snapshot: PipelineSnapshot = serde_json::from_str(
        r#"{
            "id": "pipe7",
            "jobs": [
                {"id": "pipe7-compile", "started_at": "2025-06-01T10:00:00Z", "finished_at": "2025-06-01T10:00:20Z", "runner": "r1"},
                {"id": "pipe7-lint", "started_at": "2025-06-01T10:00:05Z", "finished_at": "2025-06-01T10:00:10Z"}
            ],
            "stages": [{"name": "build", "jobs": ["pipe7-compile"]}]
        }"#,
    )
    .expect("snapshot");
    let timeline = TimelineBuilder::default().from_snapshot(&snapshot);
    let lint = &timeline.intervals()[0];
    let compile = &timeline.intervals()[1];
    assert_eq!(lint.label, "lint");
    assert_eq!(lint.stage, None);
    assert_eq!(compile.label, "compile");
    assert_eq!(compile.stage.as_deref(), Some("build"));
    assert_eq!(compile.runner.as_deref(), Some("r1"));
}

#[test]
fn reversed_input_aggregate_reverses_the_whole_caller_order() {
    let builder = TimelineBuilder::new(DisplayOrder::ReversedInput);
    let first = builder.from_jobs(&[
        job("a1", at(10, 0, 0), at(10, 0, 10)),
        job("a2", at(10, 0, 10), at(10, 0, 20)),
    ]);
    let second = builder.from_jobs(&[
        job("b1", at(10, 1, 0), at(10, 1, 10)),
        job("b2", at(10, 1, 10), at(10, 1, 20)),
    ]);
    let aggregate = builder.aggregate([&first, &second]);
    let labels: Vec<_> = aggregate.intervals().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["b2", "b1", "a2", "a1"]);
    assert_eq!(aggregate.span().unwrap().num_seconds(), 80);
}

#[test]
fn start_sorted_aggregate_interleaves_runs_by_start() {
    let builder = TimelineBuilder::new(DisplayOrder::ReverseChronological);
    let first = builder.from_jobs(&[
        job("a1", at(10, 0, 0), at(10, 0, 10)),
        job("a2", at(10, 0, 30), at(10, 0, 40)),
    ]);
    let second = builder.from_jobs(&[job("b1", at(10, 0, 20), at(10, 0, 25))]);
    let aggregate = builder.aggregate([&first, &second]);
    let labels: Vec<_> = aggregate.intervals().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["a2", "b1", "a1"]);
}
