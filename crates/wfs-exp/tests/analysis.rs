mod common;

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};

use common::{at, detail, ScriptedClient};
use wfs_core::{JobRecord, LogDelivery, RunId, RunStatus};
use wfs_exp::{
    collect_api_timelines, collect_log_timelines, download_logs, extract_archive, AggregatePolicy,
    ExperimentLayout,
};
use wfs_timeline::{DisplayOrder, TimelineBuilder};
use zip::write::FileOptions;

fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn job(id: &str, name: &str, start: u32, end: u32) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        name: name.to_string(),
        started_at: Some(at(0, start)),
        completed_at: Some(at(0, end)),
        runner: Some("runner-a".to_string()),
        stage: Some("test".to_string()),
    }
}

#[test]
fn archive_entries_cannot_escape_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("logs_1");
    let bytes = archive(&[
        ("1_build.txt", "2025-06-01T10:00:00.0000000Z start\n"),
        ("../escape.txt", "nope"),
    ]);
    let written = extract_archive(&bytes, &out).unwrap();
    assert_eq!(written, 1);
    assert!(out.join("1_build.txt").exists());
    assert!(!dir.path().join("escape.txt").exists());
}

#[test]
fn archive_download_continues_past_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path(), "github", "ci");
    let ledger = layout.ledger(0);
    ledger.append(&RunId::Numeric(1)).unwrap();
    ledger.append(&RunId::Numeric(2)).unwrap();

    let mut client = ScriptedClient::new(LogDelivery::Archive);
    client.archives.insert(
        RunId::Numeric(1),
        archive(&[
            (
                "1_build.txt",
                "\u{feff}2025-06-01T10:00:00.1234567Z checkout\n2025-06-01T10:00:30Z done\n",
            ),
            ("2_wait (120).txt", "2025-06-01T10:00:30Z sleep\n2025-06-01T10:01:15Z woke\n"),
        ]),
    );

    let report = download_logs(&client, &layout, 0).unwrap();
    assert_eq!(report.downloaded, vec![RunId::Numeric(1)]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, RunId::Numeric(2));

    let builder = TimelineBuilder::new(DisplayOrder::ReverseChronological);
    let timelines = collect_log_timelines(&layout, 0, &ledger.read_all().unwrap(), &builder);
    assert_eq!(timelines.len(), 2);
    let first = timelines[0].timeline.as_ref().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.intervals()[0].label, "2_wait (120)");
    assert!(timelines[1].timeline.is_none());
    assert!(timelines[1].counts(AggregatePolicy::default()));
}

#[test]
fn job_traces_are_saved_per_job() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path(), "gitlab", "pipeline");
    layout.ledger(0).append(&RunId::Numeric(9)).unwrap();

    let mut client = ScriptedClient::new(LogDelivery::PerJobTrace);
    client
        .jobs
        .insert(RunId::Numeric(9), vec![job("101", "build", 0, 20), job("102", "test", 20, 50)]);
    client.traces = BTreeMap::from([
        ("101".to_string(), "2025-06-01T10:00:00Z build\n".to_string()),
        ("102".to_string(), "2025-06-01T10:00:20Z test\n".to_string()),
    ]);

    let report = download_logs(&client, &layout, 0).unwrap();
    assert_eq!(report.downloaded, vec![RunId::Numeric(9)]);
    let logs = layout.run_log_dir(0, &RunId::Numeric(9));
    assert_eq!(fs::read_to_string(logs.join("102.log")).unwrap(), "2025-06-01T10:00:20Z test\n");
}

#[test]
fn api_timelines_carry_status_for_filtering() {
    let mut client = ScriptedClient::new(LogDelivery::PerJobTrace)
        .states(1, vec![detail(RunStatus::Success, at(0, 0), Some(at(0, 50)))])
        .states(2, vec![detail(RunStatus::Failure, at(1, 0), Some(at(1, 20)))]);
    client
        .jobs
        .insert(RunId::Numeric(1), vec![job("1", "build", 0, 20), job("2", "test", 20, 50)]);
    client.jobs.insert(RunId::Numeric(2), vec![job("3", "build", 0, 20)]);

    let builder = TimelineBuilder::new(DisplayOrder::ReverseChronological);
    let runs = collect_api_timelines(&client, &[RunId::Numeric(1), RunId::Numeric(2), RunId::Numeric(3)], &builder);

    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].status, Some(RunStatus::Success));
    assert_eq!(runs[0].timeline.as_ref().map(|t| t.len()), Some(2));
    assert!(!runs[1].counts(AggregatePolicy::default()));
    assert!(runs[1].counts(AggregatePolicy {
        include_unsuccessful: true
    }));
    assert!(runs[2].timeline.is_none());
    assert_eq!(runs[2].status, None);
}
