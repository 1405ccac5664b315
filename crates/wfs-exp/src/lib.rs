//! Experiment orchestration for CI timing runs.

mod analysis;
mod config;
mod layout;
mod ledger;
mod orchestrator;
mod session;

pub use analysis::{
    collect_api_timelines, collect_log_timelines, download_logs, extract_archive,
    write_jobs_snapshot, DownloadReport, RunTimeline,
};
pub use config::{AggregatePolicy, AnalysisConfig, ExperimentConfig, PollingConfig, ProviderConfig};
pub use layout::ExperimentLayout;
pub use ledger::{AppendReceipt, RunLedger};
pub use orchestrator::{run_failure, PollPolicy, RunOrchestrator, RunPhase};
pub use session::{write_durations_csv, DurationRow, ExperimentSession, RunSample, SessionReport};
