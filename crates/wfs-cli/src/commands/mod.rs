pub mod correlate;
pub mod download_logs;
pub mod gantt;
pub mod run;
pub mod simulate;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use wfs_client::{GitHubClient, GitLabClient};
use wfs_core::{CiClient, ErrorInfo, WfsError};
use wfs_exp::{
    collect_api_timelines, collect_log_timelines, write_jobs_snapshot, ExperimentConfig, ExperimentLayout,
    ProviderConfig, RunTimeline,
};
use wfs_timeline::{DisplayOrder, TimelineBuilder};

/// Options shared by every experiment command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// YAML experiment configuration.
    #[arg(long, default_value = "wfs.yaml")]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<ExperimentConfig, WfsError> {
        ExperimentConfig::load(&self.config)
    }
}

/// Where timing data comes from.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Job listings of the provider API.
    Api,
    /// Downloaded raw logs.
    Log,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    /// Sorted by start, most recent on top.
    Start,
    /// Input order, reversed.
    Input,
}

impl From<OrderArg> for DisplayOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Start => DisplayOrder::ReverseChronological,
            OrderArg::Input => DisplayOrder::ReversedInput,
        }
    }
}

pub fn client_for(config: &ExperimentConfig) -> Result<Box<dyn CiClient>, WfsError> {
    let client: Box<dyn CiClient> = match &config.provider {
        ProviderConfig::Github { owner, repo, .. } => Box::new(GitHubClient::from_env(
            owner.clone(),
            repo.clone(),
            config.provider.workflow_file(),
        )?),
        ProviderConfig::Gitlab {
            base_url,
            project_id,
            name,
        } => Box::new(GitLabClient::from_env(base_url.clone(), project_id.clone(), name.clone())?),
    };
    Ok(client)
}

/// The requested experiment, or the most recent one.
pub fn experiment_number(layout: &ExperimentLayout, requested: Option<usize>) -> Result<usize, WfsError> {
    match requested {
        Some(number) => Ok(number),
        None => layout.latest_number().ok_or_else(|| {
            WfsError::Config(
                ErrorInfo::new("no-experiment", "no experiment directory exists yet")
                    .with_context("dir", layout.workflow_dir().display().to_string())
                    .with_hint("run `wfs run` first or pass --experiment"),
            )
        }),
    }
}

pub fn write_figure(path: &Path, svg: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, svg)?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Per-run timelines of one experiment, from the API or downloaded logs.
///
/// API mode also saves the job list behind each chart as `run<id>.json`.
pub fn collect_runs(
    config: &ExperimentConfig,
    layout: &ExperimentLayout,
    number: usize,
    builder: &TimelineBuilder,
    source: Source,
) -> Result<Vec<RunTimeline>, Box<dyn Error>> {
    let run_ids = layout.ledger(number).read_all()?;
    match source {
        Source::Api => {
            let client = client_for(config)?;
            let runs = collect_api_timelines(&client, &run_ids, builder);
            for run in runs.iter().filter(|run| !run.jobs.is_empty()) {
                write_jobs_snapshot(&layout.jobs_snapshot_path(number, &run.run_id), &run.jobs)?;
            }
            Ok(runs)
        }
        Source::Log => Ok(collect_log_timelines(layout, number, &run_ids, builder)),
    }
}
