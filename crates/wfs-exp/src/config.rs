//! YAML experiment configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wfs_chart::ChartOptions;
use wfs_core::{ErrorInfo, WfsError};

use crate::layout::ExperimentLayout;
use crate::orchestrator::PollPolicy;

/// Which CI provider the experiment drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    Github {
        owner: String,
        repo: String,
        /// Workflow name; also names the experiment directory.
        workflow: String,
        /// Workflow file dispatched, defaults to `<workflow>.yml`.
        #[serde(default)]
        workflow_file: Option<String>,
        /// Run name to match while locating, defaults to the workflow file.
        #[serde(default)]
        run_name: Option<String>,
    },
    Gitlab {
        base_url: String,
        project_id: String,
        #[serde(default = "default_gitlab_name")]
        name: String,
    },
}

fn default_gitlab_name() -> String {
    "pipeline".to_string()
}

impl ProviderConfig {
    pub fn platform(&self) -> &'static str {
        match self {
            ProviderConfig::Github { .. } => "github",
            ProviderConfig::Gitlab { .. } => "gitlab",
        }
    }

    pub fn workflow_name(&self) -> &str {
        match self {
            ProviderConfig::Github { workflow, .. } => workflow,
            ProviderConfig::Gitlab { name, .. } => name,
        }
    }

    pub fn workflow_file(&self) -> String {
        match self {
            ProviderConfig::Github {
                workflow,
                workflow_file,
                ..
            } => workflow_file
                .clone()
                .unwrap_or_else(|| format!("{workflow}.yml")),
            ProviderConfig::Gitlab { name, .. } => name.clone(),
        }
    }

    /// Name a freshly dispatched run is listed under.
    pub fn expected_run_name(&self) -> String {
        match self {
            ProviderConfig::Github { run_name, .. } => {
                run_name.clone().unwrap_or_else(|| self.workflow_file())
            }
            ProviderConfig::Gitlab { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "PollingConfig::default_trigger_settle_ms")]
    pub trigger_settle_ms: u64,
    #[serde(default = "PollingConfig::default_interval_ms")]
    pub locate_interval_ms: u64,
    #[serde(default = "PollingConfig::default_locate_attempts")]
    pub locate_attempts: usize,
    #[serde(default = "PollingConfig::default_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl PollingConfig {
    const fn default_trigger_settle_ms() -> u64 {
        3_000
    }

    const fn default_interval_ms() -> u64 {
        10_000
    }

    const fn default_locate_attempts() -> usize {
        5
    }

    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            trigger_settle: Duration::from_millis(self.trigger_settle_ms),
            locate_interval: Duration::from_millis(self.locate_interval_ms),
            locate_attempts: self.locate_attempts,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            trigger_settle_ms: Self::default_trigger_settle_ms(),
            locate_interval_ms: Self::default_interval_ms(),
            locate_attempts: Self::default_locate_attempts(),
            poll_interval_ms: Self::default_interval_ms(),
            max_wait_secs: None,
        }
    }
}

/// Whether failed, cancelled or skipped runs count in aggregate timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatePolicy {
    #[serde(default)]
    pub include_unsuccessful: bool,
}

/// Markers located by the correlation analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Substring searched in log file names.
    #[serde(default = "AnalysisConfig::default_log_marker")]
    pub log_marker: String,
    /// Exact job name searched in API job listings.
    #[serde(default = "AnalysisConfig::default_job_marker")]
    pub job_marker: String,
}

impl AnalysisConfig {
    fn default_log_marker() -> String {
        "wait (120)".to_string()
    }

    fn default_job_marker() -> String {
        "wait-jobs: [120]".to_string()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            log_marker: Self::default_log_marker(),
            job_marker: Self::default_job_marker(),
        }
    }
}

/// Complete experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub provider: ProviderConfig,
    #[serde(default = "ExperimentConfig::default_branch")]
    pub branch: String,
    #[serde(default = "ExperimentConfig::default_runs")]
    pub runs: usize,
    #[serde(default = "ExperimentConfig::default_output_root")]
    pub output_root: PathBuf,
    /// Directory name below the platform, defaults to the workflow name.
    #[serde(default)]
    pub experiment_name: Option<String>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub aggregate: AggregatePolicy,
    #[serde(default)]
    pub chart: ChartOptions,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl ExperimentConfig {
    fn default_branch() -> String {
        "main".to_string()
    }

    const fn default_runs() -> usize {
        15
    }

    fn default_output_root() -> PathBuf {
        PathBuf::from("experiments")
    }

    pub fn load(path: &Path) -> Result<Self, WfsError> {
        let contents = fs::read_to_string(path).map_err(|err| WfsError::io("config-read", path, err))?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|err| {
            WfsError::Config(
                ErrorInfo::new("config-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WfsError> {
        if self.branch.trim().is_empty() {
            return Err(config_error("config-branch", "branch must not be empty"));
        }
        if self.polling.locate_attempts == 0 {
            return Err(config_error(
                "config-locate-attempts",
                "locate_attempts must be at least 1",
            ));
        }
        if self.provider.workflow_name().trim().is_empty() {
            return Err(config_error("config-workflow", "workflow name must not be empty"));
        }
        if let Some(domain) = &self.chart.fixed_domain {
            domain.validate()?;
        }
        if self.chart.legend_columns == 0 {
            return Err(config_error("config-legend", "legend_columns must be at least 1"));
        }
        Ok(())
    }

    pub fn layout(&self) -> ExperimentLayout {
        let name = self
            .experiment_name
            .as_deref()
            .unwrap_or_else(|| self.provider.workflow_name());
        ExperimentLayout::new(&self.output_root, self.provider.platform(), name)
    }
}

fn config_error(code: &str, message: &str) -> WfsError {
    WfsError::Config(ErrorInfo::new(code, message))
}
