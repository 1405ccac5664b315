//! GitHub Actions REST client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use wfs_core::{
    CiClient, DispatchReceipt, JobRecord, LogDelivery, RunDetail, RunId, RunStatus, RunSummary, WfsError,
};

use crate::http::{token_from_env, transport_error, Auth, Transport};

pub const GITHUB_API: &str = "https://api.github.com";
pub const GITHUB_TOKEN_VAR: &str = "GH_TOKEN";

/// Drives one workflow of one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    transport: Transport,
    api_base: String,
    owner: String,
    repo: String,
    workflow_file: String,
}

impl GitHubClient {
    pub fn new(
        token: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        workflow_file: impl Into<String>,
    ) -> Result<Self, WfsError> {
        let transport = Transport::new(
            token,
            Auth::Bearer,
            &[
                ("accept", "application/vnd.github+json"),
                ("x-github-api-version", "2022-11-28"),
            ],
        )?;
        Ok(Self {
            transport,
            api_base: GITHUB_API.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            workflow_file: workflow_file.into(),
        })
    }

    /// Reads the token from `GH_TOKEN`.
    pub fn from_env(
        owner: impl Into<String>,
        repo: impl Into<String>,
        workflow_file: impl Into<String>,
    ) -> Result<Self, WfsError> {
        Self::new(&token_from_env(GITHUB_TOKEN_VAR)?, owner, repo, workflow_file)
    }

    /// Points the client at a GitHub Enterprise or test server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, self.owner, self.repo, path)
    }
}

impl CiClient for GitHubClient {
    fn dispatch(&self, branch: &str) -> Result<DispatchReceipt, WfsError> {
        let url = self.repo_url(&format!("/actions/workflows/{}/dispatches", self.workflow_file));
        let response = self
            .transport
            .post(&url)
            .json(&json!({ "ref": branch }))
            .send()
            .map_err(|err| transport_error(&url, err))?;
        let status = response.status().as_u16();
        info!(workflow = %self.workflow_file, branch, status, "workflow dispatch sent");
        Ok(DispatchReceipt { status, run_id: None })
    }

    fn list_recent_runs(&self) -> Result<Vec<RunSummary>, WfsError> {
        let page: RunsPage = self
            .transport
            .get_json(&self.repo_url("/actions/runs"), &[("per_page", "30")])?;
        Ok(page.workflow_runs.into_iter().map(WorkflowRun::summary).collect())
    }

    fn get_run(&self, id: &RunId) -> Result<RunDetail, WfsError> {
        let run: WorkflowRun = self
            .transport
            .get_json(&self.repo_url(&format!("/actions/runs/{id}")), &[])?;
        Ok(run.detail())
    }

    fn list_jobs(&self, id: &RunId) -> Result<Vec<JobRecord>, WfsError> {
        let page: JobsPage = self
            .transport
            .get_json(&self.repo_url(&format!("/actions/runs/{id}/jobs")), &[("per_page", "100")])?;
        Ok(page.jobs.into_iter().map(WorkflowJob::record).collect())
    }

    fn log_delivery(&self) -> LogDelivery {
        LogDelivery::Archive
    }

    fn download_log_archive(&self, id: &RunId) -> Result<Vec<u8>, WfsError> {
        // answers with a redirect to a signed archive URL, followed by the client
        self.transport
            .get_bytes(&self.repo_url(&format!("/actions/runs/{id}/logs")))
    }
}

#[derive(Debug, Deserialize)]
struct RunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    run_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    /// `completed` runs report their outcome in `conclusion`.
    fn status(&self) -> RunStatus {
        match (self.status.as_deref(), self.conclusion.as_deref()) {
            (Some("completed"), Some(conclusion)) => RunStatus::from_provider(conclusion),
            (Some(status), _) => RunStatus::from_provider(status),
            (None, _) => RunStatus::Queued,
        }
    }

    fn summary(self) -> RunSummary {
        RunSummary {
            status: self.status(),
            id: RunId::Numeric(self.id),
            name: self.name.unwrap_or_default(),
        }
    }

    /// The run's `updated_at` doubles as its completion time.
    fn detail(self) -> RunDetail {
        let status = self.status();
        RunDetail {
            name: self.name.unwrap_or_default(),
            status,
            created_at: self.created_at,
            started_at: self.run_started_at,
            completed_at: status.is_terminal().then_some(self.updated_at).flatten(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobsPage {
    #[serde(default)]
    jobs: Vec<WorkflowJob>,
}

#[derive(Debug, Deserialize)]
struct WorkflowJob {
    id: u64,
    name: String,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    runner_name: Option<String>,
}

impl WorkflowJob {
    fn record(self) -> JobRecord {
        JobRecord {
            id: self.id.to_string(),
            name: self.name,
            started_at: self.started_at,
            completed_at: self.completed_at,
            runner: self.runner_name.filter(|name| !name.is_empty()),
            stage: None,
        }
    }
}
