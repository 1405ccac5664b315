//! GitLab CI REST client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use wfs_core::{
    CiClient, DispatchReceipt, JobRecord, LogDelivery, RunDetail, RunId, RunStatus, RunSummary, WfsError,
};

use crate::http::{token_from_env, transport_error, Auth, Transport};

pub const GITLAB_TOKEN_VAR: &str = "GITLAB_TOKEN";

/// Triggers and inspects pipelines of one project.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    transport: Transport,
    base_url: String,
    project_id: String,
    /// Name reported for pipelines that carry none.
    pipeline_name: String,
}

impl GitLabClient {
    pub fn new(
        token: &str,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        pipeline_name: impl Into<String>,
    ) -> Result<Self, WfsError> {
        Ok(Self {
            transport: Transport::new(token, Auth::PrivateToken, &[])?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            pipeline_name: pipeline_name.into(),
        })
    }

    /// Reads the token from `GITLAB_TOKEN`.
    pub fn from_env(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        pipeline_name: impl Into<String>,
    ) -> Result<Self, WfsError> {
        Self::new(&token_from_env(GITLAB_TOKEN_VAR)?, base_url, project_id, pipeline_name)
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/api/v4/projects/{}{}", self.base_url, self.project_id, path)
    }
}

impl CiClient for GitLabClient {
    fn dispatch(&self, branch: &str) -> Result<DispatchReceipt, WfsError> {
        let url = self.project_url("/pipeline");
        let response = self
            .transport
            .post(&url)
            .form(&[("ref", branch)])
            .send()
            .map_err(|err| transport_error(&url, err))?;
        let status = response.status().as_u16();
        let run_id = if response.status().is_success() {
            match response.json::<Created>() {
                Ok(created) => Some(RunId::Numeric(created.id)),
                Err(err) => {
                    warn!(error = %err, "pipeline created without a readable id");
                    None
                }
            }
        } else {
            None
        };
        info!(branch, status, run_id = ?run_id, "pipeline trigger sent");
        Ok(DispatchReceipt { status, run_id })
    }

    fn list_recent_runs(&self) -> Result<Vec<RunSummary>, WfsError> {
        let pipelines: Vec<Pipeline> = self
            .transport
            .get_json(&self.project_url("/pipelines"), &[("per_page", "20")])?;
        Ok(pipelines
            .into_iter()
            .map(|pipeline| pipeline.summary(&self.pipeline_name))
            .collect())
    }

    fn get_run(&self, id: &RunId) -> Result<RunDetail, WfsError> {
        let pipeline: Pipeline = self
            .transport
            .get_json(&self.project_url(&format!("/pipelines/{id}")), &[])?;
        Ok(pipeline.detail(&self.pipeline_name))
    }

    fn list_jobs(&self, id: &RunId) -> Result<Vec<JobRecord>, WfsError> {
        let jobs: Vec<PipelineJob> = self
            .transport
            .get_json(&self.project_url(&format!("/pipelines/{id}/jobs")), &[("per_page", "100")])?;
        Ok(jobs.into_iter().map(PipelineJob::record).collect())
    }

    fn log_delivery(&self) -> LogDelivery {
        LogDelivery::PerJobTrace
    }

    fn get_job_trace(&self, job_id: &str) -> Result<String, WfsError> {
        self.transport
            .get_text(&self.project_url(&format!("/jobs/{job_id}/trace")))
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Pipeline {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    status: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    fn summary(self, fallback_name: &str) -> RunSummary {
        RunSummary {
            id: RunId::Numeric(self.id),
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            status: RunStatus::from_provider(&self.status),
        }
    }

    /// Durations run from `created_at` to `finished_at`, or `updated_at` when
    /// the pipeline never recorded a finish.
    fn detail(self, fallback_name: &str) -> RunDetail {
        let status = RunStatus::from_provider(&self.status);
        RunDetail {
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            status,
            created_at: self.created_at,
            started_at: self.created_at.or(self.started_at),
            completed_at: status
                .is_terminal()
                .then(|| self.finished_at.or(self.updated_at))
                .flatten(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipelineJob {
    id: u64,
    name: String,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    runner: Option<JobRunner>,
}

#[derive(Debug, Deserialize)]
struct JobRunner {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    id: Option<u64>,
}

impl PipelineJob {
    fn record(self) -> JobRecord {
        let runner = self.runner.and_then(|runner| {
            runner
                .description
                .filter(|description| !description.is_empty())
                .or_else(|| runner.id.map(|id| format!("runner-{id}")))
        });
        JobRecord {
            id: self.id.to_string(),
            name: self.name,
            started_at: self.started_at,
            completed_at: self.finished_at,
            runner,
            stage: self.stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_detail_spans_created_to_finished() {
        let pipeline: Pipeline = serde_json::from_str(
            r#"{"id": 812, "status": "failed", "ref": "main",
                "created_at": "2025-06-01T10:00:00.000Z", "started_at": "2025-06-01T10:00:04.000Z",
                "finished_at": "2025-06-01T10:01:15.000Z", "updated_at": "2025-06-01T10:01:16.000Z"}"#,
        )
        .unwrap();
        let detail = pipeline.detail("pipeline");
        assert_eq!(detail.status, RunStatus::Failure);
        assert_eq!(detail.name, "pipeline");
        let span = detail.completed_at.unwrap() - detail.started_at.unwrap();
        assert_eq!(span.num_seconds(), 75);
    }

    #[test]
    fn running_pipeline_has_no_completion() {
        let pipeline: Pipeline = serde_json::from_str(
            r#"{"id": 813, "status": "running", "created_at": "2025-06-01T10:00:00Z",
                "updated_at": "2025-06-01T10:00:30Z"}"#,
        )
        .unwrap();
        let detail = pipeline.detail("pipeline");
        assert_eq!(detail.status, RunStatus::InProgress);
        assert!(detail.completed_at.is_none());
    }

    #[test]
    fn jobs_keep_stage_and_runner() {
        let jobs: Vec<PipelineJob> = serde_json::from_str(
            r#"[
                {"id": 5001, "name": "build", "stage": "build",
                 "started_at": "2025-06-01T10:00:05Z", "finished_at": "2025-06-01T10:00:35Z",
                 "runner": {"id": 7, "description": "shared-runner-1"}},
                {"id": 5002, "name": "deploy", "stage": "deploy",
                 "started_at": null, "finished_at": null, "runner": {"id": 9, "description": ""}},
                {"id": 5003, "name": "lint", "stage": "test", "runner": null}
            ]"#,
        )
        .unwrap();
        let jobs: Vec<_> = jobs.into_iter().map(PipelineJob::record).collect();
        assert_eq!(jobs[0].runner.as_deref(), Some("shared-runner-1"));
        assert_eq!(jobs[0].stage.as_deref(), Some("build"));
        assert_eq!(jobs[1].runner.as_deref(), Some("runner-9"));
        assert!(jobs[2].runner.is_none());
        assert_eq!(jobs[2].id, "5003");
    }
}
