use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Opaque run identifier as handed out by the provider.
///
/// GitHub and GitLab use integers, snapshot pipelines use strings. Ledger
/// files keep whichever form the provider produced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunId {
    /// Integer identifier.
    Numeric(u64),
    /// Free-form identifier.
    Named(String),
}

impl RunId {
    /// Parses a command line or path fragment, preferring the numeric form.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<u64>() {
            Ok(value) => RunId::Numeric(value),
            Err(_) => RunId::Named(raw.trim().to_string()),
        }
    }

    /// Form of the id that is safe to embed in a single file name.
    pub fn path_fragment(&self) -> String {
        match self {
            RunId::Numeric(value) => value.to_string(),
            RunId::Named(value) => path_fragment(value),
        }
    }
}

/// Replaces everything but ASCII alphanumerics, `-` and `_` with `_`, so the
/// result can never name a parent directory or carry a separator.
pub fn path_fragment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunId::Numeric(value) => write!(f, "{value}"),
            RunId::Named(value) => f.write_str(value),
        }
    }
}

impl From<u64> for RunId {
    fn from(value: u64) -> Self {
        RunId::Numeric(value)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        RunId::Named(value.to_string())
    }
}

/// Provider-neutral run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting for a runner.
    Queued,
    /// Executing.
    InProgress,
    /// Finished without a reported conclusion.
    Completed,
    /// Finished successfully.
    Success,
    /// Finished with a failure.
    Failure,
    /// Cancelled before finishing.
    Cancelled,
    /// Skipped by the provider.
    Skipped,
}

impl RunStatus {
    /// Maps provider status words (GitHub status/conclusion, GitLab status).
    pub fn from_provider(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "completed" => RunStatus::Completed,
            "success" | "passed" => RunStatus::Success,
            "failure" | "failed" | "timed_out" | "startup_failure" => RunStatus::Failure,
            "cancelled" | "canceled" => RunStatus::Cancelled,
            "skipped" | "neutral" | "stale" => RunStatus::Skipped,
            "in_progress" | "running" => RunStatus::InProgress,
            _ => RunStatus::Queued,
        }
    }

    /// Whether no further transition can occur.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Success
                | RunStatus::Failure
                | RunStatus::Cancelled
                | RunStatus::Skipped
        )
    }

    /// Terminal and not a failure, cancellation or skip.
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Success)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Skipped => "skipped",
        };
        f.write_str(word)
    }
}

/// Entry of the provider's recent-runs listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier.
    pub id: RunId,
    /// Workflow or pipeline name the run belongs to.
    pub name: String,
    /// Status at listing time.
    pub status: RunStatus,
}

/// Detailed state of a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetail {
    /// Workflow or pipeline name.
    pub name: String,
    /// Current status.
    pub status: RunStatus,
    /// When the provider created the run.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When execution started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished (or was last updated).
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outcome of a dispatch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// HTTP status code the provider answered with.
    pub status: u16,
    /// Identifier of the created run when the provider returns one.
    #[serde(default)]
    pub run_id: Option<RunId>,
}

impl DispatchReceipt {
    /// Whether the status code lies in the 2xx range.
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A job or step of a run as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Provider job identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Start instant, absent for jobs that never ran.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// End instant, absent for jobs that never finished.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Executor the job was scheduled on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
    /// Pipeline stage the job belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// A run that was triggered, located and observed until a terminal status.
///
/// Immutable once built; only the id is persisted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run identifier.
    pub id: RunId,
    /// Terminal status.
    pub status: RunStatus,
    /// Creation instant when reported.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Start instant.
    pub started_at: DateTime<Utc>,
    /// Completion instant.
    pub completed_at: DateTime<Utc>,
}

impl RunRecord {
    /// Wall-clock duration between start and completion.
    pub fn duration(&self) -> Duration {
        self.completed_at - self.started_at
    }

    /// Duration in fractional seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 1000.0
    }
}
