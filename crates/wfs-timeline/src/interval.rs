use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wfs_core::{ErrorInfo, WfsError};

/// A labeled span of a job, step or log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl Interval {
    /// Builds an interval, rejecting spans that end before they start.
    pub fn new(
        label: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, WfsError> {
        let label = label.into();
        if end < start {
            return Err(WfsError::NoTimingData(
                ErrorInfo::new("interval-inverted", "interval ends before it starts")
                    .with_context("label", label)
                    .with_context("start", start.to_rfc3339())
                    .with_context("end", end.to_rfc3339()),
            ));
        }
        Ok(Self {
            label,
            start,
            end,
            runner: None,
            stage: None,
        })
    }

    pub fn with_runner(mut self, runner: Option<String>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_stage(mut self, stage: Option<String>) -> Self {
        self.stage = stage;
        self
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
