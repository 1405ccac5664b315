//! Structured error types shared across wfs crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`WfsError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (run ids, attempts, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for wfs experiments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum WfsError {
    /// The provider refused the dispatch call.
    #[error("trigger rejected: {0}")]
    TriggerRejected(ErrorInfo),
    /// No run matching the dispatched workflow appeared in the locate window.
    #[error("run not found: {0}")]
    RunNotFound(ErrorInfo),
    /// A run reached a terminal state other than success.
    #[error("run failed: {0}")]
    RunFailed(ErrorInfo),
    /// Polling exceeded the configured maximum wait.
    #[error("timeout: {0}")]
    Timeout(ErrorInfo),
    /// The persisted run ledger could not be parsed.
    #[error("corrupt ledger: {0}")]
    CorruptLedger(ErrorInfo),
    /// A log or job carried no parsable timing information.
    #[error("no timing data: {0}")]
    NoTimingData(ErrorInfo),
    /// Transport failures and non-success responses from the provider.
    #[error("provider error: {0}")]
    Provider(ErrorInfo),
    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Filesystem and archive failures.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl WfsError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            WfsError::TriggerRejected(info)
            | WfsError::RunNotFound(info)
            | WfsError::RunFailed(info)
            | WfsError::Timeout(info)
            | WfsError::CorruptLedger(info)
            | WfsError::NoTimingData(info)
            | WfsError::Provider(info)
            | WfsError::Config(info)
            | WfsError::Io(info)
            | WfsError::Serde(info) => info,
        }
    }

    /// Whether re-triggering the run attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WfsError::RunNotFound(_) | WfsError::Timeout(_))
    }

    /// Wraps an I/O failure together with the path it concerned.
    pub fn io(code: &str, path: &std::path::Path, err: impl Display) -> Self {
        WfsError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
