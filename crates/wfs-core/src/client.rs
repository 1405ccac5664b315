//! The provider capability every experiment talks through.

use crate::errors::WfsError;
use crate::types::{DispatchReceipt, JobRecord, RunDetail, RunId, RunSummary};

/// How a provider delivers raw execution logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDelivery {
    /// One zip archive per run (GitHub Actions).
    Archive,
    /// One text trace per job (GitLab CI).
    PerJobTrace,
}

/// Minimal CI provider surface used by the orchestrator and analysis passes.
///
/// Implementations must surface non-2xx answers of read calls as
/// [`WfsError::Provider`]. `dispatch` instead reports the status code in its
/// receipt so the orchestrator can classify rejections.
pub trait CiClient {
    /// Requests a new run of the configured workflow on `branch`.
    fn dispatch(&self, branch: &str) -> Result<DispatchReceipt, WfsError>;

    /// Lists the most recent runs, most recent first.
    fn list_recent_runs(&self) -> Result<Vec<RunSummary>, WfsError>;

    /// Fetches the current state of a run.
    fn get_run(&self, id: &RunId) -> Result<RunDetail, WfsError>;

    /// Lists the jobs of a run.
    fn list_jobs(&self, id: &RunId) -> Result<Vec<JobRecord>, WfsError>;

    /// Which log retrieval call this provider supports.
    fn log_delivery(&self) -> LogDelivery;

    /// Downloads the zipped log archive of a run.
    fn download_log_archive(&self, id: &RunId) -> Result<Vec<u8>, WfsError> {
        Err(unsupported("download_log_archive", &id.to_string()))
    }

    /// Fetches the raw trace of a single job.
    fn get_job_trace(&self, job_id: &str) -> Result<String, WfsError> {
        Err(unsupported("get_job_trace", job_id))
    }
}

impl<C: CiClient + ?Sized> CiClient for &C {
    fn dispatch(&self, branch: &str) -> Result<DispatchReceipt, WfsError> {
        (**self).dispatch(branch)
    }

    fn list_recent_runs(&self) -> Result<Vec<RunSummary>, WfsError> {
        (**self).list_recent_runs()
    }

    fn get_run(&self, id: &RunId) -> Result<RunDetail, WfsError> {
        (**self).get_run(id)
    }

    fn list_jobs(&self, id: &RunId) -> Result<Vec<JobRecord>, WfsError> {
        (**self).list_jobs(id)
    }

    fn log_delivery(&self) -> LogDelivery {
        (**self).log_delivery()
    }

    fn download_log_archive(&self, id: &RunId) -> Result<Vec<u8>, WfsError> {
        (**self).download_log_archive(id)
    }

    fn get_job_trace(&self, job_id: &str) -> Result<String, WfsError> {
        (**self).get_job_trace(job_id)
    }
}

impl<C: CiClient + ?Sized> CiClient for Box<C> {
    fn dispatch(&self, branch: &str) -> Result<DispatchReceipt, WfsError> {
        (**self).dispatch(branch)
    }

    fn list_recent_runs(&self) -> Result<Vec<RunSummary>, WfsError> {
        (**self).list_recent_runs()
    }

    fn get_run(&self, id: &RunId) -> Result<RunDetail, WfsError> {
        (**self).get_run(id)
    }

    fn list_jobs(&self, id: &RunId) -> Result<Vec<JobRecord>, WfsError> {
        (**self).list_jobs(id)
    }

    fn log_delivery(&self) -> LogDelivery {
        (**self).log_delivery()
    }

    fn download_log_archive(&self, id: &RunId) -> Result<Vec<u8>, WfsError> {
        (**self).download_log_archive(id)
    }

    fn get_job_trace(&self, job_id: &str) -> Result<String, WfsError> {
        (**self).get_job_trace(job_id)
    }
}

fn unsupported(call: &str, subject: &str) -> WfsError {
    WfsError::Provider(
        crate::errors::ErrorInfo::new("provider-unsupported", "provider does not support this call")
            .with_context("call", call)
            .with_context("subject", subject),
    )
}
