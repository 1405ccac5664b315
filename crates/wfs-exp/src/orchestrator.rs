//! Trigger, locate and poll a single CI run.

use std::collections::BTreeSet;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wfs_core::{CiClient, ErrorInfo, RunId, RunRecord, RunStatus, WfsError};

/// Waiting behaviour of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Pause between a dispatch and the first listing.
    pub trigger_settle: Duration,
    /// Pause between two listings while locating.
    pub locate_interval: Duration,
    /// Listings attempted before giving up with `RunNotFound`.
    pub locate_attempts: usize,
    /// Pause between two status checks.
    pub poll_interval: Duration,
    /// Deadline for reaching a terminal status; `None` waits forever.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            trigger_settle: Duration::from_secs(3),
            locate_interval: Duration::from_secs(10),
            locate_attempts: 5,
            poll_interval: Duration::from_secs(10),
            max_wait: None,
        }
    }
}

impl PollPolicy {
    /// No pauses at all, for tests and replays.
    pub fn immediate() -> Self {
        Self {
            trigger_settle: Duration::ZERO,
            locate_interval: Duration::ZERO,
            locate_attempts: 5,
            poll_interval: Duration::ZERO,
            max_wait: None,
        }
    }
}

/// Where the orchestrator currently is for the run in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Triggering,
    Locating,
    Polling,
    Terminal(RunStatus),
}

/// State machine `Triggering -> Locating -> Polling -> Terminal`.
///
/// Locating matches runs by name because dispatch calls do not return an id.
/// Concurrent unrelated runs with the same name can be misattributed; ids
/// already claimed by this orchestrator are never handed out twice.
pub struct RunOrchestrator<C> {
    client: C,
    policy: PollPolicy,
    phase: RunPhase,
    claimed: BTreeSet<RunId>,
}

impl<C: CiClient> RunOrchestrator<C> {
    pub fn new(client: C, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            phase: RunPhase::Idle,
            claimed: BTreeSet::new(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Issues the dispatch call. Returns the run id when the provider hands one out.
    pub fn trigger(&mut self, branch: &str) -> Result<Option<RunId>, WfsError> {
        self.phase = RunPhase::Triggering;
        let receipt = self.client.dispatch(branch)?;
        if !receipt.accepted() {
            return Err(WfsError::TriggerRejected(
                ErrorInfo::new("dispatch-status", "provider rejected the dispatch")
                    .with_context("status", receipt.status.to_string())
                    .with_context("branch", branch),
            ));
        }
        info!(branch, status = receipt.status, "run dispatched");
        Ok(receipt.run_id)
    }

    /// Finds the run created by the last dispatch: the first listed run named
    /// `expected_name`.
    ///
    /// When that run was already claimed by an earlier attempt the new run is
    /// not listed yet, so the listing is fetched again.
    pub fn locate(&mut self, expected_name: &str, attempts: usize) -> Result<RunId, WfsError> {
        self.phase = RunPhase::Locating;
        for attempt in 0..attempts {
            if attempt > 0 {
                thread::sleep(self.policy.locate_interval);
            }
            let runs = self.client.list_recent_runs()?;
            match runs.into_iter().find(|run| run.name == expected_name) {
                Some(run) if self.claimed.contains(&run.id) => {
                    debug!(attempt, run_id = %run.id, "newest matching run already claimed")
                }
                Some(run) => {
                    info!(run_id = %run.id, attempt, "run located");
                    self.claimed.insert(run.id.clone());
                    return Ok(run.id);
                }
                None => debug!(attempt, expected_name, "run not listed yet"),
            }
        }
        Err(WfsError::RunNotFound(
            ErrorInfo::new("locate-window", "no listed run matched the dispatched workflow")
                .with_context("name", expected_name)
                .with_context("attempts", attempts.to_string())
                .with_hint("re-trigger the run or widen the locate window"),
        ))
    }

    /// Polls until the run is terminal and returns its record.
    ///
    /// A non-success terminal status is still returned as a record; see
    /// [`run_failure`].
    pub fn poll(&mut self, run_id: &RunId) -> Result<RunRecord, WfsError> {
        self.phase = RunPhase::Polling;
        let started = Instant::now();
        loop {
            let detail = self.client.get_run(run_id)?;
            debug!(run_id = %run_id, status = %detail.status, "polled run");
            if detail.status.is_terminal() {
                self.phase = RunPhase::Terminal(detail.status);
                let started_at = detail.started_at.or(detail.created_at);
                let (Some(started_at), Some(completed_at)) = (started_at, detail.completed_at) else {
                    return Err(WfsError::Provider(
                        ErrorInfo::new("run-timestamps", "terminal run lacks start or completion time")
                            .with_context("run_id", run_id.to_string()),
                    ));
                };
                let record = RunRecord {
                    id: run_id.clone(),
                    status: detail.status,
                    created_at: detail.created_at,
                    started_at,
                    completed_at,
                };
                if let Some(failure) = run_failure(&record) {
                    warn!(run_id = %run_id, error = %failure, "run finished unsuccessfully");
                }
                return Ok(record);
            }
            if let Some(max_wait) = self.policy.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(WfsError::Timeout(
                        ErrorInfo::new("poll-deadline", "run did not reach a terminal status in time")
                            .with_context("run_id", run_id.to_string())
                            .with_context("max_wait_secs", max_wait.as_secs().to_string())
                            .with_context("last_status", detail.status.to_string()),
                    ));
                }
            }
            thread::sleep(self.policy.poll_interval);
        }
    }

    /// Trigger, locate (unless the dispatch returned an id) and poll.
    pub fn trigger_and_wait(&mut self, branch: &str, name_hint: &str) -> Result<RunRecord, WfsError> {
        self.trigger_and_wait_with(branch, name_hint, |_| Ok(()))
    }

    /// Like [`Self::trigger_and_wait`], calling `on_located` once the run is
    /// known to exist and before polling starts.
    pub fn trigger_and_wait_with<F>(
        &mut self,
        branch: &str,
        name_hint: &str,
        mut on_located: F,
    ) -> Result<RunRecord, WfsError>
    where
        F: FnMut(&RunId) -> Result<(), WfsError>,
    {
        let dispatched = self.trigger(branch)?;
        thread::sleep(self.policy.trigger_settle);
        let run_id = match dispatched {
            Some(id) => {
                self.claimed.insert(id.clone());
                id
            }
            None => self.locate(name_hint, self.policy.locate_attempts)?,
        };
        on_located(&run_id)?;
        let record = self.poll(&run_id)?;
        info!(run_id = %record.id, status = %record.status, seconds = record.duration_seconds(), "run finished");
        Ok(record)
    }
}

/// `RunFailed` for records whose terminal status is not a success.
pub fn run_failure(record: &RunRecord) -> Option<WfsError> {
    if record.status.is_success() {
        return None;
    }
    Some(WfsError::RunFailed(
        ErrorInfo::new("run-unsuccessful", format!("run ended as {}", record.status))
            .with_context("run_id", record.id.to_string())
            .with_context("duration_secs", format!("{:.3}", record.duration_seconds())),
    ))
}
