#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, TimeZone, Utc};
use wfs_core::{
    CiClient, DispatchReceipt, ErrorInfo, JobRecord, LogDelivery, RunDetail, RunId, RunStatus,
    RunSummary, WfsError,
};

pub fn at(minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, second).unwrap()
}

pub fn detail(status: RunStatus, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> RunDetail {
    RunDetail {
        name: "ci".to_string(),
        status,
        created_at: Some(start),
        started_at: Some(start),
        completed_at: end,
    }
}

pub fn summary(id: u64, name: &str) -> RunSummary {
    RunSummary {
        id: RunId::Numeric(id),
        name: name.to_string(),
        status: RunStatus::Queued,
    }
}

/// Provider double answering from pre-recorded scripts.
pub struct ScriptedClient {
    pub delivery: LogDelivery,
    pub dispatches: RefCell<VecDeque<DispatchReceipt>>,
    pub listings: RefCell<VecDeque<Vec<RunSummary>>>,
    pub details: RefCell<BTreeMap<RunId, VecDeque<RunDetail>>>,
    pub jobs: BTreeMap<RunId, Vec<JobRecord>>,
    pub archives: BTreeMap<RunId, Vec<u8>>,
    pub traces: BTreeMap<String, String>,
    pub dispatch_calls: RefCell<usize>,
    pub listing_calls: RefCell<usize>,
}

impl ScriptedClient {
    pub fn new(delivery: LogDelivery) -> Self {
        Self {
            delivery,
            dispatches: RefCell::new(VecDeque::new()),
            listings: RefCell::new(VecDeque::new()),
            details: RefCell::new(BTreeMap::new()),
            jobs: BTreeMap::new(),
            archives: BTreeMap::new(),
            traces: BTreeMap::new(),
            dispatch_calls: RefCell::new(0),
            listing_calls: RefCell::new(0),
        }
    }

    pub fn accept(self, run_id: Option<u64>) -> Self {
        self.dispatches.borrow_mut().push_back(DispatchReceipt {
            status: 204,
            run_id: run_id.map(RunId::Numeric),
        });
        self
    }

    pub fn reject(self, status: u16) -> Self {
        self.dispatches
            .borrow_mut()
            .push_back(DispatchReceipt { status, run_id: None });
        self
    }

    pub fn listing(self, runs: Vec<RunSummary>) -> Self {
        self.listings.borrow_mut().push_back(runs);
        self
    }

    pub fn states(self, id: u64, states: Vec<RunDetail>) -> Self {
        self.details
            .borrow_mut()
            .insert(RunId::Numeric(id), states.into_iter().collect());
        self
    }
}

fn missing(what: &str) -> WfsError {
    WfsError::Provider(ErrorInfo::new("script-exhausted", what))
}

impl CiClient for ScriptedClient {
    fn dispatch(&self, _branch: &str) -> Result<DispatchReceipt, WfsError> {
        *self.dispatch_calls.borrow_mut() += 1;
        self.dispatches
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| missing("dispatch"))
    }

    fn list_recent_runs(&self) -> Result<Vec<RunSummary>, WfsError> {
        *self.listing_calls.borrow_mut() += 1;
        let mut listings = self.listings.borrow_mut();
        // the last listing repeats once the script runs out
        if listings.len() > 1 {
            Ok(listings.pop_front().unwrap_or_default())
        } else {
            Ok(listings.front().cloned().unwrap_or_default())
        }
    }

    fn get_run(&self, id: &RunId) -> Result<RunDetail, WfsError> {
        let mut details = self.details.borrow_mut();
        let queue = details.get_mut(id).ok_or_else(|| missing("get_run"))?;
        if queue.len() > 1 {
            queue.pop_front().ok_or_else(|| missing("get_run"))
        } else {
            queue.front().cloned().ok_or_else(|| missing("get_run"))
        }
    }

    fn list_jobs(&self, id: &RunId) -> Result<Vec<JobRecord>, WfsError> {
        self.jobs.get(id).cloned().ok_or_else(|| missing("list_jobs"))
    }

    fn log_delivery(&self) -> LogDelivery {
        self.delivery
    }

    fn download_log_archive(&self, id: &RunId) -> Result<Vec<u8>, WfsError> {
        self.archives
            .get(id)
            .cloned()
            .ok_or_else(|| missing("download_log_archive"))
    }

    fn get_job_trace(&self, job_id: &str) -> Result<String, WfsError> {
        self.traces
            .get(job_id)
            .cloned()
            .ok_or_else(|| missing("get_job_trace"))
    }
}
