#![deny(missing_docs)]
#![doc = "Core types, errors and the provider contract shared by the wfs crates."]

pub mod client;
pub mod errors;
mod types;

pub use client::{CiClient, LogDelivery};
pub use errors::{ErrorInfo, WfsError};
pub use types::{
    path_fragment, DispatchReceipt, JobRecord, RunDetail, RunId, RunRecord, RunStatus, RunSummary,
};
