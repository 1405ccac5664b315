//! Timeline reconstruction for CI runs: log timestamp scanning, job mapping
//! and display ordering.

mod interval;
pub mod snapshot;
pub mod timeline;
pub mod timestamp;

pub use interval::Interval;
pub use snapshot::{snapshot_files, PipelineSnapshot, SnapshotJob, SnapshotStage};
pub use timeline::{log_files, trim_pipeline_prefix, DisplayOrder, Timeline, TimelineBuilder};
pub use timestamp::{LogBounds, TimestampParser};
