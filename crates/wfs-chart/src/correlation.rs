//! Marker position versus run duration across the runs of an experiment.

use serde::{Deserialize, Serialize};
use wfs_timeline::{Interval, Timeline};

use crate::gantt::seconds;

/// How the marker interval is recognised by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "label", rename_all = "kebab-case")]
pub enum Marker {
    Exact(String),
    Contains(String),
}

impl Marker {
    pub fn matches(&self, interval: &Interval) -> bool {
        match self {
            Marker::Exact(label) => interval.label == *label,
            Marker::Contains(fragment) => interval.label.contains(fragment.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Marker::Exact(label) | Marker::Contains(label) => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPoint {
    pub run_index: usize,
    /// Index of the marker among the run's intervals sorted by start.
    pub marker_position: usize,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSeries {
    pub marker: Marker,
    pub points: Vec<CorrelationPoint>,
}

impl CorrelationSeries {
    /// One point per run that has both timing data and the marker.
    ///
    /// `None` entries stand for runs whose timeline could not be built; they
    /// still consume a run index.
    pub fn build(marker: Marker, timelines: &[Option<Timeline>]) -> Self {
        let points = timelines
            .iter()
            .enumerate()
            .filter_map(|(run_index, timeline)| {
                let timeline = timeline.as_ref()?;
                let duration = timeline.span()?;
                let marker_position = timeline.chronological_position(|i| marker.matches(i))?;
                Some(CorrelationPoint {
                    run_index,
                    marker_position,
                    duration_seconds: seconds(duration),
                })
            })
            .collect();
        Self { marker, points }
    }
}
