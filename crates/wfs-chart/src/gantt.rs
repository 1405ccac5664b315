//! Render-ready Gantt model derived from a [`Timeline`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wfs_core::{ErrorInfo, WfsError};
use wfs_timeline::{Interval, Timeline};

use crate::palette::{ColorAssignment, DEFAULT_BAR_COLOR, RUNNER_PALETTE, STAGE_PALETTE};

/// Fraction of a stage's extent added on both sides of its band.
pub const STAGE_MARGIN_FRACTION: f64 = 0.01;
/// Lower bound of the stage margin, in seconds.
pub const STAGE_MARGIN_MIN_SECONDS: f64 = 1.0;

/// One horizontal bar. `row` is the display index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttBar {
    pub row: usize,
    pub label: String,
    pub offset_seconds: f64,
    pub duration_seconds: f64,
    pub color: String,
    pub runner: Option<String>,
    pub stage: Option<String>,
}

impl GanttBar {
    pub fn end_seconds(&self) -> f64 {
        self.offset_seconds + self.duration_seconds
    }
}

/// Time extent of a stage over all of its bars, margin included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpan {
    pub stage: String,
    pub start_offset: f64,
    pub end_offset: f64,
    pub color: String,
}

/// Background band for a run of consecutive rows sharing a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBand {
    pub stage: String,
    pub first_row: usize,
    pub last_row: usize,
    pub start_offset: f64,
    pub end_offset: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// Derived, disposable chart model. Rebuild it rather than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttModel {
    pub title: String,
    pub origin: DateTime<Utc>,
    pub bars: Vec<GanttBar>,
    pub stage_spans: Vec<StageSpan>,
    pub stage_bands: Vec<StageBand>,
    pub runner_legend: Vec<LegendEntry>,
    pub stage_legend: Vec<LegendEntry>,
}

impl GanttModel {
    /// Builds the model from a timeline already in display order.
    pub fn build(timeline: &Timeline, title: impl Into<String>) -> Result<Self, WfsError> {
        let title = title.into();
        let origin = timeline.origin().ok_or_else(|| {
            WfsError::NoTimingData(
                ErrorInfo::new("gantt-empty", "timeline has no intervals to chart")
                    .with_context("title", title.clone()),
            )
        })?;

        let mut runners = ColorAssignment::new(&RUNNER_PALETTE);
        let bars: Vec<GanttBar> = timeline
            .intervals()
            .iter()
            .enumerate()
            .map(|(row, interval)| bar(row, interval, origin, &mut runners))
            .collect();

        let mut stages = ColorAssignment::new(&STAGE_PALETTE);
        let stage_spans = stage_spans(&bars, &mut stages);
        let stage_bands = stage_bands(&bars, &stage_spans);

        Ok(Self {
            title,
            origin,
            bars,
            stage_spans,
            stage_bands,
            runner_legend: legend(runners.entries()),
            stage_legend: legend(stages.entries()),
        })
    }

    /// Largest bar end offset.
    pub fn extent_seconds(&self) -> f64 {
        self.bars
            .iter()
            .map(GanttBar::end_seconds)
            .fold(0.0, f64::max)
    }
}

/// Converts a chrono duration to fractional seconds at microsecond precision.
pub fn seconds(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => duration.num_milliseconds() as f64 / 1_000.0,
    }
}

fn bar(
    row: usize,
    interval: &Interval,
    origin: DateTime<Utc>,
    runners: &mut ColorAssignment,
) -> GanttBar {
    let color = match &interval.runner {
        Some(runner) => runners.color_for(runner),
        None => DEFAULT_BAR_COLOR.to_string(),
    };
    GanttBar {
        row,
        label: interval.label.clone(),
        offset_seconds: seconds(interval.start - origin),
        duration_seconds: seconds(interval.duration()),
        color,
        runner: interval.runner.clone(),
        stage: interval.stage.clone(),
    }
}

fn stage_spans(bars: &[GanttBar], stages: &mut ColorAssignment) -> Vec<StageSpan> {
    let mut spans: Vec<StageSpan> = Vec::new();
    for bar in bars {
        let Some(stage) = &bar.stage else { continue };
        match spans.iter_mut().find(|span| &span.stage == stage) {
            Some(span) => {
                span.start_offset = span.start_offset.min(bar.offset_seconds);
                span.end_offset = span.end_offset.max(bar.end_seconds());
            }
            None => spans.push(StageSpan {
                stage: stage.clone(),
                start_offset: bar.offset_seconds,
                end_offset: bar.end_seconds(),
                color: stages.color_for(stage),
            }),
        }
    }
    for span in &mut spans {
        let margin = ((span.end_offset - span.start_offset) * STAGE_MARGIN_FRACTION)
            .max(STAGE_MARGIN_MIN_SECONDS);
        span.start_offset -= margin;
        span.end_offset += margin;
    }
    spans
}

/// Maximal runs of consecutive rows sharing a stage, each spanning the
/// stage's full time extent.
fn stage_bands(bars: &[GanttBar], spans: &[StageSpan]) -> Vec<StageBand> {
    let mut bands: Vec<StageBand> = Vec::new();
    for bar in bars {
        let Some(stage) = &bar.stage else { continue };
        if let Some(last) = bands.last_mut() {
            if &last.stage == stage && last.last_row + 1 == bar.row {
                last.last_row = bar.row;
                continue;
            }
        }
        let Some(span) = spans.iter().find(|span| &span.stage == stage) else {
            continue;
        };
        bands.push(StageBand {
            stage: stage.clone(),
            first_row: bar.row,
            last_row: bar.row,
            start_offset: span.start_offset,
            end_offset: span.end_offset,
            color: span.color.clone(),
        });
    }
    bands
}

fn legend(entries: &[(String, String)]) -> Vec<LegendEntry> {
    entries
        .iter()
        .map(|(label, color)| LegendEntry {
            label: label.clone(),
            color: color.clone(),
        })
        .collect()
}
