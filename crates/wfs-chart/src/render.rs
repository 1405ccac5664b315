use serde::{Deserialize, Serialize};
use wfs_core::{ErrorInfo, WfsError};

use crate::correlation::CorrelationSeries;
use crate::gantt::GanttModel;

/// Clips the time axis to `[0, max_seconds]` with fixed tick spacing so that
/// many charts share one scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub max_seconds: f64,
    pub tick_seconds: f64,
}

/// Upper bound on gridlines drawn for one axis.
pub const MAX_TICKS: usize = 1000;

impl AxisDomain {
    pub fn new(max_seconds: f64, tick_seconds: f64) -> Result<Self, WfsError> {
        let domain = Self {
            max_seconds,
            tick_seconds,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// Rejects bounds that would yield NaN coordinates or an unbounded tick list.
    pub fn validate(&self) -> Result<(), WfsError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.max_seconds) || !positive(self.tick_seconds) {
            return Err(WfsError::Config(
                ErrorInfo::new("axis-domain", "max_seconds and tick_seconds must be positive and finite")
                    .with_context("max_seconds", self.max_seconds.to_string())
                    .with_context("tick_seconds", self.tick_seconds.to_string()),
            ));
        }
        if self.max_seconds / self.tick_seconds > MAX_TICKS as f64 {
            return Err(WfsError::Config(
                ErrorInfo::new("axis-ticks", "tick spacing yields too many gridlines")
                    .with_context("max_seconds", self.max_seconds.to_string())
                    .with_context("tick_seconds", self.tick_seconds.to_string())
                    .with_hint(format!("keep max_seconds / tick_seconds at or below {MAX_TICKS}")),
            ));
        }
        Ok(())
    }
}

impl Default for AxisDomain {
    fn default() -> Self {
        Self {
            max_seconds: 100.0,
            tick_seconds: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(default = "ChartOptions::default_width")]
    pub width: u32,
    #[serde(default = "ChartOptions::default_row_height")]
    pub row_height: u32,
    #[serde(default = "ChartOptions::default_legend_columns")]
    pub legend_columns: usize,
    #[serde(default)]
    pub fixed_domain: Option<AxisDomain>,
}

impl ChartOptions {
    const fn default_width() -> u32 {
        960
    }

    const fn default_row_height() -> u32 {
        22
    }

    const fn default_legend_columns() -> usize {
        3
    }

    /// Axis domain: the fixed one, or the data extent with rounded ticks.
    pub fn domain_for(&self, extent_seconds: f64) -> AxisDomain {
        if let Some(domain) = self.fixed_domain.filter(|domain| domain.validate().is_ok()) {
            return domain;
        }
        let max_seconds = extent_seconds.max(1.0);
        AxisDomain {
            max_seconds,
            tick_seconds: nice_tick(max_seconds),
        }
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            row_height: Self::default_row_height(),
            legend_columns: Self::default_legend_columns(),
            fixed_domain: None,
        }
    }
}

/// Grid of legend entries laid out below the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendLayout {
    pub columns: usize,
    pub rows: usize,
}

impl LegendLayout {
    pub fn new(entries: usize, max_columns: usize) -> Self {
        if entries == 0 {
            return Self { columns: 0, rows: 0 };
        }
        let columns = entries.min(max_columns.max(1));
        Self {
            columns,
            rows: entries.div_ceil(columns),
        }
    }

    /// Vertical space the legend occupies below the plot.
    pub fn height(&self, line_height: f64) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            (self.rows as f64 + 1.0) * line_height
        }
    }

    /// Grid cell of the `index`-th entry, filled row by row.
    pub fn cell(&self, index: usize) -> (usize, usize) {
        let columns = self.columns.max(1);
        (index / columns, index % columns)
    }
}

/// Formats an offset in seconds as `HH:MM:SS`.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

/// Tick positions from zero up to and including `domain.max_seconds`.
pub fn ticks(domain: &AxisDomain) -> Vec<f64> {
    if domain.validate().is_err() {
        return vec![0.0];
    }
    let step = domain.tick_seconds;
    let count = ((domain.max_seconds / step).floor() as usize).min(MAX_TICKS);
    (0..=count).map(|idx| idx as f64 * step).collect()
}

fn nice_tick(max_seconds: f64) -> f64 {
    const STEPS: [f64; 14] = [
        1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0, 1800.0, 3600.0, 7200.0,
    ];
    STEPS
        .iter()
        .copied()
        .find(|step| max_seconds / step <= 10.0)
        .unwrap_or(max_seconds / 10.0)
}

/// Backend that turns finished models into an artifact.
pub trait ChartRenderer {
    type Output;

    fn render_gantt(
        &self,
        model: &GanttModel,
        options: &ChartOptions,
    ) -> Result<Self::Output, WfsError>;

    /// Run index against marker position (left axis) and duration (right axis).
    fn render_correlation(&self, series: &CorrelationSeries) -> Result<Self::Output, WfsError>;

    /// Line chart of per-run durations in seconds.
    fn render_durations(&self, title: &str, durations: &[f64]) -> Result<Self::Output, WfsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(75.4), "00:01:15");
        assert_eq!(format_hms(3725.0), "01:02:05");
    }

    #[test]
    fn fixed_domain_ticks_every_fifteen_seconds() {
        let options = ChartOptions {
            fixed_domain: Some(AxisDomain::default()),
            ..ChartOptions::default()
        };
        let domain = options.domain_for(4000.0);
        assert_eq!(ticks(&domain), vec![0.0, 15.0, 30.0, 45.0, 60.0, 75.0, 90.0]);
    }

    #[test]
    fn axis_domain_rejects_degenerate_bounds() {
        assert!(AxisDomain::new(120.0, 15.0).is_ok());
        for (max, tick) in [(0.0, 15.0), (100.0, 0.0), (-5.0, 1.0), (f64::NAN, 15.0), (f64::INFINITY, 15.0)] {
            let err = AxisDomain::new(max, tick).unwrap_err();
            assert_eq!(err.info().code, "axis-domain");
        }
        let err = AxisDomain::new(1.0e9, 0.001).unwrap_err();
        assert_eq!(err.info().code, "axis-ticks");
    }

    #[test]
    fn ticks_stay_bounded_for_hand_built_domains() {
        let zero = AxisDomain {
            max_seconds: 0.0,
            tick_seconds: 15.0,
        };
        assert_eq!(ticks(&zero), vec![0.0]);
        let dense = AxisDomain {
            max_seconds: 1.0e12,
            tick_seconds: 1.0e-6,
        };
        assert_eq!(ticks(&dense), vec![0.0]);
    }

    #[test]
    fn legend_rows_grow_with_entries() {
        assert_eq!(LegendLayout::new(0, 3), LegendLayout { columns: 0, rows: 0 });
        assert_eq!(LegendLayout::new(2, 3), LegendLayout { columns: 2, rows: 1 });
        assert_eq!(LegendLayout::new(7, 3), LegendLayout { columns: 3, rows: 3 });
        assert!(LegendLayout::new(7, 3).height(18.0) > LegendLayout::new(2, 3).height(18.0));
        assert_eq!(LegendLayout::new(7, 3).cell(4), (1, 1));
    }
}
