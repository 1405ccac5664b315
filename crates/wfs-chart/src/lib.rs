//! Gantt chart models and SVG figures for reconstructed CI timelines.

pub mod correlation;
pub mod gantt;
pub mod palette;
pub mod render;
pub mod svg;

pub use correlation::{CorrelationPoint, CorrelationSeries, Marker};
pub use gantt::{seconds, GanttBar, GanttModel, LegendEntry, StageBand, StageSpan};
pub use palette::{ColorAssignment, DEFAULT_BAR_COLOR, RUNNER_PALETTE, STAGE_PALETTE};
pub use render::{format_hms, ticks, AxisDomain, ChartOptions, ChartRenderer, LegendLayout};
pub use svg::{escape_xml, SvgRenderer};
