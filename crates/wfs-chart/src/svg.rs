use wfs_core::WfsError;

use crate::correlation::CorrelationSeries;
use crate::gantt::{GanttModel, LegendEntry};
use crate::render::{format_hms, ticks, ChartOptions, ChartRenderer, LegendLayout};

const TOP: f64 = 36.0;
const AXIS_HEIGHT: f64 = 32.0;
const RIGHT_PAD: f64 = 24.0;
const CHAR_WIDTH: f64 = 7.0;
const BAND_OPACITY: f64 = 0.35;
const POSITION_COLOR: &str = "#1f77b4";
const DURATION_COLOR: &str = "#ff7f0e";

/// Renders chart models as standalone SVG documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgRenderer {
    pub legend_line_height: f64,
    pub plot_width: u32,
    pub plot_height: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            legend_line_height: 18.0,
            plot_width: 720,
            plot_height: 400,
        }
    }
}

impl ChartRenderer for SvgRenderer {
    type Output = String;

    fn render_gantt(&self, model: &GanttModel, options: &ChartOptions) -> Result<String, WfsError> {
        let rows = model.bars.len();
        let row_height = options.row_height.max(4) as f64;
        let longest_label = model
            .bars
            .iter()
            .map(|bar| bar.label.chars().count())
            .max()
            .unwrap_or(0);
        let left = (longest_label as f64 * CHAR_WIDTH).clamp(60.0, 320.0) + 12.0;
        let width = options.width as f64;
        let plot_width = (width - left - RIGHT_PAD).max(100.0);
        let plot_height = rows as f64 * row_height;
        let domain = options.domain_for(model.extent_seconds());
        let x = |seconds: f64| left + seconds.clamp(0.0, domain.max_seconds) / domain.max_seconds * plot_width;
        let row_y = |row: usize| TOP + (rows - 1 - row) as f64 * row_height;

        let runner_layout = LegendLayout::new(model.runner_legend.len(), options.legend_columns);
        let stage_layout = LegendLayout::new(model.stage_legend.len(), options.legend_columns);
        let legend_top = TOP + plot_height + AXIS_HEIGHT;
        let stage_top = legend_top + runner_layout.height(self.legend_line_height);
        let height = stage_top + stage_layout.height(self.legend_line_height) + 8.0;

        let mut parts = vec![header(width, height), title(width, &model.title)];

        for band in &model.stage_bands {
            let x0 = x(band.start_offset);
            let x1 = x(band.end_offset);
            let y0 = row_y(band.last_row);
            let y1 = row_y(band.first_row) + row_height;
            parts.push(format!(
                "<rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' fill='{}' fill-opacity='{}' />",
                x0,
                y0,
                (x1 - x0).max(0.0),
                y1 - y0,
                band.color,
                BAND_OPACITY
            ));
        }

        for tick in ticks(&domain) {
            let tx = x(tick);
            parts.push(format!(
                "<line x1='{tx:.2}' y1='{TOP:.2}' x2='{tx:.2}' y2='{:.2}' stroke='#d0d0d0' stroke-width='0.5' />",
                TOP + plot_height
            ));
            parts.push(format!(
                "<text x='{tx:.2}' y='{:.2}' font-size='10' text-anchor='middle'>{}</text>",
                TOP + plot_height + 16.0,
                format_hms(tick)
            ));
        }

        for bar in &model.bars {
            if bar.offset_seconds > domain.max_seconds {
                continue;
            }
            let bx = x(bar.offset_seconds);
            let bw = (x(bar.end_seconds()) - bx).max(1.0);
            let by = row_y(bar.row);
            parts.push(format!(
                "<rect x='{bx:.2}' y='{:.2}' width='{bw:.2}' height='{:.2}' fill='{}'><title>{}</title></rect>",
                by + 3.0,
                row_height - 6.0,
                bar.color,
                escape_xml(&bar.label)
            ));
            parts.push(format!(
                "<text x='{:.2}' y='{:.2}' font-size='11' text-anchor='end'>{}</text>",
                left - 6.0,
                by + row_height / 2.0 + 4.0,
                escape_xml(&bar.label)
            ));
        }
        parts.push(format!(
            "<line x1='{left:.2}' y1='{:.2}' x2='{:.2}' y2='{:.2}' stroke='#333' />",
            TOP + plot_height,
            left + plot_width,
            TOP + plot_height
        ));

        self.legend(&mut parts, "Runner", &model.runner_legend, runner_layout, left, plot_width, legend_top);
        self.legend(&mut parts, "Stage", &model.stage_legend, stage_layout, left, plot_width, stage_top);

        parts.push("</svg>".into());
        Ok(parts.join(""))
    }

    fn render_correlation(&self, series: &CorrelationSeries) -> Result<String, WfsError> {
        let frame = Frame::new(self.plot_width as f64, self.plot_height as f64);
        let marker = series.marker.label();
        let max_run = series.points.iter().map(|p| p.run_index).max().unwrap_or(0).max(1) as f64;
        let max_position = series
            .points
            .iter()
            .map(|p| p.marker_position)
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        let max_duration = series
            .points
            .iter()
            .map(|p| p.duration_seconds)
            .fold(1.0, f64::max);

        let mut parts = vec![
            header(frame.width, frame.height),
            title(frame.width, &format!("Location of '{marker}' and run duration per run")),
        ];
        frame.axes(&mut parts, max_run, max_position, Some(max_duration));
        frame.axis_labels(
            &mut parts,
            "Run index",
            &format!("Index of '{marker}'"),
            Some("Run duration (seconds)"),
        );
        let positions: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|p| frame.point(p.run_index as f64 / max_run, p.marker_position as f64 / max_position))
            .collect();
        let durations: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|p| frame.point(p.run_index as f64 / max_run, p.duration_seconds / max_duration))
            .collect();
        series_path(&mut parts, &positions, POSITION_COLOR, false);
        series_path(&mut parts, &durations, DURATION_COLOR, true);
        parts.push("</svg>".into());
        Ok(parts.join(""))
    }

    fn render_durations(&self, title_text: &str, durations: &[f64]) -> Result<String, WfsError> {
        let frame = Frame::new(self.plot_width as f64, self.plot_height as f64);
        let max_run = durations.len().saturating_sub(1).max(1) as f64;
        let max_duration = durations.iter().copied().fold(1.0, f64::max);
        let mut parts = vec![header(frame.width, frame.height), title(frame.width, title_text)];
        frame.axes(&mut parts, max_run, max_duration, None);
        frame.axis_labels(&mut parts, "Run", "Duration (s)", None);
        let points: Vec<(f64, f64)> = durations
            .iter()
            .enumerate()
            .map(|(idx, value)| frame.point(idx as f64 / max_run, value / max_duration))
            .collect();
        series_path(&mut parts, &points, POSITION_COLOR, false);
        parts.push("</svg>".into());
        Ok(parts.join(""))
    }
}

impl SvgRenderer {
    #[allow(clippy::too_many_arguments)]
    fn legend(
        &self,
        parts: &mut Vec<String>,
        heading: &str,
        entries: &[LegendEntry],
        layout: LegendLayout,
        left: f64,
        plot_width: f64,
        top: f64,
    ) {
        if entries.is_empty() {
            return;
        }
        let line = self.legend_line_height;
        parts.push(format!(
            "<text x='{left:.2}' y='{:.2}' font-size='11' font-weight='bold'>{heading}</text>",
            top + line - 4.0
        ));
        let column_width = plot_width / layout.columns.max(1) as f64;
        for (idx, entry) in entries.iter().enumerate() {
            let (row, column) = layout.cell(idx);
            let ex = left + column as f64 * column_width;
            let ey = top + (row + 1) as f64 * line;
            parts.push(format!(
                "<rect x='{ex:.2}' y='{:.2}' width='10' height='10' fill='{}' />",
                ey + 3.0,
                entry.color
            ));
            parts.push(format!(
                "<text x='{:.2}' y='{:.2}' font-size='11'>{}</text>",
                ex + 14.0,
                ey + 12.0,
                escape_xml(&entry.label)
            ));
        }
    }
}

struct Frame {
    width: f64,
    height: f64,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Frame {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            left: 64.0,
            right: width - 64.0,
            top: TOP,
            bottom: height - 48.0,
        }
    }

    fn point(&self, fx: f64, fy: f64) -> (f64, f64) {
        (
            self.left + fx * (self.right - self.left),
            self.bottom - fy * (self.bottom - self.top),
        )
    }

    fn axes(&self, parts: &mut Vec<String>, max_x: f64, max_left: f64, max_right: Option<f64>) {
        parts.push(format!(
            "<rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' fill='none' stroke='#333' />",
            self.left,
            self.top,
            self.right - self.left,
            self.bottom - self.top
        ));
        for step in 0..=5 {
            let frac = step as f64 / 5.0;
            let (gx, gy) = self.point(frac, frac);
            parts.push(format!(
                "<line x1='{:.2}' y1='{gy:.2}' x2='{:.2}' y2='{gy:.2}' stroke='#e0e0e0' stroke-width='0.5' />",
                self.left, self.right
            ));
            parts.push(format!(
                "<text x='{gx:.2}' y='{:.2}' font-size='10' text-anchor='middle'>{:.0}</text>",
                self.bottom + 14.0,
                frac * max_x
            ));
            parts.push(format!(
                "<text x='{:.2}' y='{:.2}' font-size='10' text-anchor='end' fill='{POSITION_COLOR}'>{:.1}</text>",
                self.left - 4.0,
                gy + 3.0,
                frac * max_left
            ));
            if let Some(max_right) = max_right {
                parts.push(format!(
                    "<text x='{:.2}' y='{:.2}' font-size='10' fill='{DURATION_COLOR}'>{:.0}</text>",
                    self.right + 4.0,
                    gy + 3.0,
                    frac * max_right
                ));
            }
        }
    }

    fn axis_labels(&self, parts: &mut Vec<String>, x_label: &str, left_label: &str, right_label: Option<&str>) {
        let middle_y = (self.top + self.bottom) / 2.0;
        parts.push(format!(
            "<text x='{:.2}' y='{:.2}' font-size='12' text-anchor='middle'>{}</text>",
            (self.left + self.right) / 2.0,
            self.height - 10.0,
            escape_xml(x_label)
        ));
        parts.push(format!(
            "<text x='14' y='{middle_y:.2}' font-size='12' text-anchor='middle' fill='{POSITION_COLOR}' transform='rotate(-90 14 {middle_y:.2})'>{}</text>",
            escape_xml(left_label)
        ));
        if let Some(label) = right_label {
            let rx = self.width - 12.0;
            parts.push(format!(
                "<text x='{rx:.2}' y='{middle_y:.2}' font-size='12' text-anchor='middle' fill='{DURATION_COLOR}' transform='rotate(90 {rx:.2} {middle_y:.2})'>{}</text>",
                escape_xml(label)
            ));
        }
    }
}

fn header(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{:.0}' height='{:.0}' font-family='sans-serif'><rect width='100%' height='100%' fill='white' />",
        width, height
    )
}

fn title(width: f64, text: &str) -> String {
    format!(
        "<text x='{:.2}' y='22' font-size='14' text-anchor='middle'>{}</text>",
        width / 2.0,
        escape_xml(text)
    )
}

fn series_path(parts: &mut Vec<String>, points: &[(f64, f64)], color: &str, dashed: bool) {
    if points.is_empty() {
        return;
    }
    let coords: Vec<String> = points
        .iter()
        .map(|(px, py)| format!("{px:.2},{py:.2}"))
        .collect();
    let dash = if dashed { " stroke-dasharray='6 4'" } else { "" };
    parts.push(format!(
        "<polyline points='{}' fill='none' stroke='{color}' stroke-width='1.5'{dash} />",
        coords.join(" ")
    ));
    for (px, py) in points {
        if dashed {
            parts.push(format!(
                "<rect x='{:.2}' y='{:.2}' width='6' height='6' fill='{color}' />",
                px - 3.0,
                py - 3.0
            ));
        } else {
            parts.push(format!("<circle cx='{px:.2}' cy='{py:.2}' r='3' fill='{color}' />"));
        }
    }
}

/// Escapes text for use inside SVG elements and attributes.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
