use chrono::{TimeZone, Utc};
use wfs_chart::{
    AxisDomain, ChartOptions, ChartRenderer, CorrelationSeries, GanttModel, Marker, SvgRenderer,
};
use wfs_timeline::{DisplayOrder, Interval, Timeline};

fn timeline(labels: &[(&str, i64, i64, Option<&str>)]) -> Timeline {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    let intervals = labels
        .iter()
        .map(|(label, start, end, stage)| {
            Interval::new(
                *label,
                base + chrono::Duration::seconds(*start),
                base + chrono::Duration::seconds(*end),
            )
            .unwrap()
            .with_runner(Some("runner-1".into()))
            .with_stage(stage.map(str::to_string))
        })
        .collect();
    Timeline::arrange(intervals, DisplayOrder::ReverseChronological)
}

#[test]
fn gantt_svg_is_deterministic_and_escaped() {
    let model = GanttModel::build(
        &timeline(&[("build <x86>", 0, 30, Some("build")), ("wait (120)", 30, 150, None)]),
        "Job durations for run 7",
    )
    .unwrap();
    let renderer = SvgRenderer::default();
    let options = ChartOptions::default();
    let a = renderer.render_gantt(&model, &options).unwrap();
    let b = renderer.render_gantt(&model, &options).unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("<svg"));
    assert!(a.ends_with("</svg>"));
    assert!(a.contains("build &lt;x86&gt;"));
    assert!(a.contains("00:02:30"));
    assert!(a.contains(">Runner<"));
    assert!(a.contains(">Stage<"));
}

#[test]
fn fixed_domain_uses_configured_ticks() {
    let model = GanttModel::build(&timeline(&[("long", 0, 400, None)]), "fixed").unwrap();
    let options = ChartOptions {
        fixed_domain: Some(AxisDomain::default()),
        ..ChartOptions::default()
    };
    let svg = SvgRenderer::default().render_gantt(&model, &options).unwrap();
    assert!(svg.contains(">00:01:30<"));
    assert!(!svg.contains(">00:01:45<"));
}

#[test]
fn correlation_svg_plots_both_axes() {
    let runs = vec![
        Some(timeline(&[("setup", 0, 10, None), ("wait (120)", 10, 130, None)])),
        None,
        Some(timeline(&[("wait (120)", 0, 120, None), ("setup", 0, 200, None)])),
    ];
    let series = CorrelationSeries::build(Marker::Contains("wait (120)".into()), &runs);
    assert_eq!(series.points.len(), 2);
    assert_eq!(series.points[0].marker_position, 1);
    assert_eq!(series.points[1].run_index, 2);
    let svg = SvgRenderer::default().render_correlation(&series).unwrap();
    assert!(svg.contains("Run duration (seconds)"));
    assert!(svg.contains("<polyline"));
}

#[test]
fn durations_chart_handles_empty_input() {
    let svg = SvgRenderer::default().render_durations("Workflow Durations", &[]).unwrap();
    assert!(svg.contains("Workflow Durations"));
    assert!(!svg.contains("<polyline"));
}
