use std::error::Error;

use clap::Args;
use wfs_chart::{ChartRenderer, CorrelationSeries, Marker, SvgRenderer};
use wfs_timeline::{DisplayOrder, Timeline, TimelineBuilder};

use super::{collect_runs, experiment_number, write_figure, ConfigArgs, Source};

#[derive(Args, Debug)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
    /// Experiment number, defaults to the most recent one.
    #[arg(long)]
    pub experiment: Option<usize>,
    #[arg(long, value_enum, default_value_t = Source::Log)]
    pub source: Source,
}

pub fn run(args: &CorrelateArgs) -> Result<(), Box<dyn Error>> {
    let config = args.common.load()?;
    let layout = config.layout();
    let number = experiment_number(&layout, args.experiment)?;
    let builder = TimelineBuilder::new(DisplayOrder::ReverseChronological);

    let timelines: Vec<Option<Timeline>> = collect_runs(&config, &layout, number, &builder, args.source)?
        .into_iter()
        .filter(|run| run.counts(config.aggregate))
        .map(|run| run.timeline)
        .collect();
    let marker = match args.source {
        Source::Api => Marker::Exact(config.analysis.job_marker.clone()),
        Source::Log => Marker::Contains(config.analysis.log_marker.clone()),
    };
    let series = CorrelationSeries::build(marker, &timelines);
    if series.points.is_empty() {
        println!("marker '{}' found in no run with timing data", series.marker.label());
        return Ok(());
    }
    for point in &series.points {
        println!(
            "run {:>3}  position {:>3}  {:>8.1}s",
            point.run_index, point.marker_position, point.duration_seconds
        );
    }
    let svg = SvgRenderer::default().render_correlation(&series)?;
    write_figure(&layout.correlation_path(number), &svg)?;
    Ok(())
}
