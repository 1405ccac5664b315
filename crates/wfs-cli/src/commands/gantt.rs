use std::error::Error;

use clap::Args;
use wfs_chart::{ChartRenderer, GanttModel, SvgRenderer};
use wfs_timeline::TimelineBuilder;

use super::{collect_runs, experiment_number, write_figure, ConfigArgs, OrderArg, Source};

#[derive(Args, Debug)]
pub struct GanttArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
    /// Experiment number, defaults to the most recent one.
    #[arg(long)]
    pub experiment: Option<usize>,
    #[arg(long, value_enum, default_value_t = Source::Log)]
    pub source: Source,
    #[arg(long, value_enum, default_value_t = OrderArg::Start)]
    pub order: OrderArg,
}

pub fn run(args: &GanttArgs) -> Result<(), Box<dyn Error>> {
    let config = args.common.load()?;
    let layout = config.layout();
    let number = experiment_number(&layout, args.experiment)?;
    let builder = TimelineBuilder::new(args.order.into());
    let renderer = SvgRenderer::default();

    let runs = collect_runs(&config, &layout, number, &builder, args.source)?;
    for run in &runs {
        let Some(timeline) = &run.timeline else {
            println!("run {}: no timing data", run.run_id);
            continue;
        };
        let model = GanttModel::build(timeline, format!("Step/job durations for run {}", run.run_id))?;
        let svg = renderer.render_gantt(&model, &config.chart)?;
        write_figure(&layout.gantt_path(number, &run.run_id), &svg)?;
    }

    let aggregate = builder.aggregate(
        runs.iter()
            .filter(|run| run.counts(config.aggregate))
            .filter_map(|run| run.timeline.as_ref()),
    );
    if aggregate.is_empty() {
        println!("no counted run has timing data, skipping the aggregate chart");
        return Ok(());
    }
    let model = GanttModel::build(&aggregate, "Step/job durations for all jobs")?;
    let svg = renderer.render_gantt(&model, &config.chart)?;
    write_figure(&layout.aggregate_gantt_path(number), &svg)?;
    Ok(())
}
