use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tracing::warn;
use walkdir::WalkDir;
use wfs_chart::{format_hms, seconds, AxisDomain, ChartOptions, ChartRenderer, GanttModel, SvgRenderer};
use wfs_timeline::{snapshot_files, PipelineSnapshot, Timeline, TimelineBuilder};

use super::{write_figure, OrderArg};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Directory whose subdirectories hold `pipeline*.json` snapshots.
    #[arg(long)]
    pub root: PathBuf,
    #[arg(long, value_enum, default_value_t = OrderArg::Start)]
    pub order: OrderArg,
    /// Clip every chart to this many seconds so that they share one axis.
    #[arg(long)]
    pub max_seconds: Option<f64>,
    /// Tick spacing used together with --max-seconds.
    #[arg(long, default_value_t = 15.0)]
    pub tick_seconds: f64,
}

pub fn run(args: &SimulateArgs) -> Result<(), Box<dyn Error>> {
    let builder = TimelineBuilder::new(args.order.into());
    let fixed_domain = match args.max_seconds {
        Some(max_seconds) => Some(AxisDomain::new(max_seconds, args.tick_seconds)?),
        None => None,
    };
    let options = ChartOptions {
        fixed_domain,
        ..ChartOptions::default()
    };
    let renderer = SvgRenderer::default();
    let mut totals = BTreeMap::new();

    for entry in WalkDir::new(&args.root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let mut pipelines: Vec<Timeline> = Vec::new();
        for file in snapshot_files(entry.path())? {
            match PipelineSnapshot::load(&file) {
                Ok(snapshot) => pipelines.push(builder.from_snapshot(&snapshot)),
                Err(err) => warn!(path = %file.display(), error = %err, "skipping snapshot"),
            }
        }
        let timeline = builder.aggregate(&pipelines);
        if timeline.is_empty() {
            continue;
        }
        let model = GanttModel::build(&timeline, "Step/job durations for all jobs")?;
        let svg = renderer.render_gantt(&model, &options)?;
        write_figure(&entry.path().join("gantt_run_all_jobs.svg"), &svg)?;
        if let Some(span) = timeline.span() {
            totals.insert(entry.file_name().to_string_lossy().into_owned(), span);
        }
    }

    println!("---------------------------------");
    for (name, span) in &totals {
        println!("{name} {}", format_hms(seconds(*span)));
    }
    Ok(())
}
