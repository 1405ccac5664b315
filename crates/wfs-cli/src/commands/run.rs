use std::error::Error;
use std::fs;

use clap::Args;
use wfs_chart::{ChartRenderer, SvgRenderer};
use wfs_exp::{ExperimentSession, RunOrchestrator};

use super::{client_for, write_figure, ConfigArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
    /// Overrides the configured number of runs.
    #[arg(long)]
    pub runs: Option<usize>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let config = args.common.load()?;
    let layout = config.layout();
    let number = layout.fresh_number();
    fs::create_dir_all(layout.experiment_dir(number))?;
    println!("experiment {number} in {}", layout.experiment_dir(number).display());

    let client = client_for(&config)?;
    let orchestrator = RunOrchestrator::new(client, config.polling.policy());
    let mut session = ExperimentSession::new(
        number,
        layout.ledger(number),
        orchestrator,
        config.branch.as_str(),
        config.provider.expected_run_name(),
    );
    let report = session.run(args.runs.unwrap_or(config.runs));
    report.write_csv(&layout.durations_csv_path(number))?;

    let durations = report.durations(config.aggregate);
    if durations.is_empty() {
        println!("no run counted towards the durations chart");
    } else {
        let title = match config.provider.platform() {
            "gitlab" => "Pipeline Durations",
            _ => "Workflow Durations",
        };
        let svg = SvgRenderer::default().render_durations(title, &durations)?;
        write_figure(&layout.durations_chart_path(number), &svg)?;
    }

    for sample in &report.samples {
        match sample.record() {
            Some(record) => println!(
                "run {:>3}  {:<12} {:<10} {:>8.1}s",
                sample.attempt(),
                record.id.to_string(),
                record.status.to_string(),
                record.duration_seconds()
            ),
            None => println!("run {:>3}  aborted", sample.attempt()),
        }
    }
    println!(
        "{} finished, {} aborted, {} counted",
        report.samples.len() - report.aborted(),
        report.aborted(),
        durations.len()
    );
    Ok(())
}
