use std::error::Error;

use clap::Args;
use wfs_exp::download_logs;

use super::{client_for, experiment_number, ConfigArgs};

#[derive(Args, Debug)]
pub struct DownloadLogsArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
    /// Experiment number, defaults to the most recent one.
    #[arg(long)]
    pub experiment: Option<usize>,
}

pub fn run(args: &DownloadLogsArgs) -> Result<(), Box<dyn Error>> {
    let config = args.common.load()?;
    let layout = config.layout();
    let number = experiment_number(&layout, args.experiment)?;
    let client = client_for(&config)?;
    let report = download_logs(&client, &layout, number)?;
    println!(
        "experiment {number}: {} run(s) downloaded, {} failed",
        report.downloaded.len(),
        report.failed.len()
    );
    for (run_id, err) in &report.failed {
        println!("  {run_id}: {err}");
    }
    Ok(())
}
