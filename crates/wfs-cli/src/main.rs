use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    correlate::{self, CorrelateArgs},
    download_logs::{self, DownloadLogsArgs},
    gantt::{self, GanttArgs},
    run::{self, RunArgs},
    simulate::{self, SimulateArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "wfs", about = "CI workflow scheduling timing experiments")]
struct Cli {
    /// Raise log verbosity to debug (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trigger and time a fresh experiment of N runs.
    Run(RunArgs),
    /// Fetch the logs of every run recorded in an experiment.
    DownloadLogs(DownloadLogsArgs),
    /// Draw per-run and aggregate Gantt charts of an experiment.
    Gantt(GanttArgs),
    /// Plot marker position against run duration.
    Correlate(CorrelateArgs),
    /// Chart pipeline snapshots written by a CI simulator.
    Simulate(SimulateArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::DownloadLogs(args) => download_logs::run(&args),
        Command::Gantt(args) => gantt::run(&args),
        Command::Correlate(args) => correlate::run(&args),
        Command::Simulate(args) => simulate::run(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
