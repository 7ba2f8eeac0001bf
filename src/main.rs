use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod analytics;
mod config;
mod dispatcher;
mod metrics;
mod models;
mod output;
mod provider;
mod runner;
mod text;

use crate::analytics::GroupBy;
use crate::config::Config;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Sweep sampling parameters against a model and score the outputs with
/// objective text metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the evaluations defined in a TOML configuration file
    Run {
        /// Path to the TOML configuration file
        run_file: PathBuf,

        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,

        /// Dimension to group summaries by
        #[arg(short, long, default_value = "temperature")]
        group_by: GroupBy,

        /// Verbose output - show progress for each sweep
        #[arg(short, long)]
        verbose: bool,
    },
    /// Summarize a previously stored record set
    Analyze {
        /// Path to a JSON file of scored records
        records_file: PathBuf,

        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,

        /// Dimension to group summaries by
        #[arg(short, long, default_value = "temperature")]
        group_by: GroupBy,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Run {
            run_file,
            output,
            group_by,
            verbose,
        } => {
            let config = Config::from_file(&run_file)?;
            let runner = Runner::new(config, group_by, verbose);
            let reports = runner.run_evaluations().await?;
            output::print_reports(&reports, output);
        }
        Command::Analyze {
            records_file,
            output,
            group_by,
        } => {
            let records = runner::load_records(&records_file)?;
            let summaries = analytics::summarize(&records, group_by);
            output::print_summaries(&summaries, output);
        }
    }

    Ok(())
}
