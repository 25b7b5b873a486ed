//! `stack-deploy` command line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "stack-deploy")]
#[command(about = "Stack Deployer - dependency-ordered environment deployment")]
#[command(version)]
struct Cli {
    /// Deploy file path
    #[arg(short = 'f', long = "file", global = true, default_value = "handel.yml")]
    file: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the deploy file
    Validate,

    /// Show the deploy levels of environments
    Plan {
        /// Environments to plan, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        environments: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match cli.command {
        Commands::Validate => commands::validate::run(&cli.file),
        Commands::Plan { environments } => commands::plan::run(&cli.file, &environments),
    }
}
