//! recond CLI.
//!
//! # Commands
//!
//! - `recond run <targets..>` — submit targets and drive their pipelines to
//!   completion; persisted unfinished jobs are resumed first. Ctrl-c stops
//!   pipelines at the next step boundary; a later `run` picks them back up.
//! - `recond status` — print persisted targets, jobs, and finding counts.
//! - `recond config init/show/validate` — manage the JSON config file.

mod args;
mod commands;
mod logging;

use args::{Cli, Commands};
use clap::Parser;
use recond_core::config::ReconConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(run_args) => {
            let config = ReconConfig::load_or_default(&run_args.config_file)?;
            logging::init(&config.logging)?;
            commands::run::execute(run_args, config).await
        }
        Commands::Status { config_file } => commands::status::execute(&config_file).await,
        Commands::Config { action } => commands::config::execute(action).await,
    }
}
