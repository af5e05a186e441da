//! SMA trading bot CLI application.

mod cli;
mod quote_sync;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use smabot_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            cli::commands::run::run(args, &cli.config, cli.log_level, cli.json_logs).await
        }
        Commands::ValidateConfig(args) => {
            let level = cli.log_level.map_or("info", |l| l.as_str());
            let _guard = setup_logging(level, cli.json_logs, None);
            cli::commands::validate::run(args, &cli.config).await
        }
    }
}
