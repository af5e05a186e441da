//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smabot")]
#[command(author, version, about = "SMA crossover trading bot")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level, overrides `logging.level`
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trade a recorded bar history against the paper terminal
    Run(RunArgs),
    /// Validate configuration
    ValidateConfig(ValidateArgs),
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Bar history to replay (CSV: time,open,high,low,close[,volume])
    #[arg(short, long)]
    pub data: PathBuf,

    /// Stop after this many cycles (defaults to the length of the replay)
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Traded symbol, overrides `strategy.symbol`
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Print the effective configuration as JSON
    #[arg(long)]
    pub json: bool,
}
