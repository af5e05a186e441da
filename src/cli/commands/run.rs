//! Run command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use smabot_broker::PaperBroker;
use smabot_config::load_config;
use smabot_data::CsvReplaySource;
use smabot_engine::{shutdown_channel, TradingLoop};
use smabot_monitor::{setup_logging, TracingSink};
use tracing::info;

use crate::cli::{LogLevel, RunArgs};
use crate::quote_sync::QuoteSync;

pub async fn run(
    args: RunArgs,
    config_path: &Path,
    log_level: Option<LogLevel>,
    json_logs: bool,
) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let level = log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = json_logs || config.logging.format == "json";
    let _guard = setup_logging(&level, json, config.logging.file.as_deref().map(Path::new));

    let mut loop_config = config.loop_config().context("Invalid configuration")?;
    if let Some(symbol) = args.symbol {
        loop_config.symbol = symbol;
    }

    if !args.data.exists() {
        anyhow::bail!(
            "Data path '{}' does not exist. Provide a CSV bar history with --data",
            args.data.display()
        );
    }
    let replay = CsvReplaySource::from_csv(
        &args.data,
        loop_config.symbol.clone(),
        loop_config.timeframe,
        loop_config.sma_period,
    )
    .with_context(|| format!("Failed to load bars from {}", args.data.display()))?;

    loop_config.max_cycles = match args.max_cycles.or(loop_config.max_cycles) {
        Some(max) => Some(max),
        None => Some(replay.remaining().await as u64),
    };

    info!(
        data = %args.data.display(),
        bars = replay.len(),
        cycles = ?loop_config.max_cycles,
        "Replaying bar history against the paper terminal"
    );

    let broker = Arc::new(PaperBroker::new(config.paper_config()));
    let data = Arc::new(QuoteSync::new(replay, broker.clone(), config.paper.spread));
    let mut trading_loop = TradingLoop::new(loop_config, broker.clone(), data, Arc::new(TracingSink::new()))?;

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            trigger.trigger();
        }
    });

    let summary = trading_loop.run(shutdown).await?;

    info!(
        cycles = summary.cycles,
        skipped = summary.skipped_cycles,
        executed = summary.actions_executed,
        failed = summary.actions_failed,
        balance = %broker.balance()?,
        "Run finished"
    );

    Ok(())
}
