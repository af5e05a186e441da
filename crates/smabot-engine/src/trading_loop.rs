//! Poll, decide, execute, sleep.

use serde::Serialize;
use smabot_core::error::{BrokerError, DataError, TradingError};
use smabot_core::traits::{BrokerPort, CycleSink, MarketDataPort};
use smabot_core::types::{
    Action, ActionOutcome, CycleReport, ExecutionResult, OrderRequest, PositionSide, Ticket,
};
use smabot_strategy::{PositionReconciler, SignalEngine};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{LoopConfig, OpenGate};
use crate::shutdown::Shutdown;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Idle,
    Polling,
    Deciding,
    Executing,
    Sleeping,
    Stopped,
}

/// Totals over one `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoopSummary {
    /// Cycles completed
    pub cycles: u64,
    /// Cycles that stopped before executing
    pub skipped_cycles: u64,
    /// Actions the broker executed
    pub actions_executed: usize,
    /// Actions the broker failed or rejected
    pub actions_failed: usize,
}

impl LoopSummary {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.skipped.is_some() {
            self.skipped_cycles += 1;
        }
        self.actions_executed += report.executed_count();
        self.actions_failed += report.failed_count();
    }
}

/// Drives one symbol against a broker session.
///
/// Runs on a single task: every port call is awaited in turn and no two
/// broker requests are ever in flight together.
pub struct TradingLoop {
    config: LoopConfig,
    broker: Arc<dyn BrokerPort>,
    data: Arc<dyn MarketDataPort>,
    sink: Arc<dyn CycleSink>,
    signal_engine: SignalEngine,
    reconciler: PositionReconciler,
    state: LoopState,
    cycle: u64,
}

impl TradingLoop {
    /// Create a loop, rejecting a zero SMA window or a non-positive volume.
    pub fn new(
        config: LoopConfig,
        broker: Arc<dyn BrokerPort>,
        data: Arc<dyn MarketDataPort>,
        sink: Arc<dyn CycleSink>,
    ) -> Result<Self, TradingError> {
        if config.symbol.is_empty() {
            return Err(TradingError::Config("symbol must not be empty".to_string()));
        }
        let signal_engine = SignalEngine::new(config.sma_period)?;
        let reconciler = PositionReconciler::new(config.volume)?;

        Ok(Self {
            config,
            broker,
            data,
            sink,
            signal_engine,
            reconciler,
            state: LoopState::Idle,
            cycle: 0,
        })
    }

    /// Settings the loop was built with.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Current state of the loop.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Open the session and run cycles until shutdown or `max_cycles`.
    ///
    /// A failed connect or login is returned as an error and no cycle runs.
    /// Once connected, the session is released on every way out.
    pub async fn run(&mut self, mut shutdown: Shutdown) -> Result<LoopSummary, TradingError> {
        let limit = self.config.call_timeout;

        let connected = broker_call(limit, "connect", self.broker.connect()).await;
        if let Err(e) = connected {
            error!(broker = self.broker.name(), error = %e, "Failed to open terminal session");
            self.state = LoopState::Stopped;
            return Err(e.into());
        }

        let account = broker_call(limit, "account_info", self.broker.account_info()).await;
        let account = match account {
            Ok(account) => account,
            Err(e) => {
                error!(error = %e, "Failed to read account after login");
                self.release().await;
                return Err(e.into());
            }
        };
        self.sink.on_startup(self.broker.name(), &account);

        info!(
            symbol = %self.config.symbol,
            timeframe = %self.config.timeframe,
            window = self.config.sma_period,
            volume = %self.config.volume,
            gate = %self.config.open_gate,
            "Trading loop started"
        );

        let mut summary = LoopSummary::default();
        loop {
            if shutdown.is_triggered() {
                info!("Shutdown requested");
                break;
            }
            if self.cycles_exhausted(&summary) {
                break;
            }

            let report = self.run_cycle().await;
            summary.record(&report);
            self.sink.on_cycle(&report);

            if self.cycles_exhausted(&summary) {
                break;
            }

            self.state = LoopState::Sleeping;
            tokio::select! {
                _ = shutdown.triggered() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        self.release().await;
        self.sink.on_shutdown(summary.cycles);
        Ok(summary)
    }

    fn cycles_exhausted(&self, summary: &LoopSummary) -> bool {
        self.config.max_cycles.is_some_and(|max| summary.cycles >= max)
    }

    async fn release(&mut self) {
        self.state = LoopState::Stopped;
        let released =
            broker_call(self.config.call_timeout, "disconnect", self.broker.disconnect()).await;
        match released {
            Ok(()) => debug!("Terminal session released"),
            Err(e) => warn!(error = %e, "Failed to release terminal session"),
        }
    }

    /// Run a single poll/decide/execute pass.
    ///
    /// Failures never escape: they end up in the report as a skip reason or
    /// as failed action outcomes.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let mut report = CycleReport::new(self.cycle, &self.config.symbol);
        let limit = self.config.call_timeout;
        let symbol = self.config.symbol.as_str();

        self.state = LoopState::Polling;
        match broker_call(limit, "get_account_exposure", self.broker.get_account_exposure(symbol))
            .await
        {
            Ok(exposure) => report.exposure = Some(exposure),
            Err(e) => debug!(error = %e, "Exposure unavailable"),
        }

        let bars = match data_call(
            limit,
            "get_recent_bars",
            self.data
                .get_recent_bars(symbol, self.config.timeframe, self.config.sma_period),
        )
        .await
        {
            Ok(bars) => bars,
            Err(e) => {
                report.skipped = Some(format!("bars unavailable: {e}"));
                return report;
            }
        };

        self.state = LoopState::Deciding;
        let signal = match self.signal_engine.evaluate(&bars) {
            Ok(signal) => signal,
            Err(e) => {
                report.skipped = Some(e.to_string());
                return report;
            }
        };
        report.signal = Some(signal.clone());

        let positions =
            match broker_call(limit, "get_open_positions", self.broker.get_open_positions(Some(symbol)))
                .await
            {
                Ok(positions) => positions,
                Err(e) => {
                    report.skipped = Some(format!("positions unavailable: {e}"));
                    return report;
                }
            };

        let has_open_elsewhere = match self.config.open_gate {
            OpenGate::Symbol => false,
            OpenGate::Account => {
                match broker_call(limit, "get_open_positions", self.broker.get_open_positions(None))
                    .await
                {
                    Ok(all) => all.iter().any(|p| p.symbol != symbol),
                    Err(e) => {
                        report.skipped = Some(format!("account positions unavailable: {e}"));
                        return report;
                    }
                }
            }
        };

        let actions = self
            .reconciler
            .reconcile(&signal, &positions, has_open_elsewhere);
        if actions.is_empty() {
            return report;
        }

        self.state = LoopState::Executing;
        let mut closure_failed = false;
        for action in actions {
            let result = match &action {
                Action::ClosePosition { ticket } => {
                    let result = self.close(*ticket).await;
                    if !matches!(&result, ExecutionResult::Executed(r) if r.is_done()) {
                        closure_failed = true;
                    }
                    result
                }
                Action::OpenPosition { .. } if closure_failed => {
                    ExecutionResult::Skipped("a closure failed this cycle".to_string())
                }
                Action::OpenPosition { side, volume } => self.open(*side, *volume).await,
            };
            report.actions.push(ActionOutcome::new(action, result));
        }

        report
    }

    async fn close(&self, ticket: Ticket) -> ExecutionResult {
        let limit = self.config.call_timeout;
        match broker_call(limit, "close_position", self.broker.close_position(ticket)).await {
            Ok(result) => ExecutionResult::Executed(result),
            Err(e) => ExecutionResult::Failed(e),
        }
    }

    async fn open(&self, side: PositionSide, volume: Decimal) -> ExecutionResult {
        let limit = self.config.call_timeout;
        let symbol = self.config.symbol.as_str();

        let tick = match broker_call(limit, "get_tick", self.broker.get_tick(symbol)).await {
            Ok(tick) => tick,
            Err(e) => return ExecutionResult::Failed(e),
        };

        let request = OrderRequest::market(
            symbol,
            side.opening_side(),
            volume,
            &tick,
            self.config.deviation,
        )
        .with_magic(self.config.magic)
        .with_comment(self.config.comment.clone());

        match broker_call(limit, "submit_order", self.broker.submit_order(request)).await {
            Ok(result) => ExecutionResult::Executed(result),
            Err(e) => ExecutionResult::Failed(e),
        }
    }
}

fn limit_ms(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

/// Await a broker call, bounded by `limit` when one is set.
async fn broker_call<T>(
    limit: Option<Duration>,
    operation: &str,
    call: impl Future<Output = Result<T, BrokerError>>,
) -> Result<T, BrokerError> {
    let Some(limit) = limit else {
        return call.await;
    };
    timeout(limit, call).await.unwrap_or_else(|_| {
        Err(BrokerError::Timeout {
            operation: operation.to_string(),
            after_ms: limit_ms(limit),
        })
    })
}

/// Await a market data call, bounded by `limit` when one is set.
async fn data_call<T>(
    limit: Option<Duration>,
    operation: &str,
    call: impl Future<Output = Result<T, DataError>>,
) -> Result<T, DataError> {
    let Some(limit) = limit else {
        return call.await;
    };
    timeout(limit, call).await.unwrap_or_else(|_| {
        Err(DataError::Timeout {
            operation: operation.to_string(),
            after_ms: limit_ms(limit),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::{shutdown_channel, ShutdownTrigger};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use smabot_broker::{PaperBroker, PaperConfig};
    use smabot_core::types::{
        AccountInfo, Bar, Direction, OrderResult, OrderStatus, Position, Side, Tick, Timeframe,
    };
    use std::sync::Mutex;

    // ── Scripted ports ───────────────────────────────────────────────

    struct StaticBars {
        bars: Vec<Bar>,
    }

    impl StaticBars {
        fn new(closes: &[Decimal]) -> Arc<Self> {
            let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar::flat(start + ChronoDuration::minutes(i as i64), c))
                .collect();
            Arc::new(Self { bars })
        }
    }

    #[async_trait]
    impl MarketDataPort for StaticBars {
        async fn get_recent_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            count: usize,
        ) -> Result<Vec<Bar>, DataError> {
            let start = self.bars.len().saturating_sub(count);
            Ok(self.bars[start..].to_vec())
        }

        fn name(&self) -> &str {
            "Static"
        }
    }

    struct HangingBars;

    #[async_trait]
    impl MarketDataPort for HangingBars {
        async fn get_recent_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _count: usize,
        ) -> Result<Vec<Bar>, DataError> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "Hanging"
        }
    }

    /// Paper terminal whose counter-orders always come back with `close_result`.
    struct ScriptedCloses {
        inner: PaperBroker,
        close_result: Result<OrderResult, BrokerError>,
    }

    #[async_trait]
    impl BrokerPort for ScriptedCloses {
        async fn connect(&self) -> Result<(), BrokerError> {
            self.inner.connect().await
        }
        async fn disconnect(&self) -> Result<(), BrokerError> {
            self.inner.disconnect().await
        }
        async fn account_info(&self) -> Result<AccountInfo, BrokerError> {
            self.inner.account_info().await
        }
        async fn get_tick(&self, symbol: &str) -> Result<Tick, BrokerError> {
            self.inner.get_tick(symbol).await
        }
        async fn get_open_positions(
            &self,
            symbol: Option<&str>,
        ) -> Result<Vec<Position>, BrokerError> {
            self.inner.get_open_positions(symbol).await
        }
        async fn submit_order(&self, request: OrderRequest) -> Result<OrderResult, BrokerError> {
            self.inner.submit_order(request).await
        }
        async fn close_position(&self, _ticket: Ticket) -> Result<OrderResult, BrokerError> {
            self.close_result.clone()
        }
        fn name(&self) -> &str {
            "Scripted"
        }
    }

    struct UnreachableTerminal;

    #[async_trait]
    impl BrokerPort for UnreachableTerminal {
        async fn connect(&self) -> Result<(), BrokerError> {
            Err(BrokerError::Connection("terminal not running".to_string()))
        }
        async fn disconnect(&self) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn account_info(&self) -> Result<AccountInfo, BrokerError> {
            unreachable!("no session")
        }
        async fn get_tick(&self, _symbol: &str) -> Result<Tick, BrokerError> {
            unreachable!("no session")
        }
        async fn get_open_positions(
            &self,
            _symbol: Option<&str>,
        ) -> Result<Vec<Position>, BrokerError> {
            unreachable!("no session")
        }
        async fn submit_order(&self, _request: OrderRequest) -> Result<OrderResult, BrokerError> {
            unreachable!("no session")
        }
        async fn close_position(&self, _ticket: Ticket) -> Result<OrderResult, BrokerError> {
            unreachable!("no session")
        }
        fn name(&self) -> &str {
            "Unreachable"
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        started: Mutex<Option<String>>,
        reports: Mutex<Vec<CycleReport>>,
        stopped_after: Mutex<Option<u64>>,
        stop_on_first_cycle: Option<ShutdownTrigger>,
    }

    impl CycleSink for RecordingSink {
        fn on_startup(&self, broker: &str, _account: &AccountInfo) {
            *self.started.lock().unwrap() = Some(broker.to_string());
        }

        fn on_cycle(&self, report: &CycleReport) {
            self.reports.lock().unwrap().push(report.clone());
            if let Some(trigger) = &self.stop_on_first_cycle {
                trigger.trigger();
            }
        }

        fn on_shutdown(&self, cycles: u64) {
            *self.stopped_after.lock().unwrap() = Some(cycles);
        }
    }

    // ── Fixtures ─────────────────────────────────────────────────────

    fn rising() -> Arc<StaticBars> {
        StaticBars::new(&[
            dec!(1.10), dec!(1.11), dec!(1.12), dec!(1.09), dec!(1.08),
            dec!(1.07), dec!(1.06), dec!(1.05), dec!(1.04), dec!(1.20),
        ])
    }

    async fn paper() -> Arc<PaperBroker> {
        let broker = Arc::new(PaperBroker::new(PaperConfig::default()));
        broker.connect().await.unwrap();
        broker.set_quote("EURUSD", dec!(1.20000), dec!(1.20020)).unwrap();
        broker
    }

    /// Paper terminal holding one EURUSD short, with scripted closes.
    async fn short_with_closes(
        close_result: Result<OrderResult, BrokerError>,
    ) -> (Arc<ScriptedCloses>, Ticket) {
        let inner = PaperBroker::new(PaperConfig::default());
        inner.connect().await.unwrap();
        inner.set_quote("EURUSD", dec!(1.20000), dec!(1.20020)).unwrap();
        let ticket = seed(&inner, "EURUSD", Side::Sell).await;
        (Arc::new(ScriptedCloses { inner, close_result }), ticket)
    }

    async fn seed(broker: &PaperBroker, symbol: &str, side: Side) -> Ticket {
        let tick = broker.get_tick(symbol).await.unwrap();
        let request = OrderRequest::market(symbol, side, dec!(1.0), &tick, 20);
        broker.submit_order(request).await.unwrap().ticket.unwrap()
    }

    fn trading_loop(
        config: LoopConfig,
        broker: Arc<dyn BrokerPort>,
        data: Arc<dyn MarketDataPort>,
    ) -> TradingLoop {
        TradingLoop::new(config, broker, data, Arc::new(RecordingSink::default())).unwrap()
    }

    // ── Cycles ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_buy_signal_opens_long() {
        let broker = paper().await;
        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());

        let report = engine.run_cycle().await;

        let signal = report.signal.as_ref().unwrap();
        assert_eq!(signal.direction, Direction::Buy);
        assert_eq!(signal.moving_average, dec!(1.092));
        assert_eq!(report.exposure, Some(Decimal::ZERO));
        assert_eq!(report.executed_count(), 1);

        let positions = broker.get_open_positions(Some("EURUSD")).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].side, PositionSide::Long);
        assert_eq!(positions[0].magic, 100);
        assert_eq!(positions[0].open_price, dec!(1.20020));
    }

    #[tokio::test]
    async fn test_buy_signal_reverses_short() {
        let broker = paper().await;
        let short = seed(&broker, "EURUSD", Side::Sell).await;
        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());

        let report = engine.run_cycle().await;

        let actions: Vec<&Action> = report.actions.iter().map(|o| &o.action).collect();
        assert_eq!(
            actions,
            vec![
                &Action::ClosePosition { ticket: short },
                &Action::OpenPosition {
                    side: PositionSide::Long,
                    volume: dec!(1.0)
                },
            ]
        );
        assert_eq!(report.executed_count(), 2);
        assert_eq!(report.exposure, Some(dec!(1.0)));

        let positions = broker.get_open_positions(None).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_long());
    }

    #[tokio::test]
    async fn test_existing_long_is_left_alone() {
        let broker = paper().await;
        seed(&broker, "EURUSD", Side::Buy).await;
        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());

        let report = engine.run_cycle().await;
        assert!(report.actions.is_empty());
        assert!(report.skipped.is_none());

        // A second pass over the same market decides the same thing
        let report = engine.run_cycle().await;
        assert!(report.actions.is_empty());
        assert_eq!(report.cycle, 2);
        assert_eq!(broker.positions_total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_short_series_skips_cycle() {
        let broker = paper().await;
        let data = StaticBars::new(&[dec!(1.1), dec!(1.2), dec!(1.3)]);
        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), data);

        let report = engine.run_cycle().await;

        assert!(report.signal.is_none());
        assert!(report.actions.is_empty());
        assert!(report.skipped.unwrap().contains("need 10 bars, have 3"));
        assert_eq!(broker.positions_total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_closure_blocks_opening() {
        let (broker, _) =
            short_with_closes(Err(BrokerError::rejected(10018, "market closed"))).await;

        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());
        let report = engine.run_cycle().await;

        assert_eq!(report.actions.len(), 2);
        assert!(matches!(
            report.actions[0].result,
            ExecutionResult::Failed(BrokerError::OrderRejected { code: Some(10018), .. })
        ));
        assert!(matches!(report.actions[1].result, ExecutionResult::Skipped(_)));
        assert_eq!(report.failed_count(), 1);

        // Still only the original short
        let positions = broker.get_open_positions(None).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_short());
    }

    #[tokio::test]
    async fn test_unknown_ticket_on_close_blocks_opening() {
        let (broker, short) = short_with_closes(Err(BrokerError::UnknownTicket(Ticket(999)))).await;
        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());

        for cycle in 1..=2 {
            let report = engine.run_cycle().await;
            assert_eq!(report.cycle, cycle);
            assert_eq!(report.actions.len(), 2);
            assert_eq!(report.actions[0].action, Action::ClosePosition { ticket: short });
            assert!(matches!(
                report.actions[0].result,
                ExecutionResult::Failed(BrokerError::UnknownTicket(_))
            ));
            assert!(matches!(report.actions[1].result, ExecutionResult::Skipped(_)));
            assert_eq!(report.executed_count(), 0);
        }

        assert_eq!(broker.positions_total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unfilled_close_blocks_opening() {
        for status in [OrderStatus::Placed, OrderStatus::Rejected] {
            let unfilled = OrderResult {
                ticket: None,
                status,
                error_code: (status == OrderStatus::Rejected).then_some(10004),
                volume: Decimal::ZERO,
                price: Decimal::ZERO,
                comment: format!("close {status}"),
            };
            let (broker, _) = short_with_closes(Ok(unfilled.clone())).await;
            let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());

            let report = engine.run_cycle().await;
            assert_eq!(report.actions[0].result, ExecutionResult::Executed(unfilled));
            assert!(matches!(report.actions[1].result, ExecutionResult::Skipped(_)));
            assert_eq!(report.failed_count(), 1);

            // The next cycle decides and retries the same way
            let report = engine.run_cycle().await;
            assert_eq!(report.cycle, 2);
            assert!(matches!(report.actions[1].result, ExecutionResult::Skipped(_)));
            assert_eq!(broker.positions_total().await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_account_gate_blocks_opening_when_other_symbols_are_held() {
        let broker = paper().await;
        broker.set_quote("GBPUSD", dec!(1.27000), dec!(1.27020)).unwrap();
        seed(&broker, "GBPUSD", Side::Buy).await;

        let config = LoopConfig {
            open_gate: OpenGate::Account,
            ..LoopConfig::default()
        };
        let mut engine = trading_loop(config, broker.clone(), rising());
        assert!(engine.run_cycle().await.actions.is_empty());

        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());
        assert_eq!(engine.run_cycle().await.executed_count(), 1);
        assert_eq!(broker.positions_total().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rejected_open_is_reported_not_fatal() {
        let broker = Arc::new(PaperBroker::new(PaperConfig::default()));
        broker.connect().await.unwrap();
        let mut engine = trading_loop(LoopConfig::default(), broker.clone(), rising());

        // No quote published, so the tick lookup fails
        let report = engine.run_cycle().await;
        assert_eq!(report.failed_count(), 1);
        assert!(matches!(
            report.actions[0].result,
            ExecutionResult::Failed(BrokerError::SymbolNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_data_call_times_out() {
        let broker = paper().await;
        let mut engine = trading_loop(LoopConfig::default(), broker, Arc::new(HangingBars));

        let report = engine.run_cycle().await;
        let reason = report.skipped.unwrap();
        assert!(reason.contains("get_recent_bars timed out after 5000 ms"), "{reason}");
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let sink = Arc::new(RecordingSink::default());
        let mut engine = TradingLoop::new(
            LoopConfig::default(),
            Arc::new(UnreachableTerminal),
            rising(),
            sink.clone(),
        )
        .unwrap();
        let (_trigger, shutdown) = shutdown_channel();

        let err = engine.run(shutdown).await.unwrap_err();
        assert!(matches!(err, TradingError::Broker(BrokerError::Connection(_))));
        assert!(sink.started.lock().unwrap().is_none());
        assert!(sink.reports.lock().unwrap().is_empty());
        assert_eq!(engine.state(), LoopState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_after_max_cycles_and_disconnects() {
        let broker = Arc::new(PaperBroker::new(PaperConfig::default()));
        broker.set_quote("EURUSD", dec!(1.20000), dec!(1.20020)).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let config = LoopConfig {
            max_cycles: Some(3),
            ..LoopConfig::default()
        };
        let mut engine = TradingLoop::new(config, broker.clone(), rising(), sink.clone()).unwrap();
        let (_trigger, shutdown) = shutdown_channel();

        let summary = engine.run(shutdown).await.unwrap();

        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.actions_executed, 1);
        assert_eq!(summary.actions_failed, 0);
        assert_eq!(sink.started.lock().unwrap().as_deref(), Some("Paper Terminal"));
        assert_eq!(sink.reports.lock().unwrap().len(), 3);
        assert_eq!(*sink.stopped_after.lock().unwrap(), Some(3));
        assert_eq!(engine.state(), LoopState::Stopped);
        assert!(broker.positions_total().await.unwrap_err().is_connection());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let broker = Arc::new(PaperBroker::new(PaperConfig::default()));
        broker.set_quote("EURUSD", dec!(1.20000), dec!(1.20020)).unwrap();
        let (trigger, shutdown) = shutdown_channel();
        let sink = Arc::new(RecordingSink {
            stop_on_first_cycle: Some(trigger),
            ..RecordingSink::default()
        });
        let config = LoopConfig {
            poll_interval: Duration::from_secs(3600),
            ..LoopConfig::default()
        };
        let mut engine = TradingLoop::new(config, broker, rising(), sink.clone()).unwrap();

        let summary = engine.run(shutdown).await.unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(*sink.stopped_after.lock().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_shutdown_before_start_runs_no_cycles() {
        let broker = Arc::new(PaperBroker::new(PaperConfig::default()));
        let (trigger, shutdown) = shutdown_channel();
        trigger.trigger();

        let mut engine = trading_loop(LoopConfig::default(), broker, rising());
        let summary = engine.run(shutdown).await.unwrap();
        assert_eq!(summary, LoopSummary::default());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let broker: Arc<dyn BrokerPort> = Arc::new(PaperBroker::new(PaperConfig::default()));
        let sink: Arc<dyn CycleSink> = Arc::new(RecordingSink::default());

        let zero_window = LoopConfig {
            sma_period: 0,
            ..LoopConfig::default()
        };
        assert!(TradingLoop::new(zero_window, broker.clone(), rising(), sink.clone()).is_err());

        let zero_volume = LoopConfig {
            volume: Decimal::ZERO,
            ..LoopConfig::default()
        };
        assert!(TradingLoop::new(zero_volume, broker, rising(), sink).is_err());
    }
}
