//! Event-driven backtest loop.
//!
//! Phases run `Initialized → Running → Closing → Complete`. Each `step()`
//! advances by exactly one bar (or by the closing phase), so callers that
//! need cancellation drive `step()` themselves and stop between bars.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::context::StrategyContext;
use super::results::{BacktestResults, BacktestSummary, EquityPoint};
use super::strategy::{Signal, Strategy};
use crate::domain::{Bar, IdGen, Order, OrderRequest, OrderSide, Trade};
use crate::error::{DataError, EngineError, Rejection};
use crate::execution::FillSimulator;
use crate::ledger::Ledger;
use crate::risk::validate_order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestPhase {
    Initialized,
    Running,
    Closing,
    Complete,
}

impl fmt::Display for BacktestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Closing => "closing",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

pub struct BacktestEngine {
    config: EngineConfig,
    bars: Vec<Bar>,
    strategy: Box<dyn Strategy>,
    context: StrategyContext,
    ledger: Ledger,
    simulator: FillSimulator,
    ids: IdGen,
    phase: BacktestPhase,
    cursor: usize,
    trades: Vec<Trade>,
    orders: Vec<Order>,
    equity_curve: Vec<EquityPoint>,
}

impl BacktestEngine {
    /// Validate config and bars up front; nothing runs until `step()`.
    pub fn new(
        config: EngineConfig,
        bars: Vec<Bar>,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        validate_bars(&bars)?;
        let cost = config.cost_model()?;
        let ledger = Ledger::new(config.initial_capital);
        let first = &bars[0];
        let context = StrategyContext::new(
            first.symbol.clone(),
            first.timeframe,
            config.history_limit,
            ledger.snapshot(),
            config.risk_limits.clone(),
        );
        Ok(Self {
            simulator: FillSimulator::new(cost),
            context,
            ledger,
            strategy,
            bars,
            config,
            ids: IdGen::default(),
            phase: BacktestPhase::Initialized,
            cursor: 0,
            trades: Vec::new(),
            orders: Vec::new(),
            equity_curve: Vec::new(),
        })
    }

    pub fn phase(&self) -> BacktestPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == BacktestPhase::Complete
    }

    /// `(bars processed, total bars)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.bars.len())
    }

    pub fn context(&self) -> &StrategyContext {
        &self.context
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance by one bar, or run the closing phase once bars are exhausted.
    pub fn step(&mut self) -> Result<BacktestPhase, EngineError> {
        match self.phase {
            BacktestPhase::Initialized => {
                self.initialize()?;
                self.process_next_bar()?;
            }
            BacktestPhase::Running => self.process_next_bar()?,
            BacktestPhase::Closing => self.close_out()?,
            BacktestPhase::Complete => return Err(EngineError::AlreadyComplete),
        }
        Ok(self.phase)
    }

    /// Process every remaining bar, then close out.
    pub fn run(&mut self) -> Result<(), EngineError> {
        while matches!(
            self.phase,
            BacktestPhase::Initialized | BacktestPhase::Running
        ) {
            self.step()?;
        }
        self.finish()
    }

    /// Step until `stop` returns true (checked after each bar) or the bars
    /// run out. Does not close out; call `finish()` for that.
    pub fn run_until<F>(&mut self, mut stop: F) -> Result<BacktestPhase, EngineError>
    where
        F: FnMut(&StrategyContext) -> bool,
    {
        while matches!(
            self.phase,
            BacktestPhase::Initialized | BacktestPhase::Running
        ) {
            self.step()?;
            if stop(&self.context) {
                break;
            }
        }
        Ok(self.phase)
    }

    /// Stop consuming bars and close every open position at the last
    /// processed close.
    pub fn finish(&mut self) -> Result<(), EngineError> {
        match self.phase {
            BacktestPhase::Complete => Err(EngineError::AlreadyComplete),
            BacktestPhase::Initialized => {
                self.phase = BacktestPhase::Complete;
                Ok(())
            }
            BacktestPhase::Running | BacktestPhase::Closing => {
                self.phase = BacktestPhase::Closing;
                self.close_out()
            }
        }
    }

    pub fn results(&self) -> BacktestResults {
        BacktestResults {
            trades: self.trades.clone(),
            orders: self.orders.clone(),
            equity_curve: self.equity_curve.clone(),
            final_portfolio: self.ledger.snapshot(),
            summary: self.summary(),
        }
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        self.strategy
            .initialize(&mut self.context)
            .map_err(|e| EngineError::StrategyInit {
                name: self.strategy.name().to_string(),
                reason: e.to_string(),
            })?;
        self.context
            .indicators_mut()
            .set_history_limit(self.config.history_limit);
        info!(
            "Starting backtest: strategy={} symbol={} bars={} capital={}",
            self.strategy.name(),
            self.context.symbol(),
            self.bars.len(),
            self.config.initial_capital
        );
        self.phase = BacktestPhase::Running;
        Ok(())
    }

    fn process_next_bar(&mut self) -> Result<(), EngineError> {
        let index = self.cursor;
        let bar = self.bars[index].clone();

        self.context.advance(&bar, index);
        self.ledger.mark_price(&bar.symbol, bar.close);
        self.context.set_portfolio(self.ledger.snapshot());

        let signals = self.strategy.on_candle(&bar, &self.context);
        for signal in signals {
            self.process_signal(signal, &bar, false)?;
        }

        self.record_equity(&bar);
        self.cursor += 1;
        if self.cursor == self.bars.len() {
            self.phase = BacktestPhase::Closing;
        }
        Ok(())
    }

    fn close_out(&mut self) -> Result<(), EngineError> {
        if let Some(bar) = self.cursor.checked_sub(1).map(|i| self.bars[i].clone()) {
            let exits: Vec<Signal> = self
                .ledger
                .positions()
                .map(|p| {
                    Signal::sell(p.symbol.clone())
                        .with_quantity(p.quantity)
                        .with_reason("end of data")
                })
                .collect();
            for signal in exits {
                self.process_signal(signal, &bar, true)?;
            }
            self.record_equity(&bar);
        }
        self.phase = BacktestPhase::Complete;

        let summary = self.summary();
        info!(
            "Backtest complete: final_equity={:.2} return={:.4} trades={} rejected={}",
            summary.final_equity,
            summary.total_return,
            summary.trades_executed,
            summary.orders_rejected
        );
        Ok(())
    }

    /// Turn one signal into a recorded order. Rejections are recorded and
    /// logged; only ledger invariant breaches abort the run.
    fn process_signal(
        &mut self,
        signal: Signal,
        bar: &Bar,
        is_exit: bool,
    ) -> Result<(), EngineError> {
        let order_id = self.ids.next_order_id();
        let snapshot = self.ledger.snapshot();

        let quantity = match (signal.quantity, signal.side) {
            (Some(q), _) => q,
            (None, OrderSide::Buy) => self
                .config
                .sizing
                .quantity(snapshot.equity, signal.limit_price.unwrap_or(bar.close)),
            (None, OrderSide::Sell) => snapshot
                .position(&signal.symbol)
                .map_or(0.0, |p| p.quantity),
        };
        let request = OrderRequest {
            symbol: signal.symbol.clone(),
            side: signal.side,
            quantity,
            limit_price: signal.limit_price,
            timestamp: bar.timestamp,
        };

        let quote = self.simulator.quote(&request, bar);
        let verdict = pre_check(&signal, &request, bar, snapshot.has_position(&request.symbol))
            .and_then(|()| {
                validate_order(&request, &quote, &snapshot, &self.config.risk_limits, is_exit)
            });

        if let Err(rejection) = verdict {
            warn!(
                "Rejected {} {} {:.4} @ bar {}: {}",
                order_id, request.side, request.quantity, self.cursor, rejection
            );
            self.orders
                .push(Order::rejected(order_id, request, rejection.to_string()));
            return Ok(());
        }

        let trade_id = self.ids.next_trade_id();
        let trade = self
            .simulator
            .execute(trade_id, order_id, &request, &quote, &snapshot);
        let transition = self.ledger.apply_trade(&trade)?;
        debug!(
            "Filled {} {} {:.4} {} @ {:.4} (commission {:.4}, {:?}) {}",
            trade_id,
            trade.side,
            trade.quantity,
            trade.symbol,
            trade.price,
            trade.commission,
            transition,
            signal.reason
        );

        self.trades.push(trade);
        self.orders.push(Order::filled(order_id, request, trade_id));
        self.context.set_portfolio(self.ledger.snapshot());
        self.strategy.on_order_filled(order_id, &self.context);
        Ok(())
    }

    fn record_equity(&mut self, bar: &Bar) {
        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: self.ledger.equity(),
            cash: self.ledger.cash(),
        });
    }

    fn summary(&self) -> BacktestSummary {
        let initial = self.ledger.initial_capital();
        let final_equity = self.ledger.equity();
        let processed = &self.bars[..self.cursor];
        let start = processed.first().map(|b| b.timestamp);
        let end = processed.last().map(|b| b.timestamp);
        let duration_ms = match (start, end) {
            (Some(s), Some(e)) => (e - s).num_milliseconds(),
            _ => 0,
        };
        let rejected = self.orders.iter().filter(|o| !o.is_filled()).count();
        BacktestSummary {
            strategy: self.strategy.name().to_string(),
            symbol: self.context.symbol().to_string(),
            initial_capital: initial,
            final_equity,
            total_return: (final_equity - initial) / initial,
            realized_pnl: self.ledger.realized_pnl(),
            total_commission: self.ledger.total_commission(),
            total_slippage: self.ledger.total_slippage(),
            bars_processed: self.cursor,
            orders_submitted: self.orders.len(),
            orders_rejected: rejected,
            trades_executed: self.trades.len(),
            start,
            end,
            duration_ms,
        }
    }
}

impl fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("strategy", &self.strategy.name())
            .field("phase", &self.phase)
            .field("cursor", &self.cursor)
            .field("bars", &self.bars.len())
            .field("trades", &self.trades.len())
            .finish()
    }
}

/// Checks that need the signal itself rather than the order.
fn pre_check(
    signal: &Signal,
    request: &OrderRequest,
    bar: &Bar,
    held: bool,
) -> Result<(), Rejection> {
    if request.symbol != bar.symbol {
        return Err(Rejection::SymbolMismatch {
            signal: request.symbol.clone(),
            bar: bar.symbol.clone(),
        });
    }
    match request.side {
        OrderSide::Sell if !held => Err(Rejection::ShortNotSupported(request.symbol.clone())),
        OrderSide::Buy if signal.quantity.is_none() && request.quantity <= 0.0 => {
            Err(Rejection::ZeroSize)
        }
        _ => Ok(()),
    }
}

/// Non-empty, one symbol, sane OHLC, strictly increasing timestamps.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    let first = bars.first().ok_or(DataError::Empty)?;
    for (index, bar) in bars.iter().enumerate() {
        if bar.symbol != first.symbol {
            return Err(DataError::MixedSymbols {
                index,
                expected: first.symbol.clone(),
                found: bar.symbol.clone(),
            });
        }
        if !bar.is_sane() {
            return Err(DataError::InvalidBar { index });
        }
        if index > 0 {
            let previous = &bars[index - 1];
            if bar.timestamp <= previous.timestamp {
                return Err(DataError::NonMonotonic {
                    index,
                    previous: previous.timestamp.to_rfc3339(),
                    current: bar.timestamp.to_rfc3339(),
                });
            }
        }
    }
    Ok(())
}
