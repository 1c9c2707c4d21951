//! Plain-text report formatting: a summary block and a trade table.

use std::fmt;

use quantbench_core::domain::Trade;

use crate::runner::BacktestReport;

/// Summary block for one run.
pub struct Summary<'a>(pub &'a BacktestReport);

/// Fixed-width table of every fill.
pub struct TradeTable<'a>(pub &'a [Trade]);

/// Summary followed by the trade table.
pub fn format_report(report: &BacktestReport) -> String {
    format!("{}\n{}", Summary(report), TradeTable(&report.results.trades))
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0.results.summary;
        let m = &self.0.metrics;
        let t = &m.trades;

        writeln!(f, "=== Backtest Result ===")?;
        writeln!(f, "Run:            {}", self.0.run_id)?;
        writeln!(f, "Strategy:       {}", s.strategy)?;
        writeln!(f, "Symbol:         {} ({})", s.symbol, self.0.config.backtest.timeframe)?;
        match (s.start, s.end) {
            (Some(start), Some(end)) => writeln!(
                f,
                "Period:         {} to {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            )?,
            _ => writeln!(f, "Period:         n/a")?,
        }
        writeln!(f, "Bars:           {}", s.bars_processed)?;
        writeln!(
            f,
            "Orders:         {} ({} rejected)",
            s.orders_submitted, s.orders_rejected
        )?;
        writeln!(f, "Fills:          {}", s.trades_executed)?;
        writeln!(f)?;
        writeln!(f, "--- Account ---")?;
        writeln!(f, "Initial:        {:.2}", s.initial_capital)?;
        writeln!(f, "Final:          {:.2}", s.final_equity)?;
        writeln!(f, "Realized P&L:   {:.2}", s.realized_pnl)?;
        writeln!(f, "Commission:     {:.2}", s.total_commission)?;
        writeln!(f, "Slippage:       {:.2}", s.total_slippage)?;
        writeln!(f)?;
        writeln!(f, "--- Performance ---")?;
        writeln!(f, "Total Return:   {:.2}%", m.total_return * 100.0)?;
        writeln!(f, "Annualized:     {:.2}%", m.annualized_return * 100.0)?;
        writeln!(f, "Volatility:     {:.2}%", m.volatility * 100.0)?;
        writeln!(f, "Sharpe:         {}", ratio(m.annualized_sharpe))?;
        writeln!(f, "Sortino:        {}", ratio(m.sortino_ratio))?;
        writeln!(f, "Calmar:         {}", ratio(m.calmar_ratio))?;
        writeln!(
            f,
            "Max Drawdown:   {:.2}% ({:.2})",
            m.max_drawdown.fraction * 100.0,
            m.max_drawdown.amount
        )?;
        let confidence = self.0.tail.confidence * 100.0;
        writeln!(f, "VaR {confidence:.0}%:        {:.2}%", m.value_at_risk * 100.0)?;
        writeln!(
            f,
            "CVaR {confidence:.0}%:       {:.2}%",
            m.conditional_value_at_risk * 100.0
        )?;
        writeln!(f)?;
        writeln!(f, "--- Trades ---")?;
        writeln!(
            f,
            "Closed:         {} ({} won, {} lost)",
            t.total_trades, t.winning_trades, t.losing_trades
        )?;
        writeln!(f, "Win Rate:       {:.1}%", t.win_rate * 100.0)?;
        writeln!(f, "Profit Factor:  {}", ratio(t.profit_factor))?;
        writeln!(f, "Expectancy:     {:.2}", t.expectancy)?;
        writeln!(f, "Avg Win/Loss:   {:.2} / {:.2}", t.average_win, t.average_loss)?;
        writeln!(f, "Largest W/L:    {:.2} / {:.2}", t.largest_win, t.largest_loss)?;
        writeln!(
            f,
            "Max Streak W/L: {} / {}",
            t.max_consecutive_wins, t.max_consecutive_losses
        )
    }
}

impl fmt::Display for TradeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:<17} {:<8} {:<4} {:>12} {:>12} {:>10} {:>12}",
            "Id", "Time", "Symbol", "Side", "Qty", "Price", "Comm", "P&L"
        )?;
        writeln!(f, "{}", "-".repeat(88))?;
        if self.0.is_empty() {
            return writeln!(f, "(no trades)");
        }
        for t in self.0 {
            let pnl = t
                .realized_pnl
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<6} {:<17} {:<8} {:<4} {:>12.4} {:>12.4} {:>10.2} {:>12}",
                t.id.0,
                t.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                t.symbol,
                t.side.to_string(),
                t.quantity,
                t.price,
                t.commission,
                pnl
            )?;
        }
        Ok(())
    }
}

fn ratio(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{v:.3}")
    }
}
