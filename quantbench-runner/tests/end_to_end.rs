//! End-to-end: TOML config on disk → run → artifacts on disk.

use std::fs;

use quantbench_core::data::{InMemoryBarSource, SyntheticBars};
use quantbench_core::domain::{OrderSide, Timeframe};
use quantbench_runner::{
    format_report, import_json, run_backtest, run_from_source, save_artifacts, BacktestConfig,
    ParamGrid, ParamSweep, RunError, StrategyConfig,
};

const CONFIG: &str = r#"
[backtest]
symbol = "BTCUSDT"
timeframe = "1h"
initial_capital = 25000.0
history_limit = 200

[execution]
slippage = 0.0005
commission_rate = 0.001

[risk]
max_positions = 1
max_position_size = 0.5

[sizing]
type = "PERCENT_OF_EQUITY"
fraction = 0.4

[strategy]
type = "RSI_REVERSION"
period = 14
oversold = 30.0
overbought = 70.0

[metrics]
var_confidence = 0.99
"#;

fn bars(n: usize) -> Vec<quantbench_core::domain::Bar> {
    SyntheticBars::new("BTCUSDT", Timeframe::OneHour)
        .seed(77)
        .volatility(0.015)
        .generate(n)
}

#[test]
fn config_file_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(&path, CONFIG).unwrap();

    let config = BacktestConfig::load(&path).unwrap();
    assert_eq!(config.metrics_options().periods_per_year, 365.0 * 24.0);

    let report = run_backtest(&config, bars(1_000)).unwrap();
    let s = &report.results.summary;
    assert_eq!(s.strategy, "rsi_reversion_14");
    assert_eq!(s.bars_processed, 1_000);
    assert!(report.results.final_portfolio.positions.is_empty());
    assert_eq!(report.tail.confidence, 0.99);

    // buys are sized at 40% of equity, inside the 50% cap
    let peak = report
        .results
        .equity_values()
        .into_iter()
        .fold(0.0_f64, f64::max);
    for t in report.results.trades.iter().filter(|t| t.side == OrderSide::Buy) {
        assert!(t.notional() <= 0.5 * peak);
    }

    let out = save_artifacts(&report, dir.path()).unwrap();
    for name in ["report.json", "trades.csv", "equity.csv", "report.txt"] {
        assert!(out.join(name).exists(), "missing {name}");
    }
    let back = import_json(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(back.run_id, report.run_id);
    assert_eq!(back.results.summary.trades_executed, s.trades_executed);
    assert!((back.results.summary.final_equity - s.final_equity).abs() < 1e-6);

    let text = fs::read_to_string(out.join("report.txt")).unwrap();
    assert_eq!(text, format_report(&report));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BacktestConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, RunError::Io(_)));
}

#[test]
fn source_backed_run_matches_direct_run() {
    let config = BacktestConfig::from_toml_str(CONFIG).unwrap();
    let all = bars(600);
    let (start, end) = (all[100].timestamp, all[500].timestamp);
    let source = InMemoryBarSource::new().with_series(all.clone()).unwrap();

    let via_source = run_from_source(&config, &source, start, end).unwrap();
    let direct = run_backtest(&config, all[100..500].to_vec()).unwrap();
    assert_eq!(via_source.results.trades, direct.results.trades);
    assert_eq!(via_source.metrics, direct.metrics);
}

#[test]
fn sweep_over_rsi_bands() {
    let base = BacktestConfig::from_toml_str(CONFIG).unwrap();
    let grid = ParamGrid::rsi_reversion(&[7, 14, 21], &[(25.0, 75.0), (30.0, 70.0)]);
    let results = ParamSweep::new().sweep(&grid, &base, &bars(800)).unwrap();
    assert_eq!(results.len(), 6);

    let ids: std::collections::HashSet<_> = results.all().iter().map(|r| &r.run_id).collect();
    assert_eq!(ids.len(), 6);
    for r in results.all() {
        assert!(matches!(r.config.strategy, StrategyConfig::RsiReversion { .. }));
        assert_eq!(r.results.summary.bars_processed, 800);
    }
}
