//! Report export — JSON and CSV artifacts.
//!
//! - **JSON**: the full `BacktestReport`, with a schema version checked on load
//! - **CSV**: fill tape and bar-level equity curve for external tools

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use quantbench_core::domain::Trade;
use quantbench_core::engine::EquityPoint;

use crate::report::format_report;
use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Parse a report, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: id, order_id, timestamp, symbol, side, quantity, price,
/// commission, slippage, realized_pnl (empty for opening fills).
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "order_id",
        "timestamp",
        "symbol",
        "side",
        "quantity",
        "price",
        "commission",
        "slippage",
        "realized_pnl",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.id.0.to_string(),
            &t.order_id.0.to_string(),
            &t.timestamp.to_rfc3339(),
            &t.symbol,
            &t.side.to_string(),
            &format!("{:.6}", t.quantity),
            &format!("{:.6}", t.price),
            &format!("{:.6}", t.commission),
            &format!("{:.6}", t.slippage),
            &t.realized_pnl.map(|p| format!("{p:.6}")).unwrap_or_default(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "timestamp", "equity", "cash"])?;
    for (i, p) in curve.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &p.timestamp.to_rfc3339(),
            &format!("{:.6}", p.equity),
            &format!("{:.6}", p.cash),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the artifact set for one run into `output_dir/<run_id prefix>/`:
/// `report.json`, `trades.csv`, `equity.csv` and `report.txt`.
///
/// Returns the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix = report.run_id.get(..16).unwrap_or(&report.run_id);
    let run_dir = output_dir.join(format!("{}_{prefix}", report.results.summary.symbol));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("trades.csv"),
        export_trades_csv(&report.results.trades)?,
    )?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&report.results.equity_curve)?,
    )?;
    std::fs::write(run_dir.join("report.txt"), format_report(report))?;

    Ok(run_dir)
}
