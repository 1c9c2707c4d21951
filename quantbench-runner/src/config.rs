//! Serializable backtest configuration.
//!
//! A run is fully described by a `BacktestConfig`, usually loaded from TOML:
//!
//! ```toml
//! [backtest]
//! symbol = "SPY"
//! timeframe = "1d"
//! initial_capital = 100000.0
//!
//! [execution]
//! slippage = 0.0005
//! commission_rate = 0.001
//!
//! [sizing]
//! type = "PERCENT_OF_EQUITY"
//! fraction = 0.25
//!
//! [strategy]
//! type = "MA_CROSSOVER"
//! fast_period = 10
//! slow_period = 30
//! ```
//!
//! Every section is optional and falls back to its `Default`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use quantbench_core::domain::Timeframe;
use quantbench_core::engine::{EngineConfig, Strategy};
use quantbench_core::error::ConfigError;
use quantbench_core::indicators::DEFAULT_HISTORY_LIMIT;
use quantbench_core::risk::RiskLimits;
use quantbench_core::sizing::PositionSizing;
use quantbench_core::strategies::{MaCrossover, RsiReversion};

use crate::metrics::MetricsOptions;
use crate::runner::RunError;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Everything needed to reproduce a backtest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub execution: ExecutionConfig,
    pub risk: RiskLimits,
    pub sizing: PositionSizing,
    pub strategy: StrategyConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub initial_capital: f64,
    /// Bars kept in the strategy context and values kept per indicator.
    pub history_limit: usize,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            timeframe: Timeframe::OneDay,
            initial_capital: 100_000.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Fill cost model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Fraction of price moved against the trader on each fill.
    pub slippage: f64,
    /// Fraction of fill notional charged per fill.
    pub commission_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    pub var_confidence: f64,
    /// Overrides the timeframe's default annualization factor.
    pub periods_per_year: Option<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            var_confidence: 0.95,
            periods_per_year: None,
        }
    }
}

/// Which built-in strategy to run, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Fast SMA crossing the slow SMA.
    MaCrossover {
        fast_period: usize,
        slow_period: usize,
    },

    /// Buy RSI dips below `oversold`, sell above `overbought`.
    RsiReversion {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MaCrossover {
            fast_period: 10,
            slow_period: 30,
        }
    }
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::MaCrossover { .. } => "ma_crossover",
            StrategyConfig::RsiReversion { .. } => "rsi_reversion",
        }
    }

    /// Fresh strategy instance. Each run owns its own.
    pub fn build(&self) -> Result<Box<dyn Strategy>, ConfigError> {
        Ok(match *self {
            StrategyConfig::MaCrossover {
                fast_period,
                slow_period,
            } => Box::new(MaCrossover::new(fast_period, slow_period)?),
            StrategyConfig::RsiReversion {
                period,
                oversold,
                overbought,
            } => Box::new(RsiReversion::new(period, oversold, overbought)?),
        })
    }
}

impl BacktestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, RunError> {
        let config: BacktestConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, RunError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks everything the engine and analytics would reject later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "backtest.symbol",
            });
        }
        self.to_engine_config().validate()?;
        self.build_strategy()?;

        let confidence = self.metrics.var_confidence;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "metrics.var_confidence",
                value: confidence,
                min: 0.0,
                max: 1.0,
            });
        }
        if !self.metrics.risk_free_rate.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "metrics.risk_free_rate",
                value: self.metrics.risk_free_rate,
                min: f64::MIN,
                max: f64::MAX,
            });
        }
        if let Some(ppy) = self.metrics.periods_per_year {
            if !(ppy.is_finite() && ppy > 0.0) {
                return Err(ConfigError::NonPositive {
                    component: "metrics",
                    param: "periods_per_year",
                    value: ppy,
                });
            }
        }
        Ok(())
    }

    /// Deterministic hash of the canonical JSON form.
    ///
    /// Two configs with identical content share a `RunId`.
    pub fn run_id(&self) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_capital)
            .with_costs(self.execution.slippage, self.execution.commission_rate)
            .with_risk_limits(self.risk.clone())
            .with_sizing(self.sizing.clone())
            .with_history_limit(self.backtest.history_limit)
    }

    pub fn build_strategy(&self) -> Result<Box<dyn Strategy>, ConfigError> {
        self.strategy.build()
    }

    pub fn metrics_options(&self) -> MetricsOptions {
        MetricsOptions {
            risk_free_rate: self.metrics.risk_free_rate,
            var_confidence: self.metrics.var_confidence,
            periods_per_year: self
                .metrics
                .periods_per_year
                .unwrap_or_else(|| self.backtest.timeframe.periods_per_year()),
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
symbol = "QQQ"
timeframe = "1h"
initial_capital = 50000.0

[execution]
slippage = 0.0005
commission_rate = 0.001

[risk]
max_positions = 3
max_position_size = 0.5

[sizing]
type = "FIXED_NOTIONAL"
amount = 5000.0

[strategy]
type = "RSI_REVERSION"
period = 14
oversold = 25.0
overbought = 75.0

[metrics]
risk_free_rate = 0.02
"#;

    #[test]
    fn parses_all_sections() {
        let config = BacktestConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.backtest.symbol, "QQQ");
        assert_eq!(config.backtest.timeframe, Timeframe::OneHour);
        assert_eq!(config.backtest.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.risk.max_positions, 3);
        // unspecified limits keep their defaults
        assert_eq!(config.risk.max_drawdown, 1.0);
        assert_eq!(config.sizing, PositionSizing::FixedNotional { amount: 5000.0 });
        assert_eq!(config.strategy.name(), "rsi_reversion");
        assert_eq!(config.metrics.var_confidence, 0.95);
    }

    #[test]
    fn empty_document_is_the_default() {
        let config = BacktestConfig::from_toml_str("").unwrap();
        assert_eq!(config, BacktestConfig::default());
    }

    #[test]
    fn run_id_is_deterministic() {
        let a = BacktestConfig::from_toml_str(SAMPLE).unwrap();
        let b = BacktestConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);
    }

    #[test]
    fn run_id_changes_with_parameters() {
        let a = BacktestConfig::default();
        let mut b = a.clone();
        b.execution.slippage = 0.001;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn toml_round_trip() {
        let config = BacktestConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(BacktestConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = BacktestConfig::default();
        config.backtest.initial_capital = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCapital(_))));

        let mut config = BacktestConfig::default();
        config.execution.commission_rate = 1.5;
        assert!(config.validate().is_err());

        let config = BacktestConfig::default().with_strategy(StrategyConfig::MaCrossover {
            fast_period: 30,
            slow_period: 10,
        });
        assert!(matches!(config.validate(), Err(ConfigError::PeriodOrder { .. })));

        let mut config = BacktestConfig::default();
        config.metrics.var_confidence = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut config = BacktestConfig::default();
        config.backtest.symbol = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn parse_errors_surface_as_run_errors() {
        let err =
            BacktestConfig::from_toml_str("[backtest]\ninitial_capital = \"lots\"").unwrap_err();
        assert!(matches!(err, RunError::Parse(_)));
    }

    #[test]
    fn periods_per_year_follows_timeframe() {
        let config = BacktestConfig::default();
        assert_eq!(config.metrics_options().periods_per_year, 252.0);
        let mut config = config;
        config.metrics.periods_per_year = Some(365.0);
        assert_eq!(config.metrics_options().periods_per_year, 365.0);
    }
}
