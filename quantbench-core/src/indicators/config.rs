//! Serializable indicator descriptions.

use serde::{Deserialize, Serialize};

use super::registry::{erase, DynIndicator};
use super::{Atr, BollingerBands, Ema, Macd, Obv, Rsi, Sma, Stochastic, VolumeProfile};
use crate::domain::PriceSource;
use crate::error::ConfigError;

fn default_value_area() -> f64 {
    super::volume_profile::DEFAULT_VALUE_AREA_FRACTION
}

fn default_smooth_k() -> usize {
    1
}

/// Parameters for any supported indicator. Building validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorConfig {
    Sma {
        period: usize,
        #[serde(default)]
        source: PriceSource,
    },
    Ema {
        period: usize,
        #[serde(default)]
        source: PriceSource,
    },
    Rsi {
        period: usize,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        multiplier: f64,
        #[serde(default)]
        source: PriceSource,
    },
    Atr {
        period: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
        #[serde(default = "default_smooth_k")]
        smooth_k: usize,
    },
    Obv,
    VolumeProfile {
        period: usize,
        bins: usize,
        #[serde(default = "default_value_area")]
        value_area: f64,
    },
}

impl IndicatorConfig {
    pub fn build(&self) -> Result<Box<dyn DynIndicator>, ConfigError> {
        Ok(match *self {
            IndicatorConfig::Sma { period, source } => erase(Sma::with_source(period, source)?),
            IndicatorConfig::Ema { period, source } => erase(Ema::with_source(period, source)?),
            IndicatorConfig::Rsi { period } => erase(Rsi::new(period)?),
            IndicatorConfig::Macd { fast, slow, signal } => erase(Macd::new(fast, slow, signal)?),
            IndicatorConfig::Bollinger {
                period,
                multiplier,
                source,
            } => erase(BollingerBands::with_source(period, multiplier, source)?),
            IndicatorConfig::Atr { period } => erase(Atr::new(period)?),
            IndicatorConfig::Stochastic {
                k_period,
                d_period,
                smooth_k,
            } => erase(Stochastic::new(k_period, d_period, smooth_k)?),
            IndicatorConfig::Obv => erase(Obv::new()),
            IndicatorConfig::VolumeProfile {
                period,
                bins,
                value_area,
            } => erase(VolumeProfile::with_value_area(period, bins, value_area)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_variant() {
        let configs = vec![
            IndicatorConfig::Sma {
                period: 5,
                source: PriceSource::Close,
            },
            IndicatorConfig::Ema {
                period: 5,
                source: PriceSource::Hlc3,
            },
            IndicatorConfig::Rsi { period: 14 },
            IndicatorConfig::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            IndicatorConfig::Bollinger {
                period: 20,
                multiplier: 2.0,
                source: PriceSource::Close,
            },
            IndicatorConfig::Atr { period: 14 },
            IndicatorConfig::Stochastic {
                k_period: 14,
                d_period: 3,
                smooth_k: 3,
            },
            IndicatorConfig::Obv,
            IndicatorConfig::VolumeProfile {
                period: 50,
                bins: 24,
                value_area: 0.7,
            },
        ];
        let required: Vec<usize> = configs
            .iter()
            .map(|c| c.build().unwrap().required_candles())
            .collect();
        assert_eq!(required, vec![5, 5, 15, 26, 20, 15, 16, 2, 50]);
    }

    #[test]
    fn invalid_parameters_surface_as_config_errors() {
        assert!(IndicatorConfig::Rsi { period: 0 }.build().is_err());
        assert!(IndicatorConfig::Macd {
            fast: 26,
            slow: 12,
            signal: 9
        }
        .build()
        .is_err());
    }

    #[test]
    fn deserializes_from_toml_style_json() {
        let cfg: IndicatorConfig =
            serde_json::from_str(r#"{"type":"STOCHASTIC","k_period":14,"d_period":3}"#).unwrap();
        assert_eq!(
            cfg,
            IndicatorConfig::Stochastic {
                k_period: 14,
                d_period: 3,
                smooth_k: 1
            }
        );
        let cfg: IndicatorConfig =
            serde_json::from_str(r#"{"type":"SMA","period":10,"source":"hl2"}"#).unwrap();
        assert_eq!(
            cfg,
            IndicatorConfig::Sma {
                period: 10,
                source: PriceSource::Hl2
            }
        );
    }
}
