use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level configuration consumed by the order-flow aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Candle timeframe identifier (e.g. "1m", "5m", "1h")
    pub timeframe: String,
    pub runmode: RunMode,
    pub orderflow: OrderflowConfig,
}

/// How the surrounding process is being run.
///
/// Only `Live` and `DryRun` keep a long-lived cache, so only they bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Live,
    DryRun,
    Backtest,
    Hyperopt,
    #[default]
    Other,
}

impl RunMode {
    /// Returns true for modes that trade (or simulate trading) against live data.
    #[must_use]
    pub const fn is_live_like(&self) -> bool {
        matches!(self, Self::Live | Self::DryRun)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::DryRun => "dry_run",
            Self::Backtest => "backtest",
            Self::Hyperopt => "hyperopt",
            Self::Other => "other",
        }
    }
}

/// Order-flow parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderflowConfig {
    /// Number of trailing candles eligible for update
    pub max_candles: usize,
    /// Price bin width (e.g. 0.5)
    pub scale: Decimal,
    /// Diagonal ratio that must be exceeded to flag an imbalance
    pub imbalance_ratio: Decimal,
    /// Minimum level volume required before a level can be imbalanced
    pub imbalance_volume: Decimal,
    /// Consecutive imbalanced levels required for a stacked imbalance
    pub stacked_imbalance_range: usize,
    /// Cache capacity, enforced in live/dry-run mode only
    pub cache_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeframe: "1m".to_string(),
            runmode: RunMode::default(),
            orderflow: OrderflowConfig::default(),
        }
    }
}

impl Default for OrderflowConfig {
    fn default() -> Self {
        Self {
            max_candles: 1500,
            scale: Decimal::new(5, 1),
            imbalance_ratio: Decimal::from(3),
            imbalance_volume: Decimal::ZERO,
            stacked_imbalance_range: 3,
            cache_size: 1500,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("orderflow.scale must be positive, got {0}")]
    NonPositiveScale(Decimal),

    #[error("orderflow.max_candles must be at least 1")]
    ZeroMaxCandles,

    #[error("orderflow.{field} must not be negative, got {value}")]
    Negative {
        field: &'static str,
        value: Decimal,
    },
}

impl OrderflowConfig {
    /// Checks that the parameters describe a computable aggregation.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveScale(self.scale));
        }
        if self.max_candles == 0 {
            return Err(ConfigError::ZeroMaxCandles);
        }
        if self.imbalance_ratio.is_sign_negative() && !self.imbalance_ratio.is_zero() {
            return Err(ConfigError::Negative {
                field: "imbalance_ratio",
                value: self.imbalance_ratio,
            });
        }
        if self.imbalance_volume.is_sign_negative() && !self.imbalance_volume.is_zero() {
            return Err(ConfigError::Negative {
                field: "imbalance_volume",
                value: self.imbalance_volume,
            });
        }
        Ok(())
    }
}
