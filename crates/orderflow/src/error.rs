//! Error types for order-flow aggregation.

use footprint_core::{ConfigError, TimeframeError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the order-flow engine.
#[derive(Debug, Error)]
pub enum OrderflowError {
    /// Bin width must be strictly positive.
    #[error("invalid scale {0}: bin width must be positive")]
    InvalidScale(Decimal),

    /// Decimal arithmetic left the representable range.
    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),

    /// Candle boundaries could not be resolved.
    #[error(transparent)]
    Timeframe(#[from] TimeframeError),

    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An aggregation pass failed. Wraps the underlying cause.
    #[error("dependency failure: {0:#}")]
    Dependency(#[source] anyhow::Error),
}

impl OrderflowError {
    /// Wraps any failure as a dependency failure.
    pub fn dependency(err: impl Into<anyhow::Error>) -> Self {
        Self::Dependency(err.into())
    }

    /// Returns true if this is the aggregation-level wrapper.
    #[must_use]
    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency(_))
    }
}

/// Result type alias for order-flow operations.
pub type Result<T> = std::result::Result<T, OrderflowError>;
