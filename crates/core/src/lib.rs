pub mod config;
pub mod config_loader;
pub mod timeframe;

pub use config::{AppConfig, ConfigError, OrderflowConfig, RunMode};
pub use config_loader::ConfigLoader;
pub use timeframe::{IntervalResolver, Timeframe, TimeframeError, TimeframeUnit};
