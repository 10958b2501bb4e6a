use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Prefix for environment overrides, e.g. `FOOTPRINT_ORDERFLOW__SCALE=0.25`.
pub const ENV_PREFIX: &str = "FOOTPRINT_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging defaults, TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration from an explicit TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let figment = Self::base()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file("config/Config.json"));

        Self::extract(&figment)
    }

    /// Loads configuration with a specific profile layered over the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let figment = Self::base()
            .merge(Toml::file("config/Config.toml"))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file("config/Config.json"));

        Self::extract(&figment)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    fn extract(figment: &Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .extract()
            .context("Failed to extract configuration")?;
        config
            .orderflow
            .validate()
            .context("Invalid orderflow configuration")?;

        tracing::debug!(
            timeframe = %config.timeframe,
            runmode = config.runmode.as_str(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;
    use figment::Jail;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_without_files_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load().expect("defaults should load");
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_merges_toml_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                r#"
                timeframe = "5m"
                runmode = "live"

                [orderflow]
                scale = 0.25
                cache_size = 20
                "#,
            )?;

            let config = ConfigLoader::load().expect("config should load");
            assert_eq!(config.timeframe, "5m");
            assert_eq!(config.runmode, RunMode::Live);
            assert_eq!(config.orderflow.scale, dec!(0.25));
            assert_eq!(config.orderflow.cache_size, 20);
            // untouched keys keep their defaults
            assert_eq!(config.orderflow.max_candles, 1500);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file("config/Config.toml", "[orderflow]\nstacked_imbalance_range = 3\n")?;
            jail.set_env("FOOTPRINT_ORDERFLOW__STACKED_IMBALANCE_RANGE", "5");

            let config = ConfigLoader::load().expect("config should load");
            assert_eq!(config.orderflow.stacked_imbalance_range, 5);
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_layers_over_base() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file("config/Config.toml", "timeframe = \"1m\"\n")?;
            jail.create_file("config/Config.live.toml", "runmode = \"dry_run\"\n")?;

            let config = ConfigLoader::load_with_profile("live").expect("config should load");
            assert_eq!(config.timeframe, "1m");
            assert_eq!(config.runmode, RunMode::DryRun);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("footprint.toml", "[orderflow]\nscale = 0\n")?;

            let err = ConfigLoader::load_from("footprint.toml").unwrap_err();
            assert!(format!("{err:#}").contains("scale"));
            Ok(())
        });
    }
}
