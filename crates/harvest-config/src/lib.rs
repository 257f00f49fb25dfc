//! # harvest-config
//!
//! Layered configuration loading for the Harvest connectors using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`HARVEST_*` prefix, `__` as separator)
//! 2. The file named by `HARVEST_CONFIG`
//! 3. User-level `~/.config/harvest/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `HARVEST_DORK__CRTSH_URL` -> `dork.crtsh_url`,
//! `HARVEST_PORTAL__REGION` -> `portal.region`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use harvest_config::HarvestConfig;
//!
//! let config = HarvestConfig::load().expect("config");
//! println!("crt.sh at {}", config.dork.crtsh_url);
//! ```

mod dork;
mod error;
mod host;
mod http;
mod log;
mod portal;

pub use dork::DorkConfig;
pub use error::ConfigError;
pub use host::HostConfig;
pub use http::HttpConfig;
pub use log::LogConfig;
pub use portal::PortalConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an extra TOML file layered over the user config.
pub const CONFIG_PATH_ENV: &str = "HARVEST_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub dork: DorkConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl HarvestConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`HarvestConfig::load_with_dotenv`] for
    /// manual runs that keep credentials in a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source cannot be parsed or a value fails
    /// validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.dork.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// See [`HarvestConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Explicit config file
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV)
            && !explicit.is_empty()
        {
            figment = figment.merge(Toml::file(explicit));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("HARVEST_").ignore(&["config", "log"]).split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("harvest").join("config.toml"))
    }
}
