//! Logging configuration.

use serde::{Deserialize, Serialize};

fn default_level() -> String {
    String::from("info")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Directory for connector log files. Empty means `$SPLUNK_HOME/var/log/splunk`.
    #[serde(default)]
    pub dir: String,

    /// Default level filter when `HARVEST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            level: default_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = LogConfig::default();
        assert!(config.dir.is_empty());
        assert_eq!(config.level, "info");
    }
}
