//! Tracing setup shared by both connectors.
//!
//! stdout carries the event stream, so log lines go to an append-only file
//! under the host's log directory. Errors are mirrored on stderr, which the
//! host folds into its own log. Without a log directory (manual runs off the
//! host) stderr gets every level the filter lets through.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use harvest_config::LogConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "HARVEST_LOG";

/// Directory for connector log files: `log.dir`, else
/// `$SPLUNK_HOME/var/log/splunk`.
#[must_use]
pub fn log_dir(config: &LogConfig, splunk_home: Option<&Path>) -> Option<PathBuf> {
    if !config.dir.is_empty() {
        return Some(PathBuf::from(&config.dir));
    }
    splunk_home.map(|home| home.join("var").join("log").join("splunk"))
}

/// Filter used when `HARVEST_LOG` is unset.
#[must_use]
pub fn default_level(config: &LogConfig, quiet: bool, verbose: bool) -> &str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        config.level.as_str()
    }
}

/// Open `path` for appending, creating missing parent directories.
///
/// # Errors
///
/// Fails if the directory or the file cannot be created.
pub fn open_log(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Install the global subscriber for `connector`, returning the log file in
/// use.
///
/// # Errors
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init_tracing(
    connector: &str,
    config: &LogConfig,
    quiet: bool,
    verbose: bool,
) -> anyhow::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(config, quiet, verbose)));

    let splunk_home = std::env::var_os("SPLUNK_HOME").map(PathBuf::from);
    let path = log_dir(config, splunk_home.as_deref()).map(|dir| dir.join(format!("{connector}.log")));

    let file_layer = match &path {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log(path)?)),
        ),
        None => None,
    };
    let stderr_cap = if path.is_some() {
        Level::ERROR
    } else {
        Level::TRACE
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr.with_max_level(stderr_cap));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn configured_dir_wins_over_splunk_home() {
        let config = LogConfig {
            dir: "/var/tmp/harvest".into(),
            ..Default::default()
        };
        assert_eq!(
            log_dir(&config, Some(Path::new("/opt/splunk"))),
            Some(PathBuf::from("/var/tmp/harvest"))
        );
    }

    #[test]
    fn splunk_home_locates_host_log_dir() {
        assert_eq!(
            log_dir(&LogConfig::default(), Some(Path::new("/opt/splunk"))),
            Some(PathBuf::from("/opt/splunk/var/log/splunk"))
        );
        assert_eq!(log_dir(&LogConfig::default(), None), None);
    }

    #[test]
    fn quiet_beats_verbose_beats_config() {
        let config = LogConfig {
            level: "warn".into(),
            ..Default::default()
        };
        assert_eq!(default_level(&config, true, true), "error");
        assert_eq!(default_level(&config, false, true), "debug");
        assert_eq!(default_level(&config, false, false), "warn");
    }

    #[test]
    fn open_log_creates_parents_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var/log/splunk/dork.log");

        writeln!(open_log(&path).unwrap(), "first").unwrap();
        writeln!(open_log(&path).unwrap(), "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
