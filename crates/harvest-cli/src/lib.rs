//! # harvest-cli
//!
//! Shared plumbing for the `dork` and `cpharmony` binaries: command-line
//! parsing, logging setup and the two modular inputs.

pub mod cli;
pub mod cpharmony_input;
pub mod dork_input;
pub mod logging;

use harvest_config::HarvestConfig;
use harvest_host::{Mode, ModularInput};

/// Drive `input` through the host protocol on stdin and stdout.
///
/// # Errors
///
/// Fails on protocol errors, rejected validation or a failed run.
pub async fn run_host<M: ModularInput>(input: &M, mode: Mode) -> anyhow::Result<()> {
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();
    harvest_host::run(input, mode, stdin, stdout).await?;
    Ok(())
}

/// Load configuration, reading `.env` first for manual runs.
///
/// # Errors
///
/// Fails if a configuration source is malformed or invalid.
pub fn load_config(manual: bool) -> anyhow::Result<HarvestConfig> {
    let config = if manual {
        HarvestConfig::load_with_dotenv()?
    } else {
        HarvestConfig::load()?
    };
    Ok(config)
}
