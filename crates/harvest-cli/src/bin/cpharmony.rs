use clap::Parser;
use harvest_cli::cli::{CpharmonyCli, CpharmonyCommand};
use harvest_cli::cpharmony_input::{self, CpharmonyInput};
use harvest_cli::{load_config, logging, run_host};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("cpharmony error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = CpharmonyCli::parse();
    let config = load_config(cli.command.is_some())?;
    logging::init_tracing(
        cpharmony_input::CONNECTOR,
        &config.log,
        cli.host.quiet,
        cli.host.verbose,
    )?;

    match &cli.command {
        Some(CpharmonyCommand::Manual(args)) => cpharmony_input::run_manual(&config, args).await,
        None => run_host(&CpharmonyInput::new(config), cli.host.mode()).await,
    }
}
