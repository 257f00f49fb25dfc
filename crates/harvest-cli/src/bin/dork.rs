use clap::Parser;
use harvest_cli::cli::{DorkCli, DorkCommand};
use harvest_cli::dork_input::{self, DorkInput};
use harvest_cli::{load_config, logging, run_host};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("dork error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = DorkCli::parse();
    let config = load_config(cli.command.is_some())?;
    logging::init_tracing(
        dork_input::CONNECTOR,
        &config.log,
        cli.host.quiet,
        cli.host.verbose,
    )?;

    match &cli.command {
        Some(DorkCommand::Manual(args)) => dork_input::run_manual(&config, args).await,
        None => run_host(&DorkInput::new(config), cli.host.mode()).await,
    }
}
