use cadence_app::cli::Invocation;
use cadence_app::commands;
use cadence_app::logging;
use cadence_core::config::load_config;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let filter_handle = logging::init();

    let invocation = Invocation::parse();

    let config = load_config()?;
    tracing::info!(config = ?config, "Configuration loaded");
    logging::apply_level(&filter_handle, &config.logging.level);

    let output = commands::run(&invocation, config)?;
    println!("{output}");

    Ok(())
}
