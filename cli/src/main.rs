use std::path::PathBuf;

use anyhow::Result;
use bookcheck_harness::Settings;
use clap::Parser;
use tracing::info;

use commands::{fixtures, resolve, run, Target};

#[derive(Parser)]
#[command(author, version, about = "Conformance checks for the bookstore api", long_about = None)]
pub struct Cli {
    /// Directory holding api.properties and path.properties
    #[arg(long, global = true, env = "BOOKCHECK_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: commands::Commands,
}

mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::new_from_folder(&cli.config_dir)?;
    info!(
        config_dir = %cli.config_dir.display(),
        environment = %cli.target.environment,
        api_version = %cli.target.api_version,
        "loaded settings"
    );

    match cli.command {
        commands::Commands::Run(cmd) => run::execute(cmd, &settings, &cli.target).await,
        commands::Commands::Resolve(cmd) => resolve::execute(cmd, &settings, &cli.target),
        commands::Commands::Fixtures(cmd) => fixtures::execute(cmd, &settings, &cli.target),
    }
}
