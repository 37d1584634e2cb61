use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogdesk::cli::{self, Cli, Commands, ConfigCommands};
use blogdesk::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config check` reports a broken file instead of failing on it
    let config = match &cli.command {
        Commands::Config(ConfigCommands::Check) => Config::load(&cli.config).unwrap_or_default(),
        _ => Config::load(&cli.config)?,
    };
    let config = cli::effective_config(&cli, config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(
        base_url = %config.api.base_url,
        "blogdesk v{}",
        env!("CARGO_PKG_VERSION")
    );

    cli::run_command(&cli, &config).await
}
