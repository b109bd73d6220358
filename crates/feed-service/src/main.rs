use anyhow::{Context, Result};
use clap::Parser;
use feed_config::ConfigLoader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Load configuration
	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	// Initialize tracing
	let default_level = &config.service.log_level;
	let log_level = cli.log_level.as_deref().unwrap_or(default_level);
	setup_tracing(log_level)?;

	info!("Loaded configuration from: {:?}", cli.config);

	match cli.command {
		Command::Validate => commands::validate(&config),
		Command::Resolve {
			base,
			quote,
			decimals,
		} => {
			let router = commands::build_router(&config)?;
			commands::resolve(&router, &base, &quote, decimals).await
		}
		Command::Compose { route } => {
			let router = commands::build_router(&config)?;
			commands::compose(&router, &route).await
		}
		Command::Price {
			base,
			quote,
			decimals,
		} => {
			let router = commands::build_router(&config)?;
			commands::price(&router, &base, &quote, decimals).await
		}
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	// Logs go to stderr so command output stays machine readable
	let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
	tracing_subscriber::registry()
		.with(env_filter)
		.with(fmt_layer)
		.init();

	Ok(())
}
