//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "price-router")]
#[command(about = "Routed price feed: resolve and compose cross rates")]
#[command(long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
	/// Path to configuration file
	#[arg(short, long, value_name = "FILE", env = "PRICE_ROUTER_CONFIG")]
	#[arg(default_value = "config/local.toml")]
	pub config: PathBuf,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(short, long)]
	pub log_level: Option<String>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Validate the configuration and build the registry backend
	Validate,

	/// Find a route for a pair and print its descriptor
	Resolve {
		/// Base asset symbol
		base: String,
		/// Quote asset symbol
		quote: String,
		/// Decimals of the composed rate
		#[arg(short, long, default_value_t = 6)]
		decimals: u8,
	},

	/// Compose the current rate for a hex-encoded route descriptor
	Compose {
		/// ABI-encoded descriptor, as printed by `resolve`
		route: String,
	},

	/// Resolve a pair and compose its current rate
	Price {
		/// Base asset symbol
		base: String,
		/// Quote asset symbol
		quote: String,
		/// Decimals of the composed rate
		#[arg(short, long, default_value_t = 6)]
		decimals: u8,
	},
}
