//! Subcommand handlers.

use alloy_primitives::U256;
use anyhow::{Context, Result};
use feed_config::Config;
use feed_registry::RegistryService;
use feed_router::{PriceRouter, Resolution};
use feed_types::RouteDescriptor;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Builds the registry backend and router described by the configuration.
pub fn build_router(config: &Config) -> Result<PriceRouter> {
	let backend = &config.registry.backend;
	let registry = feed_registry::create_registry(backend, &config.registry.backend_config())
		.with_context(|| format!("Failed to create '{}' registry", backend))?;

	PriceRouter::new(
		Arc::new(RegistryService::new(registry)),
		config.router.intermediaries.iter().cloned(),
	)
	.context("Failed to create price router")
}

pub fn validate(config: &Config) -> Result<()> {
	let router = build_router(config)?;

	info!("Configuration is valid");
	info!("Service name: {}", config.service.name);
	info!("Registry backend: {}", config.registry.backend);
	info!("Intermediaries: {}", router.intermediaries().join(", "));

	Ok(())
}

#[derive(Serialize)]
struct ResolveOutput {
	found: bool,
	route: RouteDescriptor,
	encoded: String,
}

impl From<Resolution> for ResolveOutput {
	fn from(resolution: Resolution) -> Self {
		Self {
			found: resolution.found,
			route: resolution.route,
			encoded: resolution.route.to_hex(),
		}
	}
}

pub async fn resolve(router: &PriceRouter, base: &str, quote: &str, decimals: u8) -> Result<()> {
	let resolution = router
		.resolve(base, quote, decimals)
		.await
		.with_context(|| format!("Failed to resolve {}/{}", base, quote))?;

	print_json(&ResolveOutput::from(resolution))
}

#[derive(Serialize)]
struct RateOutput {
	decimals: u8,
	/// Integer rate scaled by `10^decimals`, absent when unavailable.
	rate: Option<String>,
	formatted: Option<String>,
}

impl RateOutput {
	fn new(rate: Option<U256>, decimals: u8) -> Self {
		Self {
			decimals,
			rate: rate.map(|r| r.to_string()),
			formatted: rate.map(|r| format_rate(r, decimals)),
		}
	}
}

pub async fn compose(router: &PriceRouter, encoded: &str) -> Result<()> {
	let route = RouteDescriptor::from_hex(encoded).context("Invalid route descriptor")?;
	let rate = router
		.compose(&route)
		.await
		.context("Failed to compose rate")?;

	print_json(&RateOutput::new(rate, route.desired_decimals))
}

pub async fn price(router: &PriceRouter, base: &str, quote: &str, decimals: u8) -> Result<()> {
	let rate = router
		.price(base, quote, decimals)
		.await
		.with_context(|| format!("Failed to price {}/{}", base, quote))?;

	print_json(&RateOutput::new(rate, decimals))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
	println!("{}", text);
	Ok(())
}

/// Renders a fixed-point rate as a decimal string, e.g. `1818181818` at 6
/// decimals as `1818.181818`.
pub fn format_rate(rate: U256, decimals: u8) -> String {
	let digits = rate.to_string();
	let decimals = usize::from(decimals);

	if decimals == 0 {
		return digits;
	}

	let padded = format!("{:0>width$}", digits, width = decimals + 1);
	let (whole, fraction) = padded.split_at(padded.len() - decimals);
	format!("{}.{}", whole, fraction)
}
