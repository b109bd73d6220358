//! Route discovery and rate composition for routed price feeds.
//!
//! A [`PriceRouter`] answers two independent read-only questions against an
//! upstream registry:
//!
//! - `resolve`: which feed, or which pair of feeds bridged by an intermediary
//!   asset, can price `BASE/QUOTE`? The answer is a [`RouteDescriptor`] the
//!   caller is free to cache.
//! - `compose`: given a descriptor, what is the rate right now at the
//!   requested precision?
//!
//! Neither call keeps state between invocations, so a router can be cloned
//! and shared across tasks freely.

use alloy_primitives::U256;
use feed_registry::{RegistryError, RegistryService};
use feed_types::{validate_symbol, PairError, RouteDescriptor};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod compositor;
pub mod resolver;

pub use compositor::RateCompositor;
pub use resolver::{Resolution, RouteResolver};

/// Name reported by the router's metadata accessor.
pub const SOURCE_NAME: &str = "Routed Price Feed";

/// Symbol reported by the router's metadata accessor.
pub const SOURCE_SYMBOL: &str = "RPF";

/// Errors that can occur while resolving or composing a route.
///
/// A missing route and an unavailable price are not errors; they are reported
/// through `Resolution::found` and `Ok(None)` respectively.
#[derive(Debug, Error)]
pub enum RouterError {
	/// The registry backend itself failed.
	#[error("Registry error: {0}")]
	Registry(#[from] RegistryError),
	/// An asset symbol cannot be embedded in a feed caption.
	#[error("Invalid pair: {0}")]
	Pair(#[from] PairError),
	/// The requested precision would need a negative power of ten.
	#[error("Cannot scale to {desired_decimals} decimals (exponent {exponent})")]
	PrecisionOutOfRange { desired_decimals: u8, exponent: i32 },
	/// An intermediate value does not fit in 256 bits.
	#[error("Arithmetic overflow while composing rate")]
	Overflow,
	/// The dividing hop of an inverted route reported a zero price.
	#[error("Division by zero: quote hop reported a zero price")]
	DivisionByZero,
}

/// Resolver and compositor bound to one registry and one intermediary list.
#[derive(Clone)]
pub struct PriceRouter {
	resolver: RouteResolver,
	compositor: RateCompositor,
}

impl PriceRouter {
	/// Creates a router searching `intermediaries` in the given order.
	///
	/// The list is captured once and never changes for the life of the router.
	pub fn new<I, S>(registry: Arc<RegistryService>, intermediaries: I) -> Result<Self, RouterError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let intermediaries: Arc<[String]> = intermediaries.into_iter().map(Into::into).collect();

		for symbol in intermediaries.iter() {
			validate_symbol(symbol)?;
		}

		Ok(Self {
			resolver: RouteResolver::new(registry.clone(), intermediaries),
			compositor: RateCompositor::new(registry),
		})
	}

	pub fn name(&self) -> &'static str {
		SOURCE_NAME
	}

	pub fn symbol(&self) -> &'static str {
		SOURCE_SYMBOL
	}

	pub fn intermediaries(&self) -> &[String] {
		self.resolver.intermediaries()
	}

	/// See [`RouteResolver::resolve`].
	pub async fn resolve(
		&self,
		base: &str,
		quote: &str,
		desired_decimals: u8,
	) -> Result<Resolution, RouterError> {
		self.resolver.resolve(base, quote, desired_decimals).await
	}

	/// See [`RateCompositor::compose`].
	pub async fn compose(&self, route: &RouteDescriptor) -> Result<Option<U256>, RouterError> {
		self.compositor.compose(route).await
	}

	/// Resolves and composes in one go. `Ok(None)` covers both a missing route
	/// and an unavailable price.
	pub async fn price(
		&self,
		base: &str,
		quote: &str,
		desired_decimals: u8,
	) -> Result<Option<U256>, RouterError> {
		let resolution = self.resolve(base, quote, desired_decimals).await?;

		match resolution.route() {
			Some(route) => self.compose(route).await,
			None => {
				debug!(base, quote, "Skipping composition for unresolved pair");
				Ok(None)
			}
		}
	}
}
