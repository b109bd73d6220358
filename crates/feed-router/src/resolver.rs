//! Route discovery.
//!
//! Finds the cheapest way to price `BASE/QUOTE` with the feeds the registry
//! publishes: a native feed if one exists, otherwise two feeds bridged by one
//! of the configured intermediary assets. The search order is fixed so that
//! the same registry state always yields the same route.

use crate::RouterError;
use feed_registry::RegistryService;
use feed_types::{PairCaption, PairId, RouteDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Precisions the upstream registry publishes, in preference order.
pub const NATIVE_PRECISIONS: [u8; 2] = [6, 9];

/// `(base hop, quote hop)` precisions tried for every intermediary, in order.
pub const HOP_PRECISIONS: [(u8, u8); 4] = [(6, 6), (6, 9), (9, 6), (9, 9)];

/// Outcome of route discovery.
///
/// When `found` is false, `route` is a native 6-decimal descriptor for the
/// requested pair. It names a feed the registry does not support and is only
/// meant for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
	pub found: bool,
	pub route: RouteDescriptor,
}

impl Resolution {
	fn found(route: RouteDescriptor) -> Self {
		Self { found: true, route }
	}

	fn not_found(route: RouteDescriptor) -> Self {
		Self {
			found: false,
			route,
		}
	}

	/// The route, if discovery actually found one.
	pub fn route(&self) -> Option<&RouteDescriptor> {
		self.found.then_some(&self.route)
	}
}

#[derive(Clone)]
pub struct RouteResolver {
	registry: Arc<RegistryService>,
	intermediaries: Arc<[String]>,
}

impl RouteResolver {
	pub fn new(registry: Arc<RegistryService>, intermediaries: Arc<[String]>) -> Self {
		Self {
			registry,
			intermediaries,
		}
	}

	/// Intermediary assets in search order.
	pub fn intermediaries(&self) -> &[String] {
		&self.intermediaries
	}

	/// Resolves `base/quote` to a route descriptor.
	///
	/// The first match wins: native at 6 decimals, native at 9 decimals, then
	/// each intermediary in order with every precision pair of
	/// [`HOP_PRECISIONS`]. Not finding a route is not an error.
	pub async fn resolve(
		&self,
		base: &str,
		quote: &str,
		desired_decimals: u8,
	) -> Result<Resolution, RouterError> {
		for precision in NATIVE_PRECISIONS {
			let caption = PairCaption::new(base, quote, precision)?;
			if let Some(id) = self.registry.supported_id(&caption).await? {
				info!(%caption, %id, desired_decimals, "Resolved native route");
				let route = RouteDescriptor::native(desired_decimals, precision, id);
				return Ok(Resolution::found(route));
			}
		}

		for via in self.intermediaries.iter() {
			if let Some(route) = self.triangulate(base, quote, via, desired_decimals).await? {
				info!(
					base,
					quote,
					via = via.as_str(),
					base_precision = route.base_precision,
					quote_precision = route.quote_precision,
					inverted = route.is_quote_inverted,
					"Resolved triangulated route"
				);
				return Ok(Resolution::found(route));
			}
		}

		let fallback = PairCaption::new(base, quote, NATIVE_PRECISIONS[0])?;
		let id = self.registry.pair_id(&fallback);
		info!(
			%fallback,
			intermediaries = self.intermediaries.len(),
			"No route found"
		);

		let route = RouteDescriptor::native(desired_decimals, NATIVE_PRECISIONS[0], id);
		Ok(Resolution::not_found(route))
	}

	/// Tries every precision pair for a single intermediary.
	async fn triangulate(
		&self,
		base: &str,
		quote: &str,
		via: &str,
		desired_decimals: u8,
	) -> Result<Option<RouteDescriptor>, RouterError> {
		for (base_precision, quote_precision) in HOP_PRECISIONS {
			let Some(base_id) = self.supported(base, via, base_precision).await? else {
				continue;
			};

			let hop = match self.supported(via, quote, quote_precision).await? {
				Some(quote_id) => Some((quote_id, false)),
				None => self
					.supported(quote, via, quote_precision)
					.await?
					.map(|quote_id| (quote_id, true)),
			};

			if let Some((quote_id, inverted)) = hop {
				let route = RouteDescriptor::triangulated(
					desired_decimals,
					base_precision,
					base_id,
					quote_precision,
					quote_id,
					inverted,
				);
				return Ok(Some(route));
			}

			debug!(
				base,
				quote,
				via,
				base_precision,
				quote_precision,
				"No quote hop"
			);
		}

		Ok(None)
	}

	async fn supported(
		&self,
		base: &str,
		quote: &str,
		precision: u8,
	) -> Result<Option<PairId>, RouterError> {
		let caption = PairCaption::new(base, quote, precision)?;
		Ok(self.registry.supported_id(&caption).await?)
	}
}
