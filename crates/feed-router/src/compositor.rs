//! Rate composition: turn a route descriptor into a scaled rate.
//!
//! Every formula multiplies by a common `10^36` buffer first and divides down
//! to the requested precision last, so truncation only ever drops digits
//! beyond `desired_decimals`. All arithmetic is checked 256-bit.

use crate::RouterError;
use alloy_primitives::U256;
use feed_registry::RegistryService;
use feed_types::{PairId, RouteDescriptor};
use std::sync::Arc;
use tracing::{debug, warn};

/// Exponent of the scaling buffer applied before dividing down.
pub const SCALE_EXPONENT: i32 = 36;

/// Fetches the prices a descriptor references and combines them.
#[derive(Clone)]
pub struct RateCompositor {
	registry: Arc<RegistryService>,
}

impl RateCompositor {
	pub fn new(registry: Arc<RegistryService>) -> Self {
		Self { registry }
	}

	/// Computes the rate for a route at its desired decimals.
	///
	/// Returns `Ok(None)` when any referenced price is not currently ready.
	/// Errors are reserved for registry failures and for arithmetic the
	/// route cannot support.
	pub async fn compose(&self, route: &RouteDescriptor) -> Result<Option<U256>, RouterError> {
		let Some(base) = self.fetch(route.base_id).await? else {
			return Ok(None);
		};

		if route.is_native() {
			let rate = native_rate(base, route.base_precision, route.desired_decimals)?;
			return Ok(Some(rate));
		}

		let Some(quote) = self.fetch(route.quote_id).await? else {
			return Ok(None);
		};

		let rate = if route.is_quote_inverted {
			inverted_rate(
				base,
				quote,
				route.base_precision,
				route.quote_precision,
				route.desired_decimals,
			)?
		} else {
			direct_rate(
				base,
				quote,
				route.base_precision,
				route.quote_precision,
				route.desired_decimals,
			)?
		};

		debug!(
			base_id = %route.base_id,
			quote_id = %route.quote_id,
			inverted = route.is_quote_inverted,
			%rate,
			"Composed triangulated rate"
		);
		Ok(Some(rate))
	}

	async fn fetch(&self, id: PairId) -> Result<Option<U256>, RouterError> {
		let price = self.registry.price(id).await?;

		if !price.is_ready() {
			warn!(%id, status = price.status, "Price unavailable");
			return Ok(None);
		}

		Ok(Some(price.magnitude()))
	}
}

/// `raw * 10^36 / 10^(36 + base_precision - desired_decimals)`
pub fn native_rate(
	raw: U256,
	base_precision: u8,
	desired_decimals: u8,
) -> Result<U256, RouterError> {
	let scaled = raw
		.checked_mul(pow10(SCALE_EXPONENT)?)
		.ok_or(RouterError::Overflow)?;

	scale_down(scaled, i32::from(base_precision), desired_decimals)
}

/// `base * quote * 10^36 / 10^(36 + base_precision + quote_precision - desired_decimals)`
pub fn direct_rate(
	base: U256,
	quote: U256,
	base_precision: u8,
	quote_precision: u8,
	desired_decimals: u8,
) -> Result<U256, RouterError> {
	let scaled = base
		.checked_mul(quote)
		.and_then(|product| product.checked_mul(pow10(SCALE_EXPONENT).ok()?))
		.ok_or(RouterError::Overflow)?;

	let precision = i32::from(base_precision) + i32::from(quote_precision);
	scale_down(scaled, precision, desired_decimals)
}

/// `(10^36 * base / quote) / 10^(36 + base_precision - quote_precision - desired_decimals)`
///
/// The quote hop was published as `QUOTE/THIRD`, so it divides.
pub fn inverted_rate(
	base: U256,
	quote: U256,
	base_precision: u8,
	quote_precision: u8,
	desired_decimals: u8,
) -> Result<U256, RouterError> {
	if quote.is_zero() {
		return Err(RouterError::DivisionByZero);
	}

	let scaled = pow10(SCALE_EXPONENT)?
		.checked_mul(base)
		.ok_or(RouterError::Overflow)?;

	let precision = i32::from(base_precision) - i32::from(quote_precision);
	scale_down(scaled / quote, precision, desired_decimals)
}

/// Divides `value` by `10^(36 + precision - desired_decimals)`.
fn scale_down(value: U256, precision: i32, desired_decimals: u8) -> Result<U256, RouterError> {
	let exponent = SCALE_EXPONENT + precision - i32::from(desired_decimals);
	if exponent < 0 {
		return Err(RouterError::PrecisionOutOfRange {
			desired_decimals,
			exponent,
		});
	}

	Ok(value / pow10(exponent)?)
}

fn pow10(exponent: i32) -> Result<U256, RouterError> {
	U256::from(10u8)
		.checked_pow(U256::from(exponent.unsigned_abs()))
		.ok_or(RouterError::Overflow)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{caption, id, registry_with};
	use feed_types::RawPrice;

	fn u(value: u64) -> U256 {
		U256::from(value)
	}

	#[test]
	fn test_native_rate_is_identity_at_native_precision() {
		for raw in [0u64, 1, 999_999, 2_000_123456, u64::MAX] {
			assert_eq!(native_rate(u(raw), 6, 6).unwrap(), u(raw));
			assert_eq!(native_rate(u(raw), 9, 9).unwrap(), u(raw));
		}
	}

	#[test]
	fn test_native_rate_expands_and_truncates() {
		let raw = u(1_234567);

		assert_eq!(native_rate(raw, 6, 8).unwrap(), u(1_23456700));
		assert_eq!(native_rate(raw, 6, 4).unwrap(), u(1_2345));
		assert_eq!(native_rate(u(1_999999), 6, 0).unwrap(), u(1));
		assert_eq!(native_rate(u(999_999999), 9, 2).unwrap(), u(99));

		let expanded = native_rate(raw, 6, 18).unwrap();
		assert_eq!(expanded, u(1_234567_000000_000000));
	}

	#[test]
	fn test_each_extra_decimal_is_a_factor_of_ten() {
		for precision in [6u8, 9] {
			for raw in [1u64, 7, 123_456789, 98_765_432_101] {
				for d in 0u8..18 {
					let lower = native_rate(u(raw), precision, d).unwrap();
					let upper = native_rate(u(raw), precision, d + 1).unwrap();

					// Dropping a decimal always truncates
					assert_eq!(lower, upper / u(10), "raw {raw} at {precision} -> {d}");
					if d >= precision {
						assert_eq!(upper, lower * u(10));
					}
				}
			}
		}
	}

	#[test]
	fn test_direct_rate_fixture() {
		// 2.0 BASE/THIRD at 6 decimals, 1.5 THIRD/QUOTE at 9 decimals
		let base = u(2_000000);
		let quote = u(1_500000000);

		assert_eq!(direct_rate(base, quote, 6, 9, 6).unwrap(), u(3_000000));
		assert_eq!(direct_rate(base, quote, 6, 9, 9).unwrap(), u(3_000000000));
		assert_eq!(direct_rate(base, quote, 6, 9, 0).unwrap(), u(3));

		let expanded = direct_rate(base, quote, 6, 9, 18).unwrap();
		assert_eq!(expanded, u(3) * pow10(18).unwrap());
	}

	#[test]
	fn test_direct_rate_truncates_product() {
		// 1.333333 * 1.5 = 1.9999995
		let base = u(1_333333);
		let quote = u(1_500000);

		assert_eq!(direct_rate(base, quote, 6, 6, 6).unwrap(), u(1_999999));
		assert_eq!(direct_rate(base, quote, 6, 6, 7).unwrap(), u(1_9999995));
	}

	#[test]
	fn test_inverted_rate_fixture() {
		// ETH/USD = 2000 at 6 decimals, EUR/USD = 1.1 at 9 decimals => ETH/EUR = 1818.1818...
		let eth_usd = u(2000_000000);
		let eur_usd = u(1_100000000);

		let rate = inverted_rate(eth_usd, eur_usd, 6, 9, 6).unwrap();
		assert_eq!(rate, u(1818_181818));

		let rate = inverted_rate(eth_usd, eur_usd, 6, 9, 0).unwrap();
		assert_eq!(rate, u(1818));

		let rate = inverted_rate(eth_usd, eur_usd, 6, 9, 12).unwrap();
		assert_eq!(rate, u(1818_181818181818));

		// Multiplying the hops would price ETH/EUR at 2200
		assert_ne!(
			inverted_rate(eth_usd, eur_usd, 6, 9, 6).unwrap(),
			direct_rate(eth_usd, eur_usd, 6, 9, 6).unwrap()
		);
	}

	#[test]
	fn test_inverted_rate_same_precision() {
		// 3.0 / 4.0 at 9 decimals each
		assert_eq!(
			inverted_rate(u(3_000000000), u(4_000000000), 9, 9, 6).unwrap(),
			u(750000)
		);
	}

	#[test]
	fn test_negative_divisor_exponent_is_rejected() {
		assert!(native_rate(u(1), 6, 42).is_ok());
		assert!(matches!(
			native_rate(u(1), 6, 43),
			Err(RouterError::PrecisionOutOfRange {
				desired_decimals: 43,
				exponent: -1,
			})
		));
		assert!(matches!(
			inverted_rate(u(1), u(1), 6, 9, 34),
			Err(RouterError::PrecisionOutOfRange { .. })
		));
		assert!(direct_rate(u(1), u(1), 6, 9, 51).is_ok());
		assert!(direct_rate(u(1), u(1), 6, 9, 52).is_err());
	}

	#[test]
	fn test_overflow_and_zero_divisor() {
		let result = native_rate(U256::MAX, 6, 6);
		assert!(matches!(result, Err(RouterError::Overflow)));

		let result = direct_rate(U256::MAX, u(2), 6, 6, 6);
		assert!(matches!(result, Err(RouterError::Overflow)));

		let result = inverted_rate(u(1), U256::ZERO, 6, 6, 6);
		assert!(matches!(result, Err(RouterError::DivisionByZero)));
	}

	#[tokio::test]
	async fn test_compose_native_route() {
		let (_, registry) = registry_with(&[("Price-ETH/USD-6", 2000_123456)]);
		let compositor = RateCompositor::new(registry);

		for d in 0u8..=18 {
			let route = RouteDescriptor::native(d, 6, id("Price-ETH/USD-6"));
			let rate = compositor.compose(&route).await.unwrap().unwrap();
			assert_eq!(rate, native_rate(u(2000_123456), 6, d).unwrap());
		}
	}

	#[tokio::test]
	async fn test_compose_rereads_live_prices() {
		let (memory, registry) = registry_with(&[("Price-ETH/USD-6", 2000_000000)]);
		let compositor = RateCompositor::new(registry);
		let eth_usd = caption("Price-ETH/USD-6");
		let route = RouteDescriptor::native(6, 6, eth_usd.id());

		let rate = compositor.compose(&route).await.unwrap();
		assert_eq!(rate, Some(u(2000_000000)));

		memory.set_price(&eth_usd, RawPrice::ready(2100_000000, 60));
		let rate = compositor.compose(&route).await.unwrap();
		assert_eq!(rate, Some(u(2100_000000)));
	}

	#[tokio::test]
	async fn test_compose_fails_softly_when_any_hop_is_unavailable() {
		let (memory, registry) = registry_with(&[
			("Price-AAA/TTT-6", 2_000000),
			("Price-TTT/BBB-9", 1_500000000),
		]);
		let compositor = RateCompositor::new(registry);
		let base_hop = caption("Price-AAA/TTT-6");
		let quote_hop = caption("Price-TTT/BBB-9");
		let route = RouteDescriptor::triangulated(6, 6, base_hop.id(), 9, quote_hop.id(), false);

		let rate = compositor.compose(&route).await.unwrap();
		assert_eq!(rate, Some(u(3_000000)));

		memory.set_price(&quote_hop, RawPrice::unavailable(425));
		assert_eq!(compositor.compose(&route).await.unwrap(), None);

		memory.set_price(&quote_hop, RawPrice::ready(1_500000000, 0));
		memory.remove(&base_hop);
		assert_eq!(compositor.compose(&route).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_compose_zero_inverted_hop_is_an_error() {
		let feeds = [("Price-ETH/USD-6", 2000_000000), ("Price-EUR/USD-6", 0)];
		let (_, registry) = registry_with(&feeds);
		let compositor = RateCompositor::new(registry);
		let eth_usd = id("Price-ETH/USD-6");
		let eur_usd = id("Price-EUR/USD-6");
		let route = RouteDescriptor::triangulated(6, 6, eth_usd, 6, eur_usd, true);

		let result = compositor.compose(&route).await;
		assert!(matches!(result, Err(RouterError::DivisionByZero)));
	}
}
