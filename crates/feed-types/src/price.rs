//! Raw prices as reported by the upstream registry.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Status code the registry attaches to a usable price.
pub const STATUS_READY: u16 = 200;

/// Status code reported for identifiers the registry does not know.
pub const STATUS_NOT_FOUND: u16 = 404;

/// A single price reading for one feed.
///
/// The value is an integer scaled by the feed's precision, so a `Price-ETH/USD-6`
/// reading of `2_000_500000` means 2000.5 USD per ETH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrice {
	/// Signed price scaled by the feed's precision.
	///
	/// The registry publishes 256-bit values, but only readings that fit in an
	/// `i64` are representable here. Snapshot records outside that range are
	/// skipped by the file backend.
	pub value: i64,
	/// Unix seconds of the reading. Carried through, never interpreted.
	#[serde(default)]
	pub timestamp: u64,
	#[serde(default = "default_status")]
	pub status: u16,
}

fn default_status() -> u16 {
	STATUS_READY
}

impl RawPrice {
	pub fn ready(value: i64, timestamp: u64) -> Self {
		Self {
			value,
			timestamp,
			status: STATUS_READY,
		}
	}

	pub fn unavailable(status: u16) -> Self {
		Self {
			value: 0,
			timestamp: 0,
			status,
		}
	}

	/// Whether the registry vouched for this reading.
	pub fn is_ready(&self) -> bool {
		self.status == STATUS_READY
	}

	/// Absolute value of the reading as an unsigned 256-bit integer.
	pub fn magnitude(&self) -> U256 {
		U256::from(self.value.unsigned_abs())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_handling() {
		assert!(RawPrice::ready(1, 0).is_ready());
		assert!(!RawPrice::unavailable(STATUS_NOT_FOUND).is_ready());
		let stale = RawPrice {
			value: 5,
			timestamp: 0,
			status: 425,
		};
		assert!(!stale.is_ready());
	}

	#[test]
	fn test_magnitude_ignores_sign() {
		let negative = RawPrice::ready(-1_500000, 0);
		assert_eq!(negative.magnitude(), U256::from(1_500000u64));

		let lowest = RawPrice::ready(i64::MIN, 0);
		assert_eq!(lowest.magnitude(), U256::from(1u64 << 63));
	}

	#[test]
	fn test_missing_fields_default_to_ready() {
		let price: RawPrice = serde_json::from_str(r#"{"value": 42}"#).unwrap();
		assert_eq!(price, RawPrice::ready(42, 0));
	}
}
