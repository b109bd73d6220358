//! Route descriptors: what to fetch and how to combine it.
//!
//! A descriptor is produced once by route discovery and can be persisted and
//! replayed any number of times. It never carries a price, only the feed
//! identifiers, their precisions and the direction of the second hop.

use crate::PairId;
use alloy_sol_types::{sol, SolType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

sol! {
	/// ABI layout used to persist a route descriptor.
	struct RouteAbi {
		uint8 desiredDecimals;
		uint8 basePrecision;
		bytes4 baseId;
		uint8 quotePrecision;
		bytes4 quoteId;
		bool isQuoteInverted;
	}
}

/// Errors that can occur while decoding a persisted descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
	/// The bytes are not a valid ABI encoding of a descriptor.
	#[error("Failed to decode route: {0}")]
	Decode(String),
	/// The bytes decode, but describe a route discovery could never produce.
	#[error("Malformed route: {0}")]
	Malformed(String),
}

/// Self-contained description of how to obtain a rate for one pair.
///
/// A zero `quote_precision` marks a native route; `quote_id` and
/// `is_quote_inverted` are then meaningless and kept zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDescriptor {
	/// Precision of the rate handed back to the caller.
	pub desired_decimals: u8,
	pub base_precision: u8,
	pub base_id: PairId,
	pub quote_precision: u8,
	pub quote_id: PairId,
	/// The second hop was found as `QUOTE/THIRD` and has to divide the first one.
	pub is_quote_inverted: bool,
}

impl RouteDescriptor {
	/// A route served by a single feed.
	pub fn native(desired_decimals: u8, precision: u8, id: PairId) -> Self {
		Self {
			desired_decimals,
			base_precision: precision,
			base_id: id,
			quote_precision: 0,
			quote_id: PairId::ZERO,
			is_quote_inverted: false,
		}
	}

	/// A route composed of `BASE/THIRD` and either `THIRD/QUOTE` or, when
	/// `inverted` is set, `QUOTE/THIRD`.
	pub fn triangulated(
		desired_decimals: u8,
		base_precision: u8,
		base_id: PairId,
		quote_precision: u8,
		quote_id: PairId,
		inverted: bool,
	) -> Self {
		Self {
			desired_decimals,
			base_precision,
			base_id,
			quote_precision,
			quote_id,
			is_quote_inverted: inverted,
		}
	}

	pub fn is_native(&self) -> bool {
		self.quote_precision == 0
	}

	/// Solidity ABI encoding of the descriptor (six static words).
	pub fn abi_encode(&self) -> Vec<u8> {
		let abi = RouteAbi {
			desiredDecimals: self.desired_decimals,
			basePrecision: self.base_precision,
			baseId: self.base_id.0,
			quotePrecision: self.quote_precision,
			quoteId: self.quote_id.0,
			isQuoteInverted: self.is_quote_inverted,
		};
		<RouteAbi as SolType>::abi_encode(&abi)
	}

	/// Decodes and checks a descriptor produced by [`RouteDescriptor::abi_encode`].
	pub fn abi_decode(data: &[u8]) -> Result<Self, DescriptorError> {
		let abi = <RouteAbi as SolType>::abi_decode(data, true)
			.map_err(|e| DescriptorError::Decode(e.to_string()))?;

		let route = if abi.quotePrecision == 0 {
			Self::native(abi.desiredDecimals, abi.basePrecision, PairId(abi.baseId))
		} else {
			Self::triangulated(
				abi.desiredDecimals,
				abi.basePrecision,
				PairId(abi.baseId),
				abi.quotePrecision,
				PairId(abi.quoteId),
				abi.isQuoteInverted,
			)
		};

		route.check()?;
		Ok(route)
	}

	/// Hex form of the ABI encoding, `0x`-prefixed.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.abi_encode()))
	}

	pub fn from_hex(text: &str) -> Result<Self, DescriptorError> {
		let text = text.trim();
		let digits = text.strip_prefix("0x").unwrap_or(text);
		let bytes = hex::decode(digits).map_err(|e| DescriptorError::Decode(e.to_string()))?;
		Self::abi_decode(&bytes)
	}

	fn check(&self) -> Result<(), DescriptorError> {
		if self.base_id.is_zero() {
			return Err(DescriptorError::Malformed("base feed id is zero".into()));
		}
		if !self.is_native() && self.quote_id.is_zero() {
			return Err(DescriptorError::Malformed(format!(
				"quote precision {} with a zero quote feed id",
				self.quote_precision
			)));
		}
		Ok(())
	}
}
