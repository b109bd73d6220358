//! Pair captions and the identifiers derived from them.
//!
//! The upstream registry addresses every feed by a 4-byte identifier computed
//! from a caption of the form `Price-<BASE>/<QUOTE>-<D>`, where `<D>` is the
//! single-digit precision the feed is published at.

use alloy_primitives::{keccak256, FixedBytes};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Prefix shared by every feed caption.
pub const CAPTION_PREFIX: &str = "Price-";

/// Errors that can occur while building or parsing a pair caption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairError {
	/// The asset symbol is empty or contains characters the caption format reserves.
	#[error("Invalid asset symbol: {0:?}")]
	InvalidSymbol(String),
	/// Captions can only carry a single decimal digit of precision.
	#[error("Precision must be a single digit, got {0}")]
	UnsupportedPrecision(u8),
	/// The text does not follow the `Price-<BASE>/<QUOTE>-<D>` layout.
	#[error("Invalid caption format: {0}")]
	InvalidCaption(String),
}

/// Identifier of a single feed in the upstream registry.
///
/// This is the first four bytes of `keccak256(caption)`, matching the
/// registry's own derivation.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PairId(pub FixedBytes<4>);

impl PairId {
	/// The "no hop" sentinel carried by native route descriptors.
	pub const ZERO: Self = Self(FixedBytes::ZERO);

	/// Derives the identifier for a caption string.
	pub fn from_caption(caption: &str) -> Self {
		let digest = keccak256(caption.as_bytes());
		let mut bytes = [0u8; 4];
		bytes.copy_from_slice(&digest[..4]);
		Self(FixedBytes(bytes))
	}

	pub fn is_zero(&self) -> bool {
		*self == Self::ZERO
	}
}

impl fmt::Display for PairId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<[u8; 4]> for PairId {
	fn from(bytes: [u8; 4]) -> Self {
		Self(FixedBytes(bytes))
	}
}

/// Human-readable name of a feed: base asset, quote asset and precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PairCaption {
	base: String,
	quote: String,
	decimals: u8,
}

impl PairCaption {
	/// Builds a caption from its parts, rejecting anything the text format cannot carry.
	pub fn new(base: &str, quote: &str, decimals: u8) -> Result<Self, PairError> {
		validate_symbol(base)?;
		validate_symbol(quote)?;
		if decimals > 9 {
			return Err(PairError::UnsupportedPrecision(decimals));
		}

		Ok(Self {
			base: base.to_string(),
			quote: quote.to_string(),
			decimals,
		})
	}

	pub fn base(&self) -> &str {
		&self.base
	}

	pub fn quote(&self) -> &str {
		&self.quote
	}

	pub fn decimals(&self) -> u8 {
		self.decimals
	}

	/// Identifier the upstream registry uses for this caption.
	pub fn id(&self) -> PairId {
		PairId::from_caption(&self.to_string())
	}
}

impl fmt::Display for PairCaption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}{}/{}-{}",
			CAPTION_PREFIX, self.base, self.quote, self.decimals
		)
	}
}

impl FromStr for PairCaption {
	type Err = PairError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || PairError::InvalidCaption(s.to_string());

		let body = s.strip_prefix(CAPTION_PREFIX).ok_or_else(invalid)?;
		let (pair, digits) = body.rsplit_once('-').ok_or_else(invalid)?;
		let (base, quote) = pair.split_once('/').ok_or_else(invalid)?;

		let decimals = match digits.as_bytes() {
			[digit] if digit.is_ascii_digit() => digit - b'0',
			_ => return Err(invalid()),
		};

		Self::new(base, quote, decimals)
	}
}

impl TryFrom<String> for PairCaption {
	type Error = PairError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<PairCaption> for String {
	fn from(caption: PairCaption) -> Self {
		caption.to_string()
	}
}

/// Checks that an asset symbol can be embedded in a caption.
pub fn validate_symbol(symbol: &str) -> Result<(), PairError> {
	let valid = !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_graphic() && c != '/');

	if !valid {
		return Err(PairError::InvalidSymbol(symbol.to_string()));
	}

	Ok(())
}
