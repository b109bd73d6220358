//! Registry module for the routed price feed.
//!
//! This module abstracts the upstream price-source registry: a store of raw
//! prices keyed by pair identifiers that can answer "is this feed supported"
//! and "what is its latest price". Route discovery and rate composition only
//! ever read from it.

use async_trait::async_trait;
use feed_types::{
	ConfigSchema, Field, FieldType, PairCaption, PairError, PairId, RawPrice, Schema,
	ValidationError, STATUS_READY,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur while talking to a registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
	/// No backend is registered under the configured name.
	#[error("Unknown registry backend: {0}")]
	UnknownBackend(String),
	/// The backend configuration failed schema validation.
	#[error("Invalid configuration: {0}")]
	Validation(#[from] ValidationError),
	/// The backend configuration passed the schema but could not be parsed.
	#[error("Failed to parse configuration: {0}")]
	Parse(String),
	/// A feed entry names a caption that cannot exist.
	#[error("Invalid feed: {0}")]
	Feed(#[from] PairError),
	/// Error that occurs in the registry backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the read-only interface of an upstream price registry.
///
/// Implementations model a remote source, hence the async methods. Neither
/// method may report an unknown identifier as an error: `is_supported`
/// answers `false` and `price_for` returns a non-ready status.
#[async_trait]
pub trait RegistryInterface: Send + Sync {
	/// Maps a caption to the identifier the registry stores it under.
	fn identifier_for(&self, caption: &str) -> PairId {
		PairId::from_caption(caption)
	}

	/// Whether the registry publishes a feed under this identifier.
	async fn is_supported(&self, id: PairId) -> Result<bool, RegistryError>;

	/// Latest reading for the identifier, with its status code.
	async fn price_for(&self, id: PairId) -> Result<RawPrice, RegistryError>;
}

/// Shared backends, so a caller can keep a handle to the registry it wraps.
#[async_trait]
impl<T: RegistryInterface + ?Sized> RegistryInterface for Arc<T> {
	fn identifier_for(&self, caption: &str) -> PairId {
		(**self).identifier_for(caption)
	}

	async fn is_supported(&self, id: PairId) -> Result<bool, RegistryError> {
		(**self).is_supported(id).await
	}

	async fn price_for(&self, id: PairId) -> Result<RawPrice, RegistryError> {
		(**self).price_for(id).await
	}
}

fn ready_status() -> u16 {
	STATUS_READY
}

/// A published feed as written in configuration and snapshot files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
	pub caption: PairCaption,
	pub value: i64,
	#[serde(default)]
	pub timestamp: u64,
	#[serde(default = "ready_status")]
	pub status: u16,
}

impl FeedRecord {
	pub fn new(caption: PairCaption, price: RawPrice) -> Self {
		Self {
			caption,
			value: price.value,
			timestamp: price.timestamp,
			status: price.status,
		}
	}

	pub fn price(&self) -> RawPrice {
		RawPrice {
			value: self.value,
			timestamp: self.timestamp,
			status: self.status,
		}
	}
}

/// Schema of a single feed record table.
pub(crate) fn feed_record_schema() -> Schema {
	Schema::new(
		vec![
			Field::new("caption", FieldType::String).with_validator(|value| {
				let text = value.as_str().unwrap_or_default();
				text.parse::<PairCaption>()
					.map(|_| ())
					.map_err(|e| e.to_string())
			}),
			Field::new(
				"value",
				FieldType::Integer {
					min: None,
					max: None,
				},
			),
		],
		vec![
			Field::new(
				"timestamp",
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			),
			Field::new(
				"status",
				FieldType::Integer {
					min: Some(0),
					max: Some(u16::MAX as i64),
				},
			),
		],
	)
}

/// Read-only facade over a registry backend.
///
/// Wraps the backend and speaks in captions, so callers never compute
/// identifiers themselves.
pub struct RegistryService {
	/// The underlying registry backend implementation.
	backend: Box<dyn RegistryInterface>,
}

impl RegistryService {
	/// Creates a new RegistryService with the specified backend.
	pub fn new(backend: Box<dyn RegistryInterface>) -> Self {
		Self { backend }
	}

	/// Identifier the backend uses for a caption.
	pub fn pair_id(&self, caption: &PairCaption) -> PairId {
		self.backend.identifier_for(&caption.to_string())
	}

	/// Returns the caption's identifier when the backend supports it.
	pub async fn supported_id(
		&self,
		caption: &PairCaption,
	) -> Result<Option<PairId>, RegistryError> {
		let id = self.pair_id(caption);
		let supported = self.backend.is_supported(id).await?;
		debug!(%caption, %id, supported, "Checked feed support");
		Ok(supported.then_some(id))
	}

	/// Latest reading for an identifier, whatever its status.
	pub async fn price(&self, id: PairId) -> Result<RawPrice, RegistryError> {
		self.backend.price_for(id).await
	}
}

/// Configuration schema for the named backend.
pub fn backend_schema(backend: &str) -> Result<Box<dyn ConfigSchema>, RegistryError> {
	match backend {
		"memory" => Ok(Box::new(implementations::memory::MemoryRegistrySchema)),
		"file" => Ok(Box::new(implementations::file::FileRegistrySchema)),
		other => Err(RegistryError::UnknownBackend(other.to_string())),
	}
}

/// Factory function to create a registry backend from configuration.
///
/// The table is validated against the backend's schema before anything is
/// constructed.
pub fn create_registry(
	backend: &str,
	config: &toml::Value,
) -> Result<Box<dyn RegistryInterface>, RegistryError> {
	backend_schema(backend)?.validate(config)?;

	match backend {
		"memory" => implementations::memory::create_registry(config),
		"file" => implementations::file::create_registry(config),
		other => Err(RegistryError::UnknownBackend(other.to_string())),
	}
}
