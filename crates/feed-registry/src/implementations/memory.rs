//! In-memory registry implementation.
//!
//! Feeds are seeded from configuration and can be updated at runtime, which
//! makes this backend the natural stand-in for the upstream registry in tests
//! and local runs.

use crate::{feed_record_schema, FeedRecord, RegistryError, RegistryInterface};
use async_trait::async_trait;
use dashmap::DashMap;
use feed_types::{
	ConfigSchema, Field, FieldType, PairCaption, PairId, RawPrice, Schema, ValidationError,
	STATUS_NOT_FOUND,
};
use serde::Deserialize;

/// In-memory registry keyed by feed identifier.
#[derive(Default)]
pub struct MemoryRegistry {
	feeds: DashMap<PairId, RawPrice>,
}

impl MemoryRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_records(records: impl IntoIterator<Item = FeedRecord>) -> Self {
		let registry = Self::new();
		for record in records {
			registry.set_price(&record.caption, record.price());
		}
		registry
	}

	/// Publishes or replaces the reading for a feed.
	pub fn set_price(&self, caption: &PairCaption, price: RawPrice) {
		let id = self.identifier_for(&caption.to_string());
		self.feeds.insert(id, price);
	}

	/// Stops publishing a feed, returning its last reading.
	pub fn remove(&self, caption: &PairCaption) -> Option<RawPrice> {
		let id = self.identifier_for(&caption.to_string());
		self.feeds.remove(&id).map(|(_, price)| price)
	}

	pub fn len(&self) -> usize {
		self.feeds.len()
	}

	pub fn is_empty(&self) -> bool {
		self.feeds.is_empty()
	}
}

#[async_trait]
impl RegistryInterface for MemoryRegistry {
	async fn is_supported(&self, id: PairId) -> Result<bool, RegistryError> {
		Ok(self.feeds.contains_key(&id))
	}

	async fn price_for(&self, id: PairId) -> Result<RawPrice, RegistryError> {
		Ok(self
			.feeds
			.get(&id)
			.map(|entry| *entry.value())
			.unwrap_or_else(|| RawPrice::unavailable(STATUS_NOT_FOUND)))
	}
}

/// Configuration schema for MemoryRegistry.
pub struct MemoryRegistrySchema;

impl ConfigSchema for MemoryRegistrySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![],
			// Optional fields
			vec![Field::new(
				"feeds",
				FieldType::Array(Box::new(FieldType::Table(feed_record_schema()))),
			)],
		);

		schema.validate(config)
	}
}

#[derive(Deserialize)]
struct MemoryRegistryConfig {
	#[serde(default)]
	feeds: Vec<FeedRecord>,
}

/// Factory function to create an in-memory registry from configuration.
///
/// Configuration parameters:
/// - `feeds`: Array of `{ caption, value, timestamp?, status? }` tables (default: empty)
pub fn create_registry(config: &toml::Value) -> Result<Box<dyn RegistryInterface>, RegistryError> {
	let parsed: MemoryRegistryConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| RegistryError::Parse(e.to_string()))?;

	Ok(Box::new(MemoryRegistry::from_records(parsed.feeds)))
}
