//! Snapshot-file registry implementation.
//!
//! Reads a JSON array of feed records from disk on every query, so an
//! external process can rewrite the snapshot and composition picks up the new
//! prices without restarting anything.

use crate::{FeedRecord, RegistryError, RegistryInterface};
use async_trait::async_trait;
use feed_types::{
	ConfigSchema, Field, FieldType, PairId, RawPrice, Schema, ValidationError, STATUS_NOT_FOUND,
};
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

/// File-backed registry.
pub struct FileRegistry {
	/// Path of the JSON snapshot.
	path: PathBuf,
}

impl FileRegistry {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	fn backend_error(&self, error: impl std::fmt::Display) -> RegistryError {
		RegistryError::Backend(format!("{}: {}", self.path.display(), error))
	}

	async fn load(&self) -> Result<Vec<FeedRecord>, RegistryError> {
		let bytes = fs::read(&self.path)
			.await
			.map_err(|e| self.backend_error(e))?;

		let entries: Vec<serde_json::Value> = serde_json::from_slice(&bytes)
			.map_err(|e| self.backend_error(e))?;

		// A record this router cannot address only hides that one feed
		Ok(entries
			.into_iter()
			.enumerate()
			.filter_map(|(index, entry)| match serde_json::from_value(entry) {
				Ok(record) => Some(record),
				Err(e) => {
					warn!(
						path = %self.path.display(),
						index,
						error = %e,
						"Skipping unreadable feed record"
					);
					None
				}
			})
			.collect())
	}

	fn record_id(&self, record: &FeedRecord) -> PairId {
		self.identifier_for(&record.caption.to_string())
	}

	async fn find(&self, id: PairId) -> Result<Option<RawPrice>, RegistryError> {
		let records = self.load().await?;

		Ok(records
			.iter()
			.rev()
			.find(|record| self.record_id(record) == id)
			.map(FeedRecord::price))
	}
}

#[async_trait]
impl RegistryInterface for FileRegistry {
	async fn is_supported(&self, id: PairId) -> Result<bool, RegistryError> {
		Ok(self.find(id).await?.is_some())
	}

	async fn price_for(&self, id: PairId) -> Result<RawPrice, RegistryError> {
		Ok(self
			.find(id)
			.await?
			.unwrap_or_else(|| RawPrice::unavailable(STATUS_NOT_FOUND)))
	}
}

/// Configuration schema for FileRegistry.
pub struct FileRegistrySchema;

impl ConfigSchema for FileRegistrySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![
				Field::new("path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("Snapshot path must not be empty".to_string()),
					}
				}),
			],
			// Optional fields
			vec![],
		);

		schema.validate(config)
	}
}

/// Factory function to create a file registry from configuration.
///
/// Configuration parameters:
/// - `path`: JSON snapshot holding an array of feed records
pub fn create_registry(config: &toml::Value) -> Result<Box<dyn RegistryInterface>, RegistryError> {
	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| RegistryError::Parse("file registry needs a path".into()))?;

	Ok(Box::new(FileRegistry::new(PathBuf::from(path))))
}
