//! Configuration types for the price router.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: ServiceSettings,
	pub router: RouterConfig,
	pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
	#[serde(default = "default_name")]
	pub name: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

impl Default for ServiceSettings {
	fn default() -> Self {
		Self {
			name: default_name(),
			log_level: default_log_level(),
		}
	}
}

fn default_name() -> String {
	"price-router".to_string()
}

fn default_log_level() -> String {
	"info".to_string()
}

/// Route discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
	/// Intermediary assets tried for triangulation, in order.
	pub intermediaries: Vec<String>,
}

/// Registry backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
	/// Name of the active backend.
	pub backend: String,
	/// Per-backend configuration tables, keyed by backend name.
	#[serde(default)]
	pub backends: HashMap<String, toml::Value>,
}

impl RegistryConfig {
	/// Table configuring the active backend. A backend with no table gets an
	/// empty one, leaving required fields to the backend's schema.
	pub fn backend_config(&self) -> toml::Value {
		self.backends
			.get(&self.backend)
			.cloned()
			.unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()))
	}
}
