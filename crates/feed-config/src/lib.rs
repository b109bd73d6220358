//! Configuration loading for the price router.
//!
//! Reads a TOML file, substitutes `${VAR}` references from the environment,
//! applies prefixed environment overrides and validates the result before
//! anything is built from it.

use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub mod types;

pub use types::{Config, RegistryConfig, RouterConfig, ServiceSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "PRICE_ROUTER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		self.parse(&content)
	}

	/// Substitutes, overrides and validates configuration text.
	pub fn parse(&self, content: &str) -> Result<Config, ConfigError> {
		let substituted_content = self.substitute_env_vars(content)?;

		let mut config: Config = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config);
		validate_config(&config)?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut Config) {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.service.log_level = log_level;
		}

		if let Ok(list) = env::var(format!("{}INTERMEDIARIES", self.env_prefix)) {
			debug!(%list, "Overriding intermediaries from environment");
			config.router.intermediaries = list
				.split(',')
				.map(str::trim)
				.filter(|symbol| !symbol.is_empty())
				.map(str::to_string)
				.collect();
		}

		if let Ok(backend) = env::var(format!("{}REGISTRY_BACKEND", self.env_prefix)) {
			debug!(%backend, "Overriding registry backend from environment");
			config.registry.backend = backend;
		}
	}
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
	// An empty list is valid and restricts the router to native feeds
	let mut seen = HashSet::new();
	for symbol in &config.router.intermediaries {
		if let Err(e) = feed_types::validate_symbol(symbol) {
			let message = format!("router.intermediaries: {}", e);
			return Err(ConfigError::ValidationError(message));
		}

		if !seen.insert(symbol.as_str()) {
			return Err(ConfigError::ValidationError(format!(
				"Intermediary '{}' is listed more than once",
				symbol
			)));
		}
	}

	let backend = &config.registry.backend;
	feed_registry::backend_schema(backend)
		.map_err(|e| ConfigError::ValidationError(e.to_string()))?
		.validate(&config.registry.backend_config())
		.map_err(|e| {
			ConfigError::ValidationError(format!("registry.backends.{}: {}", backend, e))
		})?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	const SAMPLE: &str = r#"
[service]
name = "test-router"

[router]
intermediaries = ["USD", "ETH"]

[registry]
backend = "memory"

[registry.backends.memory]
feeds = [
	{ caption = "Price-ETH/USD-6", value = 2000000000 },
]

[registry.backends.file]
path = "./data/feeds.json"
"#;

	// Each test uses its own prefix so parallel tests never see each other's
	// environment.
	fn loader(prefix: &str) -> ConfigLoader {
		ConfigLoader::new().with_env_prefix(prefix)
	}

	#[test]
	fn test_parse_sample() {
		let config = loader("FEED_CONFIG_TEST_SAMPLE_").parse(SAMPLE).unwrap();

		assert_eq!(config.service.name, "test-router");
		assert_eq!(config.service.log_level, "info");
		assert_eq!(config.router.intermediaries, ["USD", "ETH"]);
		assert_eq!(config.registry.backend, "memory");
		assert!(config.registry.backend_config().get("feeds").is_some());
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("FEED_CONFIG_TEST_SNAPSHOT", "/var/lib/feeds.json");
		let content = r#"
[router]
intermediaries = ["USD"]

[registry]
backend = "file"

[registry.backends.file]
path = "${FEED_CONFIG_TEST_SNAPSHOT}"
"#;
		let config = loader("FEED_CONFIG_TEST_SUBST_").parse(content).unwrap();
		let backend = config.registry.backend_config();
		let path = backend.get("path").and_then(|v| v.as_str());
		assert_eq!(path, Some("/var/lib/feeds.json"));

		let missing = content.replace("FEED_CONFIG_TEST_SNAPSHOT", "FEED_CONFIG_TEST_UNSET");
		assert!(matches!(
			loader("FEED_CONFIG_TEST_SUBST_").parse(&missing),
			Err(ConfigError::EnvVarNotFound(name)) if name == "FEED_CONFIG_TEST_UNSET"
		));
	}

	#[test]
	fn test_env_overrides() {
		env::set_var("FEED_CONFIG_TEST_OVR_INTERMEDIARIES", " BTC, USDC ,,");
		env::set_var("FEED_CONFIG_TEST_OVR_LOG_LEVEL", "debug");
		env::set_var("FEED_CONFIG_TEST_OVR_REGISTRY_BACKEND", "file");

		let config = loader("FEED_CONFIG_TEST_OVR_").parse(SAMPLE).unwrap();
		assert_eq!(config.router.intermediaries, ["BTC", "USDC"]);
		assert_eq!(config.service.log_level, "debug");
		assert_eq!(config.registry.backend, "file");
	}

	#[test]
	fn test_rejects_bad_intermediaries() {
		let loader = loader("FEED_CONFIG_TEST_BAD_");

		let duplicate = SAMPLE.replace(r#"["USD", "ETH"]"#, r#"["USD", "ETH", "USD"]"#);
		assert!(matches!(
			loader.parse(&duplicate),
			Err(ConfigError::ValidationError(message)) if message.contains("USD")
		));

		let malformed = SAMPLE.replace(r#"["USD", "ETH"]"#, r#"["USD/ETH"]"#);
		let result = loader.parse(&malformed);
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[test]
	fn test_empty_intermediaries_mean_native_only() {
		let content = SAMPLE.replace(r#"["USD", "ETH"]"#, "[]");
		let config = loader("FEED_CONFIG_TEST_EMPTY_").parse(&content).unwrap();
		assert!(config.router.intermediaries.is_empty());
	}

	#[test]
	fn test_rejects_bad_registry() {
		let loader = loader("FEED_CONFIG_TEST_REG_");

		let unknown = SAMPLE.replace(r#"backend = "memory""#, r#"backend = "chainlink""#);
		let result = loader.parse(&unknown);
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));

		let bad_feed = SAMPLE.replace("Price-ETH/USD-6", "ETH/USD");
		assert!(matches!(
			loader.parse(&bad_feed),
			Err(ConfigError::ValidationError(message)) if message.contains("feeds[0].caption")
		));

		let no_path = SAMPLE
			.replace(r#"backend = "memory""#, r#"backend = "file""#)
			.replace(r#"path = "./data/feeds.json""#, "");
		let result = loader.parse(&no_path);
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[test]
	fn test_rejects_invalid_toml() {
		assert!(matches!(
			loader("FEED_CONFIG_TEST_TOML_").parse("[router"),
			Err(ConfigError::ParseError(_))
		));
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(SAMPLE.as_bytes()).unwrap();
		file.flush().unwrap();

		let config = loader("FEED_CONFIG_TEST_FILE_")
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.router.intermediaries, ["USD", "ETH"]);

		assert!(matches!(
			loader("FEED_CONFIG_TEST_FILE_").load().await,
			Err(ConfigError::FileNotFound(_))
		));
		assert!(matches!(
			loader("FEED_CONFIG_TEST_FILE_")
				.with_file("/nonexistent/router.toml")
				.load()
				.await,
			Err(ConfigError::FileNotFound(_))
		));
	}
}
