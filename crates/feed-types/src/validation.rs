//! Schema checks for backend configuration tables.
//!
//! Registry backends receive free-form TOML tables. Each backend publishes a
//! [`ConfigSchema`] so a bad table is rejected at load time with the path of
//! the offending field instead of failing on first use.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: String,
	},
}

/// Shape of a configuration value.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Array(Box<FieldType>),
	Table(Schema),
}

/// Extra check run once the field has the right shape.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		self.check_table("", config)
	}

	fn check_table(&self, path: &str, value: &toml::Value) -> Result<(), ValidationError> {
		let field = if path.is_empty() { "root" } else { path };
		let table = value.as_table().ok_or_else(|| ValidationError::TypeMismatch {
			field: field.to_string(),
			expected: "table",
			actual: value.type_str().to_string(),
		})?;

		for field in &self.required {
			let field_path = join(path, &field.name);
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field_path.clone()))?;
			check_field(&field_path, field, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(&join(path, &field.name), field, value)?;
			}
		}

		Ok(())
	}
}

fn join(path: &str, name: &str) -> String {
	if path.is_empty() {
		name.to_string()
	} else {
		format!("{}.{}", path, name)
	}
}

fn check_field(path: &str, field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
	check_type(path, &field.field_type, value)?;

	if let Some(validator) = &field.validator {
		validator(value).map_err(|message| ValidationError::InvalidValue {
			field: path.to_string(),
			message,
		})?;
	}

	Ok(())
}

fn check_type(
	path: &str,
	expected: &FieldType,
	value: &toml::Value,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &'static str| ValidationError::TypeMismatch {
		field: path.to_string(),
		expected,
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String => {
			value.as_str().ok_or_else(|| mismatch("string"))?;
		}
		FieldType::Integer { min, max } => {
			let int = value.as_integer().ok_or_else(|| mismatch("integer"))?;
			if let Some(min) = min.filter(|min| int < *min) {
				return Err(ValidationError::InvalidValue {
					field: path.to_string(),
					message: format!("Value {} is less than minimum {}", int, min),
				});
			}
			if let Some(max) = max.filter(|max| int > *max) {
				return Err(ValidationError::InvalidValue {
					field: path.to_string(),
					message: format!("Value {} is greater than maximum {}", int, max),
				});
			}
		}
		FieldType::Array(inner) => {
			let items = value.as_array().ok_or_else(|| mismatch("array"))?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", path, i), inner, item)?;
			}
		}
		FieldType::Table(schema) => schema.check_table(path, value)?,
	}

	Ok(())
}

/// Trait implemented by every configurable backend.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
