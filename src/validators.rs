//! Validator composition for schema fields
//!
//! Each field type contributes a fixed set of validators derived from its
//! properties. Validators are data: they are composed once when the form
//! tree is built and run against `serde_json::Value`s on every change.
//!
//! Composition policy: type-specific validators come first (bounds, pattern,
//! allowed values), and the presence validator always comes last. Presence
//! is only added when the field is required and the partition is not
//! optional.

use crate::schema::FieldProperties;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value as JsonValue;

/// Errors produced by failed validators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
	#[error("Field is required")]
	Required,
	#[error("Value {value} is less than the minimum of {min}")]
	TooSmall { value: String, min: String },
	#[error("Value {value} is greater than the maximum of {max}")]
	TooLarge { value: String, max: String },
	#[error("Must have at least {min} characters (it has {actual})")]
	TooShort { min: usize, actual: usize },
	#[error("Must not have more than {max} characters (it has {actual})")]
	TooLong { max: usize, actual: usize },
	#[error("Must have at least {min} items (it has {actual})")]
	TooFewItems { min: usize, actual: usize },
	#[error("Must not have more than {max} items (it has {actual})")]
	TooManyItems { max: usize, actual: usize },
	#[error("{0}")]
	Pattern(String),
	#[error("Value is not one of the allowed values")]
	NotAllowed,
	#[error("Value is not a valid {expected}")]
	WrongType { expected: &'static str },
}

/// Result alias for validator runs
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A single validation rule attached to a form control
#[derive(Debug, Clone)]
pub enum Validator {
	/// A value must be present; always composed last
	Required,
	/// Numeric bounds; at least one bound is set
	Between { min: Option<f64>, max: Option<f64> },
	/// String length bounds in characters; at least one bound is set
	LengthBetween {
		min: Option<usize>,
		max: Option<usize>,
	},
	/// Item count bounds for list values; at least one bound is set
	ItemsBetween {
		min: Option<usize>,
		max: Option<usize>,
	},
	/// Date bounds; at least one bound is set
	DateTimeBetween {
		min: Option<DateTime<Utc>>,
		max: Option<DateTime<Utc>>,
	},
	/// The value must match a user-supplied regular expression
	Pattern {
		regex: Option<Regex>,
		message: Option<String>,
	},
	/// The value must be one of an enumerated set
	AllowedValues {
		values: Vec<JsonValue>,
		allow_null: bool,
	},
}

impl Validator {
	/// Builds a pattern validator from a user-supplied expression
	///
	/// An invalid pattern degrades to an inert validator rather than failing
	/// form construction; the schema author sees the problem in the logs.
	pub fn pattern(pattern: &str, message: Option<String>) -> Self {
		let regex = match Regex::new(&anchored(pattern)) {
			Ok(regex) => Some(regex),
			Err(error) => {
				tracing::warn!(pattern, %error, "invalid field pattern, validator disabled");
				None
			}
		};
		Self::Pattern { regex, message }
	}

	/// Runs this validator against a value
	///
	/// `Null` passes every validator except `Required`: absent values are an
	/// escape hatch for optional fields, and presence is checked separately.
	pub fn validate(&self, value: &JsonValue) -> ValidationResult<()> {
		match self {
			Self::Required => validate_required(value),
			_ if value.is_null() => match self {
				Self::AllowedValues {
					allow_null: false, ..
				} => Err(ValidationError::NotAllowed),
				_ => Ok(()),
			},
			Self::Between { min, max } => validate_between(value, *min, *max),
			Self::LengthBetween { min, max } => validate_length(value, *min, *max),
			Self::ItemsBetween { min, max } => validate_items(value, *min, *max),
			Self::DateTimeBetween { min, max } => validate_date_between(value, *min, *max),
			Self::Pattern { regex, message } => validate_pattern(value, regex.as_ref(), message),
			Self::AllowedValues { values, .. } => validate_allowed(value, values),
		}
	}
}

fn validate_required(value: &JsonValue) -> ValidationResult<()> {
	let missing = match value {
		JsonValue::Null => true,
		JsonValue::String(s) => s.trim().is_empty(),
		JsonValue::Array(items) => items.is_empty(),
		_ => false,
	};
	if missing {
		Err(ValidationError::Required)
	} else {
		Ok(())
	}
}

fn validate_between(value: &JsonValue, min: Option<f64>, max: Option<f64>) -> ValidationResult<()> {
	let number = value
		.as_f64()
		.ok_or(ValidationError::WrongType { expected: "number" })?;
	if let Some(min) = min
		&& number < min
	{
		return Err(ValidationError::TooSmall {
			value: number.to_string(),
			min: min.to_string(),
		});
	}
	if let Some(max) = max
		&& number > max
	{
		return Err(ValidationError::TooLarge {
			value: number.to_string(),
			max: max.to_string(),
		});
	}
	Ok(())
}

fn validate_length(
	value: &JsonValue,
	min: Option<usize>,
	max: Option<usize>,
) -> ValidationResult<()> {
	let text = value
		.as_str()
		.ok_or(ValidationError::WrongType { expected: "string" })?;
	// Character count, not byte count, for correct multi-byte handling
	let actual = text.chars().count();
	if let Some(min) = min
		&& actual < min
	{
		return Err(ValidationError::TooShort { min, actual });
	}
	if let Some(max) = max
		&& actual > max
	{
		return Err(ValidationError::TooLong { max, actual });
	}
	Ok(())
}

fn validate_items(
	value: &JsonValue,
	min: Option<usize>,
	max: Option<usize>,
) -> ValidationResult<()> {
	let actual = value
		.as_array()
		.map(Vec::len)
		.ok_or(ValidationError::WrongType { expected: "array" })?;
	if let Some(min) = min
		&& actual < min
	{
		return Err(ValidationError::TooFewItems { min, actual });
	}
	if let Some(max) = max
		&& actual > max
	{
		return Err(ValidationError::TooManyItems { max, actual });
	}
	Ok(())
}

fn validate_date_between(
	value: &JsonValue,
	min: Option<DateTime<Utc>>,
	max: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
	let text = value
		.as_str()
		.ok_or(ValidationError::WrongType { expected: "date" })?;
	let parsed = DateTime::parse_from_rfc3339(text)
		.map(|d| d.with_timezone(&Utc))
		.map_err(|_| ValidationError::WrongType { expected: "date" })?;
	if let Some(min) = min
		&& parsed < min
	{
		return Err(ValidationError::TooSmall {
			value: text.to_string(),
			min: min.to_rfc3339(),
		});
	}
	if let Some(max) = max
		&& parsed > max
	{
		return Err(ValidationError::TooLarge {
			value: text.to_string(),
			max: max.to_rfc3339(),
		});
	}
	Ok(())
}

fn validate_pattern(
	value: &JsonValue,
	regex: Option<&Regex>,
	message: &Option<String>,
) -> ValidationResult<()> {
	let Some(regex) = regex else {
		return Ok(());
	};
	let text = value
		.as_str()
		.ok_or(ValidationError::WrongType { expected: "string" })?;
	if regex.is_match(text) {
		Ok(())
	} else {
		let message = message
			.clone()
			.unwrap_or_else(|| "Value does not match the required pattern".to_string());
		Err(ValidationError::Pattern(message))
	}
}

fn validate_allowed(value: &JsonValue, values: &[JsonValue]) -> ValidationResult<()> {
	// List values (Tags) check every entry against the enumeration
	let allowed = match value {
		JsonValue::Array(items) => items.iter().all(|item| values.contains(item)),
		_ => values.contains(value),
	};
	if allowed {
		Ok(())
	} else {
		Err(ValidationError::NotAllowed)
	}
}

fn anchored(pattern: &str) -> String {
	// User patterns validate the whole value, as in HTML pattern attributes
	let mut anchored = String::with_capacity(pattern.len() + 2);
	if !pattern.starts_with('^') {
		anchored.push('^');
	}
	anchored.push_str(pattern);
	if !pattern.ends_with('$') {
		anchored.push('$');
	}
	anchored
}

/// Composes the validators for a field's control
///
/// Total over every field-type variant. `is_optional` is the partition's
/// optional flag: optional partitions never enforce presence, and their
/// enumeration validators accept `null` as an escape value.
///
/// # Examples
///
/// ```
/// use contentform::schema::{FieldProperties, StringProperties};
/// use contentform::validators::{Validator, field_validators};
///
/// let properties = FieldProperties::String(StringProperties {
///     max_length: Some(10),
///     ..Default::default()
/// });
/// let validators = field_validators(&properties, true, false);
/// assert_eq!(validators.len(), 2);
/// assert!(matches!(validators.last(), Some(Validator::Required)));
/// ```
pub fn field_validators(
	properties: &FieldProperties,
	is_required: bool,
	is_optional: bool,
) -> Vec<Validator> {
	let mut validators = Vec::new();

	match properties {
		FieldProperties::Array(p) => {
			push_items(&mut validators, p.min_items, p.max_items);
		}
		FieldProperties::Assets(p) => {
			push_items(&mut validators, p.min_items, p.max_items);
		}
		FieldProperties::Boolean(_) => {}
		FieldProperties::Component(_) => {}
		FieldProperties::Components(p) => {
			push_items(&mut validators, p.min_items, p.max_items);
		}
		FieldProperties::DateTime(p) => {
			if p.min_value.is_some() || p.max_value.is_some() {
				validators.push(Validator::DateTimeBetween {
					min: p.min_value,
					max: p.max_value,
				});
			}
		}
		FieldProperties::Geolocation(_) => {}
		FieldProperties::Json(_) => {}
		FieldProperties::Number(p) => {
			if p.min_value.is_some() || p.max_value.is_some() {
				validators.push(Validator::Between {
					min: p.min_value,
					max: p.max_value,
				});
			}
			if let Some(allowed) = &p.allowed_values {
				push_allowed(
					&mut validators,
					allowed.iter().map(|v| JsonValue::from(*v)).collect(),
					is_required,
					is_optional,
				);
			}
		}
		FieldProperties::References(p) => {
			push_items(&mut validators, p.min_items, p.max_items);
		}
		FieldProperties::String(p) => {
			if p.min_length.is_some() || p.max_length.is_some() {
				validators.push(Validator::LengthBetween {
					min: p.min_length,
					max: p.max_length,
				});
			}
			if let Some(pattern) = &p.pattern {
				validators.push(Validator::pattern(pattern, p.pattern_message.clone()));
			}
			if let Some(allowed) = &p.allowed_values {
				push_allowed(
					&mut validators,
					allowed.iter().map(|v| JsonValue::from(v.clone())).collect(),
					is_required,
					is_optional,
				);
			}
		}
		FieldProperties::Tags(p) => {
			push_items(&mut validators, p.min_items, p.max_items);
			if let Some(allowed) = &p.allowed_values {
				push_allowed(
					&mut validators,
					allowed.iter().map(|v| JsonValue::from(v.clone())).collect(),
					is_required,
					is_optional,
				);
			}
		}
		FieldProperties::Ui(_) => {}
	}

	// Required is always last
	if is_required && !is_optional {
		validators.push(Validator::Required);
	}
	validators
}

fn push_items(validators: &mut Vec<Validator>, min: Option<usize>, max: Option<usize>) {
	if min.is_some() || max.is_some() {
		validators.push(Validator::ItemsBetween { min, max });
	}
}

fn push_allowed(
	validators: &mut Vec<Validator>,
	mut values: Vec<JsonValue>,
	is_required: bool,
	is_optional: bool,
) {
	let allow_null = !is_required || is_optional;
	if allow_null {
		values.push(JsonValue::Null);
	}
	validators.push(Validator::AllowedValues { values, allow_null });
}
