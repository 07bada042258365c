//! Default values for freshly created controls
//!
//! Seeds a control when the form tree is built or an array item is inserted.
//! Precedence, highest first: a per-partition override (honored even when
//! the override is an explicit `null`), a calculated DateTime value, the
//! type's static default, and finally `null` for types without a default
//! concept.

use crate::schema::{CalculatedDefaultValue, DefaultValueOverrides, FieldProperties};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// Computes the value a new control is seeded with
///
/// Total over every field-type variant. `now` is injected so callers (and
/// tests) control the clock.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use contentform::defaults::default_value;
/// use contentform::schema::{FieldProperties, StringProperties};
///
/// let properties = FieldProperties::String(StringProperties {
///     default_value: Some("draft".to_string()),
///     ..Default::default()
/// });
/// assert_eq!(default_value(&properties, "iv", Utc::now()), "draft");
/// ```
pub fn default_value(
	properties: &FieldProperties,
	partition_key: &str,
	now: DateTime<Utc>,
) -> JsonValue {
	match properties {
		FieldProperties::Array(_) => JsonValue::Null,
		FieldProperties::Assets(_) => JsonValue::Null,
		FieldProperties::Boolean(p) => override_for(&p.default_values, partition_key)
			.unwrap_or_else(|| p.default_value.map(JsonValue::from).unwrap_or(JsonValue::Null)),
		FieldProperties::Component(_) => JsonValue::Null,
		FieldProperties::Components(_) => JsonValue::Null,
		FieldProperties::DateTime(p) => {
			override_for(&p.default_values, partition_key).unwrap_or_else(|| {
				match p.calculated_default_value {
					Some(CalculatedDefaultValue::Now) => {
						JsonValue::from(now.to_rfc3339_opts(SecondsFormat::Secs, true))
					}
					Some(CalculatedDefaultValue::Today) => {
						JsonValue::from(format!("{}T00:00:00Z", now.format("%Y-%m-%d")))
					}
					None => p
						.default_value
						.clone()
						.map(JsonValue::from)
						.unwrap_or(JsonValue::Null),
				}
			})
		}
		FieldProperties::Geolocation(_) => JsonValue::Null,
		FieldProperties::Json(_) => JsonValue::Null,
		FieldProperties::Number(p) => override_for(&p.default_values, partition_key)
			.unwrap_or_else(|| p.default_value.map(JsonValue::from).unwrap_or(JsonValue::Null)),
		FieldProperties::References(_) => JsonValue::Null,
		FieldProperties::String(p) => override_for(&p.default_values, partition_key)
			.unwrap_or_else(|| {
				p.default_value
					.clone()
					.map(JsonValue::from)
					.unwrap_or(JsonValue::Null)
			}),
		FieldProperties::Tags(p) => override_for(&p.default_values, partition_key)
			.unwrap_or_else(|| {
				p.default_value
					.clone()
					.map(JsonValue::from)
					.unwrap_or(JsonValue::Null)
			}),
		FieldProperties::Ui(_) => JsonValue::Null,
	}
}

/// The per-partition override, if one is present for this key
///
/// Presence of the key wins even when the stored override is `null`.
fn override_for(overrides: &Option<DefaultValueOverrides>, partition_key: &str) -> Option<JsonValue> {
	overrides
		.as_ref()
		.and_then(|map| map.get(partition_key).cloned())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{
		BooleanProperties, DateTimeProperties, JsonProperties, NumberProperties, StringProperties,
		TagsProperties,
	};
	use rstest::rstest;
	use serde_json::json;
	use std::collections::HashMap;

	fn fixed_now() -> DateTime<Utc> {
		"2024-05-17T09:30:45.123Z".parse().unwrap()
	}

	#[rstest]
	fn test_static_default_value() {
		// Arrange
		let properties = FieldProperties::Number(NumberProperties {
			default_value: Some(42.0),
			..Default::default()
		});

		// Act & Assert
		assert_eq!(default_value(&properties, "iv", fixed_now()), json!(42.0));
	}

	#[rstest]
	fn test_partition_override_beats_static_default() {
		// Arrange
		let mut overrides = HashMap::new();
		overrides.insert("de".to_string(), json!("Hallo"));
		let properties = FieldProperties::String(StringProperties {
			default_value: Some("Hello".to_string()),
			default_values: Some(overrides),
			..Default::default()
		});

		// Act & Assert
		assert_eq!(default_value(&properties, "de", fixed_now()), json!("Hallo"));
		assert_eq!(default_value(&properties, "en", fixed_now()), json!("Hello"));
	}

	#[rstest]
	fn test_explicit_null_override_wins() {
		// Arrange
		let mut overrides = HashMap::new();
		overrides.insert("de".to_string(), JsonValue::Null);
		let properties = FieldProperties::Boolean(BooleanProperties {
			default_value: Some(true),
			default_values: Some(overrides),
		});

		// Act & Assert
		assert_eq!(default_value(&properties, "de", fixed_now()), JsonValue::Null);
		assert_eq!(default_value(&properties, "iv", fixed_now()), json!(true));
	}

	#[rstest]
	fn test_calculated_now_is_second_precision_utc() {
		// Arrange
		let properties = FieldProperties::DateTime(DateTimeProperties {
			calculated_default_value: Some(CalculatedDefaultValue::Now),
			..Default::default()
		});

		// Act & Assert: sub-second precision is dropped, Z-suffixed
		assert_eq!(
			default_value(&properties, "iv", fixed_now()),
			json!("2024-05-17T09:30:45Z")
		);
	}

	#[rstest]
	fn test_calculated_today_is_midnight_utc() {
		// Arrange
		let properties = FieldProperties::DateTime(DateTimeProperties {
			calculated_default_value: Some(CalculatedDefaultValue::Today),
			..Default::default()
		});

		// Act & Assert
		assert_eq!(
			default_value(&properties, "iv", fixed_now()),
			json!("2024-05-17T00:00:00Z")
		);
	}

	#[rstest]
	fn test_calculated_beats_static_default() {
		// Arrange
		let properties = FieldProperties::DateTime(DateTimeProperties {
			default_value: Some("2020-01-01T00:00:00Z".to_string()),
			calculated_default_value: Some(CalculatedDefaultValue::Today),
			..Default::default()
		});

		// Act & Assert
		assert_eq!(
			default_value(&properties, "iv", fixed_now()),
			json!("2024-05-17T00:00:00Z")
		);
	}

	#[rstest]
	fn test_override_beats_calculated() {
		// Arrange
		let mut overrides = HashMap::new();
		overrides.insert("iv".to_string(), json!("2000-01-01T00:00:00Z"));
		let properties = FieldProperties::DateTime(DateTimeProperties {
			default_values: Some(overrides),
			calculated_default_value: Some(CalculatedDefaultValue::Now),
			..Default::default()
		});

		// Act & Assert
		assert_eq!(
			default_value(&properties, "iv", fixed_now()),
			json!("2000-01-01T00:00:00Z")
		);
	}

	#[rstest]
	fn test_tags_default_is_string_list() {
		// Arrange
		let properties = FieldProperties::Tags(TagsProperties {
			default_value: Some(vec!["news".to_string()]),
			..Default::default()
		});

		// Act & Assert
		assert_eq!(default_value(&properties, "iv", fixed_now()), json!(["news"]));
	}

	#[rstest]
	fn test_types_without_default_concept_yield_null() {
		// Arrange
		let properties = FieldProperties::Json(JsonProperties::default());

		// Act & Assert
		assert_eq!(default_value(&properties, "iv", fixed_now()), JsonValue::Null);
	}
}
