//! Display formatting for field values
//!
//! Produces the compact representation shown in content lists and reference
//! pickers. The output is either plain text or a tagged HTML snippet, never
//! both; HTML is only produced when the caller opts in via `allow_html`.

use crate::schema::{DateTimeEditor, Field, FieldProperties, StringEditor};
use chrono::DateTime;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

// Recognized external image hosts for String stock-photo previews.
static IMAGE_HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^https?://(images|source)\.unsplash\.com/\S+$")
		.expect("IMAGE_HOST_REGEX: invalid regex pattern")
});

/// A formatted field value for list and read views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedValue {
	/// Plain text, safe to render anywhere
	Text(String),
	/// A raw HTML snippet; only produced when the caller allows HTML
	Html(String),
}

impl FormattedValue {
	/// The inner string, regardless of kind
	pub fn as_str(&self) -> &str {
		match self {
			Self::Text(s) | Self::Html(s) => s,
		}
	}

	/// Whether this value is an HTML snippet
	pub fn is_html(&self) -> bool {
		matches!(self, Self::Html(_))
	}
}

impl From<&str> for FormattedValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

/// Formats a field's raw value for display
///
/// Total over every field-type variant; `null` always formats to empty text.
/// Values that do not match the field's expected shape pass through as raw
/// text rather than erroring.
///
/// # Examples
///
/// ```
/// use contentform::format::{FormattedValue, format_value};
/// use contentform::schema::{AssetsProperties, Field, FieldProperties};
/// use serde_json::json;
///
/// let field = Field::new("images", FieldProperties::Assets(AssetsProperties::default()));
/// let formatted = format_value(&field, &json!(["a.png", "b.png"]), false);
/// assert_eq!(formatted, FormattedValue::Text("2 Assets".to_string()));
/// ```
pub fn format_value(field: &Field, value: &JsonValue, allow_html: bool) -> FormattedValue {
	if value.is_null() {
		return FormattedValue::Text(String::new());
	}
	match &field.properties {
		FieldProperties::Array(_) => count_value(value, "Item", "Items"),
		FieldProperties::Assets(_) => count_value(value, "Asset", "Assets"),
		FieldProperties::Boolean(_) => match value.as_bool() {
			Some(true) => "Yes".into(),
			Some(false) => "No".into(),
			None => raw(value),
		},
		FieldProperties::Component(_) => "{ Component }".into(),
		FieldProperties::Components(_) => count_value(value, "Component", "Components"),
		FieldProperties::DateTime(p) => format_datetime(value, p.editor),
		FieldProperties::Geolocation(_) => format_geolocation(value),
		FieldProperties::Json(_) => "<Json />".into(),
		FieldProperties::Number(_) => raw(value),
		FieldProperties::References(_) => count_value(value, "Reference", "References"),
		FieldProperties::String(p) => format_string(value, p.editor, allow_html),
		FieldProperties::Tags(_) => count_value(value, "Tag", "Tags"),
		FieldProperties::Ui(_) => FormattedValue::Text(String::new()),
	}
}

/// Plural/singular boundary for list-valued types
fn count_value(value: &JsonValue, singular: &str, plural: &str) -> FormattedValue {
	match value.as_array() {
		Some(items) if items.len() == 1 => FormattedValue::Text(format!("1 {singular}")),
		Some(items) => FormattedValue::Text(format!("{} {plural}", items.len())),
		None => raw(value),
	}
}

fn format_datetime(value: &JsonValue, editor: DateTimeEditor) -> FormattedValue {
	let Some(text) = value.as_str() else {
		return raw(value);
	};
	// Unparsable stored values fall back to the raw input
	match DateTime::parse_from_rfc3339(text) {
		Ok(parsed) => {
			let formatted = match editor {
				DateTimeEditor::Date => parsed.format("%Y-%m-%d").to_string(),
				DateTimeEditor::DateTime => parsed.format("%Y-%m-%d %H:%M:%S").to_string(),
			};
			FormattedValue::Text(formatted)
		}
		Err(_) => FormattedValue::Text(text.to_string()),
	}
}

fn format_geolocation(value: &JsonValue) -> FormattedValue {
	let latitude = value.get("latitude").and_then(JsonValue::as_f64);
	let longitude = value.get("longitude").and_then(JsonValue::as_f64);
	match (latitude, longitude) {
		(Some(latitude), Some(longitude)) => {
			FormattedValue::Text(format!("{latitude}, {longitude}"))
		}
		_ => raw(value),
	}
}

fn format_string(value: &JsonValue, editor: StringEditor, allow_html: bool) -> FormattedValue {
	let Some(text) = value.as_str() else {
		return raw(value);
	};
	if allow_html && editor == StringEditor::StockPhoto && IMAGE_HOST_REGEX.is_match(text) {
		let src = text.replace('"', "&quot;");
		return FormattedValue::Html(format!("<img src=\"{src}\" alt=\"\" />"));
	}
	FormattedValue::Text(text.to_string())
}

fn raw(value: &JsonValue) -> FormattedValue {
	match value {
		JsonValue::String(s) => FormattedValue::Text(s.clone()),
		other => FormattedValue::Text(other.to_string()),
	}
}
