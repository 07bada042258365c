//! Content schema model
//!
//! A schema describes the fields of a content type: their names, their typed
//! properties, how their values are partitioned across languages, and the
//! nested fields of array-like types. Schemas arrive as data (the editor UI
//! lets users author them), so the field-type surface is a closed sum type:
//! every algorithm that dispatches over field types matches exhaustively and
//! fails to compile when a variant is added without updating it.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// How a field's value is split across languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partitioning {
	/// A single value shared by all languages
	#[default]
	Invariant,
	/// One value per configured language
	Language,
}

/// A content schema: an ordered list of root fields
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
	/// Schema identifier
	pub name: String,
	/// Root fields, in authoring order
	#[serde(default)]
	pub fields: Vec<Field>,
}

impl Schema {
	/// Creates an empty schema with the given name
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: Vec::new(),
		}
	}

	/// Appends a root field
	///
	/// # Examples
	///
	/// ```
	/// use contentform::schema::{Field, FieldProperties, Schema, StringProperties};
	///
	/// let schema = Schema::new("article")
	///     .with_field(Field::new("title", FieldProperties::String(StringProperties::default())));
	/// assert_eq!(schema.fields.len(), 1);
	/// ```
	pub fn with_field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	/// Looks up a root field by name
	pub fn field(&self, name: &str) -> Option<&Field> {
		self.fields.iter().find(|f| f.name == name)
	}
}

/// A single field of a schema, root or nested
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
	/// Field name, unique within its parent
	pub name: String,
	/// Typed properties of the field
	pub properties: FieldProperties,
	/// Localization setting; ignored on nested fields
	#[serde(default)]
	pub partitioning: Partitioning,
	/// Statically disabled in the editor
	#[serde(default)]
	pub is_disabled: bool,
	/// Whether a value must be present
	#[serde(default)]
	pub is_required: bool,
	/// Display label; hosts fall back to the field name
	#[serde(default)]
	pub label: Option<String>,
	/// Help text shown next to the control
	#[serde(default)]
	pub hints: Option<String>,
	/// Nested fields, meaningful for Array and Components only
	#[serde(default)]
	pub nested: Vec<Field>,
}

impl Field {
	/// Creates a field with the given name and properties
	pub fn new(name: impl Into<String>, properties: FieldProperties) -> Self {
		Self {
			name: name.into(),
			properties,
			partitioning: Partitioning::Invariant,
			is_disabled: false,
			is_required: false,
			label: None,
			hints: None,
			nested: Vec::new(),
		}
	}

	/// Makes the field localizable
	pub fn localizable(mut self) -> Self {
		self.partitioning = Partitioning::Language;
		self
	}

	/// Marks the field as required
	pub fn required(mut self) -> Self {
		self.is_required = true;
		self
	}

	/// Marks the field as statically disabled
	pub fn disabled(mut self) -> Self {
		self.is_disabled = true;
		self
	}

	/// Sets the display label
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Sets the help text
	pub fn with_hints(mut self, hints: impl Into<String>) -> Self {
		self.hints = Some(hints.into());
		self
	}

	/// Appends a nested field (Array and Components only)
	pub fn with_nested(mut self, field: Field) -> Self {
		self.nested.push(field);
		self
	}

	/// The label to display, falling back to the field name
	pub fn display_name(&self) -> &str {
		self.label.as_deref().unwrap_or(&self.name)
	}

	/// Whether this field carries content; UI fields are layout-only
	pub fn is_content(&self) -> bool {
		!matches!(self.properties, FieldProperties::Ui(_))
	}

	/// Whether this field's partitions hold per-item sub-trees
	pub fn has_items(&self) -> bool {
		matches!(
			self.properties,
			FieldProperties::Array(_) | FieldProperties::Components(_)
		)
	}
}

/// Typed properties of a field
///
/// The closed set of field-type variants. The validator, default-value, and
/// formatter visitors each match exhaustively over this enum.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "fieldType")]
pub enum FieldProperties {
	/// An ordered list of items with nested fields
	Array(ArrayProperties),
	/// References to uploaded assets
	Assets(AssetsProperties),
	/// A yes/no toggle
	Boolean(BooleanProperties),
	/// A single component instance
	Component(ComponentProperties),
	/// An ordered list of component instances with nested fields
	Components(ComponentsProperties),
	/// A point in time
	DateTime(DateTimeProperties),
	/// A latitude/longitude pair
	Geolocation(GeolocationProperties),
	/// Free-form JSON
	Json(JsonProperties),
	/// A numeric value
	Number(NumberProperties),
	/// References to other content items
	References(ReferencesProperties),
	/// A text value
	String(StringProperties),
	/// A list of tags
	Tags(TagsProperties),
	/// A layout separator without a value
	#[serde(rename = "UI")]
	Ui(UiProperties),
}

impl FieldProperties {
	/// Stable name of the field type, matching the wire tag
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Array(_) => "Array",
			Self::Assets(_) => "Assets",
			Self::Boolean(_) => "Boolean",
			Self::Component(_) => "Component",
			Self::Components(_) => "Components",
			Self::DateTime(_) => "DateTime",
			Self::Geolocation(_) => "Geolocation",
			Self::Json(_) => "Json",
			Self::Number(_) => "Number",
			Self::References(_) => "References",
			Self::String(_) => "String",
			Self::Tags(_) => "Tags",
			Self::Ui(_) => "UI",
		}
	}
}

/// Per-partition default-value overrides, keyed by partition key
pub type DefaultValueOverrides = HashMap<String, JsonValue>;

/// Properties of an Array field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrayProperties {
	pub min_items: Option<usize>,
	pub max_items: Option<usize>,
}

/// Properties of an Assets field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetsProperties {
	pub min_items: Option<usize>,
	pub max_items: Option<usize>,
}

/// Properties of a Boolean field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BooleanProperties {
	pub default_value: Option<bool>,
	pub default_values: Option<DefaultValueOverrides>,
}

/// Properties of a Component field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentProperties {}

/// Properties of a Components field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentsProperties {
	pub min_items: Option<usize>,
	pub max_items: Option<usize>,
}

/// Calculated default for DateTime fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CalculatedDefaultValue {
	/// The current timestamp at second precision
	Now,
	/// The current date at midnight UTC
	Today,
}

/// Editor variant for DateTime fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DateTimeEditor {
	#[default]
	DateTime,
	Date,
}

/// Properties of a DateTime field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateTimeProperties {
	pub default_value: Option<String>,
	pub default_values: Option<DefaultValueOverrides>,
	pub calculated_default_value: Option<CalculatedDefaultValue>,
	pub min_value: Option<chrono::DateTime<chrono::Utc>>,
	pub max_value: Option<chrono::DateTime<chrono::Utc>>,
	pub editor: DateTimeEditor,
}

/// Properties of a Geolocation field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeolocationProperties {}

/// Properties of a Json field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonProperties {}

/// Properties of a Number field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberProperties {
	pub default_value: Option<f64>,
	pub default_values: Option<DefaultValueOverrides>,
	pub min_value: Option<f64>,
	pub max_value: Option<f64>,
	pub allowed_values: Option<Vec<f64>>,
}

/// Properties of a References field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferencesProperties {
	pub min_items: Option<usize>,
	pub max_items: Option<usize>,
}

/// Editor variant for String fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StringEditor {
	#[default]
	Input,
	Slug,
	TextArea,
	RichText,
	Markdown,
	Dropdown,
	Radio,
	Color,
	StockPhoto,
}

/// Properties of a String field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringProperties {
	pub default_value: Option<String>,
	pub default_values: Option<DefaultValueOverrides>,
	pub min_length: Option<usize>,
	pub max_length: Option<usize>,
	pub pattern: Option<String>,
	pub pattern_message: Option<String>,
	pub allowed_values: Option<Vec<String>>,
	pub editor: StringEditor,
}

/// Properties of a Tags field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagsProperties {
	pub default_value: Option<Vec<String>>,
	pub default_values: Option<DefaultValueOverrides>,
	pub min_items: Option<usize>,
	pub max_items: Option<usize>,
	pub allowed_values: Option<Vec<String>>,
}

/// Properties of a UI field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiProperties {}
