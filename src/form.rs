//! The live form tree
//!
//! A [`FormTree`] is compiled from a schema, the app's language list, and
//! the schema's declarative rules. Each content-bearing root field gets one
//! node per partition; array-like fields own one sub-tree per item, each
//! with a leaf control per nested field. Leaves are seeded through the
//! default-value visitor and carry the validators composed for their field
//! type.
//!
//! Every mutation goes through the tree's methods, which synchronously
//! re-derive hidden/disabled state and re-run validators before returning,
//! so callers always observe one coherent post-state per edit.

use crate::defaults::default_value;
use crate::language::Language;
use crate::partition::{Partition, PartitionResolver};
use crate::rules::{CompiledRule, RuleDef};
use crate::schema::{Field, Schema};
use crate::tracker::ChangeTracker;
use crate::validators::{ValidationError, Validator, field_validators};
use crate::visibility;
use chrono::Utc;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;

/// Errors surfaced by form tree operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
	#[error("Validation failed for field {field}: {error}")]
	Field { field: String, error: ValidationError },
	#[error("Unknown field: {0}")]
	UnknownField(String),
	#[error("Unknown partition {partition} for field {field}")]
	UnknownPartition { field: String, partition: String },
	#[error("Unknown nested field {nested} for field {field}")]
	UnknownNestedField { field: String, nested: String },
	#[error("Field {0} does not hold array items")]
	NotAnItemField(String),
	#[error("Field {0} holds array items, not a single value")]
	ItemField(String),
	#[error("Item index {index} out of bounds for field {field}")]
	ItemOutOfBounds { field: String, index: usize },
}

/// Result alias for form tree operations
pub type FormResult<T> = Result<T, FormError>;

/// Construction options for a form tree
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
	/// The editing user, exposed to rule expressions as `user`
	pub user: JsonValue,
}

impl FormOptions {
	/// Sets the user object rule expressions evaluate against
	pub fn with_user(mut self, user: JsonValue) -> Self {
		self.user = user;
		self
	}
}

/// A leaf control: one field × one partition (× one array item)
#[derive(Debug, Clone)]
pub struct Control {
	pub(crate) value: JsonValue,
	pub(crate) validators: Vec<Validator>,
	pub(crate) errors: Vec<ValidationError>,
	pub(crate) hidden: bool,
	pub(crate) disabled: bool,
}

impl Control {
	fn new(value: JsonValue, validators: Vec<Validator>, disabled: bool) -> Self {
		Self {
			value,
			validators,
			errors: Vec::new(),
			hidden: false,
			disabled,
		}
	}

	/// The control's current raw value
	pub fn value(&self) -> &JsonValue {
		&self.value
	}

	/// Validation errors from the last re-validation
	pub fn errors(&self) -> &[ValidationError] {
		&self.errors
	}

	/// Whether the control is hidden
	pub fn is_hidden(&self) -> bool {
		self.hidden
	}

	/// Whether the control is disabled
	pub fn is_disabled(&self) -> bool {
		self.disabled
	}

	fn revalidate(&mut self) {
		// Hidden and disabled controls are excluded from validation; their
		// values stay in the raw tree regardless.
		if self.hidden || self.disabled {
			self.errors.clear();
			return;
		}
		self.errors = self
			.validators
			.iter()
			.filter_map(|validator| validator.validate(&self.value).err())
			.collect();
	}
}

/// A leaf control of a nested field inside an array item
#[derive(Debug, Clone)]
pub struct NestedControl {
	pub(crate) field: Field,
	pub(crate) control: Control,
}

impl NestedControl {
	/// The nested field this control belongs to
	pub fn field(&self) -> &Field {
		&self.field
	}

	/// The control itself
	pub fn control(&self) -> &Control {
		&self.control
	}
}

/// One item sub-tree of an array-like partition
#[derive(Debug, Clone)]
pub struct ItemNode {
	pub(crate) controls: Vec<NestedControl>,
}

impl ItemNode {
	/// Creates an item, copying values from `source` when duplicating
	fn new(
		field: &Field,
		partition: &Partition,
		source: Option<&ItemNode>,
		now: chrono::DateTime<Utc>,
	) -> Self {
		let controls = field
			.nested
			.iter()
			.filter(|nested| nested.is_content())
			.map(|nested| {
				let value = match source {
					Some(source) => source
						.control(&nested.name)
						.map(|control| control.value.clone())
						.unwrap_or(JsonValue::Null),
					None => default_value(&nested.properties, &partition.key, now),
				};
				let validators =
					field_validators(&nested.properties, nested.is_required, partition.is_optional);
				NestedControl {
					field: nested.clone(),
					control: Control::new(value, validators, nested.is_disabled),
				}
			})
			.collect();
		Self { controls }
	}

	/// The control of a nested field, by name
	pub fn control(&self, name: &str) -> Option<&Control> {
		self.controls
			.iter()
			.find(|nested| nested.field.name == name)
			.map(|nested| &nested.control)
	}

	/// All nested controls, in schema order
	pub fn controls(&self) -> &[NestedControl] {
		&self.controls
	}

	/// The item's raw value: one key per nested field
	pub fn value(&self) -> JsonValue {
		let mut map = JsonMap::new();
		for nested in &self.controls {
			map.insert(nested.field.name.clone(), nested.control.value.clone());
		}
		JsonValue::Object(map)
	}
}

/// The slot a partition holds: a single control or a list of items
#[derive(Debug, Clone)]
pub enum Slot {
	Control(Control),
	Items(Vec<ItemNode>),
}

/// One partition of a root field
#[derive(Debug, Clone)]
pub struct PartitionNode {
	pub(crate) partition: Partition,
	/// Item-count validators; empty for control slots, which validate
	/// through their own control
	pub(crate) validators: Vec<Validator>,
	pub(crate) errors: Vec<ValidationError>,
	pub(crate) slot: Slot,
}

impl PartitionNode {
	/// The partition descriptor
	pub fn partition(&self) -> &Partition {
		&self.partition
	}

	/// The leaf control, for non-array fields
	pub fn control(&self) -> Option<&Control> {
		match &self.slot {
			Slot::Control(control) => Some(control),
			Slot::Items(_) => None,
		}
	}

	/// The item sub-trees, for array-like fields
	pub fn items(&self) -> Option<&[ItemNode]> {
		match &self.slot {
			Slot::Items(items) => Some(items),
			Slot::Control(_) => None,
		}
	}

	/// Validation errors on this partition
	///
	/// For control slots these live on the control; for item slots they are
	/// the item-count errors.
	pub fn errors(&self) -> &[ValidationError] {
		match &self.slot {
			Slot::Control(control) => &control.errors,
			Slot::Items(_) => &self.errors,
		}
	}

	/// The partition's raw value
	pub fn raw_value(&self) -> JsonValue {
		match &self.slot {
			Slot::Control(control) => control.value.clone(),
			Slot::Items(items) => {
				JsonValue::Array(items.iter().map(ItemNode::value).collect())
			}
		}
	}
}

/// One root field of the form tree, owning a node per partition
#[derive(Debug, Clone)]
pub struct FieldNode {
	pub(crate) field: Field,
	pub(crate) partitions: Vec<PartitionNode>,
	pub(crate) hidden: bool,
	pub(crate) disabled: bool,
}

impl FieldNode {
	/// The schema field this node was built from
	pub fn field(&self) -> &Field {
		&self.field
	}

	/// The partition nodes, in partition order
	pub fn partitions(&self) -> &[PartitionNode] {
		&self.partitions
	}

	/// Looks up a partition node by key
	pub fn partition(&self, key: &str) -> Option<&PartitionNode> {
		self.partitions.iter().find(|p| p.partition.key == key)
	}

	/// Whether the whole field is currently hidden
	pub fn is_hidden(&self) -> bool {
		self.hidden
	}

	/// Whether the whole field is currently disabled
	pub fn is_disabled(&self) -> bool {
		self.disabled
	}
}

/// The live form tree of one edit session
///
/// # Examples
///
/// ```
/// use contentform::form::{FormOptions, FormTree};
/// use contentform::schema::{Field, FieldProperties, Schema, StringProperties};
/// use serde_json::json;
///
/// let schema = Schema::new("article")
///     .with_field(Field::new("title", FieldProperties::String(StringProperties::default())));
/// let mut tree = FormTree::build(schema, vec![], vec![], FormOptions::default());
///
/// tree.load(&json!({ "title": { "iv": "X" } }), true);
/// assert!(!tree.has_changed());
///
/// tree.set_value("title", "iv", json!("Y")).unwrap();
/// let payload = tree.submit().unwrap();
/// assert_eq!(payload, Some(json!({ "title": { "iv": "Y" } })));
/// ```
#[derive(Debug, Clone)]
pub struct FormTree {
	schema: Schema,
	resolver: PartitionResolver,
	pub(crate) rules: HashMap<String, Vec<CompiledRule>>,
	pub(crate) fields: Vec<FieldNode>,
	pub(crate) user: JsonValue,
	tracker: ChangeTracker,
}

impl FormTree {
	/// Compiles a form tree from a schema, languages, and rules
	///
	/// Construction never fails: malformed rule expressions compile to
	/// inert rules, and every leaf is seeded through the default-value
	/// visitor.
	pub fn build(
		schema: Schema,
		languages: Vec<Language>,
		rules: Vec<RuleDef>,
		options: FormOptions,
	) -> Self {
		let resolver = PartitionResolver::new(languages);
		let now = Utc::now();

		let mut rule_map: HashMap<String, Vec<CompiledRule>> = HashMap::new();
		for def in rules {
			let compiled = CompiledRule::compile(def);
			rule_map
				.entry(compiled.field().to_string())
				.or_default()
				.push(compiled);
		}

		let mut fields = Vec::new();
		for field in schema.fields.iter().filter(|f| f.is_content()) {
			let partitions = resolver
				.get_all(field)
				.into_iter()
				.map(|partition| {
					if field.has_items() {
						PartitionNode {
							validators: field_validators(
								&field.properties,
								field.is_required,
								partition.is_optional,
							),
							errors: Vec::new(),
							slot: Slot::Items(Vec::new()),
							partition,
						}
					} else {
						let control = Control::new(
							default_value(&field.properties, &partition.key, now),
							field_validators(
								&field.properties,
								field.is_required,
								partition.is_optional,
							),
							field.is_disabled,
						);
						PartitionNode {
							validators: Vec::new(),
							errors: Vec::new(),
							slot: Slot::Control(control),
							partition,
						}
					}
				})
				.collect();
			fields.push(FieldNode {
				field: field.clone(),
				partitions,
				hidden: false,
				disabled: field.is_disabled,
			});
		}

		tracing::debug!(
			schema = %schema.name,
			fields = fields.len(),
			rules = rule_map.values().map(Vec::len).sum::<usize>(),
			"form tree built"
		);

		let mut tree = Self {
			schema,
			resolver,
			rules: rule_map,
			fields,
			user: options.user,
			tracker: ChangeTracker::default(),
		};
		visibility::recompute(&mut tree);
		tree
	}

	/// The schema this tree was built from
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// The configured languages
	pub fn languages(&self) -> &[Language] {
		self.resolver.languages()
	}

	/// All root field nodes, in schema order
	pub fn fields(&self) -> &[FieldNode] {
		&self.fields
	}

	/// Looks up a root field node by name
	pub fn field(&self, name: &str) -> Option<&FieldNode> {
		self.fields.iter().find(|node| node.field.name == name)
	}

	/// The control of a field × partition, for non-array fields
	pub fn control(&self, field: &str, partition: &str) -> Option<&Control> {
		self.field(field)?.partition(partition)?.control()
	}

	/// The item sub-trees of a field × partition, for array-like fields
	pub fn items(&self, field: &str, partition: &str) -> Option<&[ItemNode]> {
		self.field(field)?.partition(partition)?.items()
	}

	/// The whole tree's raw value, including hidden and disabled controls
	pub fn value(&self) -> JsonValue {
		JsonValue::Object(self.value_map())
	}

	fn value_map(&self) -> JsonMap<String, JsonValue> {
		let mut map = JsonMap::new();
		for node in &self.fields {
			let mut field_map = JsonMap::new();
			for partition in &node.partitions {
				field_map.insert(partition.partition.key.clone(), partition.raw_value());
			}
			map.insert(node.field.name.clone(), JsonValue::Object(field_map));
		}
		map
	}

	/// Loads content data into the tree
	///
	/// Array partitions are reconciled to the incoming item counts before
	/// leaf values are assigned. Unknown fields and partitions in the data
	/// are skipped; a scalar where an item list was expected counts as
	/// empty. The loaded value becomes the new change baseline.
	pub fn load(&mut self, data: &JsonValue, is_initial: bool) {
		let now = Utc::now();

		if let Some(map) = data.as_object() {
			for key in map.keys() {
				if !self.fields.iter().any(|node| node.field.name == *key) {
					tracing::debug!(field = %key, "ignoring unknown field in content data");
				}
			}
		}

		for node in &mut self.fields {
			let field_data = data.get(&node.field.name);
			if let Some(map) = field_data.and_then(JsonValue::as_object) {
				for key in map.keys() {
					if !node.partitions.iter().any(|p| p.partition.key == *key) {
						tracing::debug!(
							field = %node.field.name,
							partition = %key,
							"ignoring unknown partition in content data"
						);
					}
				}
			}
			for partition in &mut node.partitions {
				let incoming = field_data.and_then(|d| d.get(&partition.partition.key));
				match &mut partition.slot {
					Slot::Control(control) => {
						control.value = incoming.cloned().unwrap_or(JsonValue::Null);
					}
					Slot::Items(items) => {
						let incoming_items = match incoming {
							None | Some(JsonValue::Null) => Vec::new(),
							Some(JsonValue::Array(values)) => values.clone(),
							Some(other) => {
								tracing::debug!(
									field = %node.field.name,
									partition = %partition.partition.key,
									value_type = %json_type(other),
									"expected an item list, treating as empty"
								);
								Vec::new()
							}
						};
						items.truncate(incoming_items.len());
						while items.len() < incoming_items.len() {
							items.push(ItemNode::new(
								&node.field,
								&partition.partition,
								None,
								now,
							));
						}
						for (item, item_data) in items.iter_mut().zip(incoming_items.iter()) {
							for nested in &mut item.controls {
								nested.control.value = item_data
									.get(&nested.field.name)
									.cloned()
									.unwrap_or(JsonValue::Null);
							}
						}
					}
				}
			}
		}

		visibility::recompute(self);
		if is_initial {
			// A freshly loaded form starts pristine
			self.clear_errors();
		} else {
			self.validate_all();
		}
		let value = self.value();
		self.tracker.take(value);
	}

	/// Sets the value of a non-array control
	pub fn set_value(&mut self, field: &str, partition: &str, value: JsonValue) -> FormResult<()> {
		let field_index = self.field_index(field)?;
		let partition_index = self.partition_index(field_index, partition)?;
		match &mut self.fields[field_index].partitions[partition_index].slot {
			Slot::Control(control) => control.value = value,
			Slot::Items(_) => return Err(FormError::ItemField(field.to_string())),
		}
		self.refresh();
		Ok(())
	}

	/// Sets the value of a nested control inside an array item
	pub fn set_item_value(
		&mut self,
		field: &str,
		partition: &str,
		index: usize,
		nested: &str,
		value: JsonValue,
	) -> FormResult<()> {
		let field_index = self.field_index(field)?;
		let partition_index = self.partition_index(field_index, partition)?;
		let Slot::Items(items) = &mut self.fields[field_index].partitions[partition_index].slot
		else {
			return Err(FormError::NotAnItemField(field.to_string()));
		};
		let item = items.get_mut(index).ok_or(FormError::ItemOutOfBounds {
			field: field.to_string(),
			index,
		})?;
		let control = item
			.controls
			.iter_mut()
			.find(|candidate| candidate.field.name == nested)
			.ok_or_else(|| FormError::UnknownNestedField {
				field: field.to_string(),
				nested: nested.to_string(),
			})?;
		control.control.value = value;
		self.refresh();
		Ok(())
	}

	/// Appends an item sub-tree to an array-like partition
	///
	/// With `source`, the new item copies the source item's current values
	/// (duplicating an entry); otherwise nested controls are seeded through
	/// the default-value visitor.
	pub fn add_item(
		&mut self,
		field: &str,
		partition: &str,
		source: Option<usize>,
	) -> FormResult<()> {
		let field_index = self.field_index(field)?;
		let partition_index = self.partition_index(field_index, partition)?;
		let now = Utc::now();
		let node = &mut self.fields[field_index];
		let schema_field = node.field.clone();
		let partition_node = &mut node.partitions[partition_index];
		let partition_key = partition_node.partition.clone();
		let Slot::Items(items) = &mut partition_node.slot else {
			return Err(FormError::NotAnItemField(field.to_string()));
		};
		let item = match source {
			None => ItemNode::new(&schema_field, &partition_key, None, now),
			Some(index) => {
				let source_item = items.get(index).ok_or(FormError::ItemOutOfBounds {
					field: field.to_string(),
					index,
				})?;
				ItemNode::new(&schema_field, &partition_key, Some(source_item), now)
			}
		};
		items.push(item);
		self.refresh();
		Ok(())
	}

	/// Removes an item sub-tree; the item's nodes are destroyed
	pub fn remove_item(&mut self, field: &str, partition: &str, index: usize) -> FormResult<()> {
		let field_index = self.field_index(field)?;
		let partition_index = self.partition_index(field_index, partition)?;
		let Slot::Items(items) = &mut self.fields[field_index].partitions[partition_index].slot
		else {
			return Err(FormError::NotAnItemField(field.to_string()));
		};
		if index >= items.len() {
			return Err(FormError::ItemOutOfBounds {
				field: field.to_string(),
				index,
			});
		}
		items.remove(index);
		self.refresh();
		Ok(())
	}

	/// Moves an item sub-tree to a new position, preserving its values
	pub fn move_item(
		&mut self,
		field: &str,
		partition: &str,
		from: usize,
		to: usize,
	) -> FormResult<()> {
		let field_index = self.field_index(field)?;
		let partition_index = self.partition_index(field_index, partition)?;
		let Slot::Items(items) = &mut self.fields[field_index].partitions[partition_index].slot
		else {
			return Err(FormError::NotAnItemField(field.to_string()));
		};
		if from >= items.len() {
			return Err(FormError::ItemOutOfBounds {
				field: field.to_string(),
				index: from,
			});
		}
		if to >= items.len() {
			return Err(FormError::ItemOutOfBounds {
				field: field.to_string(),
				index: to,
			});
		}
		let item = items.remove(from);
		items.insert(to, item);
		self.refresh();
		Ok(())
	}

	/// Unsets a field wholesale: controls become `null`, items are cleared
	pub fn unset(&mut self, field: &str) -> FormResult<()> {
		let field_index = self.field_index(field)?;
		for partition in &mut self.fields[field_index].partitions {
			match &mut partition.slot {
				Slot::Control(control) => control.value = JsonValue::Null,
				Slot::Items(items) => items.clear(),
			}
		}
		self.refresh();
		Ok(())
	}

	/// Whether the current value differs from the baseline
	pub fn has_changed(&self) -> bool {
		self.tracker.has_changed(&self.value())
	}

	/// Whether an external payload differs from the current value
	pub fn has_changes(&self, candidate: &JsonValue) -> bool {
		self.tracker.has_changes(candidate, &self.value())
	}

	/// Whether every enabled, visible control passes its validators
	pub fn is_valid(&self) -> bool {
		self.first_error().is_none()
	}

	/// Produces the patch payload for saving
	///
	/// Returns `Err` when validation blocks the save, `Ok(None)` when
	/// nothing changed relative to the baseline, and `Ok(Some(payload))`
	/// otherwise. Update-mode payloads contain only the fields whose value
	/// differs from the baseline; create-mode payloads (no baseline yet)
	/// contain every field. On success the baseline is retaken.
	pub fn submit(&mut self) -> FormResult<Option<JsonValue>> {
		self.validate_all();
		if let Some((field, error)) = self.first_error() {
			return Err(FormError::Field { field, error });
		}

		let current = self.value_map();
		let payload = match self.tracker.baseline() {
			None => JsonValue::Object(current.clone()),
			Some(baseline) => {
				let changed: JsonMap<String, JsonValue> = current
					.iter()
					.filter(|(key, value)| baseline.get(key.as_str()) != Some(value))
					.map(|(key, value)| (key.clone(), value.clone()))
					.collect();
				if changed.is_empty() {
					return Ok(None);
				}
				JsonValue::Object(changed)
			}
		};
		self.tracker.take(JsonValue::Object(current));
		Ok(Some(payload))
	}

	pub(crate) fn validate_all(&mut self) {
		for node in &mut self.fields {
			let field_inactive = node.hidden || node.disabled;
			for partition in &mut node.partitions {
				match &mut partition.slot {
					Slot::Control(control) => control.revalidate(),
					Slot::Items(items) => {
						if field_inactive {
							partition.errors.clear();
						} else {
							let value =
								JsonValue::Array(items.iter().map(ItemNode::value).collect());
							partition.errors = partition
								.validators
								.iter()
								.filter_map(|validator| validator.validate(&value).err())
								.collect();
						}
						for item in items {
							for nested in &mut item.controls {
								nested.control.revalidate();
							}
						}
					}
				}
			}
		}
	}

	fn clear_errors(&mut self) {
		for node in &mut self.fields {
			for partition in &mut node.partitions {
				partition.errors.clear();
				match &mut partition.slot {
					Slot::Control(control) => control.errors.clear(),
					Slot::Items(items) => {
						for item in items {
							for nested in &mut item.controls {
								nested.control.errors.clear();
							}
						}
					}
				}
			}
		}
	}

	fn first_error(&self) -> Option<(String, ValidationError)> {
		for node in &self.fields {
			for partition in &node.partitions {
				if let Some(error) = partition.errors().first() {
					return Some((node.field.name.clone(), error.clone()));
				}
				if let Slot::Items(items) = &partition.slot {
					for item in items {
						for nested in &item.controls {
							if let Some(error) = nested.control.errors.first() {
								return Some((
									format!("{}.{}", node.field.name, nested.field.name),
									error.clone(),
								));
							}
						}
					}
				}
			}
		}
		None
	}

	fn refresh(&mut self) {
		visibility::recompute(self);
		self.validate_all();
	}

	fn field_index(&self, field: &str) -> FormResult<usize> {
		self.fields
			.iter()
			.position(|node| node.field.name == field)
			.ok_or_else(|| FormError::UnknownField(field.to_string()))
	}

	fn partition_index(&self, field_index: usize, partition: &str) -> FormResult<usize> {
		let node = &self.fields[field_index];
		node.partitions
			.iter()
			.position(|p| p.partition.key == partition)
			.ok_or_else(|| FormError::UnknownPartition {
				field: node.field.name.clone(),
				partition: partition.to_string(),
			})
	}
}

fn json_type(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "boolean",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}
