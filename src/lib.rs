//! Schema-driven content forms
//!
//! Compiles a content schema into a live form tree: one node per
//! content-bearing field and partition, with leaf controls that carry
//! values, validators, and hidden/disabled state. Localizable fields fan
//! out into one partition per configured language; everything else lives
//! under the invariant partition `iv`. Array-like fields own one sub-tree
//! per item.
//!
//! The building blocks are usable on their own:
//!
//! - [`schema`]: the field model, a closed set of thirteen field types
//! - [`partition`]: language/invariant partition resolution
//! - [`validators`]: per-type validator composition and execution
//! - [`defaults`]: seeding values for new controls
//! - [`format`]: compact display formatting for list views
//! - [`rules`]: the sandboxed rule-expression compiler
//! - [`form`]: the form tree itself, with load/submit and item editing
//! - [`tracker`]: dirty-state tracking against a value baseline
//!
//! # Examples
//!
//! ```
//! use contentform::prelude::*;
//! use serde_json::json;
//!
//! let schema = Schema::new("article")
//!     .with_field(
//!         Field::new("title", FieldProperties::String(StringProperties::default()))
//!             .localizable()
//!             .required(),
//!     );
//! let languages = vec![Language::new("en").master(), Language::new("de").optional()];
//!
//! let mut form = FormTree::build(schema, languages, vec![], FormOptions::default());
//! form.load(&json!({ "title": { "en": "Hello", "de": "Hallo" } }), true);
//!
//! form.set_value("title", "en", json!("Hello again")).unwrap();
//! let payload = form.submit().unwrap();
//! assert_eq!(
//!     payload,
//!     Some(json!({ "title": { "en": "Hello again", "de": "Hallo" } }))
//! );
//! ```

pub mod defaults;
pub mod form;
pub mod format;
pub mod language;
pub mod partition;
pub mod rules;
pub mod schema;
pub mod tracker;
pub mod validators;

mod visibility;

pub use defaults::default_value;
pub use form::{
	Control, FieldNode, FormError, FormOptions, FormResult, FormTree, ItemNode, NestedControl,
	PartitionNode, Slot,
};
pub use format::{FormattedValue, format_value};
pub use language::Language;
pub use partition::{INVARIANT_KEY, Partition, PartitionResolver};
pub use rules::{CompiledRule, RuleAction, RuleContext, RuleDef};
pub use schema::{Field, FieldProperties, Partitioning, Schema};
pub use tracker::ChangeTracker;
pub use validators::{ValidationError, Validator, field_validators};

/// Commonly used types, importable in one line
pub mod prelude {
	pub use crate::form::{FormError, FormOptions, FormTree};
	pub use crate::format::{FormattedValue, format_value};
	pub use crate::language::Language;
	pub use crate::partition::{INVARIANT_KEY, Partition};
	pub use crate::rules::{RuleAction, RuleDef};
	pub use crate::schema::{
		ArrayProperties, AssetsProperties, BooleanProperties, CalculatedDefaultValue,
		ComponentProperties, ComponentsProperties, DateTimeEditor, DateTimeProperties, Field,
		FieldProperties, GeolocationProperties, JsonProperties, NumberProperties, Partitioning,
		ReferencesProperties, Schema, StringEditor, StringProperties, TagsProperties, UiProperties,
	};
	pub use crate::validators::{ValidationError, Validator};
}
