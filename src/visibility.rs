//! Hidden/disabled state derivation
//!
//! Re-derives every node's hidden and disabled flags from the schema's
//! compiled rules and the tree's current raw value. The pass is pull-based:
//! callers invoke it synchronously after each mutation, so one edit produces
//! exactly one coherent post-state.
//!
//! Hide rules bind both `data` and `itemData` to the node's own scope;
//! disable rules see the whole tree as `data` and the enclosing item (when
//! inside one) as `itemData`. A node whose field is hidden inherits the flag
//! without re-evaluating its own rules; a disabled field likewise disables
//! every control in its item sub-trees.

use crate::form::{FormTree, Slot};
use crate::rules::{CompiledRule, RuleAction, RuleContext};

struct NestedState {
	hidden: bool,
	// None leaves the flag untouched, for ancestor-hidden nodes
	disabled: Option<bool>,
}

struct FieldState {
	hidden: bool,
	disabled: bool,
	// partition -> item -> nested control
	items: Vec<Vec<Vec<NestedState>>>,
}

pub(crate) fn recompute(tree: &mut FormTree) {
	let data = tree.value();

	let states: Vec<FieldState> = tree
		.fields
		.iter()
		.map(|node| {
			let rules = tree.rules.get(&node.field.name).map(Vec::as_slice);
			let self_ctx = RuleContext {
				user: &tree.user,
				data: &data,
				item_data: &data,
			};
			let hidden = any_match(rules, RuleAction::Hide, &self_ctx);
			let disabled = any_match(rules, RuleAction::Disable, &self_ctx) || node.field.is_disabled;

			let items = node
				.partitions
				.iter()
				.map(|partition| {
					let Slot::Items(items) = &partition.slot else {
						return Vec::new();
					};
					items
						.iter()
						.map(|item| {
							let item_value = item.value();
							item.controls
								.iter()
								.map(|nested| {
									if hidden {
										return NestedState {
											hidden: true,
											disabled: disabled.then_some(true),
										};
									}
									let nested_rules =
										tree.rules.get(&nested.field.name).map(Vec::as_slice);
									let nested_self_ctx = RuleContext {
										user: &tree.user,
										data: &item_value,
										item_data: &item_value,
									};
									let nested_ctx = RuleContext {
										user: &tree.user,
										data: &data,
										item_data: &item_value,
									};
									NestedState {
										hidden: any_match(
											nested_rules,
											RuleAction::Hide,
											&nested_self_ctx,
										),
										disabled: Some(
											disabled
												|| any_match(
													nested_rules,
													RuleAction::Disable,
													&nested_ctx,
												) || nested.field.is_disabled,
										),
									}
								})
								.collect()
						})
						.collect()
				})
				.collect();

			FieldState {
				hidden,
				disabled,
				items,
			}
		})
		.collect();

	for (node, state) in tree.fields.iter_mut().zip(states) {
		node.hidden = state.hidden;
		node.disabled = state.disabled;
		for (partition, item_states) in node.partitions.iter_mut().zip(state.items) {
			match &mut partition.slot {
				Slot::Control(control) => {
					control.hidden = state.hidden;
					control.disabled = state.disabled;
				}
				Slot::Items(items) => {
					for (item, nested_states) in items.iter_mut().zip(item_states) {
						for (nested, nested_state) in item.controls.iter_mut().zip(nested_states) {
							nested.control.hidden = nested_state.hidden;
							if let Some(disabled) = nested_state.disabled {
								nested.control.disabled = disabled;
							}
						}
					}
				}
			}
		}
	}
}

fn any_match(rules: Option<&[CompiledRule]>, action: RuleAction, ctx: &RuleContext<'_>) -> bool {
	let Some(rules) = rules else {
		return false;
	};
	rules
		.iter()
		.filter(|rule| rule.action() == action)
		.any(|rule| rule.eval(ctx))
}

#[cfg(test)]
mod tests {
	use crate::form::{FormOptions, FormTree};
	use crate::rules::{RuleAction, RuleDef};
	use crate::schema::{ArrayProperties, Field, FieldProperties, Schema, StringProperties};
	use rstest::rstest;
	use serde_json::json;

	fn string_field(name: &str) -> Field {
		Field::new(name, FieldProperties::String(StringProperties::default()))
	}

	fn tree(fields: Vec<Field>, rules: Vec<RuleDef>) -> FormTree {
		let mut schema = Schema::new("test");
		schema.fields = fields;
		FormTree::build(schema, vec![], rules, FormOptions::default())
	}

	#[rstest]
	fn test_disable_rule_follows_other_field() {
		// Arrange
		let rules = vec![RuleDef::new(
			"b",
			RuleAction::Disable,
			"data.a.iv === 'lock'",
		)];
		let mut form = tree(vec![string_field("a"), string_field("b")], rules);
		assert!(!form.control("b", "iv").unwrap().is_disabled());

		// Act
		form.set_value("a", "iv", json!("lock")).unwrap();

		// Assert
		assert!(form.control("b", "iv").unwrap().is_disabled());

		// Act: and back again
		form.set_value("a", "iv", json!("open")).unwrap();

		// Assert
		assert!(!form.control("b", "iv").unwrap().is_disabled());
	}

	#[rstest]
	fn test_hide_rule_binds_data_to_own_scope() {
		// Arrange: a hide rule on "b" reading data.a still sees the root tree
		let rules = vec![RuleDef::new("b", RuleAction::Hide, "data.a.iv === 'x'")];
		let mut form = tree(vec![string_field("a"), string_field("b")], rules);

		// Act
		form.set_value("a", "iv", json!("x")).unwrap();

		// Assert
		assert!(form.control("b", "iv").unwrap().is_hidden());
		assert!(form.field("b").unwrap().is_hidden());
	}

	#[rstest]
	fn test_static_disabled_survives_non_matching_rule() {
		// Arrange
		let rules = vec![RuleDef::new("a", RuleAction::Disable, "data.a.iv === 'no'")];
		let mut form = tree(vec![string_field("a").disabled()], rules);

		// Act
		form.set_value("a", "iv", json!("anything")).unwrap();

		// Assert: no rule matched, the schema flag is the fallback
		assert!(form.control("a", "iv").unwrap().is_disabled());
	}

	#[rstest]
	fn test_hidden_field_is_excluded_from_validation_but_keeps_value() {
		// Arrange
		let rules = vec![RuleDef::new("b", RuleAction::Hide, "data.a.iv === 'hide'")];
		let mut form = tree(
			vec![string_field("a"), string_field("b").required()],
			rules,
		);
		form.set_value("b", "iv", json!("kept")).unwrap();
		form.set_value("b", "iv", json!(null)).unwrap();
		assert!(!form.is_valid());

		// Act
		form.set_value("a", "iv", json!("hide")).unwrap();

		// Assert: required no longer blocks, value stays in the raw tree
		assert!(form.is_valid());
		assert!(form.value().get("b").is_some());
	}

	#[rstest]
	fn test_malformed_rule_is_inert() {
		// Arrange
		let rules = vec![RuleDef::new("a", RuleAction::Hide, "this is not valid js")];

		// Act
		let form = tree(vec![string_field("a")], rules);

		// Assert
		assert!(!form.control("a", "iv").unwrap().is_hidden());
	}

	#[rstest]
	fn test_user_object_reaches_rule_expressions() {
		// Arrange
		let rules = vec![RuleDef::new(
			"a",
			RuleAction::Disable,
			"user.role === 'viewer'",
		)];
		let mut schema = Schema::new("test");
		schema.fields = vec![string_field("a")];
		let options = FormOptions::default().with_user(json!({ "role": "viewer" }));

		// Act
		let form = FormTree::build(schema, vec![], rules, options);

		// Assert
		assert!(form.control("a", "iv").unwrap().is_disabled());
	}

	#[rstest]
	fn test_nested_rule_sees_item_scope() {
		// Arrange: hide nested "note" when its own item's "kind" is "internal"
		let list = Field::new("list", FieldProperties::Array(ArrayProperties::default()))
			.with_nested(string_field("kind"))
			.with_nested(string_field("note"));
		let rules = vec![RuleDef::new(
			"note",
			RuleAction::Hide,
			"itemData.kind === 'internal'",
		)];
		let mut form = tree(vec![list], rules);
		form.add_item("list", "iv", None).unwrap();
		form.add_item("list", "iv", None).unwrap();

		// Act
		form.set_item_value("list", "iv", 0, "kind", json!("internal"))
			.unwrap();

		// Assert: only the first item's control is hidden
		let items = form.items("list", "iv").unwrap();
		assert!(items[0].control("note").unwrap().is_hidden());
		assert!(!items[1].control("note").unwrap().is_hidden());
	}

	#[rstest]
	fn test_disabled_field_propagates_to_nested_controls() {
		// Arrange: a required nested field inside a rule-disabled array
		let list = Field::new("list", FieldProperties::Array(ArrayProperties::default()))
			.with_nested(string_field("t").required());
		let rules = vec![RuleDef::new(
			"list",
			RuleAction::Disable,
			"data.toggle.iv === 'off'",
		)];
		let mut form = tree(vec![string_field("toggle"), list], rules);
		form.add_item("list", "iv", None).unwrap();
		assert!(!form.is_valid());

		// Act
		form.set_value("toggle", "iv", json!("off")).unwrap();

		// Assert: the item's controls are disabled and stop validating
		assert!(form.field("list").unwrap().is_disabled());
		let items = form.items("list", "iv").unwrap();
		assert!(items[0].control("t").unwrap().is_disabled());
		assert!(form.is_valid());
		assert!(form.submit().is_ok());

		// Act: re-enabling brings the nested requirement back
		form.set_value("toggle", "iv", json!("on")).unwrap();

		// Assert
		assert!(!form.items("list", "iv").unwrap()[0].control("t").unwrap().is_disabled());
		assert!(!form.is_valid());
	}

	#[rstest]
	fn test_statically_disabled_array_disables_its_items() {
		// Arrange
		let list = Field::new("list", FieldProperties::Array(ArrayProperties::default()))
			.with_nested(string_field("t"))
			.disabled();
		let mut form = tree(vec![list], vec![]);

		// Act
		form.add_item("list", "iv", None).unwrap();

		// Assert
		let items = form.items("list", "iv").unwrap();
		assert!(items[0].control("t").unwrap().is_disabled());
	}

	#[rstest]
	fn test_parent_hidden_propagates_to_nested_controls() {
		// Arrange
		let list = Field::new("list", FieldProperties::Array(ArrayProperties::default()))
			.with_nested(string_field("t"));
		let rules = vec![RuleDef::new(
			"list",
			RuleAction::Hide,
			"data.toggle.iv === true",
		)];
		let mut form = tree(vec![string_field("toggle"), list], rules);
		form.add_item("list", "iv", None).unwrap();

		// Act
		form.set_value("toggle", "iv", json!(true)).unwrap();

		// Assert
		assert!(form.field("list").unwrap().is_hidden());
		let items = form.items("list", "iv").unwrap();
		assert!(items[0].control("t").unwrap().is_hidden());
	}
}
