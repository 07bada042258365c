//! Property tests: the rule sandbox and the formatter are total

use contentform::prelude::*;
use contentform::rules::{CompiledRule, RuleContext};
use proptest::prelude::*;
use serde_json::{Value as JsonValue, json};

fn arb_json() -> impl Strategy<Value = JsonValue> {
	let leaf = prop_oneof![
		Just(JsonValue::Null),
		any::<bool>().prop_map(JsonValue::Bool),
		any::<i64>().prop_map(|n| json!(n)),
		(-1.0e9f64..1.0e9).prop_map(|f| json!(f)),
		"[a-zA-Z0-9 ]{0,12}".prop_map(JsonValue::String),
	];
	leaf.prop_recursive(3, 24, 6, |inner| {
		prop_oneof![
			prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
			prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
				.prop_map(|map| JsonValue::Object(map.into_iter().collect())),
		]
	})
}

// A mix of well-formed, nearly-well-formed, and garbage expressions.
fn arb_expression() -> impl Strategy<Value = String> {
	prop_oneof![
		".{0,40}",
		r"data\.[a-z]{1,6}\.[a-z]{1,6} (==|===|!=|!==|<|<=|>|>=) ('x'|42|true|null)",
		r"(data|itemData|user)\.[a-z]{1,6}",
		r"!?data\.[a-z]{1,6} (&&|\|\|) user\.[a-z]{1,6}",
		r"[(!&|=<>. 'a-z0-9]{0,30}",
	]
}

proptest! {
	#[test]
	fn prop_compile_and_eval_never_panic(expression in arb_expression(), data in arb_json(), user in arb_json()) {
		let rule = CompiledRule::compile(RuleDef::new("f", RuleAction::Hide, expression));
		let ctx = RuleContext { user: &user, data: &data, item_data: &data };
		// The result is a bool either way; the property is totality.
		let _ = rule.eval(&ctx);
	}

	#[test]
	fn prop_well_formed_comparisons_compile(expression in r"data\.[a-z]{1,6}\.iv === ('x'|42|true|null)") {
		let rule = CompiledRule::compile(RuleDef::new("f", RuleAction::Disable, expression));
		prop_assert!(rule.is_compiled());
	}

	#[test]
	fn prop_formatter_is_total_over_arbitrary_values(value in arb_json(), allow_html in any::<bool>()) {
		let variants = vec![
			FieldProperties::Array(ArrayProperties::default()),
			FieldProperties::Assets(AssetsProperties::default()),
			FieldProperties::Boolean(BooleanProperties::default()),
			FieldProperties::Component(ComponentProperties::default()),
			FieldProperties::Components(ComponentsProperties::default()),
			FieldProperties::DateTime(DateTimeProperties::default()),
			FieldProperties::Geolocation(GeolocationProperties::default()),
			FieldProperties::Json(JsonProperties::default()),
			FieldProperties::Number(NumberProperties::default()),
			FieldProperties::References(ReferencesProperties::default()),
			FieldProperties::String(StringProperties::default()),
			FieldProperties::Tags(TagsProperties::default()),
			FieldProperties::Ui(UiProperties::default()),
		];
		for properties in variants {
			let field = Field::new("f", properties);
			let _ = format_value(&field, &value, allow_html);
		}
	}

	#[test]
	fn prop_load_accepts_arbitrary_content_data(data in arb_json()) {
		let schema = Schema::new("fuzz")
			.with_field(Field::new("a", FieldProperties::String(StringProperties::default())))
			.with_field(
				Field::new("list", FieldProperties::Array(ArrayProperties::default()))
					.with_nested(Field::new("t", FieldProperties::String(StringProperties::default()))),
			);
		let mut form = FormTree::build(schema, vec![], vec![], FormOptions::default());

		form.load(&data, true);

		// Whatever went in, the tree's value keeps its field-partition shape.
		let value = form.value();
		prop_assert!(value.get("a").is_some());
		prop_assert!(value["list"]["iv"].is_array());
	}
}
