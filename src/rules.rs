//! Declarative Disable/Hide rules and their expression language
//!
//! Rules arrive as data: a field name, an action, and a boolean expression
//! over the live form data. Expressions are parsed into a small AST over a
//! restricted grammar (literals, `data`/`itemData`/`user` path lookups,
//! comparison and logical operators) and interpreted directly; no host
//! scripting facility is ever invoked.
//!
//! Compilation is infallible by contract: a malformed expression compiles to
//! an inert rule that never fires, and evaluation is total: missing paths
//! resolve to "undefined", type-mismatched comparisons are `false`, and
//! nothing panics.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// What a rule does to its field when the condition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RuleAction {
	/// The field's controls become disabled
	Disable,
	/// The field's controls become hidden
	Hide,
}

/// A declarative rule as authored in the schema editor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDef {
	/// Name of the field the rule applies to
	pub field: String,
	/// Disable or Hide
	#[serde(rename = "type")]
	pub action: RuleAction,
	/// Boolean expression over `(data, itemData, user)`
	pub expression: String,
}

impl RuleDef {
	/// Creates a rule definition
	pub fn new(field: impl Into<String>, action: RuleAction, expression: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			action,
			expression: expression.into(),
		}
	}
}

/// The data a rule expression is evaluated against
///
/// Hide rules bind `data` and `item_data` to the node's own scope; Disable
/// rules bind outer content data, containing item data, and the user.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
	pub user: &'a JsonValue,
	pub data: &'a JsonValue,
	pub item_data: &'a JsonValue,
}

/// A rule with its expression parsed into an evaluable predicate
#[derive(Debug, Clone)]
pub struct CompiledRule {
	def: RuleDef,
	expr: Option<Expr>,
}

impl CompiledRule {
	/// Compiles a rule definition; never fails
	///
	/// A malformed expression produces a rule whose predicate is always
	/// `false`, and the problem is logged for the schema author.
	///
	/// # Examples
	///
	/// ```
	/// use contentform::rules::{CompiledRule, RuleAction, RuleContext, RuleDef};
	/// use serde_json::json;
	///
	/// let rule = CompiledRule::compile(RuleDef::new(
	///     "b",
	///     RuleAction::Disable,
	///     "data.a.iv === 'x'",
	/// ));
	/// let data = json!({ "a": { "iv": "x" } });
	/// let user = json!({});
	/// let ctx = RuleContext { user: &user, data: &data, item_data: &data };
	/// assert!(rule.eval(&ctx));
	/// ```
	pub fn compile(def: RuleDef) -> Self {
		let expr = match parse(&def.expression) {
			Ok(expr) => Some(expr),
			Err(error) => {
				tracing::warn!(
					field = %def.field,
					expression = %def.expression,
					%error,
					"rule expression failed to compile, rule will never fire"
				);
				None
			}
		};
		Self { def, expr }
	}

	/// The field this rule applies to
	pub fn field(&self) -> &str {
		&self.def.field
	}

	/// Disable or Hide
	pub fn action(&self) -> RuleAction {
		self.def.action
	}

	/// Whether the expression parsed; inert rules return `false`
	pub fn is_compiled(&self) -> bool {
		self.expr.is_some()
	}

	/// Evaluates the predicate; total, never panics
	pub fn eval(&self, ctx: &RuleContext<'_>) -> bool {
		match &self.expr {
			Some(expr) => eval_expr(expr, ctx).truthy(),
			None => false,
		}
	}
}

/// Errors raised while parsing a rule expression
///
/// These never escape [`CompiledRule::compile`]; they exist so the compile
/// path can log why a rule was turned inert.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
	#[error("Unexpected character '{ch}' at position {position}")]
	UnexpectedChar { position: usize, ch: char },
	#[error("Unterminated string literal starting at position {position}")]
	UnterminatedString { position: usize },
	#[error("Invalid number at position {position}")]
	InvalidNumber { position: usize },
	#[error("Unexpected token '{token}'")]
	UnexpectedToken { token: String },
	#[error("Unexpected end of expression")]
	UnexpectedEnd,
	#[error("Unknown path root '{name}': expected data, itemData, or user")]
	UnknownRoot { name: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
	Literal(Literal),
	Path { root: PathRoot, segments: Vec<String> },
	Not(Box<Expr>),
	Binary {
		op: BinOp,
		lhs: Box<Expr>,
		rhs: Box<Expr>,
	},
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
	Str(String),
	Num(f64),
	Bool(bool),
	Null,
	Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathRoot {
	Data,
	ItemData,
	User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
	Eq,
	Ne,
	StrictEq,
	StrictNe,
	Lt,
	Le,
	Gt,
	Ge,
	And,
	Or,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
	Ident(String),
	Str(String),
	Num(f64),
	Op(BinOp),
	Bang,
	Dot,
	LParen,
	RParen,
	LBracket,
	RBracket,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
	let mut tokens = Vec::new();
	let chars: Vec<char> = input.chars().collect();
	let mut i = 0;

	while i < chars.len() {
		let ch = chars[i];
		match ch {
			c if c.is_whitespace() => i += 1,
			'(' => {
				tokens.push(Token::LParen);
				i += 1;
			}
			')' => {
				tokens.push(Token::RParen);
				i += 1;
			}
			'[' => {
				tokens.push(Token::LBracket);
				i += 1;
			}
			']' => {
				tokens.push(Token::RBracket);
				i += 1;
			}
			'.' => {
				tokens.push(Token::Dot);
				i += 1;
			}
			'!' => {
				if chars.get(i + 1) == Some(&'=') {
					if chars.get(i + 2) == Some(&'=') {
						tokens.push(Token::Op(BinOp::StrictNe));
						i += 3;
					} else {
						tokens.push(Token::Op(BinOp::Ne));
						i += 2;
					}
				} else {
					tokens.push(Token::Bang);
					i += 1;
				}
			}
			'=' => {
				if chars.get(i + 1) == Some(&'=') {
					if chars.get(i + 2) == Some(&'=') {
						tokens.push(Token::Op(BinOp::StrictEq));
						i += 3;
					} else {
						tokens.push(Token::Op(BinOp::Eq));
						i += 2;
					}
				} else {
					return Err(ExprError::UnexpectedChar { position: i, ch });
				}
			}
			'<' => {
				if chars.get(i + 1) == Some(&'=') {
					tokens.push(Token::Op(BinOp::Le));
					i += 2;
				} else {
					tokens.push(Token::Op(BinOp::Lt));
					i += 1;
				}
			}
			'>' => {
				if chars.get(i + 1) == Some(&'=') {
					tokens.push(Token::Op(BinOp::Ge));
					i += 2;
				} else {
					tokens.push(Token::Op(BinOp::Gt));
					i += 1;
				}
			}
			'&' => {
				if chars.get(i + 1) == Some(&'&') {
					tokens.push(Token::Op(BinOp::And));
					i += 2;
				} else {
					return Err(ExprError::UnexpectedChar { position: i, ch });
				}
			}
			'|' => {
				if chars.get(i + 1) == Some(&'|') {
					tokens.push(Token::Op(BinOp::Or));
					i += 2;
				} else {
					return Err(ExprError::UnexpectedChar { position: i, ch });
				}
			}
			'\'' | '"' => {
				let quote = ch;
				let start = i;
				let mut literal = String::new();
				i += 1;
				loop {
					match chars.get(i) {
						None => return Err(ExprError::UnterminatedString { position: start }),
						Some(&c) if c == quote => {
							i += 1;
							break;
						}
						Some('\\') => {
							let escaped = chars
								.get(i + 1)
								.ok_or(ExprError::UnterminatedString { position: start })?;
							literal.push(match escaped {
								'n' => '\n',
								't' => '\t',
								other => *other,
							});
							i += 2;
						}
						Some(&c) => {
							literal.push(c);
							i += 1;
						}
					}
				}
				tokens.push(Token::Str(literal));
			}
			c if c.is_ascii_digit() => {
				let start = i;
				while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
					i += 1;
				}
				let text: String = chars[start..i].iter().collect();
				let number = text
					.parse::<f64>()
					.map_err(|_| ExprError::InvalidNumber { position: start })?;
				tokens.push(Token::Num(number));
			}
			c if c.is_ascii_alphabetic() || c == '_' => {
				let start = i;
				while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
					i += 1;
				}
				tokens.push(Token::Ident(chars[start..i].iter().collect()));
			}
			_ => return Err(ExprError::UnexpectedChar { position: i, ch }),
		}
	}
	Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser (recursive descent, precedence: ! > comparison > && > ||)
// ---------------------------------------------------------------------------

struct Parser {
	tokens: Vec<Token>,
	position: usize,
}

/// Parses an expression into its AST
fn parse(input: &str) -> Result<Expr, ExprError> {
	let tokens = tokenize(input)?;
	let mut parser = Parser { tokens, position: 0 };
	let expr = parser.parse_or()?;
	match parser.peek() {
		None => Ok(expr),
		Some(token) => Err(ExprError::UnexpectedToken {
			token: format!("{token:?}"),
		}),
	}
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.position)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.position).cloned();
		if token.is_some() {
			self.position += 1;
		}
		token
	}

	fn eat_op(&mut self, ops: &[BinOp]) -> Option<BinOp> {
		if let Some(Token::Op(op)) = self.peek()
			&& ops.contains(op)
		{
			let op = *op;
			self.position += 1;
			return Some(op);
		}
		None
	}

	fn parse_or(&mut self) -> Result<Expr, ExprError> {
		let mut lhs = self.parse_and()?;
		while self.eat_op(&[BinOp::Or]).is_some() {
			let rhs = self.parse_and()?;
			lhs = Expr::Binary {
				op: BinOp::Or,
				lhs: Box::new(lhs),
				rhs: Box::new(rhs),
			};
		}
		Ok(lhs)
	}

	fn parse_and(&mut self) -> Result<Expr, ExprError> {
		let mut lhs = self.parse_comparison()?;
		while self.eat_op(&[BinOp::And]).is_some() {
			let rhs = self.parse_comparison()?;
			lhs = Expr::Binary {
				op: BinOp::And,
				lhs: Box::new(lhs),
				rhs: Box::new(rhs),
			};
		}
		Ok(lhs)
	}

	fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
		let comparisons = [
			BinOp::Eq,
			BinOp::Ne,
			BinOp::StrictEq,
			BinOp::StrictNe,
			BinOp::Lt,
			BinOp::Le,
			BinOp::Gt,
			BinOp::Ge,
		];
		let mut lhs = self.parse_unary()?;
		while let Some(op) = self.eat_op(&comparisons) {
			let rhs = self.parse_unary()?;
			lhs = Expr::Binary {
				op,
				lhs: Box::new(lhs),
				rhs: Box::new(rhs),
			};
		}
		Ok(lhs)
	}

	fn parse_unary(&mut self) -> Result<Expr, ExprError> {
		if matches!(self.peek(), Some(Token::Bang)) {
			self.position += 1;
			let inner = self.parse_unary()?;
			return Ok(Expr::Not(Box::new(inner)));
		}
		self.parse_primary()
	}

	fn parse_primary(&mut self) -> Result<Expr, ExprError> {
		match self.advance() {
			None => Err(ExprError::UnexpectedEnd),
			Some(Token::Num(n)) => Ok(Expr::Literal(Literal::Num(n))),
			Some(Token::Str(s)) => Ok(Expr::Literal(Literal::Str(s))),
			Some(Token::LParen) => {
				let inner = self.parse_or()?;
				match self.advance() {
					Some(Token::RParen) => Ok(inner),
					Some(token) => Err(ExprError::UnexpectedToken {
						token: format!("{token:?}"),
					}),
					None => Err(ExprError::UnexpectedEnd),
				}
			}
			Some(Token::Ident(name)) => match name.as_str() {
				"true" => Ok(Expr::Literal(Literal::Bool(true))),
				"false" => Ok(Expr::Literal(Literal::Bool(false))),
				"null" => Ok(Expr::Literal(Literal::Null)),
				"undefined" => Ok(Expr::Literal(Literal::Undefined)),
				"data" => self.parse_path(PathRoot::Data),
				"itemData" => self.parse_path(PathRoot::ItemData),
				"user" => self.parse_path(PathRoot::User),
				_ => Err(ExprError::UnknownRoot { name }),
			},
			Some(token) => Err(ExprError::UnexpectedToken {
				token: format!("{token:?}"),
			}),
		}
	}

	fn parse_path(&mut self, root: PathRoot) -> Result<Expr, ExprError> {
		let mut segments = Vec::new();
		loop {
			match self.peek() {
				Some(Token::Dot) => {
					self.position += 1;
					match self.advance() {
						Some(Token::Ident(name)) => segments.push(name),
						Some(token) => {
							return Err(ExprError::UnexpectedToken {
								token: format!("{token:?}"),
							});
						}
						None => return Err(ExprError::UnexpectedEnd),
					}
				}
				Some(Token::LBracket) => {
					self.position += 1;
					let segment = match self.advance() {
						Some(Token::Str(s)) => s,
						Some(Token::Num(n)) => {
							// Array index segments
							if n.fract() == 0.0 && n >= 0.0 {
								(n as u64).to_string()
							} else {
								return Err(ExprError::UnexpectedToken {
									token: n.to_string(),
								});
							}
						}
						Some(token) => {
							return Err(ExprError::UnexpectedToken {
								token: format!("{token:?}"),
							});
						}
						None => return Err(ExprError::UnexpectedEnd),
					};
					match self.advance() {
						Some(Token::RBracket) => segments.push(segment),
						Some(token) => {
							return Err(ExprError::UnexpectedToken {
								token: format!("{token:?}"),
							});
						}
						None => return Err(ExprError::UnexpectedEnd),
					}
				}
				_ => break,
			}
		}
		Ok(Expr::Path { root, segments })
	}
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum EvalValue<'a> {
	/// A path that resolved nowhere, or the `undefined` literal
	Undefined,
	/// The result of a comparison or logical operator
	Bool(bool),
	/// A number literal
	Num(f64),
	/// A string literal
	Str(&'a str),
	/// A value borrowed from the evaluation context
	Json(&'a JsonValue),
}

impl EvalValue<'_> {
	fn truthy(&self) -> bool {
		match self {
			Self::Undefined => false,
			Self::Bool(b) => *b,
			Self::Num(n) => *n != 0.0,
			Self::Str(s) => !s.is_empty(),
			Self::Json(value) => match value {
				JsonValue::Null => false,
				JsonValue::Bool(b) => *b,
				JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
				JsonValue::String(s) => !s.is_empty(),
				JsonValue::Array(_) | JsonValue::Object(_) => true,
			},
		}
	}

	fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Json(JsonValue::Null))
	}

	fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Num(n) => Some(*n),
			Self::Json(JsonValue::Number(n)) => n.as_f64(),
			_ => None,
		}
	}

	fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			Self::Json(JsonValue::String(s)) => Some(s),
			_ => None,
		}
	}

	fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			Self::Json(JsonValue::Bool(b)) => Some(*b),
			_ => None,
		}
	}
}

static NULL: JsonValue = JsonValue::Null;

fn eval_expr<'a>(expr: &'a Expr, ctx: &RuleContext<'a>) -> EvalValue<'a> {
	match expr {
		Expr::Literal(literal) => match literal {
			Literal::Str(s) => EvalValue::Str(s),
			Literal::Num(n) => EvalValue::Num(*n),
			Literal::Bool(b) => EvalValue::Bool(*b),
			Literal::Null => EvalValue::Json(&NULL),
			Literal::Undefined => EvalValue::Undefined,
		},
		Expr::Path { root, segments } => resolve_path(*root, segments, ctx),
		Expr::Not(inner) => EvalValue::Bool(!eval_expr(inner, ctx).truthy()),
		Expr::Binary { op, lhs, rhs } => {
			match op {
				// Logical operators short-circuit
				BinOp::And => {
					let lhs = eval_expr(lhs, ctx);
					if !lhs.truthy() {
						return EvalValue::Bool(false);
					}
					EvalValue::Bool(eval_expr(rhs, ctx).truthy())
				}
				BinOp::Or => {
					let lhs = eval_expr(lhs, ctx);
					if lhs.truthy() {
						return EvalValue::Bool(true);
					}
					EvalValue::Bool(eval_expr(rhs, ctx).truthy())
				}
				_ => {
					let lhs = eval_expr(lhs, ctx);
					let rhs = eval_expr(rhs, ctx);
					EvalValue::Bool(compare(*op, &lhs, &rhs))
				}
			}
		}
	}
}

fn resolve_path<'a>(
	root: PathRoot,
	segments: &[String],
	ctx: &RuleContext<'a>,
) -> EvalValue<'a> {
	let mut current = match root {
		PathRoot::Data => ctx.data,
		PathRoot::ItemData => ctx.item_data,
		PathRoot::User => ctx.user,
	};
	for segment in segments {
		let next = match current {
			JsonValue::Object(map) => map.get(segment),
			JsonValue::Array(items) => segment
				.parse::<usize>()
				.ok()
				.and_then(|index| items.get(index)),
			_ => None,
		};
		match next {
			Some(value) => current = value,
			None => return EvalValue::Undefined,
		}
	}
	EvalValue::Json(current)
}

fn compare(op: BinOp, lhs: &EvalValue<'_>, rhs: &EvalValue<'_>) -> bool {
	match op {
		BinOp::Eq => loose_eq(lhs, rhs),
		BinOp::Ne => !loose_eq(lhs, rhs),
		BinOp::StrictEq => strict_eq(lhs, rhs),
		BinOp::StrictNe => !strict_eq(lhs, rhs),
		BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => ordered(op, lhs, rhs),
		BinOp::And | BinOp::Or => false,
	}
}

/// Loose equality: `null` and `undefined` are equal, numbers compare by
/// value, no further cross-type coercion.
fn loose_eq(lhs: &EvalValue<'_>, rhs: &EvalValue<'_>) -> bool {
	if lhs.is_nullish() || rhs.is_nullish() {
		return lhs.is_nullish() && rhs.is_nullish();
	}
	if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
		return a == b;
	}
	if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
		return a == b;
	}
	if let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) {
		return a == b;
	}
	if let (EvalValue::Json(a), EvalValue::Json(b)) = (lhs, rhs) {
		return a == b;
	}
	false
}

/// Strict equality: same kind and same value; `null !== undefined`.
fn strict_eq(lhs: &EvalValue<'_>, rhs: &EvalValue<'_>) -> bool {
	match (lhs, rhs) {
		(EvalValue::Undefined, EvalValue::Undefined) => true,
		(EvalValue::Undefined, _) | (_, EvalValue::Undefined) => false,
		_ if lhs.is_nullish() || rhs.is_nullish() => lhs.is_nullish() && rhs.is_nullish(),
		_ => {
			if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
				a == b
			} else if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
				a == b
			} else if let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) {
				a == b
			} else if let (EvalValue::Json(a), EvalValue::Json(b)) = (lhs, rhs) {
				a == b
			} else {
				false
			}
		}
	}
}

/// Ordering only holds between two numbers or two strings.
fn ordered(op: BinOp, lhs: &EvalValue<'_>, rhs: &EvalValue<'_>) -> bool {
	if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
		return match op {
			BinOp::Lt => a < b,
			BinOp::Le => a <= b,
			BinOp::Gt => a > b,
			BinOp::Ge => a >= b,
			_ => false,
		};
	}
	if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
		return match op {
			BinOp::Lt => a < b,
			BinOp::Le => a <= b,
			BinOp::Gt => a > b,
			BinOp::Ge => a >= b,
			_ => false,
		};
	}
	false
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn eval(expression: &str, data: JsonValue) -> bool {
		let user = json!({ "name": "editor", "roles": ["writer"] });
		let rule = CompiledRule::compile(RuleDef::new("f", RuleAction::Disable, expression));
		let ctx = RuleContext {
			user: &user,
			data: &data,
			item_data: &data,
		};
		rule.eval(&ctx)
	}

	#[rstest]
	#[case("data.status.iv === 'published'", true)]
	#[case("data.status.iv === 'draft'", false)]
	#[case("data.status.iv == 'published'", true)]
	#[case("data.status.iv !== 'draft'", true)]
	#[case("data.count.iv > 2", true)]
	#[case("data.count.iv >= 3", true)]
	#[case("data.count.iv < 3", false)]
	#[case("data.count.iv <= 2", false)]
	fn test_comparisons(#[case] expression: &str, #[case] expected: bool) {
		// Arrange
		let data = json!({ "status": { "iv": "published" }, "count": { "iv": 3 } });

		// Act & Assert
		assert_eq!(eval(expression, data), expected);
	}

	#[rstest]
	#[case("data.a.iv === 1 && data.b.iv === 2", true)]
	#[case("data.a.iv === 1 && data.b.iv === 3", false)]
	#[case("data.a.iv === 9 || data.b.iv === 2", true)]
	#[case("!(data.a.iv === 1)", false)]
	#[case("!data.missing", true)]
	fn test_logical_operators(#[case] expression: &str, #[case] expected: bool) {
		// Arrange
		let data = json!({ "a": { "iv": 1 }, "b": { "iv": 2 } });

		// Act & Assert
		assert_eq!(eval(expression, data), expected);
	}

	#[rstest]
	fn test_precedence_and_binds_tighter_than_or() {
		// Arrange: true || (false && false) is true; (true || false) && false is false
		let data = json!({});

		// Act & Assert
		assert!(eval("true || false && false", data.clone()));
		assert!(!eval("(true || false) && false", data));
	}

	#[rstest]
	fn test_missing_path_is_undefined() {
		// Arrange
		let data = json!({ "a": { "iv": 1 } });

		// Act & Assert: undefined is falsy and loosely equals null
		assert!(!eval("data.b.iv", data.clone()));
		assert!(eval("data.b.iv == null", data.clone()));
		assert!(!eval("data.b.iv === null", data.clone()));
		assert!(eval("data.b.iv === undefined", data));
	}

	#[rstest]
	fn test_bracket_paths_and_array_indexing() {
		// Arrange
		let data = json!({ "tags": { "iv": ["news", "tech"] } });

		// Act & Assert
		assert!(eval("data['tags'].iv[1] === 'tech'", data.clone()));
		assert!(eval("data.tags.iv[0] == 'news'", data));
	}

	#[rstest]
	fn test_user_context_paths() {
		// Arrange
		let data = json!({});

		// Act & Assert
		assert!(eval("user.name === 'editor'", data.clone()));
		assert!(eval("user.roles[0] === 'writer'", data));
	}

	#[rstest]
	fn test_cross_type_comparisons_are_false() {
		// Arrange
		let data = json!({ "a": { "iv": 1 } });

		// Act & Assert
		assert!(!eval("data.a.iv === '1'", data.clone()));
		assert!(!eval("data.a.iv == '1'", data.clone()));
		assert!(!eval("data.a.iv < 'x'", data));
	}

	#[rstest]
	#[case("this is not valid js")]
	#[case("data.a.iv ===")]
	#[case("(data.a.iv")]
	#[case("data..iv")]
	#[case("window.alert('x')")]
	#[case("1 + 1")]
	#[case("")]
	fn test_malformed_expressions_compile_inert(#[case] expression: &str) {
		// Arrange & Act
		let rule = CompiledRule::compile(RuleDef::new("f", RuleAction::Hide, expression));
		let data = json!({ "a": { "iv": 1 } });
		let user = json!({});
		let ctx = RuleContext {
			user: &user,
			data: &data,
			item_data: &data,
		};

		// Assert: never fires, never panics
		assert!(!rule.eval(&ctx));
	}

	#[rstest]
	fn test_rule_def_deserializes_wire_shape() {
		// Arrange
		let json = r#"{ "field": "b", "type": "Hide", "expression": "data.a.iv === 'x'" }"#;

		// Act
		let def: RuleDef = serde_json::from_str(json).unwrap();

		// Assert
		assert_eq!(def.field, "b");
		assert_eq!(def.action, RuleAction::Hide);
	}

	#[rstest]
	fn test_truthiness_of_values() {
		// Arrange
		let data = json!({
			"s": { "iv": "x" },
			"empty": { "iv": "" },
			"zero": { "iv": 0 },
			"list": { "iv": [] },
			"flag": { "iv": true }
		});

		// Act & Assert
		assert!(eval("data.s.iv", data.clone()));
		assert!(!eval("data.empty.iv", data.clone()));
		assert!(!eval("data.zero.iv", data.clone()));
		// Arrays are truthy even when empty
		assert!(eval("data.list.iv", data.clone()));
		assert!(eval("data.flag.iv", data));
	}
}
