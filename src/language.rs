//! Language descriptors for localized content
//!
//! Languages are configured per app and consumed by the form engine to
//! partition localizable field values. Fallback chains are carried through
//! for host UIs; the engine itself only relies on list order.

use serde::Deserialize;

/// A configured content language
///
/// # Examples
///
/// ```
/// use contentform::Language;
///
/// let language = Language::new("de").optional();
/// assert_eq!(language.iso2_code, "de");
/// assert!(language.is_optional);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
	/// ISO code identifying the language, e.g. `"en"`
	pub iso2_code: String,
	/// Whether this is the app's master language
	#[serde(default)]
	pub is_master: bool,
	/// Optional languages produce optional partitions
	#[serde(default)]
	pub is_optional: bool,
	/// Ordered fallback languages, consumed by hosts when a value is unset
	#[serde(default)]
	pub fallback: Vec<String>,
}

impl Language {
	/// Creates a new language with the given ISO code
	pub fn new(iso2_code: impl Into<String>) -> Self {
		Self {
			iso2_code: iso2_code.into(),
			is_master: false,
			is_optional: false,
			fallback: Vec::new(),
		}
	}

	/// Marks this language as the master language
	pub fn master(mut self) -> Self {
		self.is_master = true;
		self
	}

	/// Marks this language as optional
	pub fn optional(mut self) -> Self {
		self.is_optional = true;
		self
	}

	/// Sets the ordered fallback languages
	///
	/// # Examples
	///
	/// ```
	/// use contentform::Language;
	///
	/// let language = Language::new("de-CH").with_fallback(vec!["de".to_string()]);
	/// assert_eq!(language.fallback, vec!["de".to_string()]);
	/// ```
	pub fn with_fallback(mut self, fallback: Vec<String>) -> Self {
		self.fallback = fallback;
		self
	}
}
