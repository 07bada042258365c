//! Partition resolution for localized field values
//!
//! A partition is one localization slot of a field's value: localizable
//! fields get one partition per configured language, everything else gets
//! the single invariant partition `"iv"`.

use crate::language::Language;
use crate::schema::{Field, Partitioning};
use serde::Deserialize;

/// Key of the invariant partition
pub const INVARIANT_KEY: &str = "iv";

/// One localization slot of a field's value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
	/// Partition key: `"iv"` or a language ISO code
	pub key: String,
	/// Optional partitions do not enforce required values
	pub is_optional: bool,
}

impl Partition {
	/// The invariant partition
	pub fn invariant() -> Self {
		Self {
			key: INVARIANT_KEY.to_string(),
			is_optional: false,
		}
	}

	/// The partition for a configured language
	pub fn for_language(language: &Language) -> Self {
		Self {
			key: language.iso2_code.clone(),
			is_optional: language.is_optional,
		}
	}
}

/// Maps fields to their partitions based on the app's language list
///
/// # Examples
///
/// ```
/// use contentform::partition::PartitionResolver;
/// use contentform::schema::{Field, FieldProperties, StringProperties};
/// use contentform::Language;
///
/// let resolver = PartitionResolver::new(vec![
///     Language::new("en").master(),
///     Language::new("de").optional(),
/// ]);
///
/// let field = Field::new("title", FieldProperties::String(StringProperties::default()))
///     .localizable();
/// let partitions = resolver.get_all(&field);
/// assert_eq!(partitions.len(), 2);
/// assert_eq!(partitions[0].key, "en");
/// assert!(partitions[1].is_optional);
/// ```
#[derive(Debug, Clone)]
pub struct PartitionResolver {
	languages: Vec<Language>,
}

impl PartitionResolver {
	/// Creates a resolver over the configured languages, in list order
	pub fn new(languages: Vec<Language>) -> Self {
		Self { languages }
	}

	/// The configured languages
	pub fn languages(&self) -> &[Language] {
		&self.languages
	}

	/// All partitions of a field
	///
	/// A non-localizable field always yields exactly one invariant partition.
	/// A localizable field yields one partition per configured language, in
	/// language-list order, carrying that language's optional flag.
	pub fn get_all(&self, field: &Field) -> Vec<Partition> {
		match field.partitioning {
			Partitioning::Invariant => vec![Partition::invariant()],
			Partitioning::Language => {
				self.languages.iter().map(Partition::for_language).collect()
			}
		}
	}

	/// The single partition for an optional language
	///
	/// Used outside array contexts; an absent language yields the invariant
	/// partition.
	pub fn get(&self, language: Option<&Language>) -> Partition {
		match language {
			Some(language) => Partition::for_language(language),
			None => Partition::invariant(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{FieldProperties, StringProperties};
	use rstest::rstest;

	fn resolver() -> PartitionResolver {
		PartitionResolver::new(vec![
			Language::new("en").master(),
			Language::new("de"),
			Language::new("it").optional(),
		])
	}

	fn string_field() -> Field {
		Field::new("title", FieldProperties::String(StringProperties::default()))
	}

	#[rstest]
	fn test_invariant_field_has_single_iv_partition() {
		// Arrange
		let field = string_field();

		// Act
		let partitions = resolver().get_all(&field);

		// Assert
		assert_eq!(partitions.len(), 1);
		assert_eq!(partitions[0].key, INVARIANT_KEY);
		assert!(!partitions[0].is_optional);
	}

	#[rstest]
	fn test_localizable_field_has_one_partition_per_language_in_order() {
		// Arrange
		let field = string_field().localizable();

		// Act
		let partitions = resolver().get_all(&field);

		// Assert
		let keys: Vec<&str> = partitions.iter().map(|p| p.key.as_str()).collect();
		assert_eq!(keys, vec!["en", "de", "it"]);
	}

	#[rstest]
	fn test_optional_flag_follows_language() {
		// Arrange
		let field = string_field().localizable();

		// Act
		let partitions = resolver().get_all(&field);

		// Assert
		assert!(!partitions[0].is_optional);
		assert!(!partitions[1].is_optional);
		assert!(partitions[2].is_optional);
	}

	#[rstest]
	fn test_get_without_language_yields_invariant() {
		// Arrange & Act
		let partition = resolver().get(None);

		// Assert
		assert_eq!(partition, Partition::invariant());
	}

	#[rstest]
	fn test_get_with_language_yields_language_partition() {
		// Arrange
		let language = Language::new("it").optional();

		// Act
		let partition = resolver().get(Some(&language));

		// Assert
		assert_eq!(partition.key, "it");
		assert!(partition.is_optional);
	}

	#[rstest]
	fn test_localizable_field_with_no_languages_yields_no_partitions() {
		// Arrange
		let resolver = PartitionResolver::new(vec![]);
		let field = string_field().localizable();

		// Act & Assert
		assert!(resolver.get_all(&field).is_empty());
	}
}
