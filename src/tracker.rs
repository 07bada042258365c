//! Dirty-state tracking against a value baseline
//!
//! The tracker holds a deep copy of the tree's raw value taken at load and
//! submit time. Comparisons use `serde_json::Value` structural equality, so
//! object key order is irrelevant by construction and the snapshot is never
//! mutated in place.

use serde_json::Value as JsonValue;

/// Baseline snapshot and dirty-state comparison
///
/// # Examples
///
/// ```
/// use contentform::tracker::ChangeTracker;
/// use serde_json::json;
///
/// let mut tracker = ChangeTracker::default();
/// tracker.take(json!({ "title": { "iv": "X" } }));
/// assert!(!tracker.has_changed(&json!({ "title": { "iv": "X" } })));
/// assert!(tracker.has_changed(&json!({ "title": { "iv": "Y" } })));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
	baseline: Option<JsonValue>,
}

impl ChangeTracker {
	/// Records a new baseline
	pub fn take(&mut self, value: JsonValue) {
		self.baseline = Some(value);
	}

	/// The last-taken baseline, if any
	pub fn baseline(&self) -> Option<&JsonValue> {
		self.baseline.as_ref()
	}

	/// Whether the current value differs from the baseline
	///
	/// Without a baseline everything counts as changed; create-mode forms
	/// have no recorded server state to be equal to.
	pub fn has_changed(&self, current: &JsonValue) -> bool {
		match &self.baseline {
			Some(baseline) => baseline != current,
			None => true,
		}
	}

	/// Whether an arbitrary external payload differs from the current value
	///
	/// Used for the "did the server's version diverge from what I am about
	/// to overwrite" check; the baseline is not involved.
	pub fn has_changes(&self, candidate: &JsonValue, current: &JsonValue) -> bool {
		candidate != current
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_object_key_order_is_irrelevant() {
		// Arrange
		let mut tracker = ChangeTracker::default();
		tracker.take(json!({ "a": 1, "b": 2 }));

		// Act & Assert
		assert!(!tracker.has_changed(&json!({ "b": 2, "a": 1 })));
	}

	#[rstest]
	fn test_no_baseline_counts_as_changed() {
		// Arrange
		let tracker = ChangeTracker::default();

		// Act & Assert
		assert!(tracker.has_changed(&json!({})));
	}

	#[rstest]
	fn test_has_changes_compares_candidate_to_current() {
		// Arrange
		let mut tracker = ChangeTracker::default();
		tracker.take(json!({ "a": 1 }));
		let current = json!({ "a": 2 });

		// Act & Assert: the baseline plays no part
		assert!(!tracker.has_changes(&json!({ "a": 2 }), &current));
		assert!(tracker.has_changes(&json!({ "a": 1 }), &current));
	}

	#[rstest]
	fn test_nested_array_changes_detected() {
		// Arrange
		let mut tracker = ChangeTracker::default();
		tracker.take(json!({ "items": { "iv": [{ "t": "a" }] } }));

		// Act & Assert
		assert!(!tracker.has_changed(&json!({ "items": { "iv": [{ "t": "a" }] } })));
		assert!(tracker.has_changed(&json!({ "items": { "iv": [{ "t": "b" }] } })));
		assert!(tracker.has_changed(&json!({ "items": { "iv": [] } })));
	}
}
