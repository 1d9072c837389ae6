use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::{Error, Result};

/// Maps the integer labels of a trained identity model to display names.
///
/// Stored on disk as a JSON object keyed by the label as a string:
/// `{"0": "Alice", "1": "Bob"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
	names: HashMap<i32, String>,
}

impl LabelTable {
	pub fn new(names: HashMap<i32, String>) -> Self {
		Self { names }
	}

	/// Parse a label table from a JSON string.
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(s: &str) -> Result<Self> {
		let raw: BTreeMap<String, String> = serde_json::from_str(s)?;

		let mut names = HashMap::with_capacity(raw.len());
		for (key, name) in raw {
			let label = key
				.trim()
				.parse::<i32>()
				.map_err(|_| Error::InvalidLabels(format!("label is not an integer: {key:?}")))?;
			names.insert(label, name);
		}

		Ok(Self { names })
	}

	/// Load a label table, failing if the file is missing or malformed.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		if !path.is_file() {
			return Err(Error::MissingLabels(path.to_path_buf()));
		}

		let contents = std::fs::read_to_string(path)?;
		Self::from_str(&contents)
	}

	pub fn name(&self, label: i32) -> Option<&str> {
		self.names.get(&label).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parse() {
		let table = LabelTable::from_str(r#"{"0": "Alice", "7": "Bob"}"#).unwrap();
		assert_eq!(table.len(), 2);
		assert_eq!(table.name(0), Some("Alice"));
		assert_eq!(table.name(7), Some("Bob"));
		assert_eq!(table.name(1), None);
	}

	#[test]
	fn non_integer_label() {
		let err = LabelTable::from_str(r#"{"alice": "Alice"}"#).unwrap_err();
		assert!(matches!(err, Error::InvalidLabels(_)), "{err}");
	}

	#[test]
	fn not_an_object() {
		let err = LabelTable::from_str(r#"["Alice"]"#).unwrap_err();
		assert!(matches!(err, Error::Json(_)), "{err}");
	}

	#[test]
	fn missing_file() {
		let tmp = tempfile::tempdir().unwrap();
		let path = tmp.path().join("face_labels.json");

		let err = LabelTable::from_file(&path).unwrap_err();
		assert!(matches!(err, Error::MissingLabels(p) if p == path));
	}

	#[test]
	fn from_file() {
		let tmp = tempfile::tempdir().unwrap();
		let path = tmp.path().join("face_labels.json");
		std::fs::write(&path, r#"{"3": "Carol"}"#).unwrap();

		let table = LabelTable::from_file(&path).unwrap();
		assert_eq!(table.name(3), Some("Carol"));
	}
}
