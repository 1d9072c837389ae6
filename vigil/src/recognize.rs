use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, FaceObservation, Frame, LabelTable, Recognize, Rect, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
	/// The trained identity model.
	pub model: PathBuf,

	/// The label table matching the model.
	pub labels: PathBuf,

	/// Accept a match when the distance is strictly below this value.
	pub threshold: f64,
}

impl Default for RecognizerConfig {
	fn default() -> Self {
		Self {
			model: PathBuf::from("Models/face_lbph.xml"),
			labels: PathBuf::from("Models/face_labels.json"),
			threshold: 80.0,
		}
	}
}

/// A face found by the identity model, before the label is resolved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FacePrediction {
	#[serde(rename = "box")]
	pub bbox: Rect,

	/// The closest enrolled label.
	pub label: i32,

	/// The distance to that label; lower is closer.
	pub distance: f64,
}

/// A face detection + identity model, such as LBPH over Haar cascades.
pub trait FaceModel: Send {
	fn predict(&mut self, frame: &Frame) -> Result<Vec<FacePrediction>>;
}

/// Resolves raw [FacePrediction]s into known and unknown faces.
pub struct IdentityRecognizer<M> {
	model: M,
	labels: LabelTable,
	threshold: f64,
}

impl<M: FaceModel> IdentityRecognizer<M> {
	pub fn new(model: M, labels: LabelTable, threshold: f64) -> Self {
		Self {
			model,
			labels,
			threshold,
		}
	}

	/// Load the label table and open the model, failing fast if either file is missing.
	///
	/// `open` is only called once both files are known to exist.
	pub fn load<F>(config: RecognizerConfig, open: F) -> Result<Self>
	where
		F: FnOnce(&Path) -> Result<M>,
	{
		if !config.model.is_file() {
			return Err(Error::MissingModel(config.model));
		}

		let labels = LabelTable::from_file(&config.labels)?;
		let model = open(&config.model)?;

		tracing::info!(model = %config.model.display(), labels = labels.len(), threshold = config.threshold, "loaded identity model");

		Ok(Self::new(model, labels, config.threshold))
	}

	pub fn labels(&self) -> &LabelTable {
		&self.labels
	}

	fn resolve(&self, prediction: FacePrediction) -> FaceObservation {
		let name = match prediction.distance < self.threshold {
			true => self.labels.name(prediction.label),
			false => None,
		};

		match name {
			Some(name) => FaceObservation::known(prediction.bbox, name, prediction.distance),
			None => FaceObservation::unknown(prediction.bbox, prediction.distance),
		}
	}
}

impl<M: FaceModel> Recognize for IdentityRecognizer<M> {
	fn recognize(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>> {
		let predictions = self.model.predict(frame)?;
		Ok(predictions.into_iter().map(|p| self.resolve(p)).collect())
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;
	use std::time::Duration;

	use super::*;

	struct Fixed(Vec<FacePrediction>);

	impl FaceModel for Fixed {
		fn predict(&mut self, _frame: &Frame) -> Result<Vec<FacePrediction>> {
			Ok(self.0.clone())
		}
	}

	fn prediction(label: i32, distance: f64) -> FacePrediction {
		FacePrediction {
			bbox: Rect {
				x: 5,
				y: 5,
				w: 60,
				h: 60,
			},
			label,
			distance,
		}
	}

	fn labels() -> LabelTable {
		LabelTable::new(HashMap::from([(0, "Alice".to_string()), (1, "Bob".to_string())]))
	}

	#[test]
	fn resolves_known_and_unknown() {
		let model = Fixed(vec![
			prediction(0, 42.0),  // known
			prediction(1, 80.0),  // at the threshold, so unknown
			prediction(9, 10.0),  // close, but not in the table
			prediction(1, 79.99), // known
		]);
		let mut recognizer = IdentityRecognizer::new(model, labels(), 80.0);

		let frame = Frame::new(0, Duration::ZERO, Vec::new());
		let faces = recognizer.recognize(&frame).unwrap();

		let summary: Vec<(&str, bool)> = faces.iter().map(|f| (f.identity.as_str(), f.known)).collect();
		assert_eq!(
			summary,
			vec![("Alice", true), ("Unknown", false), ("Unknown", false), ("Bob", true)]
		);
		assert_eq!(faces[1].distance, 80.0);
	}

	#[test]
	fn load_fails_fast() {
		let tmp = tempfile::tempdir().unwrap();
		let model = tmp.path().join("face_lbph.xml");
		let labels = tmp.path().join("face_labels.json");

		let config = RecognizerConfig {
			model: model.clone(),
			labels: labels.clone(),
			threshold: 80.0,
		};

		let mut opened = false;
		let res = IdentityRecognizer::load(config.clone(), |_| {
			opened = true;
			Ok(Fixed(Vec::new()))
		});
		assert!(matches!(res, Err(Error::MissingModel(_))));

		std::fs::write(&model, "<lbph/>").unwrap();
		let res = IdentityRecognizer::load(config.clone(), |_| {
			opened = true;
			Ok(Fixed(Vec::new()))
		});
		assert!(matches!(res, Err(Error::MissingLabels(_))));
		assert!(!opened, "model opened before the files were checked");

		std::fs::write(&labels, r#"{"0": "Alice"}"#).unwrap();
		let recognizer = IdentityRecognizer::load(config, |path| {
			assert_eq!(path, model.as_path());
			Ok(Fixed(Vec::new()))
		})
		.unwrap();
		assert_eq!(recognizer.labels().name(0), Some("Alice"));
	}
}
