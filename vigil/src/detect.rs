use serde::{Deserialize, Serialize};

use crate::{Corners, Detect, Detection, Frame, Result};

/// The class index of "person" in COCO-trained detectors.
pub const PERSON: u32 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
	/// Drop boxes scoring below this confidence.
	pub confidence: f32,

	/// The square input size the model runs at.
	pub resolution: u32,

	/// The only object class that counts as a body.
	pub class: u32,
}

impl Default for DetectorConfig {
	fn default() -> Self {
		Self {
			confidence: 0.5,
			resolution: 320,
			class: PERSON,
		}
	}
}

/// A raw, multi-class box straight out of an object detection model.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ObjectBox {
	pub class: u32,
	#[serde(rename = "box")]
	pub bbox: Corners,
	pub confidence: f32,
}

/// A general object detection model, such as a YOLO checkpoint.
pub trait ObjectModel: Send {
	fn infer(&mut self, frame: &Frame, resolution: u32) -> Result<Vec<ObjectBox>>;
}

/// Restricts an [ObjectModel] to confident person boxes.
pub struct PersonDetector<M> {
	model: M,
	config: DetectorConfig,
}

impl<M: ObjectModel> PersonDetector<M> {
	pub fn new(model: M, config: DetectorConfig) -> Self {
		Self { model, config }
	}

	pub fn config(&self) -> &DetectorConfig {
		&self.config
	}
}

impl<M: ObjectModel> Detect for PersonDetector<M> {
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
		let boxes = self.model.infer(frame, self.config.resolution)?;

		Ok(boxes
			.into_iter()
			.filter(|obj| obj.class == self.config.class && obj.confidence >= self.config.confidence)
			.map(|obj| Detection::new(obj.bbox, obj.confidence))
			.collect())
	}
}
