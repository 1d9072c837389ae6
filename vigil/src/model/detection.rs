use serde::{Deserialize, Serialize};

/// A corner-form bounding box in pixel coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Corners {
	pub x1: i32,
	pub y1: i32,
	pub x2: i32,
	pub y2: i32,
}

/// A body found by the person detector.
///
/// Either produced fresh for the current frame or carried over from the last detection frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
	#[serde(rename = "box")]
	pub bbox: Corners,
	pub confidence: f32, // 0.0 to 1.0
}

impl Detection {
	pub fn new(bbox: Corners, confidence: f32) -> Self {
		Self { bbox, confidence }
	}
}
