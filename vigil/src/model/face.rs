use serde::{Deserialize, Serialize};

/// An origin-and-size bounding box in pixel coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub w: i32,
	pub h: i32,
}

/// One face found by the identity recognizer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaceObservation {
	#[serde(rename = "box")]
	pub bbox: Rect,

	/// The resolved display name, or [`FaceObservation::UNKNOWN`].
	pub identity: String,

	/// The model's distance to the closest enrolled identity; lower is closer.
	pub distance: f64,

	/// True iff the distance is under the threshold and the label resolved to a name.
	pub known: bool,
}

impl FaceObservation {
	/// The identity reported for faces that did not match anyone.
	pub const UNKNOWN: &str = "Unknown";

	pub fn known(bbox: Rect, identity: impl Into<String>, distance: f64) -> Self {
		Self {
			bbox,
			identity: identity.into(),
			distance,
			known: true,
		}
	}

	pub fn unknown(bbox: Rect, distance: f64) -> Self {
		Self {
			bbox,
			identity: Self::UNKNOWN.to_string(),
			distance,
			known: false,
		}
	}
}
