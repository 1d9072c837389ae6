use bytes::Bytes;
use derive_more::Debug;

use super::{Detection, FaceObservation};

/// A timestamp representing when a frame was captured, relative to the start of the stream.
pub type Timestamp = std::time::Duration;

/// A single frame from the capture device.
///
/// The payload is an encoded image and is opaque to the engine.
/// Annotation never touches pixels; it appends [Overlay]s for the rendering layer.
#[derive(Clone, Debug)]
pub struct Frame {
	/// The capture order of this frame, as assigned by the device.
	pub sequence: u64,

	/// The capture time relative to the start of the stream.
	/// This is NOT a wall clock time.
	pub timestamp: Timestamp,

	/// The encoded image, usually a JPEG.
	#[debug("{} bytes", payload.len())]
	pub payload: Bytes,

	/// Presentation data to draw over the image, in drawing order.
	pub overlays: Vec<Overlay>,
}

impl Frame {
	pub fn new(sequence: u64, timestamp: Timestamp, payload: impl Into<Bytes>) -> Self {
		Self {
			sequence,
			timestamp,
			payload: payload.into(),
			overlays: Vec::new(),
		}
	}

	pub fn annotate(&mut self, overlay: Overlay) {
		self.overlays.push(overlay);
	}

	/// Returns the text of every banner drawn on this frame.
	pub fn banners(&self) -> impl Iterator<Item = (&str, Tone)> {
		self.overlays.iter().filter_map(|overlay| match overlay {
			Overlay::Banner { text, tone } => Some((text.as_str(), *tone)),
			_ => None,
		})
	}
}

/// The color scheme of a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
	/// Red, for intrusions.
	Alert,
	/// Green, for recognized people.
	Safe,
}

/// Something for the rendering layer to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
	/// A person box from the body detector.
	Body(Detection),

	/// A face box with its identity and distance.
	Face(FaceObservation),

	/// A full-width strip across the top of the frame.
	Banner { text: String, tone: Tone },

	/// The status line along the bottom of the frame.
	Status(String),
}
