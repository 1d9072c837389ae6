use std::collections::BTreeSet;

use crate::{Detection, FaceObservation, Status};

/// The default number of consecutive adverse frames before an intrusion is confirmed.
pub const DEFAULT_STREAK_LIMIT: u32 = 10;

/// Turns one frame of detections into a [Status], debouncing with an unknown streak.
///
/// A frame is adverse when it contains an unknown face, or a body with no known face.
/// Adverse frames grow the streak and anything else resets it to zero.
/// An unresolved face counts as an unidentified presence even when the body
/// detector has nothing for the frame.
/// Once the streak reaches the limit the status is [Status::ConfirmedIntruder],
/// regardless of any known face in the same frame.
#[derive(Debug, Clone)]
pub struct StatusClassifier {
	streak: u32,
	limit: u32,
}

impl Default for StatusClassifier {
	fn default() -> Self {
		Self::new(DEFAULT_STREAK_LIMIT)
	}
}

impl StatusClassifier {
	pub fn new(limit: u32) -> Self {
		Self { streak: 0, limit }
	}

	/// The number of consecutive adverse frames seen so far.
	pub fn streak(&self) -> u32 {
		self.streak
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	/// Classify one frame, updating the streak exactly once.
	pub fn classify(&mut self, bodies: &[Detection], faces: &[FaceObservation]) -> Status {
		let any_known = faces.iter().any(|face| face.known);
		let any_unknown = faces.iter().any(|face| !face.known);
		let any_body = !bodies.is_empty();

		if any_unknown || (any_body && !any_known) {
			self.streak = self.streak.saturating_add(1);
		} else {
			self.streak = 0;
		}

		if self.streak >= self.limit {
			Status::ConfirmedIntruder
		} else if any_known {
			let names: BTreeSet<String> = faces
				.iter()
				.filter(|face| face.known)
				.map(|face| face.identity.clone())
				.collect();
			Status::KnownSubject { names }
		} else if any_body || any_unknown {
			Status::UnidentifiedBody
		} else {
			Status::NoSubject
		}
	}
}
