use std::path::PathBuf;

use web_async::Lock;

use crate::{
	Detect, Detection, Dispatcher, EvidenceConfig, EvidenceStore, FaceObservation, Frame, Overlay, Passthrough,
	Recognize, Render, Result, Status, StatusClassifier, Tone,
};

/// Sent with the snapshot when the unknown streak confirms an intrusion.
pub const INTRUDER_MESSAGE: &str = "Alert: unknown person detected in front of the camera!";

/// Sent with the snapshot when a body is seen but no face could be resolved.
pub const BODY_MESSAGE: &str = "Alert: body detected, face unresolved!";

/// Sent with the snapshot when an unknown face is seen and the body detector has nothing.
pub const FACE_MESSAGE: &str = "Alert: unknown face detected, no body in view!";

/// The status line drawn instead of the usual one when an unknown face is seen without a body.
pub const FACE_ONLY_STATUS: &str = "INTRUDER (Unknown face)";

/// The banner drawn on every alert frame.
pub const ALERT_BANNER: &str = "INTRUDER DETECTED";

#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Consecutive adverse frames before an intrusion is confirmed.
	pub streak_limit: u32,

	/// Run the body detector on every Nth frame and reuse its result in between.
	pub detect_every: u32,

	/// Where alert snapshots go and how often.
	pub evidence: EvidenceConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			streak_limit: crate::DEFAULT_STREAK_LIMIT,
			detect_every: 3,
			evidence: EvidenceConfig::default(),
		}
	}
}

/// The result of pushing one frame through the engine.
#[derive(Debug, Clone)]
pub struct Processed {
	/// The 1-based position of this frame in the engine's stream.
	pub index: u64,

	/// The input frame with overlays appended.
	pub frame: Frame,

	pub status: Status,

	/// The snapshot written for this frame, if any.
	/// A notification was scheduled for it when a dispatcher is configured.
	pub evidence: Option<PathBuf>,
}

// Everything mutated per frame, behind one lock per stream.
struct State<D, R> {
	detector: D,
	recognizer: R,
	renderer: Box<dyn Render>,
	classifier: StatusClassifier,
	evidence: EvidenceStore,

	// The number of frames processed so far.
	index: u64,

	// The result of the most recent body detection, reused between detection frames.
	bodies: Vec<Detection>,

	// Used to log status changes only.
	status: Option<Status>,
}

/// Fuses body detections and face identities into a [Status] per frame.
///
/// Clones are handles to the same stream: they share the hysteresis state, the cached
/// detections, the evidence throttle and the models, all behind a single lock.
/// Frames are therefore classified one at a time, in the order they acquire the lock.
pub struct FusionEngine<D, R> {
	state: Lock<State<D, R>>,
	dispatcher: Option<Dispatcher>,
	detect_every: u64,
}

impl<D, R> Clone for FusionEngine<D, R> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			dispatcher: self.dispatcher.clone(),
			detect_every: self.detect_every,
		}
	}
}

impl<D: Detect, R: Recognize> FusionEngine<D, R> {
	/// Create an engine, failing if the evidence directory cannot be created.
	pub fn new(config: EngineConfig, detector: D, recognizer: R) -> Result<Self> {
		let evidence = EvidenceStore::new(config.evidence.clone())?;

		tracing::info!(
			streak_limit = config.streak_limit,
			detect_every = config.detect_every,
			evidence = %config.evidence.dir.display(),
			cooldown = ?config.evidence.cooldown,
			"engine ready"
		);

		Ok(Self {
			state: Lock::new(State {
				detector,
				recognizer,
				renderer: Box::new(Passthrough),
				classifier: StatusClassifier::new(config.streak_limit),
				evidence,
				index: 0,
				bodies: Vec::new(),
				status: None,
			}),
			dispatcher: None,
			detect_every: config.detect_every.max(1) as u64,
		})
	}

	/// Send a notification for every snapshot written.
	///
	/// Without a dispatcher, alerts only produce evidence files.
	pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
		self.dispatcher = Some(dispatcher);
		self
	}

	/// Bake overlays into snapshots with the given renderer before they are written.
	pub fn with_renderer<T: Render + 'static>(self, renderer: T) -> Self {
		self.state.lock().renderer = Box::new(renderer);
		self
	}

	/// The current number of consecutive adverse frames.
	pub fn streak(&self) -> u32 {
		self.state.lock().classifier.streak()
	}

	/// Classify one frame, saving evidence and scheduling a notification when it is alert-worthy.
	///
	/// Model and capture failures are logged and never abort the frame.
	/// Returns as soon as the notification is scheduled, without waiting for delivery.
	pub fn process(&self, mut frame: Frame) -> Processed {
		let mut guard = self.state.lock();
		let state = &mut *guard;

		state.index += 1;
		let index = state.index;

		if index % self.detect_every == 0 {
			state.bodies = match state.detector.detect(&frame) {
				Ok(bodies) => bodies,
				Err(err) => {
					tracing::warn!(%err, index, "body detection failed");
					Vec::new()
				}
			};
		}

		let faces = match state.recognizer.recognize(&frame) {
			Ok(faces) => faces,
			Err(err) => {
				tracing::warn!(%err, index, "face recognition failed");
				Vec::new()
			}
		};

		let status = state.classifier.classify(&state.bodies, &faces);
		let face_only = status == Status::UnidentifiedBody && state.bodies.is_empty();
		annotate(&mut frame, &state.bodies, &faces, &status, face_only);

		if state.status.as_ref() != Some(&status) {
			tracing::info!(index, %status, streak = state.classifier.streak(), "status changed");
			state.status = Some(status.clone());
		}

		let message = match status {
			Status::ConfirmedIntruder => Some(INTRUDER_MESSAGE),
			Status::UnidentifiedBody if face_only => Some(FACE_MESSAGE),
			Status::UnidentifiedBody => Some(BODY_MESSAGE),
			_ => None,
		};

		let mut evidence = None;
		if let Some(message) = message {
			let renderer = &mut state.renderer;
			match state.evidence.try_capture(frame.clone(), |f| renderer.render(f)) {
				Ok(Some(path)) => evidence = Some((message, path)),
				Ok(None) => {}
				Err(err) => tracing::warn!(%err, index, "failed to save evidence"),
			}
		}

		drop(guard);

		if let (Some((message, path)), Some(dispatcher)) = (&evidence, &self.dispatcher) {
			dispatcher.dispatch(message.to_string(), Some(path.clone()));
		}

		Processed {
			index,
			frame,
			status,
			evidence: evidence.map(|(_, path)| path),
		}
	}
}

fn annotate(frame: &mut Frame, bodies: &[Detection], faces: &[FaceObservation], status: &Status, face_only: bool) {
	for body in bodies {
		frame.annotate(Overlay::Body(*body));
	}

	for face in faces {
		frame.annotate(Overlay::Face(face.clone()));
	}

	match status {
		Status::ConfirmedIntruder | Status::UnidentifiedBody => frame.annotate(Overlay::Banner {
			text: ALERT_BANNER.to_string(),
			tone: Tone::Alert,
		}),
		Status::KnownSubject { .. } => frame.annotate(Overlay::Banner {
			text: status.label(),
			tone: Tone::Safe,
		}),
		Status::NoSubject => {}
	}

	let line = match face_only {
		true => FACE_ONLY_STATUS.to_string(),
		false => status.label(),
	};
	frame.annotate(Overlay::Status(line));
}
