use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vigil::{Capture, Error, FaceModel, FacePrediction, Frame, ObjectBox, ObjectModel};

const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Plays back a directory of recorded images as a capture device.
pub struct ReplayCapture {
	frames: Vec<PathBuf>,
	next: usize,
	interval: Duration,

	// Set when pacing to real time.
	started: Option<Instant>,
}

impl ReplayCapture {
	/// List the images in `dir`, sorted by file name.
	pub fn open(dir: &Path, fps: f64) -> vigil::Result<Self> {
		let interval = Duration::try_from_secs_f64(1.0 / fps)
			.map_err(|_| Error::Capture(format!("invalid frame rate: {fps}")))?;

		let entries = std::fs::read_dir(dir).map_err(|err| Error::Capture(format!("{}: {err}", dir.display())))?;

		let mut frames = Vec::new();
		for entry in entries {
			let path = entry?.path();

			let image = path
				.extension()
				.and_then(|ext| ext.to_str())
				.is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

			if image && path.is_file() {
				frames.push(path);
			}
		}

		if frames.is_empty() {
			return Err(Error::Capture(format!("no images in {}", dir.display())));
		}

		frames.sort();
		tracing::info!(dir = %dir.display(), frames = frames.len(), "opened replay");

		Ok(Self {
			frames,
			next: 0,
			interval,
			started: None,
		})
	}

	/// Sleep between frames to match the frame rate.
	pub fn realtime(mut self, enabled: bool) -> Self {
		self.started = enabled.then(Instant::now);
		self
	}
}

impl Capture for ReplayCapture {
	fn read(&mut self) -> vigil::Result<Option<Frame>> {
		let Some(path) = self.frames.get(self.next) else {
			return Ok(None);
		};

		let sequence = self.next as u64;
		let timestamp = self.interval * self.next as u32;
		self.next += 1;

		if let Some(started) = self.started {
			if let Some(wait) = timestamp.checked_sub(started.elapsed()) {
				std::thread::sleep(wait);
			}
		}

		let payload = std::fs::read(path)?;
		Ok(Some(Frame::new(sequence, timestamp, payload)))
	}

	fn release(&mut self) {
		tracing::debug!(played = self.next, total = self.frames.len(), "replay released");
		self.frames.clear();
	}
}

/// The recorded model outputs for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScriptFrame {
	/// Raw boxes from the object detector, of any class.
	pub bodies: Vec<ObjectBox>,

	/// Raw predictions from the face model.
	pub faces: Vec<FacePrediction>,
}

/// Model outputs for a replay, indexed by frame sequence.
///
/// Frames past the end of the script see no bodies and no faces.
#[derive(Debug, Clone, Default)]
pub struct Script {
	frames: Arc<Vec<ScriptFrame>>,
}

impl Script {
	pub fn new(frames: Vec<ScriptFrame>) -> Self {
		Self {
			frames: Arc::new(frames),
		}
	}

	pub fn from_file(path: &Path) -> anyhow::Result<Self> {
		let contents = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		let frames: Vec<ScriptFrame> =
			serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;

		Ok(Self::new(frames))
	}

	pub fn len(&self) -> usize {
		self.frames.len()
	}

	fn get(&self, frame: &Frame) -> Option<&ScriptFrame> {
		self.frames.get(usize::try_from(frame.sequence).ok()?)
	}
}

/// An [ObjectModel] that answers from a [Script].
pub struct ScriptedObjects(pub Script);

impl ObjectModel for ScriptedObjects {
	fn infer(&mut self, frame: &Frame, _resolution: u32) -> vigil::Result<Vec<ObjectBox>> {
		Ok(self.0.get(frame).map(|f| f.bodies.clone()).unwrap_or_default())
	}
}

/// A [FaceModel] that answers from a [Script].
pub struct ScriptedFaces(pub Script);

impl ScriptedFaces {
	/// Stand in for loading the model at `path`, which has already been checked to exist.
	pub fn open(path: &Path, script: Script) -> vigil::Result<Self> {
		tracing::debug!(model = %path.display(), frames = script.len(), "using scripted face model");
		Ok(Self(script))
	}
}

impl FaceModel for ScriptedFaces {
	fn predict(&mut self, frame: &Frame) -> vigil::Result<Vec<FacePrediction>> {
		Ok(self.0.get(frame).map(|f| f.faces.clone()).unwrap_or_default())
	}
}

#[cfg(test)]
mod test {
	use vigil::{Corners, Detect, DetectorConfig, IdentityRecognizer, LabelTable, PersonDetector, Recognize, Rect};

	use super::*;

	fn write(dir: &Path, name: &str, contents: &[u8]) {
		std::fs::write(dir.join(name), contents).unwrap();
	}

	#[test]
	fn plays_images_in_order() {
		let tmp = tempfile::tempdir().unwrap();
		write(tmp.path(), "frame_002.jpg", b"two");
		write(tmp.path(), "frame_001.jpg", b"one");
		write(tmp.path(), "frame_003.PNG", b"three");
		write(tmp.path(), "notes.txt", b"ignored");

		let mut capture = ReplayCapture::open(tmp.path(), 10.0).unwrap();

		let mut played = Vec::new();
		while let Some(frame) = capture.read().unwrap() {
			played.push((frame.sequence, frame.timestamp, frame.payload.to_vec()));
		}

		assert_eq!(
			played,
			vec![
				(0, Duration::ZERO, b"one".to_vec()),
				(1, Duration::from_millis(100), b"two".to_vec()),
				(2, Duration::from_millis(200), b"three".to_vec()),
			]
		);

		// Stays at the end.
		assert!(capture.read().unwrap().is_none());
	}

	#[test]
	fn open_fails() {
		let tmp = tempfile::tempdir().unwrap();

		let empty = ReplayCapture::open(tmp.path(), 30.0);
		assert!(matches!(empty, Err(Error::Capture(_))));

		let missing = ReplayCapture::open(&tmp.path().join("missing"), 30.0);
		assert!(matches!(missing, Err(Error::Capture(_))));

		write(tmp.path(), "frame.jpg", b"jpeg");
		let zero = ReplayCapture::open(tmp.path(), 0.0);
		assert!(matches!(zero, Err(Error::Capture(_))));
	}

	#[test]
	fn script_drives_adapters() {
		let tmp = tempfile::tempdir().unwrap();
		let path = tmp.path().join("script.json");
		std::fs::write(
			&path,
			r#"[
				{
					"bodies": [
						{ "class": 0, "box": { "x1": 10, "y1": 10, "x2": 90, "y2": 200 }, "confidence": 0.9 },
						{ "class": 56, "box": { "x1": 0, "y1": 0, "x2": 40, "y2": 40 }, "confidence": 0.95 }
					],
					"faces": [
						{ "box": { "x": 30, "y": 20, "w": 40, "h": 40 }, "label": 0, "distance": 35.5 },
						{ "box": { "x": 130, "y": 20, "w": 40, "h": 40 }, "label": 1, "distance": 120.0 }
					]
				},
				{}
			]"#,
		)
		.unwrap();

		let script = Script::from_file(&path).unwrap();
		assert_eq!(script.len(), 2);

		let mut detector = PersonDetector::new(ScriptedObjects(script.clone()), DetectorConfig::default());
		let labels = LabelTable::from_str(r#"{"0": "Alice", "1": "Bob"}"#).unwrap();
		let mut recognizer = IdentityRecognizer::new(ScriptedFaces(script), labels, 80.0);

		let first = Frame::new(0, Duration::ZERO, Vec::new());
		let bodies = detector.detect(&first).unwrap();
		assert_eq!(bodies.len(), 1);
		assert_eq!(
			bodies[0].bbox,
			Corners {
				x1: 10,
				y1: 10,
				x2: 90,
				y2: 200
			}
		);

		let faces = recognizer.recognize(&first).unwrap();
		let names: Vec<&str> = faces.iter().map(|f| f.identity.as_str()).collect();
		assert_eq!(names, vec!["Alice", "Unknown"]);
		assert_eq!(
			faces[0].bbox,
			Rect {
				x: 30,
				y: 20,
				w: 40,
				h: 40
			}
		);

		// An empty entry, then past the end.
		for sequence in [1, 2] {
			let frame = Frame::new(sequence, Duration::ZERO, Vec::new());
			assert!(detector.detect(&frame).unwrap().is_empty());
			assert!(recognizer.recognize(&frame).unwrap().is_empty());
		}
	}
}
