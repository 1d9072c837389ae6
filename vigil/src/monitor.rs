use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{Capture, CaptureGuard, Detect, Error, FusionEngine, Processed, Recognize, Result};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
	/// Give up after this many consecutive failed reads.
	pub max_read_errors: u32,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self { max_read_errors: 30 }
	}
}

/// A flag that asks a running [Monitor] to stop after the current frame.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
	pub fn trigger(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_triggered(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// What happened during a [Monitor::run].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
	/// Frames pushed through the engine.
	pub frames: u64,

	/// Frames that produced an evidence file.
	pub alerts: u64,

	/// Reads that failed and were skipped.
	pub read_errors: u64,
}

/// The frame loop: reads from a capture device and feeds the engine until told to stop.
///
/// The device is released when the monitor is dropped, whether the loop ended
/// at the end of the stream, on shutdown, or with an error.
pub struct Monitor<C: Capture, D, R> {
	capture: CaptureGuard<C>,
	engine: FusionEngine<D, R>,
	config: MonitorConfig,
	shutdown: Shutdown,
}

impl<C: Capture, D: Detect, R: Recognize> Monitor<C, D, R> {
	pub fn new(capture: C, engine: FusionEngine<D, R>, config: MonitorConfig) -> Self {
		Self {
			capture: CaptureGuard::new(capture),
			engine,
			config,
			shutdown: Shutdown::default(),
		}
	}

	/// Returns a handle that stops the loop from another thread.
	pub fn shutdown(&self) -> Shutdown {
		self.shutdown.clone()
	}

	pub fn engine(&self) -> &FusionEngine<D, R> {
		&self.engine
	}

	/// Run until the stream ends or shutdown is triggered, calling `on_frame` with every result.
	///
	/// Blocks the calling thread; run it on a dedicated or blocking thread.
	pub fn run<F>(mut self, mut on_frame: F) -> Result<Summary>
	where
		F: FnMut(&Processed),
	{
		let mut summary = Summary::default();
		let mut failures = 0;

		loop {
			if self.shutdown.is_triggered() {
				tracing::info!(frames = summary.frames, "shutdown requested");
				break;
			}

			let frame = match self.capture.read() {
				Ok(Some(frame)) => frame,
				Ok(None) => {
					tracing::info!(frames = summary.frames, "end of stream");
					break;
				}
				Err(err) => {
					failures += 1;
					summary.read_errors += 1;
					tracing::warn!(%err, failures, "failed to read frame");

					if failures >= self.config.max_read_errors {
						return Err(Error::Capture(format!("{failures} consecutive read failures: {err}")));
					}

					continue;
				}
			};

			failures = 0;

			let processed = self.engine.process(frame);
			summary.frames += 1;
			if processed.evidence.is_some() {
				summary.alerts += 1;
			}

			on_frame(&processed);
		}

		Ok(summary)
	}
}

#[cfg(test)]
mod test {
	use std::collections::VecDeque;
	use std::time::Duration;

	use super::*;
	use crate::{Corners, Detection, EngineConfig, EvidenceConfig, FaceObservation, Frame, Status};

	struct Scripted {
		reads: VecDeque<Result<Option<Frame>>>,
		released: Arc<AtomicBool>,
	}

	impl Scripted {
		fn new(reads: impl IntoIterator<Item = Result<Option<Frame>>>) -> (Self, Arc<AtomicBool>) {
			let released = Arc::new(AtomicBool::new(false));
			let capture = Self {
				reads: reads.into_iter().collect(),
				released: released.clone(),
			};
			(capture, released)
		}
	}

	impl Capture for Scripted {
		fn read(&mut self) -> Result<Option<Frame>> {
			// A live camera never ends on its own.
			self.reads.pop_front().unwrap_or(Err(Error::Capture("no signal".to_string())))
		}

		fn release(&mut self) {
			assert!(!self.released.swap(true, Ordering::SeqCst), "released twice");
		}
	}

	struct Everyone;

	impl Detect for Everyone {
		fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
			Ok(vec![Detection::new(Corners::default(), 0.9)])
		}
	}

	struct Blind;

	impl Recognize for Blind {
		fn recognize(&mut self, _frame: &Frame) -> Result<Vec<FaceObservation>> {
			Ok(Vec::new())
		}
	}

	fn frame(sequence: u64) -> Result<Option<Frame>> {
		Ok(Some(Frame::new(sequence, Duration::from_millis(33 * sequence), &b"jpeg"[..])))
	}

	fn engine(dir: &std::path::Path) -> FusionEngine<Everyone, Blind> {
		let config = EngineConfig {
			detect_every: 1,
			evidence: EvidenceConfig {
				dir: dir.to_path_buf(),
				cooldown: Duration::from_secs(3),
			},
			..Default::default()
		};

		FusionEngine::new(config, Everyone, Blind).unwrap()
	}

	#[test]
	fn end_of_stream() {
		let tmp = tempfile::tempdir().unwrap();
		let (capture, released) = Scripted::new([frame(1), frame(2), frame(3), Ok(None)]);
		let monitor = Monitor::new(capture, engine(tmp.path()), MonitorConfig::default());

		let mut statuses = Vec::new();
		let summary = monitor.run(|p| statuses.push(p.status.clone())).unwrap();

		assert_eq!(
			summary,
			Summary {
				frames: 3,
				alerts: 1,
				read_errors: 0,
			}
		);
		assert_eq!(statuses, vec![Status::UnidentifiedBody; 3]);
		assert!(released.load(Ordering::SeqCst));
	}

	#[test]
	fn skips_transient_errors() {
		let tmp = tempfile::tempdir().unwrap();
		let hiccup = || Err(Error::Capture("dropped frame".to_string()));
		let (capture, released) = Scripted::new([frame(1), hiccup(), hiccup(), frame(2), hiccup(), frame(3), Ok(None)]);

		let config = MonitorConfig { max_read_errors: 3 };
		let summary = Monitor::new(capture, engine(tmp.path()), config).run(|_| {}).unwrap();

		assert_eq!(summary.frames, 3);
		assert_eq!(summary.read_errors, 3);
		assert!(released.load(Ordering::SeqCst));
	}

	#[test]
	fn gives_up_and_releases() {
		let tmp = tempfile::tempdir().unwrap();
		let (capture, released) = Scripted::new([frame(1)]);

		let config = MonitorConfig { max_read_errors: 5 };
		let err = Monitor::new(capture, engine(tmp.path()), config).run(|_| {}).unwrap_err();

		assert!(matches!(err, Error::Capture(_)), "{err}");
		assert!(released.load(Ordering::SeqCst));
	}

	#[test]
	fn stops_on_shutdown() {
		let tmp = tempfile::tempdir().unwrap();
		let (capture, released) = Scripted::new((1..=100).map(frame));
		let monitor = Monitor::new(capture, engine(tmp.path()), MonitorConfig::default());

		let shutdown = monitor.shutdown();
		let summary = monitor
			.run(|p| {
				if p.index == 5 {
					shutdown.trigger();
				}
			})
			.unwrap();

		assert_eq!(summary.frames, 5);
		assert!(released.load(Ordering::SeqCst));
	}
}
