//! The narrow interfaces the engine uses to talk to devices and models.
//!
//! Everything behind these traits is external: the camera, the body detector,
//! the face-identity model and the overlay renderer. Tests drive the engine
//! with deterministic implementations instead.

use std::ops::{Deref, DerefMut};

use crate::{Detection, FaceObservation, Frame, Result};

/// A frame acquisition device.
pub trait Capture: Send {
	/// Block until the next frame is available.
	///
	/// Returns `Ok(None)` at the end of the stream.
	/// An error is a transient hiccup; the caller may try again.
	fn read(&mut self) -> Result<Option<Frame>>;

	/// Release the device. Called exactly once by [CaptureGuard].
	fn release(&mut self);
}

/// A body detector, returning every person in the frame.
pub trait Detect: Send {
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// A face-identity recognizer, returning every face in the frame.
pub trait Recognize: Send {
	fn recognize(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>>;
}

/// The presentation layer, baking overlays into the payload before evidence is saved.
pub trait Render: Send {
	fn render(&mut self, frame: Frame) -> Frame;
}

/// A renderer that leaves the payload untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Render for Passthrough {
	fn render(&mut self, frame: Frame) -> Frame {
		frame
	}
}

impl<T: Detect + ?Sized> Detect for Box<T> {
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
		(**self).detect(frame)
	}
}

impl<T: Recognize + ?Sized> Recognize for Box<T> {
	fn recognize(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>> {
		(**self).recognize(frame)
	}
}

/// Releases the wrapped capture device when dropped, on every exit path.
pub struct CaptureGuard<C: Capture> {
	inner: C,
}

impl<C: Capture> CaptureGuard<C> {
	pub fn new(inner: C) -> Self {
		Self { inner }
	}
}

impl<C: Capture> Deref for CaptureGuard<C> {
	type Target = C;

	fn deref(&self) -> &C {
		&self.inner
	}
}

impl<C: Capture> DerefMut for CaptureGuard<C> {
	fn deref_mut(&mut self) -> &mut C {
		&mut self.inner
	}
}

impl<C: Capture> Drop for CaptureGuard<C> {
	fn drop(&mut self) {
		tracing::debug!("releasing capture device");
		self.inner.release();
	}
}
