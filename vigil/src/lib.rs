//! # vigil: Intruder Detection Core
//!
//! `vigil` watches a camera stream for people it doesn't recognize.
//! Each frame is scored by two independent signals, a body detector and a face-identity
//! recognizer, and the [FusionEngine] fuses them into a [Status].
//!
//! ## Overview
//!
//! - **Classification**: A hysteresis counter only confirms an intruder after a streak of adverse frames.
//! - **Subsampling**: The expensive body detector runs on every Nth frame; the result is reused in between.
//! - **Evidence**: Alert frames are saved as timestamped snapshots, at most one per cooldown window.
//! - **Notification**: Each snapshot is dispatched in the background and never blocks the frame loop.
//!
//! Devices and models sit behind the traits in [source], so the engine runs the same
//! against a camera, a directory of recorded frames, or a test script.
mod classify;
mod engine;
mod error;
mod evidence;
mod model;
mod monitor;

pub mod detect;
pub mod labels;
pub mod notify;
pub mod recognize;
pub mod source;

pub use classify::*;
pub use detect::{DetectorConfig, ObjectBox, ObjectModel, PersonDetector};
pub use engine::*;
pub use error::*;
pub use evidence::*;
pub use labels::LabelTable;
pub use model::*;
pub use monitor::*;
pub use notify::{Dispatcher, Photo, Transport};
pub use recognize::{FaceModel, FacePrediction, IdentityRecognizer, RecognizerConfig};
pub use source::{Capture, CaptureGuard, Detect, Passthrough, Recognize, Render};
