use std::path::PathBuf;
use std::sync::Arc;

/// Error types for the vigil engine.
///
/// Configuration errors are returned from constructors and stop the engine before it starts.
/// Everything else is reported per frame or per dispatch and never stops the frame loop.
#[derive(Debug, thiserror::Error, Clone)]
pub enum Error {
	/// The identity model file does not exist.
	#[error("missing identity model: {}", .0.display())]
	MissingModel(PathBuf),

	/// The label table file does not exist.
	#[error("missing label table: {}", .0.display())]
	MissingLabels(PathBuf),

	/// The label table is not a JSON object of integer labels to names.
	#[error("invalid label table: {0}")]
	InvalidLabels(String),

	/// The capture device could not be opened.
	#[error("capture device unavailable: {0}")]
	Capture(String),

	/// A detector or recognizer failed on a single frame.
	#[error("model error: {0}")]
	Model(String),

	/// The notification endpoint returned a non-success status.
	#[error("transport error: status={status} body={body}")]
	Transport { status: u16, body: String },

	/// The notification request never completed.
	#[error("request failed: {0}")]
	Request(String),

	/// The attachment for a photo notification does not exist.
	#[error("attachment not found: {}", .0.display())]
	MissingAttachment(PathBuf),

	/// Filesystem error, usually while writing evidence.
	#[error("io error: {0}")]
	Io(Arc<std::io::Error>),

	/// JSON serialization/deserialization error.
	#[error("json error: {0}")]
	Json(Arc<serde_json::Error>),
}

/// A Result type alias for vigil operations.
pub type Result<T> = std::result::Result<T, Error>;

// Wrap in an Arc so it is Clone
impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Error::Io(Arc::new(err))
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Json(Arc::new(err))
	}
}
