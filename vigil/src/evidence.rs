use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use crate::{Frame, Result};

/// Where and how often evidence snapshots are written.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
	/// The directory for snapshots, created if missing.
	pub dir: PathBuf,

	/// The minimum time between two successful captures.
	pub cooldown: Duration,
}

impl Default for EvidenceConfig {
	fn default() -> Self {
		Self {
			dir: PathBuf::from("alerts"),
			cooldown: Duration::from_secs(3),
		}
	}
}

/// Persists alert snapshots, at most one per cooldown window.
///
/// The throttle only advances after a file has been written successfully,
/// so a failed write leaves the next frame free to try again.
#[derive(Debug)]
pub struct EvidenceStore {
	dir: PathBuf,
	cooldown: Duration,
	last_save: Option<Instant>,
}

impl EvidenceStore {
	pub fn new(config: EvidenceConfig) -> Result<Self> {
		fs::create_dir_all(&config.dir)?;

		Ok(Self {
			dir: config.dir,
			cooldown: config.cooldown,
			last_save: None,
		})
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Returns true if a capture right now would be throttled.
	pub fn is_cooling_down(&self) -> bool {
		match self.last_save {
			Some(last) => Instant::now().saturating_duration_since(last) < self.cooldown,
			None => false,
		}
	}

	/// Annotate and write the frame unless a snapshot was saved within the cooldown.
	///
	/// Returns the path of the new file, or `None` when throttled.
	/// A throttled call performs no I/O and never invokes `annotate`.
	pub fn try_capture<F>(&mut self, frame: Frame, annotate: F) -> Result<Option<PathBuf>>
	where
		F: FnOnce(Frame) -> Frame,
	{
		let now = Instant::now();
		if let Some(last) = self.last_save {
			let elapsed = now.saturating_duration_since(last);
			if elapsed < self.cooldown {
				tracing::debug!(remaining = ?(self.cooldown - elapsed), "capture throttled");
				return Ok(None);
			}
		}

		let frame = annotate(frame);
		let path = self.write(&frame.payload)?;

		self.last_save = Some(now);
		tracing::info!(path = %path.display(), "saved evidence");

		Ok(Some(path))
	}

	fn write(&self, payload: &[u8]) -> Result<PathBuf> {
		let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

		// Never overwrite earlier evidence captured within the same second.
		let mut attempt = 0;
		let (path, mut file) = loop {
			let name = match attempt {
				0 => format!("alert_{stamp}.jpg"),
				n => format!("alert_{stamp}_{n}.jpg"),
			};
			let path = self.dir.join(name);

			match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
				Ok(file) => break (path, file),
				Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
				Err(err) => return Err(err.into()),
			}
		};

		if let Err(err) = file.write_all(payload).and_then(|_| file.sync_all()) {
			drop(file);
			let _ = fs::remove_file(&path);
			return Err(err.into());
		}

		Ok(path)
	}
}
