use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{Error, Result};

/// An image attached to a notification.
#[derive(Clone, derive_more::Debug)]
pub struct Photo {
	/// The file name presented to the recipient.
	pub name: String,

	#[debug("{} bytes", data.len())]
	pub data: Bytes,
}

/// An outbound messaging channel, such as a chat bot API.
///
/// Implementations make a single delivery attempt and report the outcome.
pub trait Transport: Send + Sync {
	fn send_message<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<()>>;

	fn send_photo<'a>(&'a self, photo: Photo, caption: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Delivers alerts through a [Transport] without ever blocking or failing the caller.
///
/// Every failure is logged here and goes no further. There are no retries.
#[derive(Clone)]
pub struct Dispatcher {
	transport: Arc<dyn Transport>,
	runtime: Handle,

	// The number of deliveries scheduled but not finished.
	pending: Arc<watch::Sender<usize>>,
}

impl Dispatcher {
	/// Create a dispatcher that runs deliveries on the given runtime.
	///
	/// The frame loop can then dispatch from any thread, including blocking ones.
	pub fn new<T: Transport + 'static>(transport: T, runtime: Handle) -> Self {
		Self {
			transport: Arc::new(transport),
			runtime,
			pending: Arc::new(watch::Sender::new(0)),
		}
	}

	/// Send a text message, logging any failure.
	pub async fn send_text(&self, message: &str) {
		if let Err(err) = self.transport.send_message(message).await {
			tracing::warn!(%err, "failed to send message");
		}
	}

	/// Send a photo with a caption, logging any failure.
	///
	/// The network is never touched if the file does not exist.
	pub async fn send_photo(&self, path: &Path, caption: &str) {
		let photo = match read_photo(path).await {
			Ok(photo) => photo,
			Err(err) => {
				tracing::warn!(%err, "skipping photo");
				return;
			}
		};

		if let Err(err) = self.transport.send_photo(photo, caption).await {
			tracing::warn!(%err, path = %path.display(), "failed to send photo");
		}
	}

	/// Schedule a delivery in the background and return immediately.
	///
	/// Sends a photo when a path is given, otherwise plain text.
	/// The task owns its arguments and shares nothing with the caller.
	pub fn dispatch(&self, message: String, path: Option<PathBuf>) -> JoinHandle<()> {
		let this = self.clone();
		let pending = Pending::new(self.pending.clone());

		self.runtime.spawn(
			async move {
				// Dropped with the task, even if it panics or is aborted.
				let _pending = pending;

				match path {
					Some(path) => this.send_photo(&path, &message).await,
					None => this.send_text(&message).await,
				}
			}
			.in_current_span(),
		)
	}

	/// Wait until every delivery scheduled so far has finished, successfully or not.
	pub async fn flush(&self) {
		let mut pending = self.pending.subscribe();
		let _ = pending.wait_for(|pending| *pending == 0).await;
	}
}

// Counts one scheduled delivery until dropped.
struct Pending(Arc<watch::Sender<usize>>);

impl Pending {
	fn new(counter: Arc<watch::Sender<usize>>) -> Self {
		counter.send_modify(|pending| *pending += 1);
		Self(counter)
	}
}

impl Drop for Pending {
	fn drop(&mut self) {
		self.0.send_modify(|pending| *pending -= 1);
	}
}

async fn read_photo(path: &Path) -> Result<Photo> {
	let data = match tokio::fs::read(path).await {
		Ok(data) => data,
		Err(err) if err.kind() == io::ErrorKind::NotFound => {
			return Err(Error::MissingAttachment(path.to_path_buf()))
		}
		Err(err) => return Err(err.into()),
	};

	let name = path
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| "alert.jpg".to_string());

	Ok(Photo {
		name,
		data: data.into(),
	})
}
