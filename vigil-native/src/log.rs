use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[serde_as]
#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
	/// The level to log at, unless overridden with RUST_LOG.
	/// Defaults to `info` if not provided.
	#[arg(id = "log-level", long = "log-level", env = "VIGIL_LOG_LEVEL")]
	#[serde_as(as = "Option<DisplayFromStr>")]
	pub level: Option<Level>,
}

impl Log {
	/// Install the global subscriber, logging to stderr.
	///
	/// Does nothing if a subscriber was already installed.
	pub fn init(&self) {
		let filter = EnvFilter::builder()
			.with_default_directive(LevelFilter::from_level(self.level.unwrap_or(Level::INFO)).into())
			.from_env_lossy(); // Allow overriding with RUST_LOG

		let logger = tracing_subscriber::FmtSubscriber::builder()
			.with_writer(std::io::stderr)
			.with_env_filter(filter)
			.finish();

		if tracing::subscriber::set_global_default(logger).is_err() {
			tracing::debug!("logger already initialized");
		}
	}
}
