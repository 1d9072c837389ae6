use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};
use vigil::{DetectorConfig, EngineConfig, EvidenceConfig, MonitorConfig, RecognizerConfig};
use vigil_native::{Log, TelegramConfig};

#[derive(Parser, Clone, Debug, Default, Serialize, Deserialize)]
#[command(name = "vigil", version, about)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
	/// Load settings from the given TOML file.
	/// Flags and environment variables take precedence over the file.
	#[arg(long, env = "VIGIL_CONFIG")]
	#[serde(skip)]
	pub config: Option<PathBuf>,

	/// The log configuration.
	#[command(flatten)]
	pub log: Log,

	#[command(flatten)]
	pub engine: EngineArgs,

	#[command(flatten)]
	pub detector: DetectorArgs,

	#[command(flatten)]
	pub recognizer: RecognizerArgs,

	#[command(flatten)]
	pub monitor: MonitorArgs,

	/// Where alerts are sent, in addition to the evidence directory.
	#[command(flatten)]
	pub telegram: TelegramConfig,

	#[command(subcommand)]
	#[serde(skip)]
	pub command: Option<Command>,
}

#[derive(clap::Subcommand, Clone, Debug)]
pub enum Command {
	/// Run the detector over a directory of recorded frames.
	Replay(ReplayArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct ReplayArgs {
	/// A directory of images, played back in file name order.
	#[arg(long)]
	pub frames: PathBuf,

	/// A JSON file with the model outputs for each frame.
	#[arg(long)]
	pub script: PathBuf,

	/// The frame rate used for timestamps and pacing.
	#[arg(long, default_value_t = 30.0)]
	pub fps: f64,

	/// Sleep between frames to play back at the given frame rate.
	#[arg(long)]
	pub realtime: bool,
}

#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineArgs {
	/// Consecutive adverse frames before an intrusion is confirmed.
	/// Defaults to 10 if not provided.
	#[arg(long = "streak-limit", id = "streak-limit", env = "VIGIL_STREAK_LIMIT")]
	pub streak_limit: Option<u32>,

	/// Run body detection on every Nth frame.
	/// Defaults to 3 if not provided.
	#[arg(long = "detect-every", id = "detect-every", env = "VIGIL_DETECT_EVERY")]
	pub detect_every: Option<u32>,

	/// Save alert snapshots in this directory.
	/// Defaults to `alerts` if not provided.
	#[arg(long = "evidence-dir", id = "evidence-dir", env = "VIGIL_EVIDENCE_DIR")]
	pub evidence_dir: Option<PathBuf>,

	/// The minimum number of seconds between two snapshots.
	/// Defaults to 3 if not provided.
	#[arg(long = "cooldown", id = "cooldown", env = "VIGIL_COOLDOWN")]
	pub cooldown: Option<f64>,
}

impl EngineArgs {
	pub fn config(&self) -> anyhow::Result<EngineConfig> {
		let mut config = EngineConfig::default();

		if let Some(limit) = self.streak_limit {
			anyhow::ensure!(limit > 0, "streak limit must be positive");
			config.streak_limit = limit;
		}

		if let Some(every) = self.detect_every {
			anyhow::ensure!(every > 0, "detect-every must be positive");
			config.detect_every = every;
		}

		let mut evidence = EvidenceConfig::default();
		if let Some(dir) = &self.evidence_dir {
			evidence.dir = dir.clone();
		}

		if let Some(cooldown) = self.cooldown {
			evidence.cooldown = Duration::try_from_secs_f64(cooldown).context("invalid cooldown")?;
		}

		config.evidence = evidence;
		Ok(config)
	}
}

#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DetectorArgs {
	/// Ignore body detections below this confidence.
	/// Defaults to 0.5 if not provided.
	#[arg(long = "body-confidence", id = "body-confidence", env = "VIGIL_BODY_CONFIDENCE")]
	pub confidence: Option<f32>,

	/// The input resolution of the body detector.
	/// Defaults to 320 if not provided.
	#[arg(long = "body-resolution", id = "body-resolution", env = "VIGIL_BODY_RESOLUTION")]
	pub resolution: Option<u32>,
}

impl DetectorArgs {
	pub fn config(&self) -> DetectorConfig {
		let mut config = DetectorConfig::default();

		if let Some(confidence) = self.confidence {
			config.confidence = confidence;
		}

		if let Some(resolution) = self.resolution {
			config.resolution = resolution;
		}

		config
	}
}

#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RecognizerArgs {
	/// The trained face identity model.
	/// Defaults to `Models/face_lbph.xml` if not provided.
	#[arg(long = "face-model", id = "face-model", env = "VIGIL_FACE_MODEL")]
	pub model: Option<PathBuf>,

	/// The label table for the face model.
	/// Defaults to `Models/face_labels.json` if not provided.
	#[arg(long = "face-labels", id = "face-labels", env = "VIGIL_FACE_LABELS")]
	pub labels: Option<PathBuf>,

	/// Accept a face match when the distance is below this value.
	/// Defaults to 80 if not provided.
	#[arg(long = "face-threshold", id = "face-threshold", env = "VIGIL_FACE_THRESHOLD")]
	pub threshold: Option<f64>,
}

impl RecognizerArgs {
	pub fn config(&self) -> RecognizerConfig {
		let mut config = RecognizerConfig::default();

		if let Some(model) = &self.model {
			config.model = model.clone();
		}

		if let Some(labels) = &self.labels {
			config.labels = labels.clone();
		}

		if let Some(threshold) = self.threshold {
			config.threshold = threshold;
		}

		config
	}
}

#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MonitorArgs {
	/// Stop after this many consecutive failed reads from the capture device.
	/// Defaults to 30 if not provided.
	#[arg(long = "max-read-errors", id = "max-read-errors", env = "VIGIL_MAX_READ_ERRORS")]
	pub max_read_errors: Option<u32>,
}

impl MonitorArgs {
	pub fn config(&self) -> MonitorConfig {
		let mut config = MonitorConfig::default();

		if let Some(max) = self.max_read_errors {
			config.max_read_errors = max;
		}

		config
	}
}

impl Config {
	pub fn load() -> anyhow::Result<Self> {
		let config = match Self::load_from(std::env::args_os()) {
			Ok(config) => config,
			// Usage errors, --help and --version print and exit the way clap does.
			Err(err) => match err.downcast::<clap::Error>() {
				Ok(err) => err.exit(),
				Err(err) => return Err(err),
			},
		};

		config.log.init();

		tracing::trace!(?config, "final config");

		Ok(config)
	}

	/// Parse the arguments, then layer them over the config file if one was given.
	pub fn load_from<I, T>(args: I) -> anyhow::Result<Self>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		// Parse just the CLI arguments initially.
		let matches = Self::command().try_get_matches_from(args)?;
		let mut config = Self::from_arg_matches(&matches)?;

		// If a file is provided, load it and merge the CLI arguments.
		if let Some(path) = config.config.clone() {
			let contents =
				std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;

			let mut file: Self =
				toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;

			// Section by section; the subcommand only ever comes from the arguments.
			file.log.update_from_arg_matches(&matches)?;
			file.engine.update_from_arg_matches(&matches)?;
			file.detector.update_from_arg_matches(&matches)?;
			file.recognizer.update_from_arg_matches(&matches)?;
			file.monitor.update_from_arg_matches(&matches)?;
			file.telegram.update_from_arg_matches(&matches)?;

			file.config = config.config;
			file.command = config.command;
			config = file;
		}

		Ok(config)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn defaults() {
		let config = Config::load_from(["vigil"]).unwrap();

		let engine = config.engine.config().unwrap();
		assert_eq!(engine.streak_limit, 10);
		assert_eq!(engine.detect_every, 3);
		assert_eq!(engine.evidence.dir, PathBuf::from("alerts"));
		assert_eq!(engine.evidence.cooldown, Duration::from_secs(3));

		assert_eq!(config.detector.config(), DetectorConfig::default());
		assert_eq!(config.recognizer.config(), RecognizerConfig::default());
		assert_eq!(config.monitor.config().max_read_errors, 30);
		assert!(config.command.is_none());
	}

	#[test]
	fn flags() {
		let config = Config::load_from([
			"vigil",
			"--streak-limit",
			"5",
			"--cooldown",
			"0.5",
			"--face-threshold",
			"65",
			"replay",
			"--frames",
			"recordings/porch",
			"--script",
			"porch.json",
		])
		.unwrap();

		let engine = config.engine.config().unwrap();
		assert_eq!(engine.streak_limit, 5);
		assert_eq!(engine.evidence.cooldown, Duration::from_millis(500));
		assert_eq!(config.recognizer.config().threshold, 65.0);

		let Some(Command::Replay(replay)) = config.command else {
			panic!("expected replay");
		};
		assert_eq!(replay.frames, PathBuf::from("recordings/porch"));
		assert_eq!(replay.fps, 30.0);
		assert!(!replay.realtime);
	}

	#[test]
	fn file_then_flags() {
		let tmp = tempfile::tempdir().unwrap();
		let path = tmp.path().join("vigil.toml");
		std::fs::write(
			&path,
			r#"
			[log]
			level = "debug"

			[engine]
			streak_limit = 4
			detect_every = 2
			evidence_dir = "/var/lib/vigil"

			[recognizer]
			threshold = 70.0

			[telegram]
			chat = "1234"
			"#,
		)
		.unwrap();

		let path = path.to_str().unwrap();
		let config = Config::load_from([
			"vigil",
			"--config",
			path,
			"--detect-every",
			"6",
			"replay",
			"--frames",
			"recordings/porch",
			"--script",
			"porch.json",
			"--realtime",
		])
		.unwrap();

		let engine = config.engine.config().unwrap();
		assert_eq!(engine.streak_limit, 4, "kept from the file");
		assert_eq!(engine.detect_every, 6, "overridden by the flag");
		assert_eq!(engine.evidence.dir, PathBuf::from("/var/lib/vigil"));
		assert_eq!(config.recognizer.config().threshold, 70.0);
		assert_eq!(config.log.level, Some(tracing::Level::DEBUG));
		assert_eq!(config.telegram.chat.as_deref(), Some("1234"));
		assert_eq!(config.config.as_deref(), Some(std::path::Path::new(path)));

		let Some(Command::Replay(replay)) = config.command else {
			panic!("expected replay");
		};
		assert_eq!(replay.script, PathBuf::from("porch.json"));
		assert!(replay.realtime);
	}

	#[test]
	fn file_without_command() {
		let tmp = tempfile::tempdir().unwrap();
		let path = tmp.path().join("vigil.toml");
		std::fs::write(&path, "[engine]\nstreak_limit = 4\n").unwrap();

		// Loads fine; main reports the missing command.
		let path = path.to_str().unwrap();
		let config = Config::load_from(["vigil", "--config", path, "--streak-limit", "8"]).unwrap();
		assert!(config.command.is_none());
		assert_eq!(config.engine.config().unwrap().streak_limit, 8);
	}

	#[test]
	fn help_and_version() {
		let kind = |args: &[&str]| {
			let err = Config::load_from(args.iter().copied()).unwrap_err();
			err.downcast::<clap::Error>().unwrap().kind()
		};

		assert_eq!(kind(&["vigil", "--help"]), clap::error::ErrorKind::DisplayHelp);
		assert_eq!(kind(&["vigil", "replay", "--help"]), clap::error::ErrorKind::DisplayHelp);
		assert_eq!(kind(&["vigil", "--version"]), clap::error::ErrorKind::DisplayVersion);
		assert_eq!(kind(&["vigil", "--bogus"]), clap::error::ErrorKind::UnknownArgument);
	}

	#[test]
	fn unknown_key() {
		let tmp = tempfile::tempdir().unwrap();
		let path = tmp.path().join("vigil.toml");
		std::fs::write(&path, "[engine]\nstreak = 4\n").unwrap();

		let path = path.to_str().unwrap();
		assert!(Config::load_from(["vigil", "--config", path]).is_err());
	}

	#[test]
	fn invalid_values() {
		let zero = EngineArgs {
			detect_every: Some(0),
			..Default::default()
		};
		assert!(zero.config().is_err());

		let negative = EngineArgs {
			cooldown: Some(-1.0),
			..Default::default()
		};
		assert!(negative.config().is_err());
	}
}
