mod config;
mod replay;

use std::time::Duration;

use anyhow::Context;
use config::*;
use replay::*;
use tokio::runtime::Handle;
use vigil::{Dispatcher, FusionEngine, IdentityRecognizer, Monitor, PersonDetector};

// How long to wait for in-flight notifications before exiting.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = Config::load()?;

	match config.command.clone() {
		Some(Command::Replay(args)) => replay(config, args).await,
		None => anyhow::bail!("no command given; see `vigil --help`"),
	}
}

async fn replay(config: Config, args: ReplayArgs) -> anyhow::Result<()> {
	let script = Script::from_file(&args.script)?;

	// Load the models before touching the capture device.
	let detector = PersonDetector::new(ScriptedObjects(script.clone()), config.detector.config());
	let recognizer = IdentityRecognizer::load(config.recognizer.config(), |path| ScriptedFaces::open(path, script))
		.context("failed to load face model")?;

	let mut engine = FusionEngine::new(config.engine.config()?, detector, recognizer)
		.context("failed to create engine")?;

	let dispatcher = config
		.telegram
		.clone()
		.init()?
		.map(|transport| Dispatcher::new(transport, Handle::current()));

	if let Some(dispatcher) = &dispatcher {
		engine = engine.with_dispatcher(dispatcher.clone());
	}

	let capture = ReplayCapture::open(&args.frames, args.fps)
		.context("failed to open replay")?
		.realtime(args.realtime);

	let monitor = Monitor::new(capture, engine, config.monitor.config());

	let shutdown = monitor.shutdown();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::info!("interrupted, stopping after the current frame");
			shutdown.trigger();
		}
	});

	// The frame loop blocks on the device and the models.
	let summary = tokio::task::spawn_blocking(move || {
		monitor.run(|processed| {
			tracing::debug!(index = processed.index, status = %processed.status, "processed frame");
		})
	})
	.await??;

	if let Some(dispatcher) = dispatcher {
		if tokio::time::timeout(FLUSH_TIMEOUT, dispatcher.flush()).await.is_err() {
			tracing::warn!("gave up waiting for notifications");
		}
	}

	tracing::info!(
		frames = summary.frames,
		alerts = summary.alerts,
		read_errors = summary.read_errors,
		"replay finished"
	);

	Ok(())
}
