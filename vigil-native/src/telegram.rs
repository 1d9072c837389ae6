use std::time::Duration;

use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use url::Url;
use vigil::{Photo, Transport};

/// The public Bot API endpoint.
pub const DEFAULT_API: &str = "https://api.telegram.org";

#[derive(clap::Args, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TelegramConfig {
	/// The bot token. Alerts are only saved to disk when unset.
	#[arg(long = "telegram-token", id = "telegram-token", env = "VIGIL_TELEGRAM_TOKEN")]
	pub token: Option<String>,

	/// The chat that receives alerts.
	#[arg(long = "telegram-chat", id = "telegram-chat", env = "VIGIL_TELEGRAM_CHAT")]
	pub chat: Option<String>,

	/// Use a different Bot API server.
	/// Defaults to `https://api.telegram.org` if not provided.
	#[arg(long = "telegram-api", id = "telegram-api", env = "VIGIL_TELEGRAM_API")]
	pub api: Option<Url>,
}

// Never print the token.
impl std::fmt::Debug for TelegramConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TelegramConfig")
			.field("token", &self.token.as_ref().map(|_| "<redacted>"))
			.field("chat", &self.chat)
			.field("api", &self.api)
			.finish()
	}
}

impl TelegramConfig {
	/// Create the transport, or `None` if the bot is not configured.
	pub fn init(self) -> anyhow::Result<Option<TelegramTransport>> {
		let (token, chat) = match (self.token, self.chat) {
			(Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => (token, chat),
			_ => {
				tracing::info!("telegram not configured; alerts will only be saved to disk");
				return Ok(None);
			}
		};

		let api = match self.api {
			Some(api) => api,
			None => Url::parse(DEFAULT_API).context("invalid default api")?,
		};

		TelegramTransport::new(api, &token, chat).map(Some)
	}
}

/// Delivers alerts through the Telegram Bot API.
pub struct TelegramTransport {
	client: reqwest::Client,
	chat: String,

	// Both contain the token.
	send_message: Url,
	send_photo: Url,
}

impl TelegramTransport {
	pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
	pub const PHOTO_TIMEOUT: Duration = Duration::from_secs(10);

	/// Paths under `api` are kept, with or without a trailing slash.
	pub fn new(mut api: Url, token: &str, chat: String) -> anyhow::Result<Self> {
		if !api.path().ends_with('/') {
			let path = format!("{}/", api.path());
			api.set_path(&path);
		}

		let base = api.join(&format!("bot{token}/")).context("invalid api url")?;

		Ok(Self {
			client: reqwest::Client::builder().build().context("failed to build http client")?,
			chat,
			send_message: base.join("sendMessage")?,
			send_photo: base.join("sendPhoto")?,
		})
	}

	async fn message(&self, text: &str) -> vigil::Result<()> {
		let res = self
			.client
			.post(self.send_message.clone())
			.form(&[("chat_id", self.chat.as_str()), ("text", text)])
			.timeout(Self::MESSAGE_TIMEOUT)
			.send()
			.await
			.map_err(request)?;

		check(res).await
	}

	async fn photo(&self, photo: Photo, caption: &str) -> vigil::Result<()> {
		let part = Part::bytes(photo.data.to_vec())
			.file_name(photo.name)
			.mime_str("image/jpeg")
			.map_err(request)?;

		let form = Form::new()
			.text("chat_id", self.chat.clone())
			.text("caption", caption.to_string())
			.part("photo", part);

		let res = self
			.client
			.post(self.send_photo.clone())
			.multipart(form)
			.timeout(Self::PHOTO_TIMEOUT)
			.send()
			.await
			.map_err(request)?;

		check(res).await
	}
}

impl Transport for TelegramTransport {
	fn send_message<'a>(&'a self, text: &'a str) -> BoxFuture<'a, vigil::Result<()>> {
		self.message(text).boxed()
	}

	fn send_photo<'a>(&'a self, photo: Photo, caption: &'a str) -> BoxFuture<'a, vigil::Result<()>> {
		self.photo(photo, caption).boxed()
	}
}

// Strip the URL from the error; it contains the token.
fn request(err: reqwest::Error) -> vigil::Error {
	vigil::Error::Request(err.without_url().to_string())
}

async fn check(res: reqwest::Response) -> vigil::Result<()> {
	let status = res.status();
	if status.is_success() {
		return Ok(());
	}

	let body = res.text().await.unwrap_or_default();
	tracing::warn!(status = status.as_u16(), %body, "telegram rejected the request");

	Err(vigil::Error::Transport {
		status: status.as_u16(),
		body,
	})
}
