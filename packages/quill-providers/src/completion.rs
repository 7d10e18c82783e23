use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{Error, Result};
use quill_config::LlmProviderConfig;

const STREAM_BUFFER: usize = 64;
const DONE_SENTINEL: &str = "[DONE]";

/// Receiving half of a streamed completion. The channel closes after the last token.
pub type TokenStream = mpsc::Receiver<Result<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
	Token(String),
	Done,
}

pub async fn complete(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let res = send(cfg, messages, false).await?;
	let json: Value = res.json().await?;

	parse_completion_content(&json)
}

/// Starts a streamed completion and forwards content deltas as they arrive.
pub async fn complete_stream(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<TokenStream> {
	let mut res = send(cfg, messages, true).await?;
	let (tx, rx) = mpsc::channel(STREAM_BUFFER);

	tokio::spawn(async move {
		let mut decoder = SseDecoder::default();

		loop {
			let bytes = match res.chunk().await {
				Ok(Some(bytes)) => bytes,
				Ok(None) => return,
				Err(err) => {
					let _ = tx.send(Err(err.into())).await;

					return;
				},
			};

			for event in decoder.push(&bytes) {
				match event {
					StreamEvent::Token(token) =>
						if tx.send(Ok(token)).await.is_err() {
							return;
						},
					StreamEvent::Done => return,
				}
			}
		}
	});

	Ok(rx)
}

async fn send(cfg: &LlmProviderConfig, messages: &[Value], stream: bool) -> Result<Response> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
		"stream": stream,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	Ok(res.error_for_status()?)
}

pub fn parse_completion_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})
}

/// Parses one server-sent-events line of a streamed chat completion.
///
/// Returns `None` for blank lines, comments, non-data fields, and deltas without content.
pub fn parse_stream_line(line: &str) -> Option<StreamEvent> {
	let data = line.trim().strip_prefix("data:")?.trim();

	if data == DONE_SENTINEL {
		return Some(StreamEvent::Done);
	}

	let json: Value = match serde_json::from_str(data) {
		Ok(json) => json,
		Err(err) => {
			tracing::warn!(error = %err, "Skipping malformed completion stream line.");

			return None;
		},
	};
	let token = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("delta"))
		.and_then(|delta| delta.get("content"))
		.and_then(|c| c.as_str())?;

	(!token.is_empty()).then(|| StreamEvent::Token(token.to_string()))
}

/// Reassembles SSE lines split across arbitrary network chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
	pending: Vec<u8>,
}
impl SseDecoder {
	pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
		self.pending.extend_from_slice(chunk);

		let mut events = Vec::new();

		while let Some(pos) = self.pending.iter().position(|byte| *byte == b'\n') {
			let line: Vec<u8> = self.pending.drain(..=pos).collect();
			let line = String::from_utf8_lossy(&line);

			if let Some(event) = parse_stream_line(&line) {
				events.push(event);
			}
		}

		events
	}
}
