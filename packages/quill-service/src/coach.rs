use serde::{Deserialize, Serialize};

use crate::{Error, JournalService, RelatedEntry, Result, prompts, require_user_id};
use quill_providers::completion::TokenStream;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachRequest {
	pub user_id: String,
	pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachResponse {
	pub reply: String,
	pub related: Vec<RelatedEntry>,
}

/// A coaching reply still being generated. `related` is final before the first token arrives.
pub struct CoachStream {
	pub related: Vec<RelatedEntry>,
	pub tokens: TokenStream,
}

impl JournalService {
	pub async fn coach(&self, req: CoachRequest) -> Result<CoachResponse> {
		let (user_id, messages, related) = self.prepare_coach(&req).await?;
		let reply = self.complete(&messages).await?.trim().to_string();

		tracing::info!(user_id, related = related.len(), "Coach reply generated.");

		Ok(CoachResponse { reply, related })
	}

	/// Retrieves context once, then hands back the live token channel.
	pub async fn coach_stream(&self, req: CoachRequest) -> Result<CoachStream> {
		let (user_id, messages, related) = self.prepare_coach(&req).await?;
		let tokens =
			self.providers.completion.complete_stream(&self.cfg.providers.llm, &messages).await?;

		tracing::info!(user_id, related = related.len(), "Coach stream started.");

		Ok(CoachStream { related, tokens })
	}

	async fn prepare_coach<'a>(
		&self,
		req: &'a CoachRequest,
	) -> Result<(&'a str, Vec<serde_json::Value>, Vec<RelatedEntry>)> {
		let user_id = require_user_id(&req.user_id)?;
		let message = req.message.trim();

		if message.is_empty() {
			return Err(Error::InvalidRequest { message: "message must not be empty.".to_string() });
		}

		let related = self
			.related_context(user_id, message, None, self.cfg.retrieval.related.coach_limit)
			.await?;

		Ok((user_id, prompts::coach_messages(message, &related), related))
	}
}
