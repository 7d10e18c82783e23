use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{JournalService, RelatedEntry, Result, prompts};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectRequest {
	pub user_id: String,
	pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectResponse {
	pub entry_id: Uuid,
	pub reflection: String,
	pub related: Vec<RelatedEntry>,
}

impl JournalService {
	/// Writes a reflection on one entry, grounded in the caller's most similar past entries.
	pub async fn reflect(&self, req: ReflectRequest) -> Result<ReflectResponse> {
		let entry = self.load_entry(&req.user_id, req.entry_id).await?;
		let related = self
			.related_context(
				&entry.user_id,
				&entry.content,
				Some(entry.entry_id),
				self.cfg.retrieval.related.reflect_limit,
			)
			.await?;
		let messages = prompts::reflection_messages(&entry, &related);
		let reflection = self.complete(&messages).await?.trim().to_string();

		tracing::info!(
			user_id = %entry.user_id,
			entry_id = %entry.entry_id,
			related = related.len(),
			"Reflection generated."
		);

		Ok(ReflectResponse { entry_id: entry.entry_id, reflection, related })
	}
}
