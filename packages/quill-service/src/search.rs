use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, JournalService, Result, require_user_id};
use quill_retrieval::{EMBEDDING_VERSION, RetrievalPolicy, rank_text, truncate_with_ellipsis};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub user_id: String,
	pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
	pub entry_id: Uuid,
	pub title: String,
	pub excerpt: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub mood: Option<String>,
	pub tags: Vec<String>,
	pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
}

impl JournalService {
	/// Ranks the caller's entries against a free-text query.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must not be empty.".to_string() });
		}

		let cfg = &self.cfg.retrieval.search;
		let policy = RetrievalPolicy::new(cfg.min_similarity, cfg.max_results as usize);
		let candidates = self.store.candidates_with_embeddings(user_id, EMBEDDING_VERSION).await?;
		let candidate_count = candidates.len();
		let ranked = rank_text(
			query,
			candidates,
			|entry| entry.current_embedding(EMBEDDING_VERSION),
			&policy,
		);
		let items: Vec<SearchItem> = ranked
			.into_iter()
			.map(|scored| {
				let entry = scored.item;

				SearchItem {
					entry_id: entry.entry_id,
					excerpt: truncate_with_ellipsis(&entry.content, cfg.excerpt_chars as usize),
					title: entry.title,
					created_at: entry.created_at,
					mood: entry.mood,
					tags: entry.tags,
					similarity: scored.similarity,
				}
			})
			.collect();

		tracing::info!(
			user_id,
			candidates = candidate_count,
			results = items.len(),
			"Search finished."
		);

		Ok(SearchResponse { items })
	}
}
