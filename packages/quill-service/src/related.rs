use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, JournalService, Result, require_user_id};
use quill_retrieval::{EMBEDDING_VERSION, RetrievalPolicy, excerpt, rank_text};

/// A past entry surfaced as context, trimmed for prompt use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedEntry {
	pub entry_id: Uuid,
	pub excerpt: String,
	pub mood: Option<String>,
	pub tags: Vec<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub date: OffsetDateTime,
	pub similarity: f32,
}

/// Anchors on either a stored entry or free text, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindRelatedRequest {
	pub user_id: String,
	#[serde(default)]
	pub entry_id: Option<Uuid>,
	#[serde(default)]
	pub query: Option<String>,
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindRelatedResponse {
	pub items: Vec<RelatedEntry>,
}

impl JournalService {
	pub async fn find_related(&self, req: FindRelatedRequest) -> Result<FindRelatedResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let cfg = &self.cfg.retrieval.related;
		let limit = match req.limit {
			None => cfg.default_limit,
			Some(0) => {
				return Err(Error::InvalidRequest {
					message: "limit must be greater than zero.".to_string(),
				});
			},
			Some(limit) => limit.min(cfg.max_limit),
		};
		let query = req.query.as_deref().map(str::trim).filter(|query| !query.is_empty());
		let items = match (req.entry_id, query) {
			(Some(entry_id), None) => {
				let anchor = self.load_entry(user_id, entry_id).await?;

				self.related_context(user_id, &anchor.content, Some(entry_id), limit).await?
			},
			(None, Some(query)) => self.related_context(user_id, query, None, limit).await?,
			_ => {
				return Err(Error::InvalidRequest {
					message: "Exactly one of entry_id or query is required.".to_string(),
				});
			},
		};

		Ok(FindRelatedResponse { items })
	}

	/// Past entries most similar to `text` under the related-context floor, excluding `exclude`.
	pub(crate) async fn related_context(
		&self,
		user_id: &str,
		text: &str,
		exclude: Option<Uuid>,
		limit: u32,
	) -> Result<Vec<RelatedEntry>> {
		let cfg = &self.cfg.retrieval.related;
		let policy = RetrievalPolicy::new(cfg.min_similarity, limit as usize);
		let mut candidates =
			self.store.candidates_with_embeddings(user_id, EMBEDDING_VERSION).await?;

		if let Some(exclude) = exclude {
			candidates.retain(|entry| entry.entry_id != exclude);
		}

		let candidate_count = candidates.len();
		let related: Vec<RelatedEntry> =
			rank_text(text, candidates, |entry| entry.current_embedding(EMBEDDING_VERSION), &policy)
				.into_iter()
				.map(|scored| {
					let entry = scored.item;

					RelatedEntry {
						entry_id: entry.entry_id,
						excerpt: excerpt(&entry.content, cfg.excerpt_chars as usize).to_string(),
						mood: entry.mood,
						tags: entry.tags,
						date: entry.created_at,
						similarity: scored.similarity,
					}
				})
				.collect();

		tracing::debug!(
			user_id,
			candidates = candidate_count,
			results = related.len(),
			"Related context retrieved."
		);

		Ok(related)
	}
}
