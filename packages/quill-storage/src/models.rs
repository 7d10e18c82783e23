use time::OffsetDateTime;
use uuid::Uuid;

/// A journal entry as persisted.
///
/// `embedding` and `embedding_version` are written together whenever `content` changes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Entry {
	pub entry_id: Uuid,
	pub user_id: String,
	pub title: String,
	pub content: String,
	pub mood: Option<String>,
	pub tags: Vec<String>,
	pub summary: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub embedding: Option<Vec<f32>>,
	pub embedding_version: Option<String>,
}
impl Entry {
	/// The stored vector, if it was produced by the embedding identified by `version`.
	pub fn current_embedding(&self, version: &str) -> Option<&[f32]> {
		match self.embedding_version.as_deref() {
			Some(stored) if stored == version => self.embedding.as_deref(),
			_ => None,
		}
	}
}

/// Derived fields written back by entry analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryAnalysisFields {
	pub mood: Option<String>,
	pub tags: Vec<String>,
	pub summary: Option<String>,
	pub updated_at: OffsetDateTime,
}
