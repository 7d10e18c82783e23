use std::{future::Future, pin::Pin};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{Entry, EntryAnalysisFields},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence seen by the journal service. Every read is scoped to one owner except the
/// reindex scan.
pub trait EntryStore
where
	Self: Send + Sync,
{
	fn insert_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>>;

	/// Overwrites the stored row. Fails with `NotFound` when the entry does not exist.
	fn update_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>>;

	/// Writes only the derived fields. Fails with `NotFound` when the entry does not exist.
	fn set_analysis<'a>(
		&'a self,
		user_id: &'a str,
		entry_id: Uuid,
		analysis: &'a EntryAnalysisFields,
	) -> BoxFuture<'a, Result<()>>;

	/// Stores a vector only while `expected_content` is still the entry's content. Returns
	/// whether a row was written.
	fn set_embedding<'a>(
		&'a self,
		entry_id: Uuid,
		expected_content: &'a str,
		embedding: &'a [f32],
		embedding_version: &'a str,
	) -> BoxFuture<'a, Result<bool>>;

	fn get_entry<'a>(
		&'a self,
		user_id: &'a str,
		entry_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Entry>>>;

	/// Newest first.
	fn list_entries<'a>(&'a self, user_id: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Entry>>>;

	fn delete_entry<'a>(&'a self, user_id: &'a str, entry_id: Uuid) -> BoxFuture<'a, Result<bool>>;

	/// Entries with a vector produced by `embedding_version`, ordered by creation.
	fn candidates_with_embeddings<'a>(
		&'a self,
		user_id: &'a str,
		embedding_version: &'a str,
	) -> BoxFuture<'a, Result<Vec<Entry>>>;

	/// The latest `limit` entries created in `[start, end)`, oldest first.
	fn entries_between<'a>(
		&'a self,
		user_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Entry>>>;

	/// Entries with no vector or a vector from another embedding version, across all owners.
	fn entries_needing_embedding<'a>(
		&'a self,
		embedding_version: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Entry>>>;
}

impl EntryStore for Db {
	fn insert_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::insert_entry(self, entry))
	}

	fn update_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::update_entry(self, entry))
	}

	fn set_analysis<'a>(
		&'a self,
		user_id: &'a str,
		entry_id: Uuid,
		analysis: &'a EntryAnalysisFields,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::set_analysis(self, user_id, entry_id, analysis))
	}

	fn set_embedding<'a>(
		&'a self,
		entry_id: Uuid,
		expected_content: &'a str,
		embedding: &'a [f32],
		embedding_version: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(queries::set_embedding(
			self,
			entry_id,
			expected_content,
			embedding,
			embedding_version,
		))
	}

	fn get_entry<'a>(
		&'a self,
		user_id: &'a str,
		entry_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Entry>>> {
		Box::pin(queries::get_entry(self, user_id, entry_id))
	}

	fn list_entries<'a>(&'a self, user_id: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(queries::list_entries(self, user_id, limit))
	}

	fn delete_entry<'a>(&'a self, user_id: &'a str, entry_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(queries::delete_entry(self, user_id, entry_id))
	}

	fn candidates_with_embeddings<'a>(
		&'a self,
		user_id: &'a str,
		embedding_version: &'a str,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(queries::candidates_with_embeddings(self, user_id, embedding_version))
	}

	fn entries_between<'a>(
		&'a self,
		user_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(queries::entries_between(self, user_id, start, end, limit))
	}

	fn entries_needing_embedding<'a>(
		&'a self,
		embedding_version: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(queries::entries_needing_embedding(self, embedding_version, limit))
	}
}
