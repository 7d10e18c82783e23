//! In-process entry store for local runs and tests. Contents vanish with the process.

use std::sync::{Mutex, MutexGuard};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, EntryStore, Error, Result,
	models::{Entry, EntryAnalysisFields},
};

#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<Vec<Entry>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
		self.entries.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn collect_sorted<F>(&self, keep: F) -> Vec<Entry>
	where
		F: Fn(&Entry) -> bool,
	{
		let mut out: Vec<Entry> = self.lock().iter().filter(|entry| keep(entry)).cloned().collect();

		out.sort_by(|a, b| {
			a.created_at.cmp(&b.created_at).then_with(|| a.entry_id.cmp(&b.entry_id))
		});

		out
	}
}

impl EntryStore for MemoryStore {
	fn insert_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>> {
		let result = {
			let mut entries = self.lock();

			if entries.iter().any(|existing| existing.entry_id == entry.entry_id) {
				Err(Error::InvalidArgument(format!("Entry {} already exists.", entry.entry_id)))
			} else {
				entries.push(entry.clone());

				Ok(())
			}
		};

		Box::pin(async move { result })
	}

	fn update_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>> {
		let result = {
			let mut entries = self.lock();

			match entries.iter_mut().find(|existing| {
				existing.entry_id == entry.entry_id && existing.user_id == entry.user_id
			}) {
				Some(existing) => {
					*existing = Entry { created_at: existing.created_at, ..entry.clone() };

					Ok(())
				},
				None => Err(Error::NotFound(format!("Entry {} does not exist.", entry.entry_id))),
			}
		};

		Box::pin(async move { result })
	}

	fn set_analysis<'a>(
		&'a self,
		user_id: &'a str,
		entry_id: Uuid,
		analysis: &'a EntryAnalysisFields,
	) -> BoxFuture<'a, Result<()>> {
		let result = {
			let mut entries = self.lock();

			match entries
				.iter_mut()
				.find(|entry| entry.entry_id == entry_id && entry.user_id == user_id)
			{
				Some(entry) => {
					entry.mood = analysis.mood.clone();
					entry.tags = analysis.tags.clone();
					entry.summary = analysis.summary.clone();
					entry.updated_at = analysis.updated_at;

					Ok(())
				},
				None => Err(Error::NotFound(format!("Entry {entry_id} does not exist."))),
			}
		};

		Box::pin(async move { result })
	}

	fn set_embedding<'a>(
		&'a self,
		entry_id: Uuid,
		expected_content: &'a str,
		embedding: &'a [f32],
		embedding_version: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		let written = {
			let mut entries = self.lock();

			match entries
				.iter_mut()
				.find(|entry| entry.entry_id == entry_id && entry.content == expected_content)
			{
				Some(entry) => {
					entry.embedding = Some(embedding.to_vec());
					entry.embedding_version = Some(embedding_version.to_string());

					true
				},
				None => false,
			}
		};

		Box::pin(async move { Ok(written) })
	}

	fn get_entry<'a>(
		&'a self,
		user_id: &'a str,
		entry_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Entry>>> {
		let found = self
			.lock()
			.iter()
			.find(|entry| entry.entry_id == entry_id && entry.user_id == user_id)
			.cloned();

		Box::pin(async move { Ok(found) })
	}

	fn list_entries<'a>(&'a self, user_id: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Entry>>> {
		let mut entries = self.collect_sorted(|entry| entry.user_id == user_id);

		entries.reverse();
		entries.truncate(limit as usize);

		Box::pin(async move { Ok(entries) })
	}

	fn delete_entry<'a>(&'a self, user_id: &'a str, entry_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		let removed = {
			let mut entries = self.lock();
			let before = entries.len();

			entries.retain(|entry| !(entry.entry_id == entry_id && entry.user_id == user_id));

			entries.len() != before
		};

		Box::pin(async move { Ok(removed) })
	}

	fn candidates_with_embeddings<'a>(
		&'a self,
		user_id: &'a str,
		embedding_version: &'a str,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		let entries = self.collect_sorted(|entry| {
			entry.user_id == user_id && entry.current_embedding(embedding_version).is_some()
		});

		Box::pin(async move { Ok(entries) })
	}

	fn entries_between<'a>(
		&'a self,
		user_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		if start >= end {
			return Box::pin(async move {
				Err(Error::InvalidArgument("Window start must precede its end.".to_string()))
			});
		}

		let mut entries = self.collect_sorted(|entry| {
			entry.user_id == user_id && entry.created_at >= start && entry.created_at < end
		});
		let skip = entries.len().saturating_sub(limit as usize);

		entries.drain(..skip);

		Box::pin(async move { Ok(entries) })
	}

	fn entries_needing_embedding<'a>(
		&'a self,
		embedding_version: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		let mut entries =
			self.collect_sorted(|entry| entry.current_embedding(embedding_version).is_none());

		entries.truncate(limit as usize);

		Box::pin(async move { Ok(entries) })
	}
}
