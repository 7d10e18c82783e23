use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, JournalService, Result, require_user_id};
use quill_retrieval::{EMBEDDING_VERSION, embed, excerpt};
use quill_storage::models::Entry;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;
const DERIVED_TITLE_CHARS: usize = 60;
const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryRequest {
	pub user_id: String,
	#[serde(default)]
	pub title: Option<String>,
	pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
	pub user_id: String,
	pub entry_id: Uuid,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEntryRequest {
	pub user_id: String,
	pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEntriesRequest {
	pub user_id: String,
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEntriesResponse {
	pub items: Vec<EntryView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEntryRequest {
	pub user_id: String,
	pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEntryResponse {
	pub entry_id: Uuid,
	pub deleted: bool,
}

/// An entry as returned to clients. The vector itself stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
	pub entry_id: Uuid,
	pub title: String,
	pub content: String,
	pub mood: Option<String>,
	pub tags: Vec<String>,
	pub summary: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
	pub has_embedding: bool,
}
impl From<&Entry> for EntryView {
	fn from(entry: &Entry) -> Self {
		Self {
			entry_id: entry.entry_id,
			title: entry.title.clone(),
			content: entry.content.clone(),
			mood: entry.mood.clone(),
			tags: entry.tags.clone(),
			summary: entry.summary.clone(),
			created_at: entry.created_at,
			updated_at: entry.updated_at,
			has_embedding: entry.current_embedding(EMBEDDING_VERSION).is_some(),
		}
	}
}

impl JournalService {
	pub async fn create_entry(&self, req: CreateEntryRequest) -> Result<EntryView> {
		let user_id = require_user_id(&req.user_id)?;
		let content = require_content(&req.content)?;
		let title = resolve_title(req.title.as_deref(), content);
		let now = OffsetDateTime::now_utc();
		let entry = Entry {
			entry_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			title,
			content: content.to_string(),
			mood: None,
			tags: Vec::new(),
			summary: None,
			created_at: now,
			updated_at: now,
			embedding: Some(embed(content)),
			embedding_version: Some(EMBEDDING_VERSION.to_string()),
		};

		self.store.insert_entry(&entry).await?;

		tracing::info!(user_id, entry_id = %entry.entry_id, "Entry created.");

		Ok(EntryView::from(&entry))
	}

	pub async fn get_entry(&self, req: GetEntryRequest) -> Result<EntryView> {
		let entry = self.load_entry(&req.user_id, req.entry_id).await?;

		Ok(EntryView::from(&entry))
	}

	pub async fn list_entries(&self, req: ListEntriesRequest) -> Result<ListEntriesResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let limit = match req.limit {
			None => DEFAULT_LIST_LIMIT,
			Some(0) => {
				return Err(Error::InvalidRequest {
					message: "limit must be greater than zero.".to_string(),
				});
			},
			Some(limit) => limit.min(MAX_LIST_LIMIT),
		};
		let entries = self.store.list_entries(user_id, limit).await?;

		Ok(ListEntriesResponse { items: entries.iter().map(EntryView::from).collect() })
	}

	/// Applies title and content changes. A content change re-embeds before the write.
	pub async fn update_entry(&self, req: UpdateEntryRequest) -> Result<EntryView> {
		if req.title.is_none() && req.content.is_none() {
			return Err(Error::InvalidRequest {
				message: "At least one of title or content is required.".to_string(),
			});
		}

		let mut entry = self.load_entry(&req.user_id, req.entry_id).await?;
		let mut reembedded = false;

		if let Some(content) = req.content.as_deref() {
			let content = require_content(content)?;

			if content != entry.content || entry.current_embedding(EMBEDDING_VERSION).is_none() {
				entry.content = content.to_string();
				entry.embedding = Some(embed(content));
				entry.embedding_version = Some(EMBEDDING_VERSION.to_string());
				reembedded = true;
			}
		}
		if let Some(title) = req.title.as_deref() {
			entry.title = resolve_title(Some(title), &entry.content);
		}

		entry.updated_at = OffsetDateTime::now_utc();

		self.store.update_entry(&entry).await?;

		tracing::info!(
			user_id = %entry.user_id,
			entry_id = %entry.entry_id,
			reembedded,
			"Entry updated."
		);

		Ok(EntryView::from(&entry))
	}

	pub async fn delete_entry(&self, req: DeleteEntryRequest) -> Result<DeleteEntryResponse> {
		let user_id = require_user_id(&req.user_id)?;

		if !self.store.delete_entry(user_id, req.entry_id).await? {
			return Err(entry_not_found(req.entry_id));
		}

		tracing::info!(user_id, entry_id = %req.entry_id, "Entry deleted.");

		Ok(DeleteEntryResponse { entry_id: req.entry_id, deleted: true })
	}

	pub(crate) async fn load_entry(&self, user_id: &str, entry_id: Uuid) -> Result<Entry> {
		let user_id = require_user_id(user_id)?;

		self.store.get_entry(user_id, entry_id).await?.ok_or_else(|| entry_not_found(entry_id))
	}
}

pub(crate) fn entry_not_found(entry_id: Uuid) -> Error {
	Error::NotFound { message: format!("Entry {entry_id} does not exist.") }
}

fn require_content(content: &str) -> Result<&str> {
	let content = content.trim();

	if content.is_empty() {
		return Err(Error::InvalidRequest { message: "content must not be empty.".to_string() });
	}

	Ok(content)
}

/// Uses the given title, or the first line of `content` when it is absent or blank.
fn resolve_title(title: Option<&str>, content: &str) -> String {
	if let Some(title) = title.map(str::trim)
		&& !title.is_empty()
	{
		return title.to_string();
	}

	let first_line = content.lines().map(str::trim).find(|line| !line.is_empty());

	match first_line {
		Some(line) => excerpt(line, DERIVED_TITLE_CHARS).trim_end().to_string(),
		None => UNTITLED.to_string(),
	}
}
