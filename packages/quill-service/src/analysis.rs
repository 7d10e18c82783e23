use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, JournalService, Result, prompts};
use quill_providers::safe_parse_json;
use quill_storage::models::EntryAnalysisFields;

const MAX_TAGS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeEntryRequest {
	pub user_id: String,
	pub entry_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAnalysis {
	pub entry_id: Uuid,
	pub mood: Option<String>,
	pub tags: Vec<String>,
	pub summary: Option<String>,
}

impl JournalService {
	/// Derives mood, tags and a summary for an entry and stores them on it.
	///
	/// Only the derived fields are written, so edits made while the completion runs survive.
	pub async fn analyze_entry(&self, req: AnalyzeEntryRequest) -> Result<EntryAnalysis> {
		let entry = self.load_entry(&req.user_id, req.entry_id).await?;
		let messages = prompts::analysis_messages(&entry, MAX_TAGS);
		let raw = self.complete(&messages).await?;
		let Some(parsed) = safe_parse_json(&raw) else {
			tracing::warn!(entry_id = %entry.entry_id, "Analysis output was not JSON.");

			return Err(Error::AnalysisFailed {
				message: "Completion did not contain a JSON object.".to_string(),
			});
		};
		let analysis = parse_analysis(entry.entry_id, &parsed)?;
		let fields = EntryAnalysisFields {
			mood: analysis.mood.clone(),
			tags: analysis.tags.clone(),
			summary: analysis.summary.clone(),
			updated_at: OffsetDateTime::now_utc(),
		};

		self.store.set_analysis(&entry.user_id, entry.entry_id, &fields).await?;

		tracing::info!(
			user_id = %entry.user_id,
			entry_id = %entry.entry_id,
			tags = analysis.tags.len(),
			"Entry analyzed."
		);

		Ok(analysis)
	}
}

fn parse_analysis(entry_id: Uuid, value: &Value) -> Result<EntryAnalysis> {
	let Some(object) = value.as_object() else {
		return Err(Error::AnalysisFailed {
			message: "Analysis output must be a JSON object.".to_string(),
		});
	};
	let mood = non_empty_string(object.get("mood")).map(|mood| mood.to_lowercase());
	let summary = non_empty_string(object.get("summary"));
	let tags = match object.get("tags") {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => normalize_tags(items.iter().filter_map(Value::as_str)),
		Some(_) => {
			return Err(Error::AnalysisFailed {
				message: "Analysis tags must be an array of strings.".to_string(),
			});
		},
	};

	if mood.is_none() && summary.is_none() && tags.is_empty() {
		return Err(Error::AnalysisFailed {
			message: "Analysis output had no mood, tags or summary.".to_string(),
		});
	}

	Ok(EntryAnalysis { entry_id, mood, tags, summary })
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
	value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Trims, lowercases and deduplicates tags in first-seen order, keeping at most eight.
pub(crate) fn normalize_tags<'a, I>(raw: I) -> Vec<String>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut tags: Vec<String> = Vec::new();

	for tag in raw {
		let tag = tag.trim().to_lowercase();

		if tag.is_empty() || tags.contains(&tag) {
			continue;
		}

		tags.push(tag);

		if tags.len() == MAX_TAGS {
			break;
		}
	}

	tags
}
