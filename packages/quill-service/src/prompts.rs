//! Chat messages sent to the completion provider.

use serde_json::{Value, json};

use crate::related::RelatedEntry;
use quill_retrieval::excerpt;
use quill_storage::models::Entry;

const NO_CONTEXT: &str = "No related past entries.";

pub(crate) fn analysis_messages(entry: &Entry, max_tags: usize) -> Vec<Value> {
	let schema = json!({
		"mood": "string",
		"tags": ["string"],
		"summary": "string"
	});
	let system_prompt = "You analyze private journal entries. \
Output must be valid JSON only and must match the provided schema exactly. \
mood is one or two lowercase words. tags are short lowercase topics. \
summary is one or two sentences in the writer's own perspective. \
Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n- MAX_TAGS = {max_tags}\nTitle:\n{title}\nEntry:\n{content}",
		schema = pretty(&schema),
		title = entry.title,
		content = entry.content,
	);

	messages(system_prompt, user_prompt)
}

pub(crate) fn reflection_messages(entry: &Entry, related: &[RelatedEntry]) -> Vec<Value> {
	let system_prompt = "You are a thoughtful journaling companion. \
Write a short reflection on today's entry that notices patterns with the past entries provided. \
Refer to past entries by their date. Do not invent events that are not in the text. \
Keep it under 200 words.";
	let user_prompt = format!(
		"Past entries:\n{context}\nToday's entry ({date}):\n{title}\n{content}",
		context = format_context(related),
		date = entry.created_at.date(),
		title = entry.title,
		content = entry.content,
	);

	messages(system_prompt, user_prompt)
}

pub(crate) fn coach_messages(message: &str, related: &[RelatedEntry]) -> Vec<Value> {
	let system_prompt = "You are a supportive coach with access to the user's journal. \
Answer the message directly and ground suggestions in the past entries provided when they are relevant. \
Do not diagnose. Keep it under 150 words.";
	let user_prompt = format!(
		"Past entries:\n{context}\nMessage:\n{message}",
		context = format_context(related),
	);

	messages(system_prompt, user_prompt)
}

pub(crate) fn recap_messages(period: &str, entries: &[Entry], excerpt_chars: usize) -> Vec<Value> {
	let schema = json!({
		"summary": "string",
		"highlights": ["string"],
		"mood_trend": "string"
	});
	let system_prompt = "You write recaps of a person's journal. \
Output must be valid JSON only and must match the provided schema exactly. \
highlights are short phrases taken from the entries. \
mood_trend describes how mood changed across the period in one sentence. \
Do not add explanations or extra fields.";
	let mut listing = String::new();

	for entry in entries {
		listing.push_str(&format!(
			"- [{date}] {title}{mood}: {content}\n",
			date = entry.created_at.date(),
			title = entry.title,
			mood = entry.mood.as_deref().map(|mood| format!(" (mood: {mood})")).unwrap_or_default(),
			content = excerpt(&entry.content, excerpt_chars),
		));
	}

	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nPeriod: {period}\nEntries:\n{listing}",
		schema = pretty(&schema),
	);

	messages(system_prompt, user_prompt)
}

pub(crate) fn format_context(related: &[RelatedEntry]) -> String {
	if related.is_empty() {
		return format!("{NO_CONTEXT}\n");
	}

	let mut out = String::new();

	for item in related {
		out.push_str(&format!("- [{}]", item.date.date()));

		if let Some(mood) = item.mood.as_deref() {
			out.push_str(&format!(" (mood: {mood})"));
		}
		if !item.tags.is_empty() {
			out.push_str(&format!(" (tags: {})", item.tags.join(", ")));
		}

		out.push(' ');
		out.push_str(&item.excerpt);
		out.push('\n');
	}

	out
}

fn messages(system_prompt: &str, user_prompt: String) -> Vec<Value> {
	vec![
		json!({ "role": "system", "content": system_prompt }),
		json!({ "role": "user", "content": user_prompt }),
	]
}

fn pretty(schema: &Value) -> String {
	serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;
	use uuid::Uuid;

	use super::*;

	fn related(mood: Option<&str>, tags: &[&str]) -> RelatedEntry {
		RelatedEntry {
			entry_id: Uuid::nil(),
			excerpt: "Ran by the river.".to_string(),
			mood: mood.map(str::to_string),
			tags: tags.iter().map(|tag| tag.to_string()).collect(),
			date: datetime!(2024-05-01 07:30 UTC),
			similarity: 0.5,
		}
	}

	#[test]
	fn empty_context_is_stated() {
		assert_eq!(format_context(&[]), "No related past entries.\n");
	}

	#[test]
	fn context_lines_carry_date_mood_and_tags() {
		let text = format_context(&[related(Some("calm"), &["running", "outdoors"])]);

		assert_eq!(text, "- [2024-05-01] (mood: calm) (tags: running, outdoors) Ran by the river.\n");
	}

	#[test]
	fn coach_prompt_includes_message_and_context() {
		let messages = coach_messages("How do I keep this up?", &[related(None, &[])]);

		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0]["role"], "system");

		let user = messages[1]["content"].as_str().expect("user content");

		assert!(user.contains("How do I keep this up?"));
		assert!(user.contains("- [2024-05-01] Ran by the river."));
	}
}
