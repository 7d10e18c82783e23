//! Best-effort recovery of structured JSON from completion text.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?s)```(?i:json)?\s*(.*?)\s*```").ok());

/// Recovers a JSON object or array from free-form completion text.
///
/// Tried in order, first success wins: the whole text, the content of each fenced code block,
/// the greedy `{...}` span, the greedy `[...]` span. Bare scalars never count as success. Returns
/// `None` when nothing parses.
pub fn safe_parse_json(text: &str) -> Option<Value> {
	if let Some(value) = parse_structured(text.trim()) {
		return Some(value);
	}

	if let Some(re) = FENCED_BLOCK.as_ref() {
		for captures in re.captures_iter(text) {
			if let Some(value) = captures.get(1).and_then(|block| parse_structured(block.as_str()))
			{
				return Some(value);
			}
		}
	}

	if let Some(value) = delimited(text, '{', '}').and_then(parse_structured) {
		return Some(value);
	}

	delimited(text, '[', ']').and_then(parse_structured)
}

fn parse_structured(candidate: &str) -> Option<Value> {
	let value: Value = serde_json::from_str(candidate).ok()?;

	(value.is_object() || value.is_array()).then_some(value)
}

fn delimited(text: &str, open: char, close: char) -> Option<&str> {
	let start = text.find(open)?;
	let end = text.rfind(close)?;

	(end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parses_plain_json() {
		assert_eq!(safe_parse_json(r#"{"a":1}"#), Some(json!({ "a": 1 })));
		assert_eq!(safe_parse_json("  [1, 2]\n"), Some(json!([1, 2])));
	}

	#[test]
	fn parses_fenced_json() {
		assert_eq!(safe_parse_json("```json\n{\"a\":1}\n```"), Some(json!({ "a": 1 })));
		assert_eq!(safe_parse_json("```\n[\"x\"]\n```"), Some(json!(["x"])));
		assert_eq!(
			safe_parse_json("Sure!\n```JSON\n{\"mood\": \"calm\"}\n```\nAnything else?"),
			Some(json!({ "mood": "calm" }))
		);
	}

	#[test]
	fn skips_unparseable_fences() {
		let text = "```\nnot json\n```\nthen\n```json\n{\"ok\": true}\n```";

		assert_eq!(safe_parse_json(text), Some(json!({ "ok": true })));
	}

	#[test]
	fn parses_object_embedded_in_prose() {
		let text = "Here is the result:\n{\"mood\":\"focused\"}\nDone.";

		assert_eq!(safe_parse_json(text), Some(json!({ "mood": "focused" })));
	}

	#[test]
	fn brace_span_is_greedy() {
		let text = "Result: {\"outer\": {\"inner\": 1}} trailing";

		assert_eq!(safe_parse_json(text), Some(json!({ "outer": { "inner": 1 } })));
	}

	#[test]
	fn falls_back_to_array_span() {
		let text = "Tags: [\"work\", \"sleep\"] as requested";

		assert_eq!(safe_parse_json(text), Some(json!(["work", "sleep"])));
	}

	#[test]
	fn broken_object_falls_back_to_array() {
		let text = "oops { not valid } but [1, 2, 3]";

		assert_eq!(safe_parse_json(text), Some(json!([1, 2, 3])));
	}

	#[test]
	fn returns_none_for_non_json() {
		assert_eq!(safe_parse_json("not json at all"), None);
		assert_eq!(safe_parse_json(""), None);
		assert_eq!(safe_parse_json("} backwards {"), None);
		assert_eq!(safe_parse_json("{\"unterminated\": "), None);
	}

	#[test]
	fn bare_scalars_are_not_structured() {
		assert_eq!(safe_parse_json("42"), None);
		assert_eq!(safe_parse_json("null"), None);
		assert_eq!(safe_parse_json("\"text\""), None);
	}
}
