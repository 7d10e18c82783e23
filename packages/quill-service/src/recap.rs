use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::{Error, JournalService, Result, prompts, require_user_id};
use quill_providers::safe_parse_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecapPeriod {
	Week,
	Month,
}
impl RecapPeriod {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Week => "week",
			Self::Month => "month",
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapRequest {
	pub user_id: String,
	pub period: RecapPeriod,
	/// Exclusive end of the window. Defaults to now.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub end: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapResponse {
	pub period: RecapPeriod,
	#[serde(with = "time::serde::rfc3339")]
	pub start: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub end: OffsetDateTime,
	pub entry_count: usize,
	pub summary: String,
	pub highlights: Vec<String>,
	pub mood_trend: Option<String>,
}

impl JournalService {
	pub async fn recap(&self, req: RecapRequest) -> Result<RecapResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let cfg = &self.cfg.recap;
		let days = match req.period {
			RecapPeriod::Week => cfg.week_days,
			RecapPeriod::Month => cfg.month_days,
		};
		let end = req.end.unwrap_or_else(OffsetDateTime::now_utc);
		let start = end.checked_sub(Duration::days(i64::from(days))).ok_or_else(|| {
			Error::InvalidRequest {
				message: format!("Recap end is too early for a {} window.", req.period.as_str()),
			}
		})?;
		let entries = self.store.entries_between(user_id, start, end, cfg.max_entries).await?;

		if entries.is_empty() {
			return Err(Error::NotFound {
				message: format!("No entries in the requested {}.", req.period.as_str()),
			});
		}

		let messages =
			prompts::recap_messages(req.period.as_str(), &entries, cfg.excerpt_chars as usize);
		let raw = self.complete(&messages).await?;
		let Some(parsed) = safe_parse_json(&raw) else {
			tracing::warn!(user_id, period = req.period.as_str(), "Recap output was not JSON.");

			return Err(Error::AnalysisFailed {
				message: "Completion did not contain a JSON object.".to_string(),
			});
		};
		let (summary, highlights, mood_trend) = parse_recap(&parsed)?;

		tracing::info!(
			user_id,
			period = req.period.as_str(),
			entries = entries.len(),
			"Recap generated."
		);

		Ok(RecapResponse {
			period: req.period,
			start,
			end,
			entry_count: entries.len(),
			summary,
			highlights,
			mood_trend,
		})
	}
}

fn parse_recap(value: &Value) -> Result<(String, Vec<String>, Option<String>)> {
	let text = |key: &str| {
		value
			.get(key)
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
	};
	let Some(summary) = text("summary") else {
		return Err(Error::AnalysisFailed { message: "Recap output had no summary.".to_string() });
	};
	let highlights = value
		.get("highlights")
		.and_then(Value::as_array)
		.map(|items| {
			items
				.iter()
				.filter_map(Value::as_str)
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(str::to_string)
				.collect()
		})
		.unwrap_or_default();

	Ok((summary, highlights, text("mood_trend")))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn summary_is_required() {
		assert!(parse_recap(&json!({ "highlights": ["x"] })).is_err());
		assert!(parse_recap(&json!({ "summary": "  " })).is_err());
	}

	#[test]
	fn optional_fields_default_when_missing() {
		let (summary, highlights, mood_trend) =
			parse_recap(&json!({ "summary": "Steady week.", "highlights": [" ran ", 4, ""] }))
				.expect("recap should parse");

		assert_eq!(summary, "Steady week.");
		assert_eq!(highlights, vec!["ran"]);
		assert_eq!(mood_trend, None);
	}

	#[test]
	fn period_round_trips_as_snake_case() {
		let period: RecapPeriod = serde_json::from_value(json!("month")).expect("valid period");

		assert_eq!(period, RecapPeriod::Month);
		assert_eq!(serde_json::to_value(RecapPeriod::Week).expect("serializable"), json!("week"));
	}
}
