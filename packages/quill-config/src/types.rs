use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub recap: Recap,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// Either "postgres" or "memory".
	pub backend: String,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub search: RetrievalSearch,
	pub related: RetrievalRelated,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalSearch {
	pub min_similarity: f32,
	pub max_results: u32,
	pub excerpt_chars: u32,
}
impl Default for RetrievalSearch {
	fn default() -> Self {
		Self { min_similarity: 0.1, max_results: 10, excerpt_chars: 200 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalRelated {
	pub min_similarity: f32,
	pub reflect_limit: u32,
	pub coach_limit: u32,
	pub default_limit: u32,
	pub max_limit: u32,
	pub excerpt_chars: u32,
}
impl Default for RetrievalRelated {
	fn default() -> Self {
		Self {
			min_similarity: 0.15,
			reflect_limit: 5,
			coach_limit: 3,
			default_limit: 5,
			max_limit: 20,
			excerpt_chars: 300,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Recap {
	pub week_days: u32,
	pub month_days: u32,
	pub max_entries: u32,
	pub excerpt_chars: u32,
}
impl Default for Recap {
	fn default() -> Self {
		Self { week_days: 7, month_days: 30, max_entries: 50, excerpt_chars: 300 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
