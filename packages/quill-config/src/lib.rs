mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, LlmProviderConfig, Postgres, Providers, Recap, Retrieval, RetrievalRelated,
	RetrievalSearch, Security, Service, Storage,
};

use std::{fs, path::Path};

const MAX_RECAP_DAYS: u32 = 3_660;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}

	match cfg.storage.backend.as_str() {
		"postgres" => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
		},
		"memory" => {},
		_ => {
			return Err(Error::Validation {
				message: "storage.backend must be one of postgres or memory.".to_string(),
			});
		},
	}

	let llm = &cfg.providers.llm;

	if llm.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider llm api_key must be non-empty.".to_string(),
		});
	}
	if llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !llm.temperature.is_finite() || llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}

	for (label, value) in [
		("retrieval.search.min_similarity", cfg.retrieval.search.min_similarity),
		("retrieval.related.min_similarity", cfg.retrieval.related.min_similarity),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(-1.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range -1.0-1.0."),
			});
		}
	}
	for (label, value) in [
		("retrieval.search.max_results", cfg.retrieval.search.max_results),
		("retrieval.search.excerpt_chars", cfg.retrieval.search.excerpt_chars),
		("retrieval.related.reflect_limit", cfg.retrieval.related.reflect_limit),
		("retrieval.related.coach_limit", cfg.retrieval.related.coach_limit),
		("retrieval.related.default_limit", cfg.retrieval.related.default_limit),
		("retrieval.related.max_limit", cfg.retrieval.related.max_limit),
		("retrieval.related.excerpt_chars", cfg.retrieval.related.excerpt_chars),
		("recap.week_days", cfg.recap.week_days),
		("recap.month_days", cfg.recap.month_days),
		("recap.max_entries", cfg.recap.max_entries),
		("recap.excerpt_chars", cfg.recap.excerpt_chars),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	for (label, value) in
		[("recap.week_days", cfg.recap.week_days), ("recap.month_days", cfg.recap.month_days)]
	{
		if value > MAX_RECAP_DAYS {
			return Err(Error::Validation {
				message: format!("{label} must be at most {MAX_RECAP_DAYS}."),
			});
		}
	}

	if cfg.retrieval.related.default_limit > cfg.retrieval.related.max_limit {
		return Err(Error::Validation {
			message: "retrieval.related.default_limit must not exceed retrieval.related.max_limit."
				.to_string(),
		});
	}

	for (key, value) in &llm.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.llm.default_headers.{key} must be a string."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();
	cfg.providers.llm.api_base = cfg.providers.llm.api_base.trim_end_matches('/').to_string();

	if cfg.storage.backend == "memory" {
		cfg.storage.postgres = None;
	}
}
