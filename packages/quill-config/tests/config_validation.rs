use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use quill_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn table_mut<'a>(value: &'a mut Value, path: &[&str]) -> &'a mut toml::Table {
	let mut current = value.as_table_mut().expect("Template config must be a table.");

	for key in path {
		current = current
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	current
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("quill_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> quill_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = quill_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_error(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config should load.");

	assert_eq!(cfg.storage.backend, "postgres");
	assert_eq!(cfg.providers.llm.api_base, "https://api.openai.com");
	assert_eq!(cfg.retrieval.search.max_results, 10);
	assert_eq!(cfg.retrieval.related.coach_limit, 3);
}

#[test]
fn retrieval_and_recap_sections_default_when_missing() {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Template config must be a table.");

	root.remove("retrieval");
	root.remove("recap");

	let cfg = load_payload(render(&value)).expect("Config without optional sections should load.");

	assert_eq!(cfg.retrieval.search.min_similarity, 0.1);
	assert_eq!(cfg.retrieval.search.excerpt_chars, 200);
	assert_eq!(cfg.retrieval.related.min_similarity, 0.15);
	assert_eq!(cfg.retrieval.related.reflect_limit, 5);
	assert_eq!(cfg.retrieval.related.default_limit, 5);
	assert_eq!(cfg.retrieval.related.excerpt_chars, 300);
	assert_eq!(cfg.recap.week_days, 7);
	assert_eq!(cfg.recap.month_days, 30);
}

#[test]
fn memory_backend_ignores_postgres_section() {
	let mut value = sample_value();

	table_mut(&mut value, &["storage"]).insert("backend".to_string(), Value::from(" Memory "));

	let cfg = load_payload(render(&value)).expect("Memory backend config should load.");

	assert_eq!(cfg.storage.backend, "memory");
	assert!(cfg.storage.postgres.is_none());
}

#[test]
fn postgres_backend_requires_postgres_section() {
	let mut value = sample_value();

	table_mut(&mut value, &["storage"]).remove("postgres");

	expect_validation_error(
		render(&value),
		"storage.postgres is required when storage.backend is postgres.",
	);
}

#[test]
fn unknown_backend_is_rejected() {
	let mut value = sample_value();

	table_mut(&mut value, &["storage"]).insert("backend".to_string(), Value::from("sqlite"));

	expect_validation_error(render(&value), "storage.backend must be one of postgres or memory.");
}

#[test]
fn similarity_floor_must_be_in_range() {
	let mut value = sample_value();

	table_mut(&mut value, &["retrieval", "search"])
		.insert("min_similarity".to_string(), Value::Float(1.5));

	expect_validation_error(
		render(&value),
		"retrieval.search.min_similarity must be in the range -1.0-1.0.",
	);
}

#[test]
fn zero_caps_are_rejected() {
	let mut value = sample_value();

	table_mut(&mut value, &["retrieval", "related"])
		.insert("coach_limit".to_string(), Value::Integer(0));

	expect_validation_error(render(&value), "retrieval.related.coach_limit must be greater than zero.");
}

#[test]
fn recap_windows_are_bounded() {
	let mut value = sample_value();

	table_mut(&mut value, &["recap"]).insert("month_days".to_string(), Value::Integer(100_000));

	expect_validation_error(render(&value), "recap.month_days must be at most 3660.");
}

#[test]
fn default_limit_cannot_exceed_max_limit() {
	let mut value = sample_value();
	let related = table_mut(&mut value, &["retrieval", "related"]);

	related.insert("default_limit".to_string(), Value::Integer(30));
	related.insert("max_limit".to_string(), Value::Integer(20));

	expect_validation_error(
		render(&value),
		"retrieval.related.default_limit must not exceed retrieval.related.max_limit.",
	);
}

#[test]
fn api_key_must_be_non_empty() {
	let mut value = sample_value();

	table_mut(&mut value, &["providers", "llm"]).insert("api_key".to_string(), Value::from("  "));

	expect_validation_error(render(&value), "Provider llm api_key must be non-empty.");
}

#[test]
fn default_headers_must_be_strings() {
	let mut value = sample_value();

	table_mut(&mut value, &["providers", "llm", "default_headers"])
		.insert("X-Retries".to_string(), Value::Integer(3));

	expect_validation_error(render(&value), "providers.llm.default_headers.X-Retries must be a string.");
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("quill_config_test_does_not_exist.toml");

	let err = quill_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn malformed_toml_reports_parse_error() {
	let err = load_payload("[service\nhttp_bind = ".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }));
}
