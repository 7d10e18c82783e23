use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use quill_config::Postgres;
use quill_storage::{
	EntryStore,
	db::Db,
	models::{Entry, EntryAnalysisFields},
};
use quill_testkit::TestDatabase;

fn entry(user_id: &str, created_at: OffsetDateTime, embedding: Option<Vec<f32>>) -> Entry {
	let embedding_version = embedding.as_ref().map(|_| "trigram-384-v1".to_string());

	Entry {
		entry_id: Uuid::new_v4(),
		user_id: user_id.to_string(),
		title: "Morning".to_string(),
		content: "Coffee on the balcony.".to_string(),
		mood: None,
		tags: vec!["morning".to_string()],
		summary: None,
		created_at,
		updated_at: created_at,
		embedding,
		embedding_version,
	}
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QUILL_PG_DSN to run."]
async fn entry_round_trip_preserves_embedding() {
	let Some(base_dsn) = quill_testkit::env_dsn() else {
		eprintln!("Skipping db_smoke; set QUILL_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("Valid nanosecond.");
	let stored = entry("alice", now, Some(vec![0.6, 0.8, 0.0]));

	db.insert_entry(&stored).await.expect("Failed to insert entry.");

	let fetched = db
		.get_entry("alice", stored.entry_id)
		.await
		.expect("Failed to fetch entry.")
		.expect("Entry should exist.");

	assert_eq!(fetched, stored);
	assert!(db.get_entry("bob", stored.entry_id).await.expect("Failed to fetch.").is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QUILL_PG_DSN to run."]
async fn candidate_read_skips_entries_without_embeddings() {
	let Some(base_dsn) = quill_testkit::env_dsn() else {
		eprintln!("Skipping db_smoke; set QUILL_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let base = OffsetDateTime::now_utc().replace_nanosecond(0).expect("Valid nanosecond.");
	let first = entry("alice", base, Some(vec![1.0, 0.0]));
	let missing = entry("alice", base + Duration::minutes(1), None);
	let second = entry("alice", base + Duration::minutes(2), Some(vec![0.0, 1.0]));
	let foreign = entry("bob", base, Some(vec![1.0, 0.0]));

	for e in [&first, &missing, &second, &foreign] {
		db.insert_entry(e).await.expect("Failed to insert entry.");
	}

	let candidates = db
		.candidates_with_embeddings("alice", "trigram-384-v1")
		.await
		.expect("Failed to read candidates.");
	let ids: Vec<Uuid> = candidates.iter().map(|e| e.entry_id).collect();

	assert_eq!(ids, vec![first.entry_id, second.entry_id]);

	let pending =
		db.entries_needing_embedding("trigram-384-v1", 10).await.expect("Failed to scan.");

	assert_eq!(pending.len(), 1);
	assert_eq!(pending[0].entry_id, missing.entry_id);

	assert!(db.delete_entry("alice", missing.entry_id).await.expect("Failed to delete."));
	assert!(!db.delete_entry("alice", missing.entry_id).await.expect("Failed to delete."));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QUILL_PG_DSN to run."]
async fn derived_field_writes_leave_edits_alone() {
	let Some(base_dsn) = quill_testkit::env_dsn() else {
		eprintln!("Skipping db_smoke; set QUILL_PG_DSN to run this test.");

		return;
	};

	quill_testkit::with_test_db(&base_dsn, |test_db| {
		let name = test_db.name().to_string();
		let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };

		async move {
			assert!(name.starts_with("quill_test_"));
			assert!(cfg.dsn.contains(&name));

			let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

			db.ensure_schema().await.expect("Failed to ensure schema.");

			let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("Valid nanosecond.");
			let stored = entry("alice", now, None);

			db.insert_entry(&stored).await.expect("Failed to insert entry.");

			let stale = db
				.set_embedding(stored.entry_id, "Older draft.", &[1.0, 0.0], "trigram-384-v1")
				.await
				.expect("Failed to write embedding.");
			let fresh = db
				.set_embedding(stored.entry_id, &stored.content, &[0.0, 1.0], "trigram-384-v1")
				.await
				.expect("Failed to write embedding.");

			assert!(!stale);
			assert!(fresh);

			let analysis = EntryAnalysisFields {
				mood: Some("calm".to_string()),
				tags: vec!["coffee".to_string()],
				summary: Some("A quiet start.".to_string()),
				updated_at: now + Duration::minutes(1),
			};

			db.set_analysis("alice", stored.entry_id, &analysis)
				.await
				.expect("Failed to write analysis.");

			let fetched = db
				.get_entry("alice", stored.entry_id)
				.await
				.expect("Failed to fetch entry.")
				.expect("Entry should exist.");

			assert_eq!(fetched.content, stored.content);
			assert_eq!(fetched.mood.as_deref(), Some("calm"));
			assert_eq!(fetched.embedding, Some(vec![0.0, 1.0]));
			assert!(db.set_analysis("bob", stored.entry_id, &analysis).await.is_err());

			Ok(())
		}
	})
	.await
	.expect("Failed to run against a test database.");
}
