use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{Entry, EntryAnalysisFields},
};

const ENTRY_COLUMNS: &str = "\
entry_id, user_id, title, content, mood, tags, summary, created_at, updated_at, embedding, \
embedding_version";

pub async fn insert_entry(db: &Db, entry: &Entry) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO journal_entries (
	entry_id,
	user_id,
	title,
	content,
	mood,
	tags,
	summary,
	created_at,
	updated_at,
	embedding,
	embedding_version
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)",
	)
	.bind(entry.entry_id)
	.bind(entry.user_id.as_str())
	.bind(entry.title.as_str())
	.bind(entry.content.as_str())
	.bind(entry.mood.as_deref())
	.bind(&entry.tags)
	.bind(entry.summary.as_deref())
	.bind(entry.created_at)
	.bind(entry.updated_at)
	.bind(entry.embedding.as_ref())
	.bind(entry.embedding_version.as_deref())
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn update_entry(db: &Db, entry: &Entry) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE journal_entries
SET
	title = $1,
	content = $2,
	mood = $3,
	tags = $4,
	summary = $5,
	updated_at = $6,
	embedding = $7,
	embedding_version = $8
WHERE entry_id = $9 AND user_id = $10",
	)
	.bind(entry.title.as_str())
	.bind(entry.content.as_str())
	.bind(entry.mood.as_deref())
	.bind(&entry.tags)
	.bind(entry.summary.as_deref())
	.bind(entry.updated_at)
	.bind(entry.embedding.as_ref())
	.bind(entry.embedding_version.as_deref())
	.bind(entry.entry_id)
	.bind(entry.user_id.as_str())
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Entry {} does not exist.", entry.entry_id)));
	}

	Ok(())
}

pub async fn set_analysis(
	db: &Db,
	user_id: &str,
	entry_id: Uuid,
	analysis: &EntryAnalysisFields,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE journal_entries
SET mood = $1, tags = $2, summary = $3, updated_at = $4
WHERE entry_id = $5 AND user_id = $6",
	)
	.bind(analysis.mood.as_deref())
	.bind(&analysis.tags)
	.bind(analysis.summary.as_deref())
	.bind(analysis.updated_at)
	.bind(entry_id)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Entry {entry_id} does not exist.")));
	}

	Ok(())
}

/// Compare-and-set on `content`: a row edited since it was read is left alone.
pub async fn set_embedding(
	db: &Db,
	entry_id: Uuid,
	expected_content: &str,
	embedding: &[f32],
	embedding_version: &str,
) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE journal_entries
SET embedding = $1, embedding_version = $2
WHERE entry_id = $3 AND content = $4",
	)
	.bind(embedding)
	.bind(embedding_version)
	.bind(entry_id)
	.bind(expected_content)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn get_entry(db: &Db, user_id: &str, entry_id: Uuid) -> Result<Option<Entry>> {
	let sql =
		format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE entry_id = $1 AND user_id = $2");
	let entry = sqlx::query_as::<_, Entry>(&sql)
		.bind(entry_id)
		.bind(user_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(entry)
}

pub async fn list_entries(db: &Db, user_id: &str, limit: u32) -> Result<Vec<Entry>> {
	let sql = format!(
		"\
SELECT {ENTRY_COLUMNS}
FROM journal_entries
WHERE user_id = $1
ORDER BY created_at DESC, entry_id DESC
LIMIT $2"
	);
	let entries = sqlx::query_as::<_, Entry>(&sql)
		.bind(user_id)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(entries)
}

pub async fn delete_entry(db: &Db, user_id: &str, entry_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM journal_entries WHERE entry_id = $1 AND user_id = $2")
		.bind(entry_id)
		.bind(user_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Owner-scoped bulk read of every entry carrying a vector of `embedding_version`, in creation
/// order.
pub async fn candidates_with_embeddings(
	db: &Db,
	user_id: &str,
	embedding_version: &str,
) -> Result<Vec<Entry>> {
	let sql = format!(
		"\
SELECT {ENTRY_COLUMNS}
FROM journal_entries
WHERE user_id = $1
	AND embedding IS NOT NULL
	AND embedding_version = $2
ORDER BY created_at ASC, entry_id ASC"
	);
	let entries = sqlx::query_as::<_, Entry>(&sql)
		.bind(user_id)
		.bind(embedding_version)
		.fetch_all(&db.pool)
		.await?;

	Ok(entries)
}

/// The latest `limit` entries created in `[start, end)`, returned oldest first.
pub async fn entries_between(
	db: &Db,
	user_id: &str,
	start: OffsetDateTime,
	end: OffsetDateTime,
	limit: u32,
) -> Result<Vec<Entry>> {
	if start >= end {
		return Err(Error::InvalidArgument("Window start must precede its end.".to_string()));
	}

	let sql = format!(
		"\
SELECT {ENTRY_COLUMNS}
FROM journal_entries
WHERE user_id = $1
	AND created_at >= $2
	AND created_at < $3
ORDER BY created_at DESC, entry_id DESC
LIMIT $4"
	);
	let mut entries = sqlx::query_as::<_, Entry>(&sql)
		.bind(user_id)
		.bind(start)
		.bind(end)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	entries.reverse();

	Ok(entries)
}

pub async fn entries_needing_embedding(
	db: &Db,
	embedding_version: &str,
	limit: u32,
) -> Result<Vec<Entry>> {
	let sql = format!(
		"\
SELECT {ENTRY_COLUMNS}
FROM journal_entries
WHERE embedding IS NULL
	OR embedding_version IS DISTINCT FROM $1
ORDER BY created_at ASC, entry_id ASC
LIMIT $2"
	);
	let entries = sqlx::query_as::<_, Entry>(&sql)
		.bind(embedding_version)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(entries)
}
