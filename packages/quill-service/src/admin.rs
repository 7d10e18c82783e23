use serde::{Deserialize, Serialize};

use crate::{JournalService, Result};
use quill_retrieval::{EMBEDDING_VERSION, embed};

const REINDEX_BATCH: u32 = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
	pub batches: u32,
	pub reembedded: u64,
	/// Entries edited between the scan and the write. The edit already re-embedded them.
	pub skipped: u64,
}

impl JournalService {
	/// Recomputes embeddings for every entry whose vector is missing or from another version.
	pub async fn reindex(&self) -> Result<ReindexReport> {
		let mut report = ReindexReport::default();

		loop {
			let batch =
				self.store.entries_needing_embedding(EMBEDDING_VERSION, REINDEX_BATCH).await?;

			if batch.is_empty() {
				break;
			}

			report.batches += 1;

			let mut written = 0;

			for entry in batch {
				let embedding = embed(&entry.content);
				let stored = self
					.store
					.set_embedding(entry.entry_id, &entry.content, &embedding, EMBEDDING_VERSION)
					.await?;

				if stored {
					written += 1;
				} else {
					report.skipped += 1;
				}
			}

			report.reembedded += written;

			if written == 0 {
				break;
			}

			tracing::debug!(
				batch = report.batches,
				reembedded = report.reembedded,
				"Reindex batch done."
			);
		}

		tracing::info!(
			batches = report.batches,
			reembedded = report.reembedded,
			version = EMBEDDING_VERSION,
			"Reindex finished."
		);

		Ok(report)
	}
}
