use std::sync::Arc;

use color_eyre::eyre;

use quill_service::JournalService;
use quill_storage::{EntryStore, db::Db, memory::MemoryStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<JournalService>,
}
impl AppState {
	/// Opens the configured store and wires the service with the HTTP completion provider.
	pub async fn new(config: quill_config::Config) -> color_eyre::Result<Self> {
		let store: Arc<dyn EntryStore> = match config.storage.backend.as_str() {
			"memory" => {
				tracing::warn!("Using the in-memory store. Entries are lost on shutdown.");

				Arc::new(MemoryStore::new())
			},
			_ => {
				let Some(postgres) = config.storage.postgres.as_ref() else {
					return Err(eyre::eyre!(
						"storage.postgres is required for the postgres backend."
					));
				};
				let db = Db::connect(postgres).await?;

				db.ensure_schema().await?;

				Arc::new(db)
			},
		};

		Ok(Self::from_service(JournalService::new(config, store)))
	}

	pub fn from_service(service: JournalService) -> Self {
		Self { service: Arc::new(service) }
	}
}
