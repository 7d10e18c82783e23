pub mod admin;
pub mod analysis;
pub mod coach;
pub mod entries;
pub mod recap;
pub mod reflect;
pub mod related;
pub mod search;

mod error;
mod prompts;

pub use admin::ReindexReport;
pub use analysis::{AnalyzeEntryRequest, EntryAnalysis};
pub use coach::{CoachRequest, CoachResponse, CoachStream};
pub use entries::{
	CreateEntryRequest, DeleteEntryRequest, DeleteEntryResponse, EntryView, GetEntryRequest,
	ListEntriesRequest, ListEntriesResponse, UpdateEntryRequest,
};
pub use error::{Error, Result};
pub use quill_storage::BoxFuture;
pub use recap::{RecapPeriod, RecapRequest, RecapResponse};
pub use reflect::{ReflectRequest, ReflectResponse};
pub use related::{FindRelatedRequest, FindRelatedResponse, RelatedEntry};
pub use search::{SearchItem, SearchRequest, SearchResponse};

use std::sync::Arc;

use serde_json::Value;

use quill_config::{Config, LlmProviderConfig};
use quill_providers::completion::{self, TokenStream};
use quill_storage::EntryStore;

/// Chat completion backend used by analysis, reflection, coaching and recaps.
pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, quill_providers::Result<String>>;

	fn complete_stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, quill_providers::Result<TokenStream>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
		Self { completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { completion: Arc::new(DefaultProviders) }
	}
}

pub struct JournalService {
	pub cfg: Config,
	pub store: Arc<dyn EntryStore>,
	pub providers: Providers,
}
impl JournalService {
	pub fn new(cfg: Config, store: Arc<dyn EntryStore>) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn EntryStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	pub(crate) async fn complete(&self, messages: &[Value]) -> Result<String> {
		let text = self.providers.completion.complete(&self.cfg.providers.llm, messages).await?;

		Ok(text)
	}
}

struct DefaultProviders;
impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, quill_providers::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}

	fn complete_stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, quill_providers::Result<TokenStream>> {
		Box::pin(completion::complete_stream(cfg, messages))
	}
}

pub(crate) fn require_user_id(user_id: &str) -> Result<&str> {
	let user_id = user_id.trim();

	if user_id.is_empty() {
		return Err(Error::InvalidRequest { message: "user_id is required.".to_string() });
	}

	Ok(user_id)
}
