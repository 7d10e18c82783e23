//! Self-contained semantic retrieval for journal entries.
//!
//! Text is embedded by hashing character trigrams into a fixed-size histogram, compared with
//! cosine similarity, and ranked by a floor-and-cap policy. Everything here is pure and
//! synchronous, so it can be called from any number of request handlers without coordination.

pub mod embedding;
pub mod excerpt;
pub mod policy;
pub mod similarity;

pub use embedding::{EMBEDDING_DIM, EMBEDDING_VERSION, embed};
pub use excerpt::{excerpt, truncate_with_ellipsis};
pub use policy::{RetrievalPolicy, Scored, cmp_f32_desc, rank, rank_text, select};
pub use similarity::cosine_similarity;
