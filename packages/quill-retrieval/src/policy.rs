use std::cmp::Ordering;

use crate::{embedding::embed, similarity::cosine_similarity};

/// Similarity floor and result cap applied after scoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalPolicy {
	/// Candidates must score strictly above this value.
	pub min_similarity: f32,
	pub limit: usize,
}
impl RetrievalPolicy {
	pub fn new(min_similarity: f32, limit: usize) -> Self {
		Self { min_similarity, limit }
	}
}

/// A candidate paired with its similarity to the query.
#[derive(Clone, Debug, PartialEq)]
pub struct Scored<T> {
	pub item: T,
	pub similarity: f32,
}

/// Scores every candidate against `query` and applies `policy`.
///
/// `embedding_of` returns `None` for candidates without a usable embedding; those are skipped
/// rather than scored against a zero vector.
pub fn rank<T, I, F>(
	query: &[f32],
	candidates: I,
	embedding_of: F,
	policy: &RetrievalPolicy,
) -> Vec<Scored<T>>
where
	I: IntoIterator<Item = T>,
	F: Fn(&T) -> Option<&[f32]>,
{
	let scored = candidates
		.into_iter()
		.filter_map(|item| {
			let similarity = cosine_similarity(query, embedding_of(&item)?);

			Some(Scored { item, similarity })
		})
		.collect();

	select(scored, policy)
}

/// Embeds `query_text` and ranks `candidates` against it.
pub fn rank_text<T, I, F>(
	query_text: &str,
	candidates: I,
	embedding_of: F,
	policy: &RetrievalPolicy,
) -> Vec<Scored<T>>
where
	I: IntoIterator<Item = T>,
	F: Fn(&T) -> Option<&[f32]>,
{
	rank(&embed(query_text), candidates, embedding_of, policy)
}

/// Drops scores at or below the floor, sorts the rest descending, and caps the list.
///
/// The sort is stable: equal scores keep their enumeration order.
pub fn select<T>(mut scored: Vec<Scored<T>>, policy: &RetrievalPolicy) -> Vec<Scored<T>> {
	scored.retain(|candidate| candidate.similarity > policy.min_similarity);
	scored.sort_by(|a, b| cmp_f32_desc(a.similarity, b.similarity));
	scored.truncate(policy.limit);

	scored
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
