/// Cosine similarity between two vectors.
///
/// Returns `0.0` when the lengths differ or when either vector has zero norm, so a zero vector
/// is dissimilar to everything, itself included. Accumulation happens in `f64`; the result is
/// symmetric in its arguments.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() {
		return 0.0;
	}

	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b) {
		let (x, y) = (f64::from(*x), f64::from(*y));

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	(dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::embedding::{EMBEDDING_DIM, embed};

	fn one_hot(index: usize) -> Vec<f32> {
		let mut vec = vec![0.0; EMBEDDING_DIM];

		vec[index] = 1.0;

		vec
	}

	#[test]
	fn identical_vectors_score_one() {
		let vec = vec![0.3, -1.2, 4.0, 0.0];

		assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 1e-6);

		let embedded = embed("morning pages by the window");

		assert!((cosine_similarity(&embedded, &embedded) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn similarity_is_symmetric() {
		let a = embed("debugging a database issue");
		let b = embed("fixed a tricky database bug");

		assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
		assert_eq!(
			cosine_similarity(&[1.0, -2.0, 0.5], &[0.25, 3.0, -1.0]),
			cosine_similarity(&[0.25, 3.0, -1.0], &[1.0, -2.0, 0.5])
		);
	}

	#[test]
	fn disjoint_one_hot_vectors_are_orthogonal() {
		assert!(cosine_similarity(&one_hot(3), &one_hot(200)).abs() < 1e-9);
	}

	#[test]
	fn opposite_vectors_score_minus_one() {
		assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
	}

	#[test]
	fn dimension_mismatch_scores_zero() {
		assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
		assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
	}

	#[test]
	fn zero_vector_scores_zero_even_against_itself() {
		let zero = embed("");

		assert_eq!(cosine_similarity(&zero, &zero), 0.0);
		assert_eq!(cosine_similarity(&zero, &embed("anything at all")), 0.0);
		assert_eq!(cosine_similarity(&[], &[]), 0.0);
	}

	#[test]
	fn magnitude_does_not_matter() {
		let score = cosine_similarity(&[1.0, 1.0, 0.0], &[10.0, 10.0, 0.0]);

		assert!((score - 1.0).abs() < 1e-6);
	}
}
