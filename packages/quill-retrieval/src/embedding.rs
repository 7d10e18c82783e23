/// Number of hash buckets in every embedding.
pub const EMBEDDING_DIM: usize = 384;
/// Tag stored next to persisted vectors. Bump it whenever normalization, hashing, or the
/// dimension changes; vectors carrying another tag are never compared against fresh ones.
pub const EMBEDDING_VERSION: &str = "trigram-384-v1";

const TRIGRAM_LEN: usize = 3;
const HASH_MULTIPLIER: i32 = 31;

/// Embeds `text` as an L2-normalized bag of character trigrams.
///
/// The result always has [`EMBEDDING_DIM`] components. Input that keeps fewer than three
/// characters after normalization yields the zero vector.
pub fn embed(text: &str) -> Vec<f32> {
	let normalized = normalize_text(text);
	let mut vec = vec![0.0_f32; EMBEDDING_DIM];

	for trigram in trigrams(&normalized) {
		vec[trigram_bucket(trigram)] += 1.0;
	}

	let norm = vec.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in &mut vec {
			*value /= norm;
		}
	}

	vec
}

/// Lowercases `text`, keeps only ASCII letters, digits, and the space character, then trims
/// surrounding spaces.
///
/// Other whitespace, punctuation, diacritics, and non-Latin scripts are dropped outright, so they
/// never contribute trigrams.
pub fn normalize_text(text: &str) -> String {
	let kept: String = text
		.to_lowercase()
		.chars()
		.filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == ' ')
		.collect();

	kept.trim_matches(' ').to_string()
}

/// Overlapping three-byte windows of an already normalized string.
pub fn trigrams(normalized: &str) -> impl Iterator<Item = &str> {
	// Normalized text is pure ASCII, so byte windows are char windows.
	let count = normalized.len().saturating_sub(TRIGRAM_LEN - 1);

	(0..count).map(move |start| &normalized[start..start + TRIGRAM_LEN])
}

/// Polynomial hash of a trigram folded into a bucket index.
pub fn trigram_bucket(trigram: &str) -> usize {
	let hash = trigram
		.bytes()
		.fold(0_i32, |acc, byte| acc.wrapping_mul(HASH_MULTIPLIER).wrapping_add(i32::from(byte)));

	(hash.unsigned_abs() as usize) % EMBEDDING_DIM
}

#[cfg(test)]
mod tests {
	use super::*;

	fn l2_norm(vec: &[f32]) -> f32 {
		vec.iter().map(|value| value * value).sum::<f32>().sqrt()
	}

	#[test]
	fn normalization_drops_everything_but_ascii_alphanumerics_and_spaces() {
		assert_eq!(normalize_text("Héllo, World!\tOK 42"), "hllo worldok 42");
		assert_eq!(normalize_text("日本語 🎉"), "");
		assert_eq!(normalize_text("  spaced out  "), "spaced out");
	}

	#[test]
	fn trigrams_slide_one_character_at_a_time() {
		let found: Vec<&str> = trigrams("abcde").collect();

		assert_eq!(found, vec!["abc", "bcd", "cde"]);
		assert_eq!(trigrams("ab").count(), 0);
		assert_eq!(trigrams("").count(), 0);
	}

	#[test]
	fn bucket_is_stable_and_in_range() {
		// 97 * 31^2 + 98 * 31 + 99 = 96354; 96354 % 384 = 354.
		assert_eq!(trigram_bucket("abc"), 354);
		assert_eq!(trigram_bucket("the"), trigram_bucket("the"));

		for trigram in ["zzz", "999", "   ", "a b"] {
			assert!(trigram_bucket(trigram) < EMBEDDING_DIM);
		}
	}

	#[test]
	fn embedding_is_deterministic() {
		let text = "Walked to the harbor and watched the ferries.";

		assert_eq!(embed(text), embed(text));
	}

	#[test]
	fn embedding_is_unit_length() {
		for text in ["abc", "debugging a database issue", "A long entry about a quiet morning."] {
			let norm = l2_norm(&embed(text));

			assert!((norm - 1.0).abs() < 1e-5, "norm for {text:?} was {norm}");
		}
	}

	#[test]
	fn degenerate_input_embeds_to_zero_vector() {
		for text in ["", "   ", "!!", "ab", "😀😀😀😀"] {
			let vec = embed(text);

			assert_eq!(vec.len(), EMBEDDING_DIM);
			assert!(vec.iter().all(|value| *value == 0.0), "{text:?} was not zero");
		}
	}

	#[test]
	fn repeated_trigram_concentrates_into_one_bucket() {
		let vec = embed("aaaaaa");
		let bucket = trigram_bucket("aaa");

		assert!((vec[bucket] - 1.0).abs() < 1e-6);
		assert_eq!(vec.iter().filter(|value| **value != 0.0).count(), 1);
	}

	#[test]
	fn case_and_punctuation_do_not_change_the_embedding() {
		assert_eq!(embed("Fixed the BUG!"), embed("fixed the bug"));
	}
}
