use unicode_segmentation::UnicodeSegmentation;

const ELLIPSIS: &str = "...";

/// First `max_chars` grapheme clusters of `text`, without any marker.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
	match text.grapheme_indices(true).nth(max_chars) {
		Some((end, _)) => &text[..end],
		None => text,
	}
}

/// First `max_chars` grapheme clusters of `text`, followed by `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
	let head = excerpt(text, max_chars);

	if head.len() == text.len() {
		return text.to_string();
	}

	let mut out = String::with_capacity(head.len() + ELLIPSIS.len());

	out.push_str(head);
	out.push_str(ELLIPSIS);

	out
}
