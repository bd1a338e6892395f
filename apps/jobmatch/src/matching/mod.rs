//! Analysis stage: embedding pre-filter → LLM scoring → shortlist.

pub mod embedding_filter;
pub mod pipeline;
pub mod prompts;
pub mod scorer;
pub mod shortlist;

/// First `max` chars of `text`, with `...` appended when something was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}
