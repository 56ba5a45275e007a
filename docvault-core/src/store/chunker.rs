//! Text chunking for indexing.
//!
//! Long documents are split into overlapping windows so that embeddings stay
//! focused and phrases spanning a window boundary remain retrievable from at
//! least one chunk.

/// Split text into overlapping chunks of at most `chunk_size` bytes.
///
/// Window edges are snapped to `char` boundaries, so multi-byte characters
/// are never split. Consecutive windows share `chunk_overlap` bytes. Empty
/// or whitespace-only input yields no chunks; input no longer than
/// `chunk_size` yields exactly one.
pub(crate) fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    // The window always advances, even under a degenerate overlap config.
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }

        if end > start {
            chunks.push(text[start..end].to_string());
        }

        if end == text.len() {
            break;
        }

        start += step;
        while start < text.len() && !text.is_char_boundary(start) {
            start += 1;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("Hello", 10, 2);
        assert_eq!(chunks, vec!["Hello".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(chunk_text("", 10, 2).is_empty());
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(chunk_text("   \n\t  ", 10, 2).is_empty());
    }

    #[test]
    fn windows_overlap() {
        let chunks = chunk_text("0123456789ABCDEF", 10, 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "0123456789");
        assert_eq!(chunks[1], "89ABCDEF");
    }

    #[test]
    fn long_text_covers_everything() {
        let word = "retrieval ";
        let text = word.repeat(200);
        let chunks = chunk_text(&text, 64, 16);
        assert!(chunks.len() > 1);
        // First chunk starts at the front, last chunk reaches the end.
        assert!(text.starts_with(&chunks[0]));
        assert!(text.ends_with(chunks.last().unwrap().as_str()));
    }

    #[test]
    fn respects_char_boundaries() {
        // Multi-byte characters must never be split mid-sequence.
        let text = "héllö wörld ünïcödé çöntent".repeat(4);
        let chunks = chunk_text(&text, 10, 3);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            // Slicing succeeded, so each chunk is valid UTF-8 by construction;
            // also check we didn't lose the accented characters.
            assert!(chunk.chars().count() > 0);
        }
    }

    #[test]
    fn degenerate_overlap_still_terminates() {
        let chunks = chunk_text("abcdefghij", 4, 4);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.len() <= 4));
    }
}
