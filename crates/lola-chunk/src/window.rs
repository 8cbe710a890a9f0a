//! Sliding-window text chunker.
//!
//! Normalizes whitespace once, then walks a fixed-size character window
//! over the text with a configurable overlap between consecutive windows.

use lola_core::ChunkOptions;
use tracing::debug;

/// Split text into overlapping fixed-size chunks.
///
/// The text is normalized before windowing: CRLF becomes LF, tabs and
/// non-breaking spaces become plain spaces, and runs of spaces (plus
/// form-feeds and vertical tabs) collapse to a single space. Newlines
/// survive, so paragraph breaks are preserved.
///
/// Sizes are measured in characters. Each emitted chunk is trimmed of
/// leading and trailing whitespace; chunks that trim to nothing are
/// dropped. The last chunk always ends at the end of the text.
///
/// Out-of-range options are clamped rather than rejected:
/// a negative `overlap` is treated as 0, and an `overlap >= size` is
/// replaced with `size / 4` so the window always advances. A
/// non-positive `size` disables chunking entirely and returns the raw
/// input as a single chunk. The function is total: it never errors.
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    if options.size <= 0 {
        // Direct passthrough, not part of the windowing loop.
        return vec![text.to_string()];
    }

    if text.is_empty() {
        return Vec::new();
    }

    let size = options.size as usize;
    let overlap = if options.overlap < 0 {
        0
    } else if options.overlap >= options.size {
        (options.size / 4) as usize
    } else {
        options.overlap as usize
    };

    let normalized = normalize(text);
    let chars: Vec<char> = normalized.chars().collect();
    let len = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let end = (start + size).min(len);

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end == len {
            break;
        }

        // overlap < size, so the cursor always moves forward.
        start = end - overlap;
    }

    debug!(chunks = chunks.len(), chars = len, "chunked text");

    chunks
}

/// Normalize whitespace before windowing.
fn normalize(text: &str) -> String {
    let replaced = text
        .replace("\r\n", "\n")
        .replace('\t', " ")
        .replace('\u{00A0}', " ");

    // Collapse runs of spaces, form-feeds, and vertical tabs into a
    // single space. Newlines are kept as-is.
    let mut out = String::with_capacity(replaced.len());
    let mut in_space_run = false;
    for c in replaced.chars() {
        match c {
            ' ' | '\u{000C}' | '\u{000B}' => {
                if !in_space_run {
                    out.push(' ');
                }
                in_space_run = true;
            }
            _ => {
                in_space_run = false;
                out.push(c);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(size: i64, overlap: i64) -> ChunkOptions {
        ChunkOptions { size, overlap }
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", &ChunkOptions::default()).is_empty());
        assert!(chunk_text("", &opts(4, 2)).is_empty());
    }

    #[test]
    fn test_non_positive_size_passthrough() {
        // Raw input, unnormalized and unfiltered
        assert_eq!(chunk_text("hello world", &opts(0, 200)), vec!["hello world"]);
        assert_eq!(chunk_text("a\tb", &opts(-5, 0)), vec!["a\tb"]);
        assert_eq!(chunk_text("   ", &opts(0, 0)), vec!["   "]);
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("hello", &opts(1200, 200)), vec!["hello"]);
    }

    #[test]
    fn test_exact_windowing_no_overlap() {
        let text = "a".repeat(10);
        let chunks = chunk_text(&text, &opts(4, 0));
        assert_eq!(chunks, vec!["aaaa", "aaaa", "aa"]);
    }

    #[test]
    fn test_overlap_correctness() {
        let chunks = chunk_text("0123456789", &opts(4, 2));
        assert_eq!(chunks, vec!["0123", "2345", "4567", "6789"]);
        // Last chunk ends exactly at the end of the input
        assert!(chunks.last().unwrap().ends_with('9'));
    }

    #[test]
    fn test_overlap_clamped_to_quarter_size() {
        let text = "the quick brown fox jumps over the lazy dog";
        // overlap >= size falls back to size / 4
        assert_eq!(chunk_text(text, &opts(10, 10)), chunk_text(text, &opts(10, 2)));
        assert_eq!(chunk_text(text, &opts(10, 99)), chunk_text(text, &opts(10, 2)));
    }

    #[test]
    fn test_negative_overlap_clamped_to_zero() {
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(chunk_text(text, &opts(10, -5)), chunk_text(text, &opts(10, 0)));
    }

    #[test]
    fn test_normalization() {
        let chunks = chunk_text("a\r\nb\tc\u{00A0}d", &opts(1200, 200));
        assert_eq!(chunks, vec!["a\nb c d"]);
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(chunk_text("a    b", &opts(1200, 200)), vec!["a b"]);
        // Form feed and vertical tab collapse too, newlines survive
        assert_eq!(
            chunk_text("a \u{000C} \u{000B} b\n\nc", &opts(1200, 200)),
            vec!["a b\n\nc"]
        );
    }

    #[test]
    fn test_all_whitespace_window_dropped() {
        // Newlines are not collapsed, so a window can land entirely on
        // whitespace and must be dropped from the output.
        let text = format!("{}{}{}", "a".repeat(4), "\n".repeat(4), "b".repeat(4));
        let chunks = chunk_text(&text, &opts(4, 0));
        assert_eq!(chunks, vec!["aaaa", "bbbb"]);
        // Output is shorter than the naive window count of 3
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_rechunking_emitted_chunk_is_idempotent() {
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs.";
        let options = opts(30, 10);
        for chunk in chunk_text(text, &options) {
            // Every emitted chunk fits in one window, so re-chunking
            // returns it unchanged.
            assert_eq!(chunk_text(&chunk, &options), vec![chunk.clone()]);
        }
    }

    #[test]
    fn test_totality_over_degenerate_options() {
        let text = "some input text";
        for size in [-10, -1, 0, 1, 2, 7, 1200] {
            for overlap in [-10, -1, 0, 1, 6, 7, 200, 5000] {
                // Must return without panicking for every combination
                let _ = chunk_text(text, &opts(size, overlap));
            }
        }
    }

    #[test]
    fn test_forward_progress_with_size_one() {
        // size 1 forces overlap to 0 (1 / 4), one chunk per character
        let chunks = chunk_text("abc", &opts(1, 5));
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_no_overlap_partitions_text() {
        let text = "abcdefghij";
        let chunks = chunk_text(text, &opts(3, 0));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_unicode_counted_by_chars() {
        // Multi-byte characters count as one each
        let text = "héllo wörld";
        let chunks = chunk_text(text, &opts(6, 0));
        assert_eq!(chunks, vec!["héllo", "wörld"]);
    }
}
