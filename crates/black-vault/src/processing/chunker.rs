//! Recursive-boundary text chunker (§4.3).
//!
//! Unlike the teacher's `TextChunker`, this one never drops a tail shorter
//! than some minimum size — the chunk-coverage invariant (every byte of the
//! input appears in at least one chunk) has to hold unconditionally, so
//! there is no `min_chunk_size` floor here.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into spans of at most `chunk_size` characters, each
    /// consecutive pair overlapping by at most `chunk_overlap` characters.
    /// Empty input yields no chunks; everything else is covered by at least
    /// one span. Bounds are counted in Unicode scalar values (`char`), not
    /// bytes — `boundaries[i]` is the byte offset of the `i`-th char, so all
    /// the char-index arithmetic below converts to byte offsets only at the
    /// point of slicing.
    pub fn chunk(&self, text: &str) -> Vec<ChunkSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let boundaries = char_boundaries(text);
        let char_len = boundaries.len() - 1;

        if char_len <= self.chunk_size {
            return vec![ChunkSpan {
                index: 0,
                text: text.to_string(),
                start_offset: 0,
                end_offset: text.len(),
            }];
        }

        let mut chunks = Vec::new();
        let mut start_char = 0usize;
        let mut index = 0usize;

        while start_char < char_len {
            let raw_end_char = (start_char + self.chunk_size).min(char_len);
            let start_byte = boundaries[start_char];
            let max_end_byte = boundaries[raw_end_char];

            let actual_end_byte = if raw_end_char < char_len {
                let broken = self.find_break_point(text, &boundaries, start_char, raw_end_char);
                if broken > start_byte {
                    broken
                } else {
                    max_end_byte
                }
            } else {
                max_end_byte
            };

            chunks.push(ChunkSpan {
                index,
                text: text[start_byte..actual_end_byte].to_string(),
                start_offset: start_byte,
                end_offset: actual_end_byte,
            });
            index += 1;

            if actual_end_byte >= text.len() {
                break;
            }

            let actual_end_char = char_index_of(&boundaries, actual_end_byte);
            let span_len_chars = actual_end_char - start_char;
            let step_chars = if span_len_chars > self.chunk_overlap {
                span_len_chars - self.chunk_overlap
            } else {
                // The break point landed very close to `start` (e.g. a short
                // paragraph right at the window edge); advance by at least
                // one char so the loop always makes progress.
                1
            };

            start_char = (start_char + step_chars).min(char_len);
        }

        chunks
    }

    /// Look backwards from `preferred_end_char` for a natural break point,
    /// trying paragraph, sentence, line, then word boundaries in that order.
    /// Falls back to `preferred_end_char` itself (a hard char-boundary cut)
    /// if none of them appear within the search window. Returns a byte
    /// offset, since that's what slicing `text` needs.
    fn find_break_point(&self, text: &str, boundaries: &[usize], start_char: usize, preferred_end_char: usize) -> usize {
        const SEARCH_WINDOW_CHARS: usize = 200;

        let search_start_char = preferred_end_char.saturating_sub(SEARCH_WINDOW_CHARS).max(start_char);
        let search_start = boundaries[search_start_char];
        let safe_end = boundaries[preferred_end_char];

        if search_start >= safe_end {
            return safe_end;
        }

        let region = &text[search_start..safe_end];

        if let Some(pos) = region.rfind("\n\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = region.rfind(". ") {
            return search_start + pos + 2;
        }
        if let Some(pos) = region.rfind(".\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = region.rfind('\n') {
            return search_start + pos + 1;
        }
        if let Some(pos) = region.rfind(' ') {
            return search_start + pos + 1;
        }

        safe_end
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(1000, 150)
    }
}

/// Byte offset of every char boundary in `text`, plus `text.len()` as a
/// final sentinel — `boundaries[i]` is the byte offset of the `i`-th char,
/// and `boundaries.len() - 1` is the char count.
fn char_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    boundaries
}

/// Char index corresponding to a byte offset that is known to be a char
/// boundary (every offset this chunker produces is, by construction).
fn char_index_of(boundaries: &[usize], byte_offset: usize) -> usize {
    boundaries.binary_search(&byte_offset).unwrap_or_else(|i| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = Chunker::new(100, 10);
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn short_input_is_one_chunk() {
        let chunker = Chunker::new(100, 10);
        let chunks = chunker.chunk("hello world");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
    }

    #[test]
    fn long_input_is_fully_covered() {
        let chunker = Chunker::new(50, 10);
        let text = "a".repeat(10).repeat(30); // 300 chars of 'a', no break points
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks.last().unwrap().end_offset, text.len());
        for pair in chunks.windows(2) {
            assert!(pair[1].start_offset <= pair[0].end_offset, "gap between chunks");
            assert!(
                pair[0].end_offset - pair[1].start_offset <= 10,
                "overlap exceeds configured bound"
            );
        }
    }

    #[test]
    fn chunk_size_counts_chars_not_bytes() {
        // "café" is 4 chars but 5 bytes (é is 2 bytes in UTF-8); with
        // chunk_size=8 a byte-length chunker would split mid-repetition
        // differently than a char-count one.
        let chunker = Chunker::new(8, 0);
        let text = "café".repeat(10);
        let chunks = chunker.chunk(&text);
        for c in &chunks {
            assert!(c.text.chars().count() <= 8, "chunk exceeded char budget: {:?}", c.text);
        }
        assert_eq!(chunks.iter().map(|c| c.text.chars().count()).sum::<usize>(), text.chars().count());
    }

    #[test]
    fn respects_utf8_char_boundaries() {
        let chunker = Chunker::new(10, 2);
        let text = "héllo wörld this is a tëst of unicode chunking across boundaries";
        let chunks = chunker.chunk(text);
        for c in &chunks {
            assert!(text.is_char_boundary(c.start_offset));
            assert!(text.is_char_boundary(c.end_offset));
        }
    }

    #[test]
    fn prefers_paragraph_boundary() {
        let chunker = Chunker::new(40, 5);
        let text = format!("{}\n\n{}", "x".repeat(35), "y".repeat(35));
        let chunks = chunker.chunk(&text);
        assert!(chunks[0].text.ends_with("\n\n") || chunks[0].text.trim_end() == "x".repeat(35));
    }
}
