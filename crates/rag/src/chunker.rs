//! Text chunking with configurable size and overlap.
//!
//! Pages are split independently; a chunk never mixes text from two
//! pages. Within a page, split points prefer the largest separator that
//! fits the size window: paragraph break, then line break, then space,
//! then a hard character cut. Consecutive chunks cut from the same page
//! share exactly `chunk_overlap` characters of boundary context.
//!
//! All sizes are counted in characters, not bytes. Splitting is purely
//! functional and deterministic.

use crate::types::{Chunk, Page};

/// Split extracted pages into chunks.
///
/// Callers must ensure `chunk_overlap < chunk_size` (see
/// `PipelineConfig::validate`); an out-of-range overlap is clamped so the
/// window always advances. An empty page yields no chunks; a page that
/// fits within `chunk_size` yields exactly one.
pub fn split_pages(pages: &[Page], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for page in pages {
        for text in split_text(&page.text, chunk_size, chunk_overlap) {
            chunks.push(Chunk {
                text,
                document_id: page.document_id.clone(),
                page_index: page.page_index,
            });
        }
    }

    tracing::debug!(
        "Chunked {} pages into {} chunks (size: {}, overlap: {})",
        pages.len(),
        chunks.len(),
        chunk_size,
        chunk_overlap
    );

    chunks
}

/// Split one text into size-bounded, overlapping pieces.
///
/// Removing the first `chunk_overlap` characters of every piece after the
/// first and concatenating reconstructs the input exactly.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total <= chunk_size {
        return vec![text.to_string()];
    }

    // Clamp so every window advances by at least one character
    let overlap = chunk_overlap.min(chunk_size - 1);

    let mut pieces = Vec::new();
    let mut start = 0usize;

    loop {
        let limit = start + chunk_size;
        if limit >= total {
            pieces.push(chars[start..total].iter().collect());
            break;
        }

        // The cut must leave at least one new character beyond the overlap
        let cut = find_cut(&chars, start + overlap + 1, limit);
        pieces.push(chars[start..cut].iter().collect());
        start = cut - overlap;
    }

    pieces
}

/// Find the end of the current chunk: the latest separator boundary in
/// `[min_cut, limit]`, preferring paragraph breaks over line breaks over
/// spaces. Falls back to a hard cut at `limit`.
fn find_cut(chars: &[char], min_cut: usize, limit: usize) -> usize {
    let separators: [&[char]; 3] = [&['\n', '\n'], &['\n'], &[' ']];

    for sep in separators {
        let mut cut = limit;
        while cut >= min_cut {
            if cut >= sep.len() && chars[cut - sep.len()..cut] == *sep {
                return cut;
            }
            cut -= 1;
        }
    }

    limit
}
