//! Splitting and merging primitives used by the recursive splitter.

use std::collections::VecDeque;

/// Length in characters (Unicode scalar values), the unit chunk sizes are measured in.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` on `separator`, keeping each separator at the start of the piece
/// that follows it. An empty separator splits into single characters.
/// Empty pieces are dropped.
pub(crate) fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    pieces
}

/// Join pieces and trim surrounding whitespace; `None` when nothing is left.
fn join_trimmed(pieces: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = pieces.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Greedily merge pieces (each shorter than `chunk_size`) into chunks of at most
/// `chunk_size` characters. When a chunk is emitted, leading pieces are dropped
/// until at most `chunk_overlap` characters remain, and those carry over into
/// the next chunk.
pub(crate) fn merge_splits(splits: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for split in splits {
        let len = char_len(split);
        if total + len > chunk_size {
            if total > chunk_size {
                tracing::warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    total,
                    chunk_size
                );
            }
            if !current.is_empty() {
                if let Some(doc) = join_trimmed(&current) {
                    docs.push(doc);
                }
                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    match current.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }
        }
        current.push_back((split.as_str(), len));
        total += len;
    }

    if let Some(doc) = join_trimmed(&current) {
        docs.push(doc);
    }
    docs
}
