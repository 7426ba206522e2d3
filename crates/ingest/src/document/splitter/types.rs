//! Splitter output and error types.

use serde::Serialize;
use thiserror::Error;

/// Separators tried in order: paragraph, line, word, character.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitterError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk overlap ({overlap}) is larger than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// A chunk of page text used as a retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// 0-based index within the document.
    pub index: usize,
    /// The chunk text content.
    pub content: String,
    /// 1-based page the chunk was cut from.
    pub page_number: usize,
}
