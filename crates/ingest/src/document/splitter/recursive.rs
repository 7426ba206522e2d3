use pdfqa_core::config::SplitterConfig;

use super::helpers::{char_len, merge_splits, split_keeping_separator};
use super::types::{Chunk, SplitterError, DEFAULT_SEPARATORS};
use crate::document::PageContent;

/// Fixed-size recursive character splitter.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitterError> {
        if chunk_size == 0 {
            return Err(SplitterError::ZeroChunkSize);
        }
        if chunk_overlap > chunk_size {
            return Err(SplitterError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn from_config(config: &SplitterConfig) -> Result<Self, SplitterError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a single text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    /// Split every page independently and number the chunks across the document.
    pub fn split_documents(&self, pages: &[PageContent]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for content in self.split_text(&page.text) {
                chunks.push(Chunk {
                    index: chunks.len(),
                    content,
                    page_number: page.page_number,
                });
            }
        }
        tracing::debug!(
            "Split {} pages into {} chunks (size={}, overlap={})",
            pages.len(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text wins; "" always matches.
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(merge_splits(&good_splits, self.chunk_size, self.chunk_overlap));
                good_splits.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    final_chunks.push(trimmed.to_string());
                }
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(merge_splits(&good_splits, self.chunk_size, self.chunk_overlap));
        }
        final_chunks
    }
}
