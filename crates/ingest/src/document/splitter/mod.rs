//! Recursive character text splitter.
//!
//! Splits page text into overlapping chunks of bounded character length, trying
//! paragraph breaks first, then line breaks, then spaces, and finally single
//! characters. Chunks never cross page boundaries.

mod helpers;
mod recursive;
mod types;

pub use recursive::RecursiveCharacterSplitter;
pub use types::{Chunk, SplitterError, DEFAULT_SEPARATORS};
