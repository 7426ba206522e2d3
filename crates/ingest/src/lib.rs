//! Document ingestion for question answering: PDF loading, recursive character
//! splitting, embedding, and the in-memory similarity index.

pub mod document;
pub mod embedding;
pub mod index;

pub use document::splitter::{Chunk, RecursiveCharacterSplitter, SplitterError};
pub use document::{
    ensure_pdf_filename, extract_text, load_pdf, persist_upload, ExtractedDocument, ExtractionError,
    PageContent,
};
pub use embedding::{embed_in_batches, Embedder, EmbeddingError, OpenAiEmbedder};
pub use index::{DistanceMetric, IndexError, ScoredChunk, VectorIndex};
