pub mod batcher;
pub mod openai;
pub mod traits;

pub use batcher::embed_in_batches;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};
