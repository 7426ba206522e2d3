use tracing::info;

use super::traits::{Embedder, EmbeddingError};

/// Embed `texts` in order, sending at most `batch_size` texts per request.
///
/// A `batch_size` of zero is treated as one.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut vectors = Vec::with_capacity(texts.len());

    for (batch_idx, batch) in texts.chunks(batch_size).enumerate() {
        info!(
            "Embedding batch {}/{} ({} texts)",
            batch_idx + 1,
            total_batches,
            batch.len()
        );
        let embeddings = embedder.embed_batch(batch).await?;
        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }
        vectors.extend(embeddings);
    }

    Ok(vectors)
}
