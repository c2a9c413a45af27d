use crate::error::{Error, Result};

/// A dense embedding of one document.
pub type Embedding = Vec<f32>;

/// Maps texts to fixed-length vectors, one per input and in input order.
pub trait Embedder {
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Embedding>>;
}

/// Encode every text and check the embedder returned one vector per input,
/// all of the same dimension.
pub fn embed_all<E: Embedder + ?Sized>(
    embedder: &mut E,
    texts: &[String],
) -> Result<Vec<Embedding>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let embeddings = embedder.encode(texts)?;
    if embeddings.len() != texts.len() {
        return Err(Error::Model(format!(
            "embedder returned {} vectors for {} texts",
            embeddings.len(),
            texts.len()
        )));
    }

    let dimension = embeddings[0].len();
    if let Some(i) = embeddings.iter().position(|e| e.len() != dimension) {
        tracing::warn!(
            index = i,
            expected = dimension,
            found = embeddings[i].len(),
            "embedding dimension mismatch"
        );
    }

    tracing::debug!(count = embeddings.len(), dimension, "embedded documents");
    Ok(embeddings)
}
