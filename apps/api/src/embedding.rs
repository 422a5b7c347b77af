//! Embedding client — the single point of entry for all embedding calls.
//!
//! Wraps the Hugging Face Inference API feature-extraction pipeline with the
//! same retry discipline as the LLM client. The model is hardcoded: index and
//! query vectors must come from the same model or similarity scores are
//! meaningless.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// The embedding model used for both chunk and query vectors.
pub const EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const HF_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding count/shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// Seam for the embedding service so the retrieval pipeline is testable
/// without the network. Carried in `AppState` as `Arc<dyn Embedder>`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts into fixed-dimension vectors, one per input,
    /// in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let batch = [text.to_string()];
        let mut vectors = self.embed(&batch).await?;
        vectors.pop().ok_or(EmbeddingError::ShapeMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a [String],
    options: EmbeddingOptions,
}

#[derive(Serialize)]
struct EmbeddingOptions {
    wait_for_model: bool,
}

/// Hugging Face Inference API embedder.
#[derive(Clone)]
pub struct HfEmbedder {
    client: Client,
    token: String,
}

impl HfEmbedder {
    pub fn new(token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            token,
        }
    }
}

#[async_trait]
impl Embedder for HfEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request_body = EmbeddingRequest {
            inputs: texts,
            options: EmbeddingOptions {
                wait_for_model: true,
            },
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(HF_INFERENCE_URL)
                .bearer_auth(&self.token)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, body);
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let vectors: Vec<Vec<f32>> = response.json().await?;

            if vectors.len() != texts.len() {
                return Err(EmbeddingError::ShapeMismatch {
                    expected: texts.len(),
                    actual: vectors.len(),
                });
            }

            debug!(
                "Embedded {} texts ({} dimensions)",
                vectors.len(),
                vectors.first().map(Vec::len).unwrap_or(0)
            );

            return Ok(vectors);
        }

        Err(last_error.unwrap_or(EmbeddingError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_extraction_response_parses() {
        let body = "[[0.1, -0.2, 0.3], [0.4, 0.5, -0.6]]";
        let vectors: Vec<Vec<f32>> = serde_json::from_str(body).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 3);
        assert!((vectors[1][2] + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_request_body_shape() {
        let inputs = vec!["a chunk".to_string()];
        let request = EmbeddingRequest {
            inputs: &inputs,
            options: EmbeddingOptions {
                wait_for_model: true,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"][0], "a chunk");
        assert_eq!(json["options"]["wait_for_model"], true);
    }

    #[tokio::test]
    async fn test_embed_query_uses_batch_embed() {
        struct OneVector;

        #[async_trait]
        impl Embedder for OneVector {
            async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                assert_eq!(texts.len(), 1);
                Ok(vec![vec![0.5, 0.5]])
            }
        }

        let vector = OneVector.embed_query("question").await.unwrap();
        assert_eq!(vector, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_embed_query_empty_batch_is_shape_mismatch() {
        struct NoVectors;

        #[async_trait]
        impl Embedder for NoVectors {
            async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                Ok(Vec::new())
            }
        }

        let result = NoVectors.embed_query("question").await;
        assert!(matches!(
            result,
            Err(EmbeddingError::ShapeMismatch {
                expected: 1,
                actual: 0
            })
        ));
    }
}
