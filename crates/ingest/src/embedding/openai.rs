use std::time::Duration;

use async_trait::async_trait;
use pdfqa_core::config::OpenAiConfig;
use pdfqa_core::ConfigError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{Embedder, EmbeddingError};

/// OpenAI-compatible embedding backend.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            dimensions,
        }
    }

    /// Build from config; fails when no API key is set.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            api_key.to_string(),
            config.embedding_model.clone(),
            Some(config.base_url.clone()),
            config.embedding_dimensions,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let mut resp: EmbedResponse = response.json().await?;

        // Sort by index to maintain input order.
        resp.data.sort_by_key(|item| item.index);

        let embeddings: Vec<Vec<f32>> = resp.data.into_iter().map(|item| item.embedding).collect();

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn embedder(base_url: String, dims: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            "sk-test".into(),
            "text-embedding-3-large".into(),
            Some(base_url),
            dims,
            Duration::from_secs(5),
        )
    }

    /// Echoes each input's length as a 2-d vector, returned in reverse order.
    async fn reversed_embeddings(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }
        let inputs = body["input"].as_array().cloned().unwrap_or_default();
        let mut data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let len = text.as_str().unwrap_or("").len() as f32;
                json!({"object": "embedding", "index": i, "embedding": [len, i as f32]})
            })
            .collect();
        data.reverse();
        (StatusCode::OK, Json(json!({"object": "list", "data": data})))
    }

    #[tokio::test]
    async fn results_are_reordered_by_index() {
        let base = spawn(Router::new().route("/v1/embeddings", post(reversed_embeddings))).await;
        let vectors = embedder(base, 2).embed_batch(&["a", "bbb", "cc"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![3.0, 1.0], vec![2.0, 2.0]]);
    }

    #[tokio::test]
    async fn wrong_dimensions_are_rejected() {
        let base = spawn(Router::new().route("/v1/embeddings", post(reversed_embeddings))).await;
        let err = embedder(base, 3).embed_batch(&["a"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[tokio::test]
    async fn api_errors_carry_status() {
        let base = spawn(Router::new().route(
            "/v1/embeddings",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        ))
        .await;
        let err = embedder(base, 2).embed_batch(&["a"]).await.unwrap_err();
        match err {
            EmbeddingError::Api(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid api key"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_batch_skips_the_request() {
        // Nothing listens here; a request would fail.
        let vectors = embedder("http://127.0.0.1:9".into(), 2).embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn from_config_requires_key() {
        let config = pdfqa_core::Config::from_lookup("", |_| None);
        assert!(OpenAiEmbedder::from_config(&config.openai).is_err());

        let config = pdfqa_core::Config::from_lookup("", |k| {
            (k == "OPENAI_API_KEY").then(|| "sk-x".to_string())
        });
        let embedder = OpenAiEmbedder::from_config(&config.openai).unwrap();
        assert_eq!(embedder.model(), "text-embedding-3-large");
        assert_eq!(embedder.dimensions(), 3072);
    }
}
