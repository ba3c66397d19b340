//! OpenAI embedding provider.
//!
//! Talks to the `/embeddings` endpoint of OpenAI-compatible services.
//! Requests are batched; rate-limit and server errors are retried with
//! exponential backoff.

use crate::embeddings::provider::EmbeddingProvider;
use crate::types::EmbeddingSettings;
use passage_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default OpenAI API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Maximum retry attempts for retryable failures.
const MAX_RETRIES: u32 = 3;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Embeddings request body.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Embeddings response body.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embedding provider.
#[derive(Debug)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(settings: EmbeddingSettings, api_key: &str) -> AppResult<Self> {
        Self::with_base_url(settings, api_key, DEFAULT_BASE_URL)
    }

    /// Create a new OpenAI embedder with a custom base URL.
    pub fn with_base_url(
        settings: EmbeddingSettings,
        api_key: &str,
        base_url: &str,
    ) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("OpenAI API key is empty".to_string()));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth)
                .map_err(|e| AppError::Config(format!("Invalid OpenAI API key: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: settings.model,
            dimensions: settings.dimensions,
        })
    }

    fn should_retry(status: reqwest::StatusCode) -> bool {
        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn backoff(attempt: u32) -> Duration {
        Duration::from_millis(500 * 2_u64.pow(attempt.min(5)))
    }

    async fn request_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: Some(self.dimensions),
        };

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| AppError::Embedding(format!("Failed to call OpenAI: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
                    AppError::Embedding(format!("Failed to parse OpenAI embedding response: {}", e))
                })?;

                parsed.data.sort_by_key(|entry| entry.index);

                if parsed.data.len() != texts.len() {
                    return Err(AppError::Embedding(format!(
                        "OpenAI returned {} embeddings for {} inputs",
                        parsed.data.len(),
                        texts.len()
                    )));
                }

                let embeddings: Vec<Vec<f32>> =
                    parsed.data.into_iter().map(|entry| entry.embedding).collect();

                for embedding in &embeddings {
                    if embedding.len() != self.dimensions {
                        return Err(AppError::Embedding(format!(
                            "Unexpected embedding dimensions: got {}, expected {}",
                            embedding.len(),
                            self.dimensions
                        )));
                    }
                }

                return Ok(embeddings);
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if Self::should_retry(status) && attempt + 1 < MAX_RETRIES {
                attempt += 1;
                warn!(
                    "OpenAI embeddings request failed ({}), retrying (attempt {}/{})",
                    status, attempt, MAX_RETRIES
                );
                tokio::time::sleep(Self::backoff(attempt)).await;
                continue;
            }

            return Err(AppError::Embedding(format!(
                "OpenAI embeddings request failed ({}): {}",
                status, body
            )));
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(AppError::Embedding(format!(
                "Cannot embed empty text (batch index {})",
                pos
            )));
        }

        debug!("Embedding batch of {} texts via OpenAI", texts.len());

        self.request_batch(texts).await
    }
}
