//! Gemini `embedContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{api_error_message, LlmError, RequestPart, GEMINI_API_BASE};

/// Which side of a retrieval pair a text is embedded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    Document,
    Query,
}

impl EmbeddingMode {
    fn task_type(self) -> &'static str {
        match self {
            EmbeddingMode::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingMode::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Embedding seam used by the pre-filter.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(
        &self,
        text: &str,
        mode: EmbeddingMode,
        title: Option<&str>,
    ) -> Result<Vec<f32>, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    fn request<'a>(&self, text: &'a str, mode: EmbeddingMode, title: Option<&'a str>) -> EmbedRequest<'a> {
        EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![RequestPart { text }],
            },
            task_type: mode.task_type(),
            // The API only accepts a title for document embeddings.
            title: title.filter(|_| mode == EmbeddingMode::Document),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed(
        &self,
        text: &str,
        mode: EmbeddingMode,
        title: Option<&str>,
    ) -> Result<Vec<f32>, LlmError> {
        let url = format!("{GEMINI_API_BASE}/models/{}:embedContent", self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request(text, mode, title))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        if parsed.embedding.values.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(parsed.embedding.values)
    }
}
