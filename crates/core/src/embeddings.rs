use crate::config::AppConfig;
use crate::error::QueryError;
use crate::traits::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

/// Gemini embedding client. Output dimensionality is fixed per model
/// (768 for `models/embedding-001`) and verified on every response.
pub struct GeminiEmbedder {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(config: &AppConfig) -> Result<Self, QueryError> {
        let model = model_resource(&config.embedding_model);
        let endpoint = Url::parse(&format!(
            "{}/v1beta/{}:embedContent",
            config.gemini_base_url.trim_end_matches('/'),
            model
        ))?;

        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            endpoint,
            model,
            api_key: config.gemini_api_key.clone(),
            dimensions: config.embedding_dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, QueryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "model": self.model,
                "content": { "parts": [{ "text": text }] },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueryError::Embedding(format!(
                "{} returned {}",
                self.model,
                response.status()
            )));
        }

        let parsed: Value = response.json().await?;
        let values = parsed
            .pointer("/embedding/values")
            .and_then(Value::as_array)
            .ok_or_else(|| QueryError::BackendResponse {
                backend: "gemini".to_string(),
                details: "embedding response missing embedding.values".to_string(),
            })?;

        let vector = values
            .iter()
            .map(|value| value.as_f64().map(|v| v as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| QueryError::BackendResponse {
                backend: "gemini".to_string(),
                details: "embedding values were not numbers".to_string(),
            })?;

        if vector.len() != self.dimensions {
            return Err(QueryError::Embedding(format!(
                "embedding dimension {} != expected {}",
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }
}

/// Gemini REST resources are addressed as `models/<name>`.
pub(crate) fn model_resource(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
