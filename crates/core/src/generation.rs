use crate::config::AppConfig;
use crate::embeddings::model_resource;
use crate::error::QueryError;
use crate::traits::Generator;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

/// Gemini text-generation client. Single-shot: one prompt in, one candidate
/// text out; failures are never retried here.
pub struct GeminiGenerator {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(config: &AppConfig) -> Result<Self, QueryError> {
        let endpoint = Url::parse(&format!(
            "{}/v1beta/{}:generateContent",
            config.gemini_base_url.trim_end_matches('/'),
            model_resource(&config.generation_model)
        ))?;

        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            endpoint,
            api_key: config.gemini_api_key.clone(),
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, QueryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueryError::Generation(format!(
                "generateContent returned {}",
                response.status()
            )));
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| QueryError::BackendResponse {
                backend: "gemini".to_string(),
                details: "generation response had no candidate text".to_string(),
            })
    }
}
