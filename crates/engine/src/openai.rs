use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use burgeria_core::config::EmbeddingConfig;
use burgeria_core::embedding::{Embedder, EmbeddingError};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| EmbeddingError::Request("no embedding API key configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| EmbeddingError::Request(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest { model: &self.model, input: text })
            .send()
            .await
            .map_err(|error| EmbeddingError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Request(format!("status {status}: {body}")));
        }

        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|error| EmbeddingError::Malformed(error.to_string()))?;

        payload
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| EmbeddingError::Malformed("empty data array".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use burgeria_core::config::EmbeddingConfig;

    use super::OpenAiEmbedder;

    #[test]
    fn missing_api_key_is_rejected_at_construction() {
        let config = EmbeddingConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 5,
        };

        assert!(OpenAiEmbedder::from_config(&config).is_err());
    }

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let config = EmbeddingConfig {
            api_key: Some("test-key".to_string().into()),
            base_url: "https://api.openai.com/v1/".to_string(),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 5,
        };

        let embedder = OpenAiEmbedder::from_config(&config).expect("construct embedder");
        assert_eq!(embedder.base_url, "https://api.openai.com/v1");
    }
}
