use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::ai::models::ChatMessage;
use crate::ai::{BackendError, TextBackend};

/// Local Ollama backend, useful for development without API keys.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl TextBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, BackendError> {
        let body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(format!("Ollama Error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        json["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BackendError::Api("missing completion content".to_string()))
    }
}
