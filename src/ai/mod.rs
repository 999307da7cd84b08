pub mod generator;
pub mod keywords;
pub mod models;
pub mod ollama;
pub mod openai;
pub mod parse;
pub mod session;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use models::ChatMessage;
use ollama::OllamaBackend;
use openai::OpenAiBackend;

pub use generator::ArticleGenerator;
pub use session::PromptSessionCache;

/// A single backend call failing, before fallback is applied.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Rate Limited")]
    RateLimited,
}

/// Errors surfaced to callers of analyze/generate/regenerate.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0}")]
    Validation(String),
    #[error("Prompt session expired or unknown. Please start over.")]
    StaleSession,
    #[error("All AI models failed.")]
    BackendUnavailable,
    #[error("AI returned unparseable response: {0}")]
    MalformedOutput(String),
}

impl AiError {
    /// Stable machine-readable tag for structured API failures.
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::Validation(_) => "validation",
            AiError::StaleSession => "stale_session",
            AiError::BackendUnavailable => "backend_unavailable",
            AiError::MalformedOutput(_) => "malformed_output",
        }
    }
}

/// Text-generation backend. The model is chosen per call so one backend can
/// serve the whole fallback candidate list.
#[async_trait]
pub trait TextBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, BackendError>;
}

pub struct BackendFactory;

impl BackendFactory {
    pub fn create_default(config: &AppConfig) -> Option<Arc<dyn TextBackend>> {
        match config.ai.provider.as_str() {
            "openai" => {
                let cfg = config.ai.openai.as_ref()?;
                Some(Arc::new(OpenAiBackend::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                )))
            }
            "ollama" => {
                let cfg = config.ai.ollama.as_ref()?;
                Some(Arc::new(OllamaBackend::new(cfg.base_url.clone())))
            }
            _ => None,
        }
    }
}
