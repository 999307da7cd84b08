use std::sync::Arc;
use tracing::warn;

use crate::ai::keywords::KEYWORDS;
use crate::ai::models::{
    ChatMessage, GenerateRequest, GeneratedArticle, LengthTier, PromptAnalysis,
};
use crate::ai::parse::{count_words, parse_article, parse_model_json};
use crate::ai::session::PromptSessionCache;
use crate::ai::{AiError, TextBackend};

/// Whether a draft is a first version or an explicit do-over; the
/// instructions differ but the correction loop is shared.
#[derive(Clone, Copy)]
enum DraftMode {
    Initial,
    Variant,
}

impl DraftMode {
    fn system_prompt(self) -> &'static str {
        match self {
            DraftMode::Initial => {
                "You are an expert blog writer. Respond with ONLY valid JSON. \
                 No markdown, no extra text."
            }
            DraftMode::Variant => {
                "You are an expert blog writer. Write a DIFFERENT version: new title, \
                 new angle, fresh structure. Respond with ONLY valid JSON."
            }
        }
    }

    fn preamble(self) -> &'static str {
        match self {
            DraftMode::Initial => "Write a blog article:",
            DraftMode::Variant => "Write a FRESH, DIFFERENT article:",
        }
    }

    fn empty_subtopics(self) -> &'static str {
        match self {
            DraftMode::Initial => "none - generate based on user prompt alone",
            DraftMode::Variant => "none",
        }
    }
}

/// Drives the text backend through the analyze/generate/regenerate protocol:
/// ordered-candidate fallback per call, two-stage output parsing, and a
/// one-shot length-correction retry around the whole thing.
pub struct ArticleGenerator {
    backend: Arc<dyn TextBackend>,
    models: Vec<String>,
    cache: Arc<PromptSessionCache>,
}

impl ArticleGenerator {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        models: Vec<String>,
        cache: Arc<PromptSessionCache>,
    ) -> Self {
        Self {
            backend,
            models,
            cache,
        }
    }

    /// One logical backend call: candidates tried in order, per-candidate
    /// failures absorbed and logged, exhaustion surfaced as a terminal error.
    async fn call_backend(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        for model in &self.models {
            match self.backend.complete(model, messages).await {
                Ok(raw) => return Ok(raw),
                Err(e) => warn!("AI model {} failed: {}", model, e),
            }
        }
        Err(AiError::BackendUnavailable)
    }

    /// Identify the topic, match keywords from the controlled vocabulary,
    /// and detect length/tone hints already present in the prompt. Caches
    /// the raw prompt under a fresh session id for the generate step.
    pub async fn analyze(&self, user_input: &str) -> Result<PromptAnalysis, AiError> {
        let input = user_input.trim();
        if input.is_empty() {
            return Err(AiError::Validation("userInput is required.".to_string()));
        }

        let messages = vec![
            ChatMessage::system(
                "You are an assistant for a blogging platform. Respond with ONLY valid JSON. \
                 No markdown, no extra text.",
            ),
            ChatMessage::user(format!(
                "Analyze this blog article idea: \"{input}\"\n\n\
                 KEYWORD LIST (only select from this list exactly):\n{}\n\n\
                 Tasks:\n\
                 1. Identify main topic\n\
                 2. Select 5-10 matching keywords from the list only\n\
                 3. Detect if prompt mentions article LENGTH (short/long/word count etc)\n\
                 4. Detect if prompt mentions TONE (professional/casual/humorous etc)\n\n\
                 Respond ONLY with:\n\
                 {{\"topic\":\"...\",\"keywords\":[...],\"hasArticleLengthInPrompt\":false,\"hasToneInPrompt\":false}}",
                KEYWORDS.join(", ")
            )),
        ];

        let raw = self.call_backend(&messages).await?;
        let parsed = parse_model_json(&raw)?;

        let keywords = parsed["keywords"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .take(10)
                    .collect()
            })
            .unwrap_or_default();

        let session_id = self.cache.create(input);

        Ok(PromptAnalysis {
            session_id,
            topic: parsed["topic"].as_str().unwrap_or_default().to_string(),
            keywords,
            has_article_length_in_prompt: parsed["hasArticleLengthInPrompt"]
                .as_bool()
                .unwrap_or(false),
            has_tone_in_prompt: parsed["hasToneInPrompt"].as_bool().unwrap_or(false),
        })
    }

    /// Write a full article from the prompt plus the caller's selections.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedArticle, AiError> {
        self.produce(request, DraftMode::Initial).await
    }

    /// Same contract as generate, but the backend is told to produce a
    /// materially different variant from the same prompt.
    pub async fn regenerate(&self, request: &GenerateRequest) -> Result<GeneratedArticle, AiError> {
        self.produce(request, DraftMode::Variant).await
    }

    /// The effective prompt: the cached session wins when it is still alive,
    /// a directly supplied prompt is the fallback.
    fn resolve_prompt(&self, request: &GenerateRequest) -> Result<String, AiError> {
        let direct = request
            .user_input
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(session_id) = request.session_id {
            if let Some(prompt) = self.cache.get(&session_id) {
                return Ok(prompt);
            }
            return direct.map(str::to_string).ok_or(AiError::StaleSession);
        }

        direct
            .map(str::to_string)
            .ok_or_else(|| AiError::Validation("userInput or sessionId is required.".to_string()))
    }

    async fn produce(
        &self,
        request: &GenerateRequest,
        mode: DraftMode,
    ) -> Result<GeneratedArticle, AiError> {
        let prompt = self.resolve_prompt(request)?;
        let tier = request.article_length.unwrap_or_default();
        let tone = request.tone.as_deref().unwrap_or("professional");
        let subtopics = match &request.selected_keywords {
            Some(keywords) if !keywords.is_empty() => keywords.join(", "),
            _ => mode.empty_subtopics().to_string(),
        };

        let build_messages = |extra: &str| {
            vec![
                ChatMessage::system(mode.system_prompt()),
                ChatMessage::user(format!(
                    "{}\nIdea: \"{prompt}\"\nSubtopics: {subtopics}\nLength: {}\nTone: {tone}\n{extra}\n\n\
                     Respond ONLY with: {{\"title\":\"...\",\"content\":\"...\"}}",
                    mode.preamble(),
                    tier.label(),
                )),
            ]
        };

        let raw = self.call_backend(&build_messages("")).await?;
        let (title, content) = parse_article(&raw)?;
        let word_count = count_words(&content);

        if !out_of_range(tier, word_count) {
            return Ok(GeneratedArticle {
                title,
                content,
                word_count,
            });
        }

        // Exactly one corrective retry; the second attempt is accepted as-is
        // even if it is still out of range.
        let correction = if word_count < tier.min_words() {
            format!(
                "IMPORTANT: Too short ({word_count} words). Must be at least {} words.",
                tier.min_words()
            )
        } else {
            format!(
                "IMPORTANT: Too long ({word_count} words). Must be under {} words.",
                tier.max_words().unwrap_or(usize::MAX)
            )
        };

        let raw = self.call_backend(&build_messages(&correction)).await?;
        let (title, content) = parse_article(&raw)?;
        let word_count = count_words(&content);

        Ok(GeneratedArticle {
            title,
            content,
            word_count,
        })
    }
}

fn out_of_range(tier: LengthTier, word_count: usize) -> bool {
    word_count < tier.min_words()
        || tier.max_words().map_or(false, |max| word_count > max)
}
