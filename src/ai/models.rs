use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Target word-count band for a generated article. `Long` is unbounded
/// above; the other tiers are corrected when the draft overshoots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthTier {
    #[default]
    Short,
    MidLength,
    Long,
}

impl LengthTier {
    pub fn min_words(self) -> usize {
        match self {
            LengthTier::Short => 300,
            LengthTier::MidLength => 1000,
            LengthTier::Long => 2000,
        }
    }

    pub fn max_words(self) -> Option<usize> {
        match self {
            LengthTier::Short => Some(1000),
            LengthTier::MidLength => Some(2000),
            LengthTier::Long => None,
        }
    }

    /// Wording handed to the backend in the generation instruction.
    pub fn label(self) -> &'static str {
        match self {
            LengthTier::Short => "300 to 1000 words",
            LengthTier::MidLength => "1000 to 2000 words",
            LengthTier::Long => "at least 2000 words",
        }
    }
}

impl FromStr for LengthTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(LengthTier::Short),
            "mid-length" => Ok(LengthTier::MidLength),
            "long" => Ok(LengthTier::Long),
            other => Err(format!("unknown length tier: {other}")),
        }
    }
}

impl fmt::Display for LengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LengthTier::Short => "short",
            LengthTier::MidLength => "mid-length",
            LengthTier::Long => "long",
        };
        f.write_str(s)
    }
}

/// Result of the analyze step: topic and keyword suggestions plus a session
/// id the client passes back to generate without resending the prompt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptAnalysis {
    pub session_id: Uuid,
    pub topic: String,
    pub keywords: Vec<String>,
    pub has_article_length_in_prompt: bool,
    pub has_tone_in_prompt: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub session_id: Option<Uuid>,
    pub user_input: Option<String>,
    pub selected_keywords: Option<Vec<String>>,
    pub article_length: Option<LengthTier>,
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
    pub word_count: usize,
}
