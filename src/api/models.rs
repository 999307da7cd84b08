use serde::{Deserialize, Serialize};

use crate::ai::models::{GeneratedArticle, PromptAnalysis};
use crate::db::Message;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub user_input: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub analysis: PromptAnalysis,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub success: bool,
    pub article: GeneratedArticle,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub messages: Vec<Message>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub success: bool,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_offset")]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

fn default_offset() -> usize {
    0
}
