use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::ai::AiError;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""title"\s*:\s*"([^"]+)""#).unwrap());
static CONTENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"content"\s*:\s*"(.+?)"\s*\}"#).unwrap());

/// Best-effort parse of model output that should be JSON but often is not.
///
/// Stage one cleans the text (code fences stripped, raw control characters
/// mapped back to escape sequences) and tries a strict parse. Stage two
/// falls back to extracting `title` and `content` fields by pattern and
/// synthesizing the object from them. Only when both stages fail does the
/// caller see `MalformedOutput`.
pub fn parse_model_json(raw: &str) -> Result<Value, AiError> {
    let cleaned = clean(raw);

    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(e) => {
            fallback_extract(raw).ok_or_else(|| AiError::MalformedOutput(e.to_string()))
        }
    }
}

/// Extract the `{title, content}` pair a generation call must produce.
pub fn parse_article(raw: &str) -> Result<(String, String), AiError> {
    let value = parse_model_json(raw)?;

    let title = value["title"]
        .as_str()
        .ok_or_else(|| AiError::MalformedOutput("missing title field".to_string()))?
        .to_string();
    let content = value["content"]
        .as_str()
        .ok_or_else(|| AiError::MalformedOutput("missing content field".to_string()))?
        .to_string();

    Ok((title, content))
}

fn clean(raw: &str) -> String {
    // Strip markdown code fences
    let stripped = raw.replace("```json", "").replace("```", "");
    let trimmed = stripped.trim();

    // Models sometimes inject raw control characters inside string values,
    // which breaks a strict parse. Map the common ones back to their escaped
    // forms and drop the rest.
    let mut cleaned = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '\n' => cleaned.push_str("\\n"),
            '\r' => cleaned.push_str("\\r"),
            '\t' => cleaned.push_str("\\t"),
            c if (c as u32) < 0x20 || (c as u32) == 0x7f => {}
            c => cleaned.push(c),
        }
    }
    cleaned
}

fn fallback_extract(raw: &str) -> Option<Value> {
    let title = TITLE_RE.captures(raw)?.get(1)?.as_str().to_string();
    let content = CONTENT_RE
        .captures(raw)?
        .get(1)?
        .as_str()
        .replace("\\n", "\n");

    Some(json!({ "title": title, "content": content }))
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
