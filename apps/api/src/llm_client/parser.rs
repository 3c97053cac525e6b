//! Strict decoder for model replies.
//!
//! The model is asked for bare JSON but often wraps it in a Markdown fence.
//! Fences are stripped; anything else that is not valid JSON of the expected
//! shape is rejected whole. There is no partial recovery.

use serde::de::DeserializeOwned;
use thiserror::Error;

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model returned an empty response")]
    Empty,

    #[error("Failed to parse AI response as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strips a leading fence (with or without a language tag) and a trailing
/// fence, then trims surrounding whitespace.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(FENCE) {
        body = skip_language_tag(rest);
    }
    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }
    body.trim()
}

fn skip_language_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(rest.len());
    &rest[tag_len..]
}

/// Decodes a raw model reply into `T`.
pub fn parse_model_response<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}
