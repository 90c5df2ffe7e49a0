// src/client/anthropic.rs
//! Anthropic Messages API client for slide generation and slide rewrites.

use std::time::Duration;

use log::debug;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{error_from_response, http_client};
use crate::config::RuntimeConfig;
use crate::errors::{LessonError, Result};
use crate::generation::{
    parse_slide_record, parse_slides, GenerationRequest, REWRITE_SYSTEM_PROMPT,
    SLIDES_SYSTEM_PROMPT,
};
use crate::models::slide::Slide;

pub const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

const GENERATION_MAX_TOKENS: u32 = 32_000;
const REWRITE_MAX_TOKENS: u32 = 4_096;
/// Whole-deck generation can run for minutes.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Serialize, Debug)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// # Errors
    ///
    /// `CollaboratorUnavailable` if `ANTHROPIC_API_KEY` is not configured.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let key = config.anthropic_api_key.as_deref().ok_or_else(|| {
            LessonError::CollaboratorUnavailable("ANTHROPIC_API_KEY is not set".into())
        })?;
        Self::new(key, config.anthropic_model.as_str())
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| LessonError::InvalidInput("API key is not a valid header value".into()))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Sends one user message and returns the concatenated text reply.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: user,
            }],
        };
        let request = self
            .http
            .post(MESSAGES_URL)
            .headers(self.headers()?)
            .json(&body);
        #[cfg(not(target_arch = "wasm32"))]
        let request = match timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let reply: MessagesResponse = response.json().await?;
        let text: String = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();
        debug!("Anthropic reply: {} chars", text.len());
        Ok(text)
    }

    /// Generates slides for a source document.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if the reply does not parse. Not retried.
    pub async fn generate_slides(&self, request: &GenerationRequest) -> Result<Vec<Slide>> {
        let user = request.user_message()?;
        let raw = self
            .complete(
                SLIDES_SYSTEM_PROMPT,
                &user,
                GENERATION_MAX_TOKENS,
                Some(GENERATION_TIMEOUT),
            )
            .await?;
        parse_slides(&raw)
    }

    /// Rewrites one slide record according to `instruction`.
    pub async fn rewrite_slide(&self, snapshot: &Value, instruction: &str) -> Result<Value> {
        let user = format!(
            "Current slide JSON:\n{}\n\nInstruction: {instruction}",
            serde_json::to_string_pretty(snapshot)?
        );
        let raw = self
            .complete(REWRITE_SYSTEM_PROMPT, &user, REWRITE_MAX_TOKENS, None)
            .await?;
        parse_slide_record(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_unavailable() {
        let config = RuntimeConfig::from_lookup(|_| Ok(None)).unwrap();
        assert!(matches!(
            AnthropicClient::from_config(&config),
            Err(LessonError::CollaboratorUnavailable(_))
        ));
    }

    #[test]
    fn request_body_shape() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "m",
                "max_tokens": 10,
                "system": "sys",
                "messages": [{ "role": "user", "content": "hi" }]
            })
        );
    }

    #[test]
    fn reply_text_blocks_are_read() {
        let reply: MessagesResponse = serde_json::from_str(
            r#"{"id":"x","content":[{"type":"text","text":"[1]"},{"type":"thinking"}]}"#,
        )
        .unwrap();
        assert_eq!(reply.content.len(), 2);
        assert_eq!(reply.content[0].text, "[1]");
    }
}
