//! Client for the Gemini `generateContent` endpoint.
//!
//! The reply shape is handled loosely: only `candidates[0].content.parts[0]`
//! is consulted and the text is looked up under several field names.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::GeminiConfig;

/// Field names tried on the first content part, in priority order.
pub const REPLY_FIELDS: [&str; 4] = ["text", "textContent", "stringValue", "value"];

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Gemini API timed out")]
    Timeout,

    #[error("Gemini API unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Gemini API returned invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            // The URL carries the API key.
            UpstreamError::Network(err.without_url())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content<'a>>,
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub role: &'a str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Part<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn new(config: &'a GeminiConfig, message: &'a str) -> Self {
        Self {
            system_instruction: config.system_instruction.as_deref().map(|text| Content {
                role: "system",
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: message }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        }
    }
}

/// First non-empty string among [`REPLY_FIELDS`] on the first part of the
/// first candidate.
pub fn extract_reply(response: &Value) -> Option<String> {
    let part = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?;

    REPLY_FIELDS
        .iter()
        .filter_map(|field| part.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, reqwest::Error> {
        // Dropping the in-flight request on timeout is what cancels it upstream.
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }

    /// Send one user turn and return the decoded upstream payload.
    pub async fn generate(
        &self,
        config: &GeminiConfig,
        api_key: &str,
        message: &str,
    ) -> Result<Value, UpstreamError> {
        let request = GenerateContentRequest::new(config, message);

        tracing::debug!(
            endpoint = %config.endpoint,
            message_len = message.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&config.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        tracing::debug!(%status, raw = %raw, "Gemini raw response");

        if !status.is_success() {
            return Err(UpstreamError::Status { status, body: raw });
        }

        serde_json::from_str(&raw).map_err(UpstreamError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_part(part: Value) -> Value {
        json!({ "candidates": [{ "content": { "parts": [part] } }] })
    }

    #[test]
    fn text_wins_over_later_fields() {
        let resp = with_part(json!({ "text": "Hello", "stringValue": "Hi", "value": "v" }));
        assert_eq!(extract_reply(&resp).as_deref(), Some("Hello"));
    }

    #[test]
    fn falls_through_the_chain_in_order() {
        let resp = with_part(json!({ "stringValue": "Hi", "value": "v" }));
        assert_eq!(extract_reply(&resp).as_deref(), Some("Hi"));

        let resp = with_part(json!({ "textContent": "tc", "stringValue": "Hi" }));
        assert_eq!(extract_reply(&resp).as_deref(), Some("tc"));

        let resp = with_part(json!({ "value": "last" }));
        assert_eq!(extract_reply(&resp).as_deref(), Some("last"));
    }

    #[test]
    fn empty_and_non_string_fields_are_skipped() {
        let resp = with_part(json!({ "text": "", "textContent": 42, "value": "ok" }));
        assert_eq!(extract_reply(&resp).as_deref(), Some("ok"));
    }

    #[test]
    fn missing_path_yields_none() {
        assert_eq!(extract_reply(&json!({})), None);
        assert_eq!(extract_reply(&json!({ "candidates": [] })), None);
        assert_eq!(extract_reply(&json!({ "candidates": [{ "content": {} }] })), None);
        assert_eq!(extract_reply(&with_part(json!({ "inlineData": {} }))), None);
    }

    #[test]
    fn only_first_candidate_and_part_are_consulted() {
        let resp = json!({
            "candidates": [
                { "content": { "parts": [{ "inlineData": {} }, { "text": "second part" }] } },
                { "content": { "parts": [{ "text": "second candidate" }] } }
            ]
        });
        assert_eq!(extract_reply(&resp), None);
    }

    #[test]
    fn request_serializes_with_camel_case_fields() {
        let config = GeminiConfig::new(Some("k".into()), "http://x");
        let body = serde_json::to_value(GenerateContentRequest::new(&config, "hi")).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 300);
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("You are Cleo"));
    }

    #[test]
    fn system_instruction_is_optional() {
        let mut config = GeminiConfig::new(Some("k".into()), "http://x");
        config.system_instruction = None;
        let body = serde_json::to_value(GenerateContentRequest::new(&config, "hi")).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }
}
