// src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    /// Pull a usable message out of a decoded body. Missing, non-string and
    /// blank messages all yield `None`.
    pub fn from_value(body: &Value) -> Option<Self> {
        let message = body.get("message")?.as_str()?;
        if message.trim().is_empty() {
            return None;
        }
        Some(Self { message: message.to_string() })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
