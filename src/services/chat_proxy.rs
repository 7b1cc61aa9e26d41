// src/services/chat_proxy.rs
use axum::http::Method;
use serde_json::Value;

use crate::{
    config::GeminiConfig,
    error::AppError,
    message::{ChatRequest, ChatResponse},
    services::gemini::{GeminiClient, extract_reply},
};

pub const FALLBACK_REPLY: &str = "Sorry, I couldn’t think of a response.";

/// Request body as handed over by the hosting runtime.
#[derive(Debug, Clone)]
pub enum InboundBody {
    /// Already decoded. A JSON string still needs one parse step.
    Json(Value),
    /// Undecoded bytes.
    Raw(Vec<u8>),
}

impl InboundBody {
    fn decode(self) -> Result<Value, serde_json::Error> {
        let value = match self {
            InboundBody::Json(value) => value,
            InboundBody::Raw(bytes) => serde_json::from_slice(&bytes)?,
        };
        match value {
            Value::String(s) => serde_json::from_str(&s),
            other => Ok(other),
        }
    }
}

/// Runtime-independent chat handler: validate, forward, normalize.
#[derive(Debug, Clone)]
pub struct ChatProxy {
    config: GeminiConfig,
    gemini: GeminiClient,
}

impl ChatProxy {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let gemini = GeminiClient::new(&config)?;
        Ok(Self { config, gemini })
    }

    pub async fn handle(&self, method: &Method, body: InboundBody) -> Result<ChatResponse, AppError> {
        if *method != Method::POST {
            return Err(AppError::MethodNotAllowed);
        }

        let body = body.decode().map_err(AppError::InvalidJson)?;

        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::error!("Missing GEMINI_API_KEY");
            return Err(AppError::MissingApiKey);
        };

        let request = ChatRequest::from_value(&body).ok_or(AppError::EmptyMessage)?;

        let upstream = self
            .gemini
            .generate(&self.config, api_key, &request.message)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Gemini API error"))?;

        let reply = extract_reply(&upstream).unwrap_or_else(|| {
            tracing::warn!("No usable text in Gemini response, using fallback reply");
            FALLBACK_REPLY.to_string()
        });

        Ok(ChatResponse { reply })
    }
}
