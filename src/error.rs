// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorResponse;
use crate::services::gemini::UpstreamError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Missing GEMINI_API_KEY")]
    MissingApiKey,

    #[error("Empty message")]
    EmptyMessage,

    #[error("Gemini API request failed")]
    Upstream(#[from] UpstreamError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidJson(_) | AppError::EmptyMessage => StatusCode::BAD_REQUEST,
            AppError::MissingApiKey | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}
