// src/state.rs
use std::sync::Arc;

use crate::config::GeminiConfig;
use crate::services::chat_proxy::ChatProxy;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub proxy: ChatProxy,
}

impl AppState {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            proxy: ChatProxy::new(config)?,
        })
    }
}
