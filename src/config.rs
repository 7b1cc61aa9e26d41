// src/config.rs
use std::{fmt, time::Duration};

use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Cleo, the AI instructor for BourgeoisAI. Respond helpfully, concisely, and professionally about automation, education, and citizenship.";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 300;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Everything the chat proxy needs to reach the upstream model.
#[derive(Clone)]
pub struct GeminiConfig {
    /// `None` when the credential is unset or empty; checked per request.
    pub api_key: Option<String>,
    /// Full `generateContent` URL, without the `key` query parameter.
    pub endpoint: String,
    pub system_instruction: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Defaults with the given credential and endpoint. Handy for tests.
    pub fn new(api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            endpoint: endpoint.into(),
            system_instruction: Some(DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// Keep the credential out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("system_instruction", &self.system_instruction.is_some())
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini: GeminiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint = format!("{}/models/{}:generateContent", base.trim_end_matches('/'), model);

        let mut gemini = GeminiConfig::new(lookup("GEMINI_API_KEY"), endpoint);
        gemini.system_instruction = match lookup("CLEO_SYSTEM_INSTRUCTION") {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s),
            None => gemini.system_instruction,
        };
        gemini.temperature = parse_or(&lookup, "GEMINI_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        gemini.max_output_tokens =
            parse_or(&lookup, "GEMINI_MAX_OUTPUT_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS)?;
        gemini.timeout = Duration::from_secs(parse_or(
            &lookup,
            "GEMINI_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            gemini,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
        assert!(cfg.gemini.api_key.is_none());
        assert_eq!(
            cfg.gemini.endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
        assert_eq!(cfg.gemini.max_output_tokens, 300);
        assert_eq!(cfg.gemini.timeout, Duration::from_secs(10));
        assert!(cfg.gemini.system_instruction.is_some());
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let cfg = config_from(&[("GEMINI_API_KEY", "")]).unwrap();
        assert!(cfg.gemini.api_key.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("GEMINI_API_KEY", "abc"),
            ("GEMINI_API_BASE", "http://localhost:9000/"),
            ("GEMINI_MODEL", "test-model"),
            ("GEMINI_TIMEOUT_SECS", "3"),
            ("CLEO_SYSTEM_INSTRUCTION", "  "),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(cfg.gemini.api_key.as_deref(), Some("abc"));
        assert_eq!(
            cfg.gemini.endpoint,
            "http://localhost:9000/models/test-model:generateContent"
        );
        assert_eq!(cfg.gemini.timeout, Duration::from_secs(3));
        assert!(cfg.gemini.system_instruction.is_none());
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = config_from(&[("GEMINI_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("GEMINI_TIMEOUT_SECS"));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let cfg = GeminiConfig::new(Some("super-secret".into()), "http://x");
        assert!(!format!("{:?}", cfg).contains("super-secret"));
    }
}
