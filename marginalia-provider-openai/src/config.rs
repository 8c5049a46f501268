//! Client configuration.

use std::str::FromStr;
use std::time::Duration;

use marginalia_types::ConfigError;
use serde::{Deserialize, Serialize};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default context window shared by prompt and completion.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 4000;

/// Settings for an [`OpenAi`](crate::OpenAi) client.
///
/// Built explicitly by the caller, either by hand, from
/// [`Default`], or from the environment with [`from_env`](Self::from_env).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (`OPENAI_API_KEY`). Never serialized.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model identifier (`MARGINALIA_MODEL`).
    pub model: String,

    /// API base URL (`MARGINALIA_BASE_URL`).
    pub base_url: String,

    /// Sampling temperature (`MARGINALIA_TEMPERATURE`).
    pub temperature: f64,

    /// Tokens shared by prompt and completion (`MARGINALIA_CONTEXT_WINDOW`).
    pub context_window: u32,

    /// Organization ID (`OPENAI_ORGANIZATION`).
    pub organization: Option<String>,

    /// Delay between streamed deltas in milliseconds (`MARGINALIA_PACING_MS`).
    pub pacing_ms: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            temperature: 0.0,
            context_window: DEFAULT_CONTEXT_WINDOW,
            organization: None,
            pacing_ms: None,
        }
    }
}

impl OpenAiConfig {
    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = get("OPENAI_API_KEY").ok_or_else(|| ConfigError::Missing("OPENAI_API_KEY".into()))?;

        if let Some(model) = get("MARGINALIA_MODEL") {
            config.model = model;
        }
        if let Some(url) = get("MARGINALIA_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("MARGINALIA_TEMPERATURE") {
            config.temperature = parse_var("MARGINALIA_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = get("MARGINALIA_CONTEXT_WINDOW") {
            config.context_window = parse_var("MARGINALIA_CONTEXT_WINDOW", &raw)?;
        }
        config.organization = get("OPENAI_ORGANIZATION");
        if let Some(raw) = get("MARGINALIA_PACING_MS") {
            config.pacing_ms = Some(parse_var("MARGINALIA_PACING_MS", &raw)?);
        }

        Ok(config)
    }

    /// Pacing delay as a [`Duration`].
    #[must_use]
    pub fn pacing(&self) -> Option<Duration> {
        self.pacing_ms.map(Duration::from_millis)
    }
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        reason: e.to_string(),
    })
}
