use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::analysis::{AnalysisError, GeminiClient, LlmClient, OllamaClient};

/// Application-level constants
pub const APP_NAME: &str = "Antenatal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_PROVIDER: &str = "ANTENATAL_AI_PROVIDER";
pub const ENV_BASE_URL: &str = "ANTENATAL_AI_URL";
pub const ENV_MODEL: &str = "ANTENATAL_AI_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "ANTENATAL_AI_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENT: &str = "ANTENATAL_AI_MAX_CONCURRENT";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-pro";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const OLLAMA_DEFAULT_MODEL: &str = "medgemma";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const GEMINI_MAX_CONCURRENT: usize = 4;
// Ollama serves one generation at a time.
const OLLAMA_MAX_CONCURRENT: usize = 1;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "antenatal_lib=info,antenatal=info,warn"
}

/// Which generative text service backs the extraction adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    Gemini,
    Ollama,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_BASE_URL,
            Self::Ollama => OLLAMA_BASE_URL,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_DEFAULT_MODEL,
            Self::Ollama => OLLAMA_DEFAULT_MODEL,
        }
    }

    fn default_max_concurrent(&self) -> usize {
        match self {
            Self::Gemini => GEMINI_MAX_CONCURRENT,
            Self::Ollama => OLLAMA_MAX_CONCURRENT,
        }
    }
}

impl FromStr for AiProvider {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" | "local" => Ok(Self::Ollama),
            other => Err(AnalysisError::Config(format!(
                "unknown AI provider '{other}' (expected 'gemini' or 'ollama')"
            ))),
        }
    }
}

/// Connection settings for the generative text service.
///
/// Built once by the caller and handed to the adapter; nothing in the
/// crate holds credentials in global state.
#[derive(Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Upper bound on simultaneous requests during batch analysis.
    pub max_concurrent_requests: usize,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .finish()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::for_provider(AiProvider::Gemini)
    }
}

impl AiConfig {
    /// Provider defaults with no API key.
    pub fn for_provider(provider: AiProvider) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent_requests: provider.default_max_concurrent(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get(ENV_PROVIDER) {
            Some(raw) => raw.parse()?,
            None => AiProvider::Gemini,
        };

        let mut config = Self::for_provider(provider);
        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                AnalysisError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"))
            })?;
        }
        if let Some(raw) = get(ENV_MAX_CONCURRENT) {
            config.max_concurrent_requests = raw
                .trim()
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or_else(|| {
                    AnalysisError::Config(format!(
                        "{ENV_MAX_CONCURRENT} must be a positive whole number, got '{raw}'"
                    ))
                })?;
        }
        config.api_key = get(ENV_GEMINI_API_KEY);

        Ok(config)
    }

    /// Construct the LLM client this configuration describes.
    pub fn build_client(&self) -> Result<Box<dyn LlmClient + Send + Sync>, AnalysisError> {
        match self.provider {
            AiProvider::Gemini => {
                let key = self
                    .api_key
                    .as_deref()
                    .ok_or(AnalysisError::MissingApiKey)?;
                Ok(Box::new(GeminiClient::new(
                    &self.base_url,
                    key,
                    self.timeout_secs,
                )?))
            }
            AiProvider::Ollama => Ok(Box::new(OllamaClient::new(
                &self.base_url,
                self.timeout_secs,
            )?)),
        }
    }
}
