//! sense-extract: vision-model adapters that turn a page image into
//! transaction records.

pub mod error;
pub mod gemini;
mod http;
pub mod openai;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use sense_core::{PageExtractor, PageImage, Transaction};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use error::ExtractError;
pub use gemini::GeminiExtractor;
pub use openai::OpenAiExtractor;
pub use parse::parse_transactions;
pub use prompt::{EXTRACTION_PROMPT, response_schema};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => gemini::DEFAULT_MODEL,
            Provider::OpenAi => openai::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => gemini::DEFAULT_BASE_URL,
            Provider::OpenAi => openai::DEFAULT_BASE_URL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" | "openai-compatible" => Ok(Provider::OpenAi),
            other => Err(ExtractError::UnknownProvider(other.to_string())),
        }
    }
}

/// Everything needed to build an extractor for one run
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl ExtractorSettings {
    /// Provider defaults for model, endpoint and timeout.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            api_key: api_key.into(),
            temperature: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ExtractError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ExtractError::Client)
}

/// The configured extraction backend
pub enum Extractor {
    Gemini(GeminiExtractor),
    OpenAi(OpenAiExtractor),
}

impl Extractor {
    pub fn from_settings(settings: &ExtractorSettings) -> Result<Self, ExtractError> {
        Ok(match settings.provider {
            Provider::Gemini => Extractor::Gemini(GeminiExtractor::new(settings)?),
            Provider::OpenAi => Extractor::OpenAi(OpenAiExtractor::new(settings)?),
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            Extractor::Gemini(_) => Provider::Gemini,
            Extractor::OpenAi(_) => Provider::OpenAi,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Extractor::Gemini(x) => x.model(),
            Extractor::OpenAi(x) => x.model(),
        }
    }
}

#[async_trait]
impl PageExtractor for Extractor {
    async fn extract(&self, page: &PageImage) -> anyhow::Result<Vec<Transaction>> {
        match self {
            Extractor::Gemini(x) => x.extract(page).await,
            Extractor::OpenAi(x) => x.extract(page).await,
        }
    }
}
