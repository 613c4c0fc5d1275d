//! OpenAI-compatible chat completions adapter (OpenAI, LM Studio, vLLM, ...).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use sense_core::{PageExtractor, PageImage, Transaction};

use crate::error::ExtractError;
use crate::http::send_json;
use crate::parse::parse_transactions;
use crate::prompt::EXTRACTION_PROMPT;
use crate::{ExtractorSettings, build_client};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const PROVIDER: &str = "openai";

pub struct OpenAiExtractor {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiExtractor {
    pub fn new(settings: &ExtractorSettings) -> Result<Self, ExtractError> {
        if settings.api_key.trim().is_empty() {
            return Err(ExtractError::MissingApiKey {
                provider: PROVIDER,
                hint: "set OPENAI_API_KEY or run: statementsense auth paste-openai-key",
            });
        }

        Ok(Self {
            client: build_client(settings.timeout)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature.unwrap_or(0.0),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn request_body(&self, page: &PageImage) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "image_url",
                            "image_url": { "url": page.data_uri() }
                        },
                        {
                            "type": "text",
                            "text": EXTRACTION_PROMPT
                        }
                    ]
                }
            ],
            "temperature": self.temperature,
            "stream": false
        })
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn completion_text(completion: ChatCompletion) -> String {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}

#[async_trait]
impl PageExtractor for OpenAiExtractor {
    #[tracing::instrument(skip_all, fields(model = %self.model, page = page.page_number))]
    async fn extract(&self, page: &PageImage) -> anyhow::Result<Vec<Transaction>> {
        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(page));

        let completion: ChatCompletion = send_json(request, PROVIDER).await?;
        let txns = parse_transactions(&completion_text(completion))?;

        tracing::debug!(records = txns.len(), "openai page parsed");
        Ok(txns)
    }
}
