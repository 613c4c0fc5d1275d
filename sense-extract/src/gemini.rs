//! Google Gemini `generateContent` adapter.
//!
//! One request per page: the page image as inline data, the extraction
//! prompt, and a JSON response schema so the model answers with a bare
//! transaction array.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use sense_core::{PageExtractor, PageImage, Transaction};

use crate::error::ExtractError;
use crate::http::send_json;
use crate::parse::parse_transactions;
use crate::prompt::{EXTRACTION_PROMPT, response_schema};
use crate::{ExtractorSettings, build_client};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROVIDER: &str = "gemini";

pub struct GeminiExtractor {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

impl GeminiExtractor {
    pub fn new(settings: &ExtractorSettings) -> Result<Self, ExtractError> {
        if settings.api_key.trim().is_empty() {
            return Err(ExtractError::MissingApiKey {
                provider: PROVIDER,
                hint: "set GEMINI_API_KEY or run: statementsense auth paste-gemini-key",
            });
        }

        Ok(Self {
            client: build_client(settings.timeout)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(&self, page: &PageImage) -> Value {
        let mut generation_config = json!({
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        });
        if let Some(t) = self.temperature {
            generation_config["temperature"] = json!(t);
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "inlineData": { "mimeType": page.media_type, "data": page.data } },
                    { "text": EXTRACTION_PROMPT }
                ]
            }],
            "generationConfig": generation_config,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn response_text(resp: GenerateContentResponse) -> Result<String, ExtractError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractError::Blocked {
            provider: PROVIDER,
            reason,
        });
    }

    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    Ok(text)
}

#[async_trait]
impl PageExtractor for GeminiExtractor {
    #[tracing::instrument(skip_all, fields(model = %self.model, page = page.page_number))]
    async fn extract(&self, page: &PageImage) -> anyhow::Result<Vec<Transaction>> {
        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(page));

        let resp: GenerateContentResponse = send_json(request, PROVIDER).await?;
        let text = response_text(resp)?;
        let txns = parse_transactions(&text)?;

        tracing::debug!(records = txns.len(), "gemini page parsed");
        Ok(txns)
    }
}
