//! Machine translation through a LibreTranslate-compatible service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::TranslationError;

/// A service translating text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError>;
}

/// Client for the LibreTranslate `/translate` endpoint.
pub struct LibreTranslate {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: Option<String>,
    error: Option<String>,
}

impl LibreTranslate {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Translator for LibreTranslate {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        let request = TranslateRequest {
            q: text,
            source: "auto",
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!("Translating {} characters to {}", text.len(), target);

        let resp = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TranslationError::Network(e.to_string()))?;

        let parsed = parse_response(&body);
        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TranslationError::Api(message));
        }

        let parsed = parsed?;
        match (parsed.translated_text, parsed.error) {
            (Some(text), _) if !text.trim().is_empty() => Ok(text),
            (_, Some(error)) => Err(TranslationError::Api(error)),
            _ => Err(TranslationError::Parse("empty translation".to_string())),
        }
    }
}

fn parse_response(body: &str) -> Result<TranslateResponse, TranslationError> {
    serde_json::from_str(body).map_err(|e| TranslationError::Parse(e.to_string()))
}
