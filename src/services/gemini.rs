// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini generative-language client with model fallback.
//!
//! Calls `models/{model}:generateContent` for each configured model in
//! order. A model that is missing or unsupported is skipped; a quota error
//! waits once and retries the same model; anything else moves on to the
//! next model. When every model fails, the last classified error is
//! returned.

use crate::config::Config;
use crate::error::{AiError, AiErrorKind};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Image sent alongside a prompt.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// Successful model answer.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    pub text: String,
    pub model: String,
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    models: Vec<String>,
    quota_retry_delay: Duration,
}

impl GeminiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.gemini_timeout)
            .build()
            .context("failed building Gemini HTTP client")?;

        Ok(Self {
            http_client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            models: config.gemini_models.clone(),
            quota_retry_delay: config.quota_retry_delay,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Send a prompt (and optional image), trying each model in order.
    pub async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<GeneratedText, AiError> {
        let mut parts = vec![RequestPart::Text { text: prompt }];
        if let Some(image) = image {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: &image.data,
                },
            });
        }
        let body = GenerateContentRequest {
            contents: vec![RequestContent { parts }],
        };

        let mut last_error = None;

        for model in &self.models {
            let mut quota_retried = false;
            loop {
                tracing::debug!(model = %model, "Calling Gemini model");
                match self.call_model(model, &body).await {
                    Ok(text) => {
                        tracing::info!(model = %model, "Gemini model answered");
                        return Ok(GeneratedText {
                            text,
                            model: model.clone(),
                        });
                    }
                    Err(err) if err.kind == AiErrorKind::QuotaExceeded && !quota_retried => {
                        tracing::warn!(
                            model = %model,
                            delay_ms = self.quota_retry_delay.as_millis() as u64,
                            "Gemini quota exceeded, retrying after delay"
                        );
                        quota_retried = true;
                        tokio::time::sleep(self.quota_retry_delay).await;
                    }
                    Err(err) => {
                        tracing::warn!(
                            model = %model,
                            kind = err.kind.as_str(),
                            error = %err.message,
                            "Gemini model failed, trying next"
                        );
                        last_error = Some(err);
                        break;
                    }
                }
            }
        }

        tracing::error!("All Gemini models failed");
        Err(last_error.unwrap_or_else(|| {
            AiError::new(AiErrorKind::GenericError, "no Gemini models configured")
        }))
    }

    async fn call_model(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AiError::new(AiErrorKind::NetworkError, format!("network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            let kind = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                AiErrorKind::QuotaExceeded
            } else {
                classify_error(&message)
            };
            return Err(AiError::new(kind, message));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AiError::new(
                AiErrorKind::InvalidResponse,
                format!("failed to parse Gemini response JSON: {e}"),
            )
        })?;

        parsed.first_text().ok_or_else(|| {
            AiError::new(
                AiErrorKind::InvalidResponse,
                "invalid API response: no candidate text",
            )
        })
    }
}

/// Classify a provider error message by substring.
pub fn classify_error(message: &str) -> AiErrorKind {
    if message.contains("not found") || message.contains("not supported") {
        AiErrorKind::ModelNotFound
    } else if message.contains("quota") || message.contains("rate limit") || message.contains("429")
    {
        AiErrorKind::QuotaExceeded
    } else if message.contains("network") || message.contains("fetch") {
        AiErrorKind::NetworkError
    } else if message.contains("JSON") || message.contains("parse") {
        AiErrorKind::InvalidResponse
    } else {
        AiErrorKind::GenericError
    }
}

/// Remove markdown code fences the model sometimes wraps JSON in.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        out.push_str(&rest[..start]);
        rest = &rest[start + 3..];
        // Drop an optional language tag (`json`, any case) and its newline.
        if rest.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            rest = &rest[4..];
        }
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Parse a model answer as JSON after stripping fences.
pub fn parse_json_answer<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let clean = strip_code_fences(text);
    serde_json::from_str(&clean).map_err(|e| {
        AiError::new(
            AiErrorKind::InvalidResponse,
            format!("failed to parse model JSON: {e}"),
        )
    })
}
