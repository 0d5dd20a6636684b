// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini API.
//!
//! Authentication and quota refusals (401, 403, 429) are reported as
//! [`EngineFailure::Unavailable`] rather than retried: the caller disables
//! the engine for the rest of the run.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;
use triage_config::model::GeminiConfig;
use triage_core::{EngineFailure, TriageError};
use triage_llm::{Attempt, is_transient_status};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// HTTP client for `generateContent` and model metadata.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    probe_timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: &str, config: &GeminiConfig) -> Result<Self, TriageError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| TriageError::Config(format!("invalid Gemini API key header value: {e}")))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TriageError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }

    /// Sends one `generateContent` request and classifies the outcome.
    pub async fn generate(&self, prompt: &str, timeout: Duration) -> Attempt<String> {
        let request = GenerateContentRequest::user_prompt(prompt, self.temperature);

        let response = match self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .timeout(timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Attempt::Transient(format!("request failed: {e}"));
            }
            Err(e) => {
                return Attempt::Permanent(EngineFailure::CallFailed(format!(
                    "request failed: {e}"
                )));
            }
        };

        let status = response.status();
        debug!(status = %status, model = %self.model, "generateContent response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error {status} ({}): {}",
                    api_err.error.status, api_err.error.message
                ),
                Err(_) => format!("Gemini API returned {status}: {body}"),
            };
            return match status.as_u16() {
                401 | 403 | 429 => Attempt::Permanent(EngineFailure::Unavailable(message)),
                code if is_transient_status(code) => Attempt::Transient(message),
                _ => Attempt::Permanent(EngineFailure::CallFailed(message)),
            };
        }

        match response.json::<GenerateContentResponse>().await {
            Ok(body) => match body.text() {
                Some(text) => Attempt::Done(text),
                None => Attempt::Permanent(EngineFailure::CallFailed(
                    "response has no candidate text".into(),
                )),
            },
            Err(e) if e.is_timeout() => Attempt::Transient(format!("reading response timed out: {e}")),
            Err(e) => Attempt::Permanent(EngineFailure::CallFailed(format!(
                "unexpected response envelope: {e}"
            ))),
        }
    }

    /// Liveness check: model metadata is readable with this key.
    pub async fn probe(&self) -> bool {
        match self
            .client
            .get(self.model_url())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(status = %response.status(), "Gemini probe rejected");
                false
            }
            Err(e) => {
                debug!(error = %e, "Gemini probe failed");
                false
            }
        }
    }
}
