// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an Ollama-compatible inference server.

use std::time::Duration;

use tracing::debug;
use triage_config::model::OllamaConfig;
use triage_core::{EngineFailure, TriageError};
use triage_llm::{Attempt, is_transient_status};

use crate::types::{GenerateOptions, GenerateRequest, GenerateResponse, TagsResponse};

/// Nucleus sampling cut-off sent with every request.
const TOP_P: f32 = 0.9;

/// HTTP client for `/api/generate` and `/api/tags`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerateOptions,
    probe_timeout: Duration,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, TriageError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TriageError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.num_predict,
                top_p: TOP_P,
            },
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one generation request and classifies the outcome for the retry loop.
    pub async fn generate(&self, prompt: &str, timeout: Duration) -> Attempt<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
            options: self.options,
        };

        let response = match self
            .client
            .post(format!("{}/api/generate", self.base_url))
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
        debug!(status = %status, model = %self.model, "generate response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Ollama returned {status}: {body}");
            return if is_transient_status(status.as_u16()) {
                Attempt::Transient(message)
            } else {
                Attempt::Permanent(EngineFailure::CallFailed(message))
            };
        }

        match response.json::<GenerateResponse>().await {
            Ok(body) => Attempt::Done(body.response),
            Err(e) if e.is_timeout() => Attempt::Transient(format!("reading response timed out: {e}")),
            Err(e) => Attempt::Permanent(EngineFailure::CallFailed(format!(
                "unexpected response envelope: {e}"
            ))),
        }
    }

    /// Liveness check: the server answers `/api/tags` and has the model installed.
    pub async fn probe(&self) -> bool {
        let response = match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "Ollama probe rejected");
                return false;
            }
            Err(e) => {
                debug!(error = %e, "Ollama probe failed");
                return false;
            }
        };

        match response.json::<TagsResponse>().await {
            Ok(tags) => {
                let found = tags.has_model(&self.model);
                if !found {
                    debug!(model = %self.model, "Ollama is up but the model is not installed");
                }
                found
            }
            Err(e) => {
                debug!(error = %e, "Ollama probe returned an unexpected body");
                false
            }
        }
    }
}
