// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud LLM engine for the triage classifier.
//!
//! Sends one `generateContent` request per document to the Gemini API.
//! API key resolution order: `gemini.api_key` -> `GEMINI_API_KEY` ->
//! `GOOGLE_API_KEY`. Without a key the engine stays constructible but
//! probes as unavailable and never touches the network.

pub mod client;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};
use triage_config::model::{GeminiConfig, RetryConfig};
use triage_core::{EngineFailure, EngineKind, EngineResult, NormalizedText, RemoteEngine, TriageError};
use triage_llm::{RetryPolicy, build_prompt, parse_verdict};

use crate::client::GeminiClient;

/// Environment variables consulted when the config has no key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// LLM engine backed by the hosted Gemini API.
#[derive(Debug)]
pub struct GeminiEngine {
    client: Option<GeminiClient>,
    retry: RetryPolicy,
    /// Set once the API refuses service; cleared by [`RemoteEngine::reset`]
    /// when the next run starts.
    disabled: AtomicBool,
}

impl GeminiEngine {
    pub fn new(config: &GeminiConfig, retry: &RetryConfig) -> Result<Self, TriageError> {
        let key = resolve_api_key(config.api_key.as_deref(), |name| std::env::var(name).ok());
        Self::with_key(key.as_deref(), config, retry)
    }

    /// Builds the engine with an already-resolved key (`None` leaves it unconfigured).
    pub fn with_key(
        api_key: Option<&str>,
        config: &GeminiConfig,
        retry: &RetryConfig,
    ) -> Result<Self, TriageError> {
        let client = match api_key {
            Some(key) => {
                info!(model = %config.model, "cloud LLM engine initialized");
                Some(GeminiClient::new(key, config)?)
            }
            None => {
                info!("no Gemini API key configured, cloud LLM engine disabled");
                None
            }
        };
        Ok(Self {
            client,
            retry: RetryPolicy::from_config(retry),
            disabled: AtomicBool::new(false),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Whether a quota or auth refusal has disabled the engine.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    async fn classify_one(&self, text: &NormalizedText, timeout: Duration) -> EngineResult {
        let Some(client) = &self.client else {
            return EngineResult::failed(
                EngineKind::CloudLlm,
                EngineFailure::Unavailable("no API key configured".into()),
            );
        };
        if self.is_disabled() {
            return EngineResult::failed(
                EngineKind::CloudLlm,
                EngineFailure::Unavailable("disabled after quota or auth refusal".into()),
            );
        }
        if text.is_degraded() {
            return EngineResult::failed(
                EngineKind::CloudLlm,
                EngineFailure::CallFailed("no usable text after normalization".into()),
            );
        }

        let prompt = build_prompt(&text.clean_text);
        let call = self
            .retry
            .run(EngineKind::CloudLlm, |_| client.generate(&prompt, timeout));

        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(raw)) => parse_verdict(EngineKind::CloudLlm, &raw),
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(EngineFailure::TimedOut(timeout)),
        };

        match outcome {
            Ok(result) => result,
            Err(failure) => {
                if matches!(failure, EngineFailure::Unavailable(_))
                    && !self.disabled.swap(true, Ordering::AcqRel)
                {
                    warn!(engine = %EngineKind::CloudLlm, error = %failure, "cloud LLM refused service, disabling for this run");
                } else {
                    warn!(engine = %EngineKind::CloudLlm, error = %failure, "cloud LLM call failed");
                }
                EngineResult::failed(EngineKind::CloudLlm, failure)
            }
        }
    }
}

#[async_trait]
impl RemoteEngine for GeminiEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::CloudLlm
    }

    async fn classify_batch(&self, texts: &[NormalizedText], timeout: Duration) -> Vec<EngineResult> {
        join_all(texts.iter().map(|text| self.classify_one(text, timeout))).await
    }

    async fn probe(&self) -> bool {
        match &self.client {
            Some(client) if !self.is_disabled() => client.probe().await,
            _ => false,
        }
    }

    fn reset(&self) {
        if self.disabled.swap(false, Ordering::AcqRel) {
            info!(engine = %EngineKind::CloudLlm, "re-enabling cloud LLM for the new run");
        }
    }
}

/// Picks the first non-empty key from the config value, then the
/// environment variables in [`API_KEY_ENV_VARS`] order.
pub fn resolve_api_key(
    configured: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().filter_map(|name| env(name)))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}
