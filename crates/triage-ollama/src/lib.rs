// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local LLM engine for the triage classifier.
//!
//! Talks to an Ollama-compatible server: one `/api/generate` request per
//! document, JSON-constrained output, and `/api/tags` as the liveness probe.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};
use triage_config::model::{OllamaConfig, RetryConfig};
use triage_core::{EngineFailure, EngineKind, EngineResult, NormalizedText, RemoteEngine, TriageError};
use triage_llm::{RetryPolicy, build_prompt, parse_verdict};

use crate::client::OllamaClient;

/// LLM engine backed by a locally hosted Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEngine {
    client: OllamaClient,
    retry: RetryPolicy,
}

impl OllamaEngine {
    pub fn new(config: &OllamaConfig, retry: &RetryConfig) -> Result<Self, TriageError> {
        let client = OllamaClient::new(config)?;
        info!(model = %config.model, base_url = %config.base_url, "local LLM engine initialized");
        Ok(Self {
            client,
            retry: RetryPolicy::from_config(retry),
        })
    }

    /// Replaces the retry policy (tests use [`RetryPolicy::immediate`]).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn classify_one(&self, text: &NormalizedText, timeout: Duration) -> EngineResult {
        if text.is_degraded() {
            return EngineResult::failed(
                EngineKind::LocalLlm,
                EngineFailure::CallFailed("no usable text after normalization".into()),
            );
        }

        let prompt = build_prompt(&text.clean_text);
        let call = self
            .retry
            .run(EngineKind::LocalLlm, |_| self.client.generate(&prompt, timeout));

        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(raw)) => parse_verdict(EngineKind::LocalLlm, &raw),
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(EngineFailure::TimedOut(timeout)),
        };

        match outcome {
            Ok(result) => {
                debug!(model = %self.client.model(), "local LLM classified document");
                result
            }
            Err(failure) => {
                warn!(engine = %EngineKind::LocalLlm, error = %failure, "local LLM call failed");
                EngineResult::failed(EngineKind::LocalLlm, failure)
            }
        }
    }
}

#[async_trait]
impl RemoteEngine for OllamaEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::LocalLlm
    }

    async fn classify_batch(&self, texts: &[NormalizedText], timeout: Duration) -> Vec<EngineResult> {
        join_all(texts.iter().map(|text| self.classify_one(text, timeout))).await
    }

    async fn probe(&self) -> bool {
        self.client.probe().await
    }
}
