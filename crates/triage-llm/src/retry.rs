// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for transient LLM call failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use triage_config::model::RetryConfig;
use triage_core::{EngineFailure, EngineKind};

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The call succeeded.
    Done(T),
    /// Connect/timeout error or a retryable status; try again.
    Transient(String),
    /// Parse, validation, auth, or other non-retryable failure.
    Permanent(EngineFailure),
}

/// Retry policy: `max_attempts` total attempts, the `n`th retry waiting
/// `min(base * 2^n, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.base_delay_ms),
            max: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// A policy that never sleeps, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the zero-based attempt number.
    pub async fn run<T, F, Fut>(&self, engine: EngineKind, mut op: F) -> Result<T, EngineFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let mut last_error = String::new();
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.delay(attempt - 1);
                warn!(%engine, attempt, delay_ms = delay.as_millis() as u64, error = %last_error, "retrying after transient error");
                tokio::time::sleep(delay).await;
            }
            match op(attempt).await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Permanent(failure) => return Err(failure),
                Attempt::Transient(message) => last_error = message,
            }
        }
        Err(EngineFailure::CallFailed(format!(
            "{last_error} (gave up after {} attempts)",
            self.max_attempts
        )))
    }
}

/// Whether an HTTP status is worth retrying: 429 and the 5xx range.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
