// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as ranges, non-empty URLs, and retry delay ordering.

use crate::diagnostic::ConfigError;
use crate::model::TriageConfig;

/// Upper bound for concurrent LLM calls.
pub const MAX_IN_FLIGHT_LIMIT: usize = 16;

/// Rule engine confidence with exactly one matching pattern.
pub const RULE_SINGLE_MATCH_CONFIDENCE: f32 = 0.7;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TriageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let o = &config.orchestrator;
    if !(0.0..=1.0).contains(&o.sample_fraction) {
        fail(format!(
            "orchestrator.sample_fraction must be between 0 and 1, got {}",
            o.sample_fraction
        ));
    }
    if o.batch_size == 0 {
        fail("orchestrator.batch_size must be at least 1".to_string());
    }
    if !(1..=MAX_IN_FLIGHT_LIMIT).contains(&o.max_in_flight) {
        fail(format!(
            "orchestrator.max_in_flight must be between 1 and {MAX_IN_FLIGHT_LIMIT}, got {}",
            o.max_in_flight
        ));
    }
    if o.batches_in_flight == 0 {
        fail("orchestrator.batches_in_flight must be at least 1".to_string());
    }
    if o.eta_window == 0 {
        fail("orchestrator.eta_window must be at least 1".to_string());
    }

    for (section, url, model, temperature) in [
        (
            "ollama",
            &config.ollama.base_url,
            &config.ollama.model,
            config.ollama.temperature,
        ),
        (
            "gemini",
            &config.gemini.base_url,
            &config.gemini.model,
            config.gemini.temperature,
        ),
    ] {
        if url.trim().is_empty() {
            fail(format!("{section}.base_url must not be empty"));
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!(
                "{section}.base_url `{url}` must start with http:// or https://"
            ));
        }
        if model.trim().is_empty() {
            fail(format!("{section}.model must not be empty"));
        }
        if !(0.0..=1.0).contains(&temperature) {
            fail(format!(
                "{section}.temperature must be between 0 and 1, got {temperature}"
            ));
        }
    }

    if config.ollama.timeout_secs == 0 || config.gemini.timeout_secs == 0 {
        fail("engine timeout_secs must be at least 1".to_string());
    }

    if config.retry.max_attempts == 0 {
        fail("retry.max_attempts must be at least 1".to_string());
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        fail(format!(
            "retry.base_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
            config.retry.base_delay_ms, config.retry.max_delay_ms
        ));
    }

    let r = &config.rules;
    if !(0.0..RULE_SINGLE_MATCH_CONFIDENCE).contains(&r.confidence_floor) {
        fail(format!(
            "rules.confidence_floor must be at least 0 and below {RULE_SINGLE_MATCH_CONFIDENCE} \
             (the confidence of a single keyword match), got {}",
            r.confidence_floor
        ));
    }
    if !(0.0..=1.0).contains(&r.fallback_confidence_scale) {
        fail(format!(
            "rules.fallback_confidence_scale must be between 0 and 1, got {}",
            r.fallback_confidence_scale
        ));
    }

    if let Some(path) = &config.sentiment.model_path {
        if path.trim().is_empty() {
            fail("sentiment.model_path must not be empty when set".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
