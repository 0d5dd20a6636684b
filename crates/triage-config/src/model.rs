// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the triage classifier.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use triage_core::{EngineKind, ExecutionMode, ExecutionPlan, LlmProvider};

/// Top-level triage configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Text cleaning settings.
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// Keyword rule engine settings.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Local sentiment model settings.
    #[serde(default)]
    pub sentiment: SentimentConfig,

    /// Local LLM (Ollama) settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Cloud LLM (Gemini) settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Retry policy shared by both LLM engines.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Availability probe cache settings.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Execution plan and batching settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl TriageConfig {
    /// Builds the execution plan described by the `[orchestrator]` section,
    /// with per-engine timeouts taken from the engine sections.
    pub fn execution_plan(&self) -> ExecutionPlan {
        let o = &self.orchestrator;
        ExecutionPlan::for_mode(o.mode, o.provider, o.sample_fraction)
            .with_timeout(
                EngineKind::LocalLlm,
                Duration::from_secs(self.ollama.timeout_secs),
            )
            .with_timeout(
                EngineKind::CloudLlm,
                Duration::from_secs(self.gemini.timeout_secs),
            )
            .with_max_in_flight(o.max_in_flight)
    }

    /// A copy safe to print: secrets are replaced with a placeholder.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.gemini.api_key.is_some() {
            copy.gemini.api_key = Some(REDACTED.to_string());
        }
        copy
    }
}

const REDACTED: &str = "[REDACTED]";

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Text normalizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Strip `http(s)://` and `www.` links.
    #[serde(default = "default_true")]
    pub remove_urls: bool,

    /// Strip `@handle` mentions.
    #[serde(default = "default_true")]
    pub remove_mentions: bool,

    /// Strip `#tag` tokens entirely. When false only the `#` is removed.
    #[serde(default)]
    pub remove_hashtags: bool,

    /// Replace known emoji with words; unknown emoji are always dropped.
    #[serde(default = "default_true")]
    pub convert_emojis: bool,

    /// Fold accented characters to ASCII.
    #[serde(default)]
    pub fold_accents: bool,

    #[serde(default = "default_true")]
    pub lowercase: bool,

    /// Never drop telecom vocabulary during stopword filtering.
    #[serde(default = "default_true")]
    pub preserve_domain_keywords: bool,

    /// Additional words removed from the cleaned text.
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            remove_urls: true,
            remove_mentions: true,
            remove_hashtags: false,
            convert_emojis: true,
            fold_accents: false,
            lowercase: true,
            preserve_domain_keywords: true,
            extra_stopwords: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Keyword rule engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Confidence reported when no keyword matches. Must stay below the
    /// one-match confidence of 0.7.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f32,

    /// Multiplier applied to the rule confidence for fallback topic,
    /// incident, and responsible labels.
    #[serde(default = "default_fallback_confidence_scale")]
    pub fallback_confidence_scale: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            fallback_confidence_scale: default_fallback_confidence_scale(),
        }
    }
}

fn default_confidence_floor() -> f32 {
    0.5
}

fn default_fallback_confidence_scale() -> f32 {
    0.6
}

/// Local sentiment model configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SentimentConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`.
    /// The built-in lexicon model is used when unset.
    #[serde(default)]
    pub model_path: Option<String>,
}

/// Local LLM service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens generated per response.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Per-call timeout in seconds.
    #[serde(default = "default_ollama_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for the liveness probe in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            timeout_secs: default_ollama_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "mistral".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_num_predict() -> u32 {
    512
}

fn default_ollama_timeout_secs() -> u64 {
    60
}

fn default_probe_timeout_secs() -> u64 {
    3
}

/// Cloud LLM service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds.
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for the liveness probe in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            timeout_secs: default_gemini_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    30
}

/// Retry policy for transient LLM errors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

/// Availability probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// How long a probe result stays cached, in seconds.
    #[serde(default = "default_probe_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_probe_ttl_secs(),
        }
    }
}

fn default_probe_ttl_secs() -> u64 {
    30
}

/// Execution plan and batching configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub mode: ExecutionMode,

    #[serde(default)]
    pub provider: LlmProvider,

    /// Fraction of documents sent to LLM engines in balanced mode.
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,

    /// Concurrent LLM calls across the whole run.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batches processed concurrently.
    #[serde(default = "default_batches_in_flight")]
    pub batches_in_flight: usize,

    /// Number of recent batch durations averaged for the ETA.
    #[serde(default = "default_eta_window")]
    pub eta_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            provider: LlmProvider::default(),
            sample_fraction: default_sample_fraction(),
            max_in_flight: default_max_in_flight(),
            batch_size: default_batch_size(),
            batches_in_flight: default_batches_in_flight(),
            eta_window: default_eta_window(),
        }
    }
}

fn default_sample_fraction() -> f64 {
    0.2
}

fn default_max_in_flight() -> usize {
    4
}

fn default_batch_size() -> usize {
    50
}

fn default_batches_in_flight() -> usize {
    2
}

fn default_eta_window() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TriageConfig::default();
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.timeout_secs, 60);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.timeout_secs, 30);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.probe.ttl_secs, 30);
        assert_eq!(config.orchestrator.batch_size, 50);
        assert_eq!(config.orchestrator.mode, ExecutionMode::Balanced);
        assert_eq!(config.orchestrator.provider, LlmProvider::Local);
    }

    #[test]
    fn execution_plan_uses_engine_timeouts() {
        let mut config = TriageConfig::default();
        config.orchestrator.provider = LlmProvider::Both;
        config.gemini.timeout_secs = 12;
        let plan = config.execution_plan();
        assert!(plan.contains(EngineKind::LocalLlm));
        assert!(plan.contains(EngineKind::CloudLlm));
        assert_eq!(plan.timeout(EngineKind::CloudLlm), Duration::from_secs(12));
        assert_eq!(plan.timeout(EngineKind::LocalLlm), Duration::from_secs(60));
        assert_eq!(plan.max_in_flight(), 4);
    }

    #[test]
    fn redacted_hides_api_key() {
        let mut config = TriageConfig::default();
        config.gemini.api_key = Some("AIza-secret".to_string());
        let shown = config.redacted();
        assert_eq!(shown.gemini.api_key.as_deref(), Some("[REDACTED]"));
        assert!(TriageConfig::default().redacted().gemini.api_key.is_none());
    }

    #[test]
    fn fast_mode_plan_has_no_llm() {
        let mut config = TriageConfig::default();
        config.orchestrator.mode = ExecutionMode::Fast;
        assert!(!config.execution_plan().has_llm());
    }
}
