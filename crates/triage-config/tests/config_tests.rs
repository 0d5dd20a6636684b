// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the triage configuration system.

use triage_config::diagnostic::{ConfigError, suggest_key};
use triage_config::model::TriageConfig;
use triage_config::{load_and_validate_str, load_config_from_str};
use triage_core::{EngineKind, ExecutionMode, LlmProvider};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_triage_config() {
    let toml = r#"
[general]
log_level = "debug"

[normalizer]
remove_hashtags = true
fold_accents = true
extra_stopwords = ["svp", "stp"]

[rules]
confidence_floor = 0.65
fallback_confidence_scale = 0.5

[ollama]
base_url = "http://gpu-box:11434"
model = "mistral-nemo"
temperature = 0.0
num_predict = 256

[gemini]
api_key = "test-key"
model = "gemini-1.5-pro"

[retry]
max_attempts = 5
base_delay_ms = 100
max_delay_ms = 1000

[probe]
ttl_secs = 10

[orchestrator]
mode = "precise"
provider = "both"
max_in_flight = 8
batch_size = 20
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.general.log_level, "debug");
    assert!(config.normalizer.remove_hashtags);
    assert!(config.normalizer.fold_accents);
    assert_eq!(config.normalizer.extra_stopwords, vec!["svp", "stp"]);
    assert_eq!(config.rules.confidence_floor, 0.65);
    assert_eq!(config.ollama.base_url, "http://gpu-box:11434");
    assert_eq!(config.ollama.num_predict, 256);
    assert_eq!(config.gemini.api_key.as_deref(), Some("test-key"));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.probe.ttl_secs, 10);
    assert_eq!(config.orchestrator.mode, ExecutionMode::Precise);
    assert_eq!(config.orchestrator.provider, LlmProvider::Both);
    assert_eq!(config.orchestrator.batch_size, 20);

    let plan = config.execution_plan();
    assert_eq!(plan.llm_engines().count(), 2);
    assert_eq!(plan.sample_fraction(), 1.0);
    assert_eq!(plan.max_in_flight(), 8);
    assert!(plan.contains(EngineKind::Rule));
}

/// Empty TOML produces the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.ollama.model, "mistral");
    assert_eq!(config.orchestrator.sample_fraction, 0.2);
    assert!(config.gemini.api_key.is_none());
}

/// Unknown field in a section produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_produces_suggestion() {
    let toml = r#"
[ollama]
modle = "mistral"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "modle");
            assert_eq!(suggestion.as_deref(), Some("model"));
            assert!(span.is_some(), "inline source should yield a span");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[orchestrater]
batch_size = 10
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown section");
    let rendered = format!("{}", errors[0]);
    assert!(rendered.contains("orchestrater"), "got: {rendered}");
}

/// Unknown execution mode is an InvalidValue diagnostic.
#[test]
fn unknown_mode_is_invalid_value() {
    let toml = r#"
[orchestrator]
mode = "turbo"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown mode");
    assert!(
        matches!(&errors[0], ConfigError::InvalidValue { detail, .. } if detail.contains("turbo")),
        "got: {:?}",
        errors[0]
    );
}

/// Wrong value type is an InvalidType diagnostic naming the key.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[orchestrator]
batch_size = "fifty"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string batch size");
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "orchestrator.batch_size"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[orchestrator]
sample_fraction = 2.0
max_in_flight = 64

[retry]
max_attempts = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 3);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn suggest_key_public_api() {
    assert_eq!(
        suggest_key("tll_secs", &["ttl_secs"]),
        Some("ttl_secs".to_string())
    );
}

/// Serialized config round-trips through TOML.
#[test]
fn config_serializes_to_toml() {
    let config = TriageConfig::default();
    let rendered = toml::to_string(&config).expect("serialize");
    let parsed = load_config_from_str(&rendered).expect("re-parse");
    assert_eq!(parsed.orchestrator.batch_size, config.orchestrator.batch_size);
    assert_eq!(parsed.ollama.base_url, config.ollama.base_url);
}
