// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./triage.toml` > `~/.config/triage/triage.toml` > `/etc/triage/triage.toml`
//! with environment variable overrides via `TRIAGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TriageConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/triage/triage.toml";

/// Local configuration file, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "triage.toml";

/// Top-level sections, used to map `TRIAGE_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &[
    "general",
    "normalizer",
    "rules",
    "sentiment",
    "ollama",
    "gemini",
    "retry",
    "probe",
    "orchestrator",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/triage/triage.toml` (system-wide)
/// 3. `~/.config/triage/triage.toml` (user XDG config)
/// 4. `./triage.toml` (local directory)
/// 5. `TRIAGE_*` environment variables
pub fn load_config() -> Result<TriageConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TriageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TriageConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TriageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TriageConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TriageConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `$XDG_CONFIG_HOME/triage/triage.toml`, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("triage/triage.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TRIAGE_OLLAMA_PROBE_TIMEOUT_SECS` must map to
/// `ollama.probe_timeout_secs`, not `ollama.probe.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("TRIAGE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped variable name to a dotted config path.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("gemini_api_key"), "gemini.api_key");
        assert_eq!(
            map_env_key("ollama_probe_timeout_secs"),
            "ollama.probe_timeout_secs"
        );
        assert_eq!(
            map_env_key("orchestrator_max_in_flight"),
            "orchestrator.max_in_flight"
        );
        assert_eq!(map_env_key("probe_ttl_secs"), "probe.ttl_secs");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("weather_today"), "weather_today");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[ollama]
model = "llama3"
"#,
            )?;
            jail.set_env("TRIAGE_OLLAMA_MODEL", "mistral-nemo");
            jail.set_env("TRIAGE_ORCHESTRATOR_BATCH_SIZE", "25");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.ollama.model, "mistral-nemo");
            assert_eq!(config.orchestrator.batch_size, 25);
            Ok(())
        });
    }
}
