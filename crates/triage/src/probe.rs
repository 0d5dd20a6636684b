// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triage probe`: reports whether each LLM engine can be used right now.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use triage_core::{EngineKind, TriageError};
use triage_orchestrator::Orchestrator;

/// Outcome of probing one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Available,
    Unavailable,
    NotConfigured,
}

#[derive(Debug, Clone)]
pub struct ProbeCheck {
    pub engine: EngineKind,
    pub status: ProbeStatus,
    pub message: String,
    pub duration: Duration,
}

const PROBED: [EngineKind; 2] = [EngineKind::LocalLlm, EngineKind::CloudLlm];

/// Probes both LLM engines and prints one line per engine.
///
/// Returns the number of engines that answered.
pub async fn run_probe(orchestrator: &Orchestrator, plain: bool) -> Result<usize, TriageError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let checks = probe_all(orchestrator).await;

    println!();
    println!("  triage probe");
    println!();
    for check in &checks {
        println!("{}", render_line(check, use_color));
    }
    println!();

    let available = checks
        .iter()
        .filter(|c| c.status == ProbeStatus::Available)
        .count();
    if available == 0 {
        println!("  No LLM engine available; runs will use the rule engine and transformer only.");
    } else {
        println!("  {available} of {} LLM engines available.", checks.len());
    }
    println!();
    Ok(available)
}

pub async fn probe_all(orchestrator: &Orchestrator) -> Vec<ProbeCheck> {
    let probe = orchestrator.probe();
    let mut checks = Vec::with_capacity(PROBED.len());
    for engine in PROBED {
        let start = Instant::now();
        let (status, message) = if !probe.is_registered(engine) {
            (ProbeStatus::NotConfigured, not_configured_hint(engine))
        } else if probe.is_available(engine).await {
            (ProbeStatus::Available, "reachable".to_string())
        } else {
            (ProbeStatus::Unavailable, "not reachable".to_string())
        };
        checks.push(ProbeCheck {
            engine,
            status,
            message,
            duration: start.elapsed(),
        });
    }
    checks
}

fn not_configured_hint(engine: EngineKind) -> String {
    match engine {
        EngineKind::CloudLlm => "no API key (set GEMINI_API_KEY or gemini.api_key)".to_string(),
        _ => "not configured".to_string(),
    }
}

pub fn render_line(check: &ProbeCheck, use_color: bool) -> String {
    use colored::Colorize;

    let name = check.engine.to_string();
    let duration_ms = check.duration.as_millis();
    if !use_color {
        let tag = match check.status {
            ProbeStatus::Available => "[OK]  ",
            ProbeStatus::NotConfigured => "[SKIP]",
            ProbeStatus::Unavailable => "[FAIL]",
        };
        return format!("    {tag} {name:<20} {} ({duration_ms}ms)", check.message);
    }

    let (symbol, message) = match check.status {
        ProbeStatus::Available => ("✓".green(), check.message.normal()),
        ProbeStatus::NotConfigured => ("-".yellow(), check.message.yellow()),
        ProbeStatus::Unavailable => ("✗".red(), check.message.red()),
    };
    format!("    {symbol} {name:<20} {message} ({duration_ms}ms)")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(status: ProbeStatus, message: &str) -> ProbeCheck {
        ProbeCheck {
            engine: EngineKind::LocalLlm,
            status,
            message: message.to_string(),
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn plain_lines_use_bracket_tags() {
        let line = render_line(&check(ProbeStatus::Available, "reachable"), false);
        assert!(line.contains("[OK]"));
        assert!(line.contains("reachable"));
        assert!(line.contains("(12ms)"));

        let line = render_line(&check(ProbeStatus::Unavailable, "not reachable"), false);
        assert!(line.contains("[FAIL]"));

        let line = render_line(&check(ProbeStatus::NotConfigured, "no key"), false);
        assert!(line.contains("[SKIP]"));
    }

    #[test]
    fn cloud_hint_names_the_key_variable() {
        assert!(not_configured_hint(EngineKind::CloudLlm).contains("GEMINI_API_KEY"));
    }
}
