// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of a requested plan against live engine availability.

use serde::Serialize;
use tracing::info;
use triage_core::{EngineKind, ExecutionPlan};

use crate::probe::AvailabilityProbe;

/// Why an engine was removed from the requested plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    /// No engine of this kind was registered with the orchestrator.
    NotConfigured,
    /// The liveness probe failed.
    Unavailable,
    /// The engine refused service during the run.
    RefusedService,
}

/// A plan adjustment reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanNote {
    pub engine: EngineKind,
    pub reason: DropReason,
}

impl std::fmt::Display for PlanNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            DropReason::NotConfigured => {
                write!(f, "{} dropped from plan: not configured", self.engine)
            }
            DropReason::Unavailable => {
                write!(f, "{} dropped from plan: probe reported it unavailable", self.engine)
            }
            DropReason::RefusedService => write!(
                f,
                "{} disabled for the rest of the run: quota or authentication refusal",
                self.engine
            ),
        }
    }
}

/// Drops every LLM engine the probe reports unavailable.
///
/// Dropped engines are not retried per document; each drop yields one note.
pub async fn resolve_plan(
    requested: &ExecutionPlan,
    probe: &AvailabilityProbe,
) -> (ExecutionPlan, Vec<PlanNote>) {
    let mut plan = requested.clone();
    let mut notes = Vec::new();

    for kind in requested.llm_engines() {
        let reason = if !probe.is_registered(kind) {
            Some(DropReason::NotConfigured)
        } else if !probe.is_available(kind).await {
            Some(DropReason::Unavailable)
        } else {
            None
        };

        if let Some(reason) = reason {
            plan = plan.without(kind);
            let note = PlanNote { engine: kind, reason };
            info!(engine = %kind, reason = ?reason, "plan adjusted");
            notes.push(note);
        }
    }

    (plan, notes)
}
