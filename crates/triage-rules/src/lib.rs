// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword rule engine.
//!
//! Scores complaint likelihood and urgency from weighted pattern matches,
//! and derives lower-confidence topic, incident, and responsible labels used
//! when no language model classified a document. No network, no model, no
//! allocation beyond the folded input.

pub mod engine;
pub mod fallback;
pub mod tables;

pub use engine::RuleEngine;
