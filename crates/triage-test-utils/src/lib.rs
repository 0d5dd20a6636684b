// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for triage integration tests.
//!
//! Provides scripted engines with configurable labels, delays, failures,
//! and availability, plus call counters for asserting on behaviour.

pub mod mock_engine;

pub use mock_engine::{FixedLocalEngine, ScriptedRemoteEngine, default_llm_labels};
