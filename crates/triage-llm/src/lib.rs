// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building blocks shared by the local and cloud LLM engines.
//!
//! Both engines send the same structured prompt, parse the same JSON
//! verdict, and retry transient failures with the same backoff policy.
//! Only the HTTP envelope differs between them.

pub mod parse;
pub mod prompt;
pub mod retry;

pub use parse::{DEFAULT_LLM_CONFIDENCE, LlmVerdict, extract_json_object, parse_verdict};
pub use prompt::build_prompt;
pub use retry::{Attempt, RetryPolicy, is_transient_status};
