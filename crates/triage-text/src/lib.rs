// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text normalization for customer feedback.
//!
//! [`TextNormalizer`] turns raw social-media text into a [`NormalizedText`]
//! with a quality score. [`fold`] is the accent-insensitive, lowercase form
//! used by keyword matchers.
//!
//! [`NormalizedText`]: triage_core::NormalizedText

pub mod emoji;
pub mod fold;
pub mod normalizer;

pub use fold::fold;
pub use normalizer::TextNormalizer;
