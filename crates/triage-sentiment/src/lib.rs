// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local sentiment engine.
//!
//! A [`SentimentModel`] produces three logits (negative, neutral, positive)
//! in a single forward pass; [`SentimentEngine`] turns them into a label and
//! the winning class probability. The built-in [`LexiconModel`] needs no
//! model files. With the `onnx` feature, `OnnxSentimentModel` runs a
//! five-star multilingual BERT classifier through ONNX Runtime.

pub mod engine;
pub mod lexicon;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use engine::SentimentEngine;
pub use lexicon::LexiconModel;
pub use model::{SentimentModel, softmax};
#[cfg(feature = "onnx")]
pub use onnx::OnnxSentimentModel;
