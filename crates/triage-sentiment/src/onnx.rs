// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX transformer sentiment model.
//!
//! Runs a five-class ("1 star" to "5 stars") multilingual BERT sentiment
//! classifier on CPU and collapses its output to three classes: stars 1-2
//! are negative, 3 is neutral, 4-5 are positive. Collapsing uses
//! log-sum-exp so the result stays a valid logit vector.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use triage_core::TriageError;

use crate::model::SentimentModel;

/// Longest token sequence fed to the model.
const MAX_SEQUENCE_LEN: usize = 512;

/// Number of classes the model emits.
const STAR_CLASSES: usize = 5;

/// ONNX Runtime sentiment classifier.
pub struct OnnxSentimentModel {
    /// ONNX Runtime session (not Send, wrapped in Mutex for safety).
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: Session is accessed through Mutex which provides synchronization.
// The tokenizer is thread-safe for encoding operations.
unsafe impl Send for OnnxSentimentModel {}
unsafe impl Sync for OnnxSentimentModel {}

impl OnnxSentimentModel {
    /// Loads `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn new(model_dir: &Path) -> Result<Self, TriageError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            TriageError::Config(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let session = Session::builder()
            .map_err(|e| TriageError::Internal(format!("failed to create ONNX session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| TriageError::Internal(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| TriageError::Internal(format!("failed to set thread count: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                TriageError::Config(format!(
                    "failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn star_logits(&self, text: &str) -> Result<[f32; STAR_CLASSES], TriageError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| TriageError::Internal(format!("tokenization failed: {e}")))?;

        let seq_len = encoding.get_ids().len().min(MAX_SEQUENCE_LEN);
        let to_i64 = |v: &[u32]| v.iter().take(seq_len).map(|&x| x as i64).collect::<Vec<_>>();

        let input_ids = Array2::from_shape_vec((1, seq_len), to_i64(encoding.get_ids()))
            .map_err(|e| TriageError::Internal(format!("failed to shape input_ids: {e}")))?;
        let attention_mask =
            Array2::from_shape_vec((1, seq_len), to_i64(encoding.get_attention_mask()))
                .map_err(|e| TriageError::Internal(format!("failed to shape attention_mask: {e}")))?;
        let token_type_ids = Array2::from_shape_vec((1, seq_len), to_i64(encoding.get_type_ids()))
            .map_err(|e| TriageError::Internal(format!("failed to shape token_type_ids: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| TriageError::Internal(format!("failed to lock ONNX session: {e}")))?;

        let input_ids_tensor = TensorRef::from_array_view(&input_ids)
            .map_err(|e| TriageError::Internal(format!("input_ids tensor: {e}")))?;
        let attention_mask_tensor = TensorRef::from_array_view(&attention_mask)
            .map_err(|e| TriageError::Internal(format!("attention_mask tensor: {e}")))?;
        let token_type_ids_tensor = TensorRef::from_array_view(&token_type_ids)
            .map_err(|e| TriageError::Internal(format!("token_type_ids tensor: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
            .map_err(|e| TriageError::Internal(format!("ONNX inference failed: {e}")))?;

        // Output shape: [1, 5]
        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| TriageError::Internal(format!("failed to extract logits: {e}")))?;

        if data.len() < STAR_CLASSES {
            return Err(TriageError::Internal(format!(
                "expected {STAR_CLASSES} logits, model returned {}",
                data.len()
            )));
        }
        let mut logits = [0.0; STAR_CLASSES];
        logits.copy_from_slice(&data[..STAR_CLASSES]);
        Ok(logits)
    }
}

fn log_sum_exp(values: &[f32]) -> f32 {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    max + values.iter().map(|v| (v - max).exp()).sum::<f32>().ln()
}

/// Collapses five star logits into `[negative, neutral, positive]`.
pub fn collapse_stars(stars: [f32; STAR_CLASSES]) -> [f32; 3] {
    [
        log_sum_exp(&stars[0..2]),
        stars[2],
        log_sum_exp(&stars[3..5]),
    ]
}

impl SentimentModel for OnnxSentimentModel {
    fn name(&self) -> &str {
        "onnx-bert-sentiment"
    }

    fn predict(&self, text: &str) -> Result<[f32; 3], TriageError> {
        self.star_logits(text).map(collapse_stars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::softmax;

    #[test]
    fn collapse_preserves_probability_mass() {
        let stars = [0.1, 0.5, 1.0, 2.0, 0.3];
        let star_total: f32 = stars.iter().map(|s| s.exp()).sum();
        let p5: Vec<f32> = stars.iter().map(|s| s.exp() / star_total).collect();
        let p3 = softmax(collapse_stars(stars));
        assert!((p3[0] - (p5[0] + p5[1])).abs() < 1e-5);
        assert!((p3[1] - p5[2]).abs() < 1e-5);
        assert!((p3[2] - (p5[3] + p5[4])).abs() < 1e-5);
    }

    #[test]
    fn missing_model_dir_is_config_error() {
        let err = OnnxSentimentModel::new(Path::new("/nonexistent/model")).err();
        assert!(matches!(err, Some(TriageError::Config(_))));
    }
}
