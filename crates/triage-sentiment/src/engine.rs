// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The local transformer engine.

use std::sync::Arc;

use tracing::{info, warn};
use triage_config::model::SentimentConfig;
use triage_core::{
    EngineKind, EngineResult, Label, LocalEngine, NormalizedText, Sentiment, TriageError,
};

use crate::lexicon::LexiconModel;
use crate::model::{NEGATIVE, NEUTRAL, POSITIVE, SentimentModel, softmax};

/// Confidence reported when the model fails: uniform over three classes.
pub const DEGRADED_CONFIDENCE: f32 = 1.0 / 3.0;

/// Sentiment classifier over a pluggable [`SentimentModel`].
#[derive(Clone)]
pub struct SentimentEngine {
    model: Arc<dyn SentimentModel>,
}

impl std::fmt::Debug for SentimentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentEngine")
            .field("model", &self.model.name())
            .finish()
    }
}

impl Default for SentimentEngine {
    fn default() -> Self {
        Self::new(Arc::new(LexiconModel::new()))
    }
}

impl SentimentEngine {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self { model }
    }

    /// Builds the engine described by `[sentiment]`.
    ///
    /// Without a `model_path` the lexicon model is used. A `model_path`
    /// requires the `onnx` feature.
    pub fn from_config(config: &SentimentConfig) -> Result<Self, TriageError> {
        match &config.model_path {
            None => {
                info!(model = "lexicon", "sentiment model loaded");
                Ok(Self::default())
            }
            Some(path) => Self::load_onnx(std::path::Path::new(path)),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(path: &std::path::Path) -> Result<Self, TriageError> {
        let model = crate::onnx::OnnxSentimentModel::new(path)?;
        info!(model = model.name(), path = %path.display(), "sentiment model loaded");
        Ok(Self::new(Arc::new(model)))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(path: &std::path::Path) -> Result<Self, TriageError> {
        Err(TriageError::Config(format!(
            "sentiment.model_path is set to {} but this build has no ONNX support (enable the `onnx` feature)",
            path.display()
        )))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

impl LocalEngine for SentimentEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Transformer
    }

    fn classify(&self, text: &NormalizedText) -> EngineResult {
        let probabilities = match self.model.predict(&text.clean_text) {
            Ok(logits) => softmax(logits),
            Err(e) => {
                warn!(model = self.model.name(), error = %e, "sentiment model failed, degrading to neutral");
                return EngineResult::ok(EngineKind::Transformer)
                    .with(Label::Sentiment(Sentiment::Neutral), DEGRADED_CONFIDENCE);
            }
        };

        if probabilities.iter().any(|p| !p.is_finite()) {
            warn!(model = self.model.name(), "sentiment model returned non-finite scores");
            return EngineResult::ok(EngineKind::Transformer)
                .with(Label::Sentiment(Sentiment::Neutral), DEGRADED_CONFIDENCE);
        }

        // Ties resolve toward neutral, then negative.
        let (label, confidence) = [
            (Sentiment::Neutral, probabilities[NEUTRAL]),
            (Sentiment::Negative, probabilities[NEGATIVE]),
            (Sentiment::Positive, probabilities[POSITIVE]),
        ]
        .into_iter()
        .fold((Sentiment::Neutral, f32::NEG_INFINITY), |best, candidate| {
            if candidate.1 > best.1 { candidate } else { best }
        });

        EngineResult::ok(EngineKind::Transformer).with(Label::Sentiment(label), confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Dimension, EngineStatus};

    struct FailingModel;

    impl SentimentModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _text: &str) -> Result<[f32; 3], TriageError> {
            Err(TriageError::Internal("model exploded".into()))
        }
    }

    struct NanModel;

    impl SentimentModel for NanModel {
        fn name(&self) -> &str {
            "nan"
        }

        fn predict(&self, _text: &str) -> Result<[f32; 3], TriageError> {
            Ok([f32::NAN, 0.0, 0.0])
        }
    }

    fn text(s: &str) -> NormalizedText {
        triage_text::TextNormalizer::default().normalize(s)
    }

    #[test]
    fn negative_complaint() {
        let r = SentimentEngine::default()
            .classify(&text("Plus de réseau depuis ce matin, c'est inadmissible"));
        assert_eq!(
            r.label(Dimension::Sentiment),
            Some(Label::Sentiment(Sentiment::Negative))
        );
        assert!(r.confidence(Dimension::Sentiment).unwrap() > 0.5);
    }

    #[test]
    fn positive_thanks() {
        let r = SentimentEngine::default().classify(&text("Merci pour votre aide, tout est résolu"));
        assert_eq!(
            r.label(Dimension::Sentiment),
            Some(Label::Sentiment(Sentiment::Positive))
        );
    }

    #[test]
    fn confidence_is_winning_probability() {
        let r = SentimentEngine::default().classify(&NormalizedText::degraded());
        // [0, 1, 0] logits
        let expected = std::f32::consts::E / (std::f32::consts::E + 2.0);
        assert!((r.confidence(Dimension::Sentiment).unwrap() - expected).abs() < 1e-5);
    }

    #[tracing_test::traced_test]
    #[test]
    fn model_error_degrades_to_neutral() {
        let engine = SentimentEngine::new(Arc::new(FailingModel));
        let r = engine.classify(&text("peu importe"));
        assert_eq!(r.status, EngineStatus::Ok);
        assert_eq!(
            r.label(Dimension::Sentiment),
            Some(Label::Sentiment(Sentiment::Neutral))
        );
        assert_eq!(r.confidence(Dimension::Sentiment), Some(DEGRADED_CONFIDENCE));
        assert!(logs_contain("degrading to neutral"));
    }

    #[test]
    fn non_finite_scores_degrade() {
        let r = SentimentEngine::new(Arc::new(NanModel)).classify(&text("x y z"));
        assert_eq!(r.confidence(Dimension::Sentiment), Some(DEGRADED_CONFIDENCE));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn model_path_without_onnx_feature_is_config_error() {
        let config = SentimentConfig {
            model_path: Some("/models/bert".into()),
        };
        assert!(matches!(
            SentimentEngine::from_config(&config),
            Err(TriageError::Config(_))
        ));
    }

    #[test]
    fn default_config_uses_lexicon() {
        let engine = SentimentEngine::from_config(&SentimentConfig::default()).unwrap();
        assert_eq!(engine.model_name(), "lexicon");
    }
}
