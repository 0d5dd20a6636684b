// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Ollama `/api/generate` and `/api/tags` endpoints.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    /// `"json"` constrains the model to emit a JSON document.
    pub format: String,
    pub options: GenerateOptions,
}

/// Generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub top_p: f32,
}

/// Non-streaming response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Response body of `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

impl TagsResponse {
    /// Whether `model` is installed. `mistral` matches `mistral:latest`.
    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|tag| {
            tag.name == model
                || tag
                    .name
                    .split_once(':')
                    .is_some_and(|(base, _)| base == model)
        })
    }
}
