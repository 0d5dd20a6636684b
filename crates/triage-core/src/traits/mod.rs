// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine capability traits.
//!
//! In-process engines implement [`LocalEngine`]; engines behind a network API
//! implement [`RemoteEngine`]. The orchestrator holds them as the tagged
//! [`Engine`] variant and dispatches on the tag.

pub mod local;
pub mod remote;

use std::sync::Arc;

pub use local::LocalEngine;
pub use remote::RemoteEngine;

use crate::types::EngineKind;

/// A registered engine, tagged by execution model.
#[derive(Clone)]
pub enum Engine {
    Local(Arc<dyn LocalEngine>),
    Remote(Arc<dyn RemoteEngine>),
}

impl Engine {
    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::Local(engine) => engine.kind(),
            Engine::Remote(engine) => engine.kind(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Local(e) => f.debug_tuple("Local").field(&e.kind()).finish(),
            Engine::Remote(e) => f.debug_tuple("Remote").field(&e.kind()).finish(),
        }
    }
}
