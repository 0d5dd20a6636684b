// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cached liveness checks for the remote engines.
//!
//! The cache is the only state shared across concurrent batches. Each engine
//! has its own async mutex, held across the probe call so that concurrent
//! cache misses for the same engine collapse into one network round trip.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use triage_core::{EngineKind, RemoteEngine};

/// Upper bound on a single probe when none is configured, on top of the
/// engine's own timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    available: bool,
    checked_at: Instant,
}

struct Slot {
    engine: Arc<dyn RemoteEngine>,
    entry: Mutex<Option<CacheEntry>>,
}

/// TTL-cached availability of the registered remote engines.
pub struct AvailabilityProbe {
    ttl: Duration,
    probe_timeout: Duration,
    slots: HashMap<EngineKind, Slot>,
}

impl std::fmt::Debug for AvailabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityProbe")
            .field("ttl", &self.ttl)
            .field("engines", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AvailabilityProbe {
    pub fn new(ttl: Duration, engines: impl IntoIterator<Item = Arc<dyn RemoteEngine>>) -> Self {
        let slots = engines
            .into_iter()
            .map(|engine| {
                (
                    engine.kind(),
                    Slot {
                        engine,
                        entry: Mutex::new(None),
                    },
                )
            })
            .collect();
        Self {
            ttl,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            slots,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Whether an engine is registered at all.
    pub fn is_registered(&self, kind: EngineKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Returns the cached availability, probing on a miss or expiry.
    ///
    /// Unregistered engines are unavailable. Probe errors and timeouts count
    /// as unavailable.
    pub async fn is_available(&self, kind: EngineKind) -> bool {
        let Some(slot) = self.slots.get(&kind) else {
            return false;
        };

        let mut entry = slot.entry.lock().await;
        if let Some(cached) = *entry {
            if cached.checked_at.elapsed() < self.ttl {
                debug!(engine = %kind, available = cached.available, "probe cache hit");
                return cached.available;
            }
        }

        let available = tokio::time::timeout(self.probe_timeout, slot.engine.probe())
            .await
            .unwrap_or(false);
        info!(engine = %kind, available, "engine probed");
        *entry = Some(CacheEntry {
            available,
            checked_at: Instant::now(),
        });
        available
    }

    /// Records that an engine refused service; the entry expires with the TTL.
    pub async fn mark_unavailable(&self, kind: EngineKind) {
        if let Some(slot) = self.slots.get(&kind) {
            *slot.entry.lock().await = Some(CacheEntry {
                available: false,
                checked_at: Instant::now(),
            });
            info!(engine = %kind, "engine marked unavailable");
        }
    }

    /// Drops every cached entry.
    pub async fn invalidate(&self) {
        for slot in self.slots.values() {
            *slot.entry.lock().await = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_test_utils::ScriptedRemoteEngine;

    fn probe_with(engine: ScriptedRemoteEngine) -> (AvailabilityProbe, Arc<ScriptedRemoteEngine>) {
        let engine = Arc::new(engine);
        let probe = AvailabilityProbe::new(
            Duration::from_secs(30),
            [engine.clone() as Arc<dyn RemoteEngine>],
        );
        (probe, engine)
    }

    #[tokio::test(start_paused = true)]
    async fn result_is_cached_until_ttl_expires() {
        let (probe, engine) = probe_with(ScriptedRemoteEngine::new(EngineKind::LocalLlm));

        assert!(probe.is_available(EngineKind::LocalLlm).await);
        assert!(probe.is_available(EngineKind::LocalLlm).await);
        assert_eq!(engine.probe_count(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(probe.is_available(EngineKind::LocalLlm).await);
        assert_eq!(engine.probe_count(), 2);
    }

    #[tokio::test]
    async fn unregistered_engine_is_unavailable() {
        let (probe, _) = probe_with(ScriptedRemoteEngine::new(EngineKind::LocalLlm));
        assert!(!probe.is_registered(EngineKind::CloudLlm));
        assert!(!probe.is_available(EngineKind::CloudLlm).await);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_probe_times_out_as_unavailable() {
        let (probe, _) = probe_with(
            ScriptedRemoteEngine::new(EngineKind::CloudLlm).with_probe_delay(Duration::from_secs(60)),
        );
        let probe = probe.with_probe_timeout(Duration::from_secs(1));
        assert!(!probe.is_available(EngineKind::CloudLlm).await);
    }

    #[tokio::test]
    async fn mark_unavailable_overrides_cache() {
        let (probe, engine) = probe_with(ScriptedRemoteEngine::new(EngineKind::CloudLlm));
        assert!(probe.is_available(EngineKind::CloudLlm).await);
        probe.mark_unavailable(EngineKind::CloudLlm).await;
        assert!(!probe.is_available(EngineKind::CloudLlm).await);
        assert_eq!(engine.probe_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_probe_once() {
        let (probe, engine) = probe_with(
            ScriptedRemoteEngine::new(EngineKind::LocalLlm).with_probe_delay(Duration::from_millis(20)),
        );
        let probe = Arc::new(probe);
        let checks = (0..8).map(|_| {
            let probe = probe.clone();
            tokio::spawn(async move { probe.is_available(EngineKind::LocalLlm).await })
        });
        for check in futures::future::join_all(checks).await {
            assert!(check.unwrap());
        }
        assert_eq!(engine.probe_count(), 1);
    }
}
