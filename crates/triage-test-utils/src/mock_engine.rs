// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted engines implementing [`LocalEngine`] and [`RemoteEngine`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use triage_core::{
    EngineFailure, EngineKind, EngineResult, IncidentType, Label, LocalEngine, NormalizedText,
    RemoteEngine, Responsible, Sentiment, Topic, Urgency,
};

/// Labels a scripted LLM returns unless told otherwise.
pub fn default_llm_labels() -> Vec<(Label, f32)> {
    vec![
        (Label::Sentiment(Sentiment::Negative), 0.9),
        (Label::Claim(true), 0.9),
        (Label::Urgency(Urgency::High), 0.9),
        (Label::Topic(Topic::Fiber), 0.9),
        (Label::Incident(IncidentType::ConnectionOutage), 0.9),
        (Label::Responsible(Responsible::Technical), 0.9),
    ]
}

fn build(kind: EngineKind, labels: &[(Label, f32)]) -> EngineResult {
    labels
        .iter()
        .fold(EngineResult::ok(kind), |r, (label, conf)| r.with(*label, *conf))
}

/// A remote engine whose behaviour is fixed up front.
///
/// Per-text rules match when the normalized text contains the needle; the
/// first matching rule applies.
pub struct ScriptedRemoteEngine {
    kind: EngineKind,
    available: bool,
    probe_delay: Duration,
    delay: Duration,
    text_delays: Vec<(String, Duration)>,
    failure: Option<EngineFailure>,
    text_failures: Vec<(String, EngineFailure)>,
    labels: Vec<(Label, f32)>,
    probes: AtomicUsize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedRemoteEngine {
    /// Available, instant, and returning [`default_llm_labels`].
    pub fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            available: true,
            probe_delay: Duration::ZERO,
            delay: Duration::ZERO,
            text_delays: Vec::new(),
            failure: None,
            text_failures: Vec::new(),
            labels: default_llm_labels(),
            probes: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Probe reports unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Calls on texts containing `needle` sleep this long instead.
    pub fn with_delay_for(mut self, needle: &str, delay: Duration) -> Self {
        self.text_delays.push((needle.to_string(), delay));
        self
    }

    /// Every call fails.
    pub fn failing(mut self, failure: EngineFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Calls on texts containing `needle` fail.
    pub fn failing_for(mut self, needle: &str, failure: EngineFailure) -> Self {
        self.text_failures.push((needle.to_string(), failure));
        self
    }

    pub fn with_labels(mut self, labels: Vec<(Label, f32)>) -> Self {
        self.labels = labels;
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of documents classified (including failed and timed-out ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of documents ever in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn classify_one(&self, text: &NormalizedText) -> EngineResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        let delay = self
            .text_delays
            .iter()
            .find(|(needle, _)| text.clean_text.contains(needle.as_str()))
            .map_or(self.delay, |(_, d)| *d);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .text_failures
            .iter()
            .find(|(needle, _)| text.clean_text.contains(needle.as_str()))
            .map(|(_, f)| f.clone())
            .or_else(|| self.failure.clone());
        match failure {
            Some(failure) => EngineResult::failed(self.kind, failure),
            None => build(self.kind, &self.labels),
        }
    }
}

/// Decrements the in-flight counter on drop, including when the call is
/// abandoned by a timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteEngine for ScriptedRemoteEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn classify_batch(&self, texts: &[NormalizedText], _timeout: Duration) -> Vec<EngineResult> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify_one(text).await);
        }
        results
    }

    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !self.probe_delay.is_zero() {
            tokio::time::sleep(self.probe_delay).await;
        }
        self.available
    }
}

/// A local engine returning fixed labels, or failing every document.
pub struct FixedLocalEngine {
    kind: EngineKind,
    labels: Vec<(Label, f32)>,
    failure: Option<EngineFailure>,
    calls: AtomicUsize,
}

impl FixedLocalEngine {
    pub fn new(kind: EngineKind, labels: Vec<(Label, f32)>) -> Self {
        Self {
            kind,
            labels,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A rule engine calling every text a low-urgency, no-incident non-claim.
    pub fn quiet_rules() -> Self {
        Self::new(
            EngineKind::Rule,
            vec![
                (Label::Claim(false), 0.7),
                (Label::Urgency(Urgency::Low), 0.7),
                (Label::Topic(Topic::Other), 0.42),
                (Label::Incident(IncidentType::None), 0.42),
                (Label::Responsible(Responsible::None), 0.42),
            ],
        )
    }

    /// A transformer calling every text neutral.
    pub fn neutral_transformer() -> Self {
        Self::new(
            EngineKind::Transformer,
            vec![(Label::Sentiment(Sentiment::Neutral), 0.6)],
        )
    }

    /// Fails every document with [`EngineFailure::CallFailed`].
    pub fn broken(kind: EngineKind) -> Self {
        Self {
            kind,
            labels: Vec::new(),
            failure: Some(EngineFailure::CallFailed("scripted failure".into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LocalEngine for FixedLocalEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn classify(&self, _text: &NormalizedText) -> EngineResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(failure) => EngineResult::failed(self.kind, failure.clone()),
            None => build(self.kind, &self.labels),
        }
    }
}
