// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification prompt.

use std::fmt::Write;

use strum::IntoEnumIterator;
use triage_core::{IncidentType, Responsible, Sentiment, Topic, Urgency};

/// Builds the single-document classification prompt.
///
/// The prompt lists every allowed value per dimension and asks for one JSON
/// object and nothing else.
pub fn build_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(1024 + text.len());
    prompt.push_str(
        "You classify customer messages sent to a telecom operator on social media.\n\
         Messages are usually in French. Answer with exactly one JSON object and no other text.\n\n\
         Allowed values:\n",
    );
    push_options(&mut prompt, "sentiment", Sentiment::iter());
    let _ = writeln!(prompt, "- is_claim: yes | no");
    push_options(&mut prompt, "urgency", Urgency::iter());
    push_options(&mut prompt, "topic", Topic::iter());
    push_options(&mut prompt, "incident_type", IncidentType::iter());
    push_options(&mut prompt, "responsible", Responsible::iter());
    prompt.push_str("- confidence: a number between 0.0 and 1.0\n\n");
    prompt.push_str(
        "Guidelines:\n\
         - is_claim is yes as soon as an outage, bug, billing problem or dissatisfaction is mentioned.\n\
         - urgency is critical for a total loss of service, high for blocking problems (\"urgent\", \"impossible\", \"blocked\").\n\
         - incident_type describes the problem; use unspecified only when it cannot be determined, none when there is no problem.\n\
         - when is_claim is no, urgency is low.\n\n",
    );
    prompt.push_str("Message:\n\"\"\"\n");
    prompt.push_str(text);
    prompt.push_str("\n\"\"\"\n\n");
    prompt.push_str(
        "Format:\n\
         {\"sentiment\": \"negative\", \"is_claim\": \"yes\", \"urgency\": \"high\", \
         \"topic\": \"network\", \"incident_type\": \"connection_outage\", \
         \"responsible\": \"technical\", \"confidence\": 0.9}\n",
    );
    prompt
}

fn push_options<T: std::fmt::Display>(prompt: &mut String, name: &str, values: impl Iterator<Item = T>) {
    let values: Vec<String> = values.map(|v| v.to_string()).collect();
    let _ = writeln!(prompt, "- {name}: {}", values.join(" | "));
}
