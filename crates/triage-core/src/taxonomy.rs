// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed label taxonomy.
//!
//! Every label set is a closed enum. Engines that speak a text protocol
//! (the LLM engines) go through [`Label::parse_wire`], which accepts the
//! canonical English snake_case names plus the French vocabulary used by the
//! operator's historical prompts, and rejects everything else.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::types::Dimension;

/// Polarity of the feedback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Ordered urgency scale, `Low < Medium < High < Critical`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const LOWEST: Urgency = Urgency::Low;
    pub const HIGHEST: Urgency = Urgency::Critical;
}

/// Subject of the feedback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Fiber,
    Mobile,
    Network,
    Router,
    Wifi,
    Billing,
    CustomerService,
    TechnicalSupport,
    Promotion,
    Other,
}

/// Kind of incident described, if any.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    ConnectionOutage,
    RouterFault,
    BillingIssue,
    MobileIssue,
    ActivationDelay,
    SlowSpeed,
    Information,
    None,
    Unspecified,
}

/// Department expected to handle the feedback.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Responsible {
    Technical,
    Commercial,
    Network,
    CustomerService,
    /// Neutral default for texts that need no follow-up.
    #[default]
    None,
}

/// A label value for one of the six labelled dimensions.
///
/// `Confidence` is a number, not a label, and has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "value", rename_all = "snake_case")]
pub enum Label {
    Sentiment(Sentiment),
    Claim(bool),
    Urgency(Urgency),
    Topic(Topic),
    Incident(IncidentType),
    Responsible(Responsible),
}

impl Label {
    /// The dimension this label belongs to.
    pub fn dimension(&self) -> Dimension {
        match self {
            Label::Sentiment(_) => Dimension::Sentiment,
            Label::Claim(_) => Dimension::IsClaim,
            Label::Urgency(_) => Dimension::Urgency,
            Label::Topic(_) => Dimension::Topic,
            Label::Incident(_) => Dimension::IncidentType,
            Label::Responsible(_) => Dimension::Responsible,
        }
    }

    /// Parses a textual label for `dimension`.
    ///
    /// Matching is case-insensitive and treats spaces and hyphens as
    /// underscores. Returns `None` for values outside the taxonomy and for
    /// the `Confidence` dimension.
    pub fn parse_wire(dimension: Dimension, raw: &str) -> Option<Label> {
        let key = wire_key(raw);
        let key = key.as_str();
        match dimension {
            Dimension::Sentiment => parse_sentiment(key).map(Label::Sentiment),
            Dimension::IsClaim => parse_claim(key).map(Label::Claim),
            Dimension::Urgency => parse_urgency(key).map(Label::Urgency),
            Dimension::Topic => parse_topic(key).map(Label::Topic),
            Dimension::IncidentType => parse_incident(key).map(Label::Incident),
            Dimension::Responsible => parse_responsible(key).map(Label::Responsible),
            Dimension::Confidence => None,
        }
    }

    /// Canonical wire value (snake_case English, `yes`/`no` for claims).
    pub fn wire_value(&self) -> String {
        match self {
            Label::Sentiment(v) => v.to_string(),
            Label::Claim(true) => "yes".to_string(),
            Label::Claim(false) => "no".to_string(),
            Label::Urgency(v) => v.to_string(),
            Label::Topic(v) => v.to_string(),
            Label::Incident(v) => v.to_string(),
            Label::Responsible(v) => v.to_string(),
        }
    }
}

fn wire_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            'é' | 'è' | 'ê' => 'e',
            'à' | 'â' => 'a',
            'î' => 'i',
            'ô' => 'o',
            'û' | 'ù' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn parse_sentiment(key: &str) -> Option<Sentiment> {
    match key {
        "positive" | "positif" | "pos" => Some(Sentiment::Positive),
        "neutral" | "neutre" | "neu" => Some(Sentiment::Neutral),
        "negative" | "negatif" | "neg" => Some(Sentiment::Negative),
        _ => None,
    }
}

fn parse_claim(key: &str) -> Option<bool> {
    match key {
        "yes" | "true" | "oui" | "1" => Some(true),
        "no" | "false" | "non" | "0" => Some(false),
        _ => None,
    }
}

fn parse_urgency(key: &str) -> Option<Urgency> {
    match key {
        "low" | "faible" | "basse" => Some(Urgency::Low),
        "medium" | "moyenne" | "moyen" => Some(Urgency::Medium),
        "high" | "haute" | "elevee" => Some(Urgency::High),
        "critical" | "critique" => Some(Urgency::Critical),
        _ => None,
    }
}

fn parse_topic(key: &str) -> Option<Topic> {
    match key {
        "fiber" | "fibre" => Some(Topic::Fiber),
        "mobile" => Some(Topic::Mobile),
        "network" | "reseau" => Some(Topic::Network),
        "router" | "box" | "freebox" => Some(Topic::Router),
        "wifi" => Some(Topic::Wifi),
        "billing" | "facture" | "facturation" => Some(Topic::Billing),
        "customer_service" | "service_client" | "sav" => Some(Topic::CustomerService),
        "technical_support" | "support_technique" | "support" => Some(Topic::TechnicalSupport),
        "promotion" | "offre" => Some(Topic::Promotion),
        "other" | "autre" => Some(Topic::Other),
        _ => None,
    }
}

fn parse_incident(key: &str) -> Option<IncidentType> {
    match key {
        "connection_outage" | "panne_connexion" => Some(IncidentType::ConnectionOutage),
        "router_fault" | "bug_freebox" | "panne_box" => Some(IncidentType::RouterFault),
        "billing_issue" | "probleme_facturation" => Some(IncidentType::BillingIssue),
        "mobile_issue" | "probleme_mobile" => Some(IncidentType::MobileIssue),
        "activation_delay" | "retard_activation" => Some(IncidentType::ActivationDelay),
        "slow_speed" | "debit_insuffisant" => Some(IncidentType::SlowSpeed),
        "information" => Some(IncidentType::Information),
        "none" | "aucun" => Some(IncidentType::None),
        "unspecified" | "non_specifie" => Some(IncidentType::Unspecified),
        _ => None,
    }
}

fn parse_responsible(key: &str) -> Option<Responsible> {
    match key {
        "technical" | "technique" | "service_technique" => Some(Responsible::Technical),
        "commercial" | "service_commercial" => Some(Responsible::Commercial),
        "network" | "reseau" | "service_reseau" => Some(Responsible::Network),
        "customer_service" | "service_client" | "sav" => Some(Responsible::CustomerService),
        "none" | "aucun" => Some(Responsible::None),
        _ => None,
    }
}
