// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic topic, incident, and responsible heuristics.
//!
//! These stand in for language-model labels on documents outside the LLM
//! sample, or when an LLM call fails.

use std::sync::LazyLock;

use triage_core::{IncidentType, Responsible, Topic};

use crate::tables::{KeywordTable, Score};

/// Topic tables in declaration order; equal hit counts keep the earlier topic.
static TOPICS: LazyLock<Vec<(Topic, KeywordTable)>> = LazyLock::new(|| {
    vec![
        (
            Topic::Fiber,
            KeywordTable::new(&[
                ("fibre|fiber|ftth", 1),
                ("adsl|vdsl|ligne fixe|reseau fixe", 1),
                ("internet", 1),
            ]),
        ),
        (
            Topic::Mobile,
            KeywordTable::new(&[
                ("mobile|smartphone|portable", 1),
                ("4g|5g|data|roaming", 1),
                ("carte sim|sim|sms|appels?", 1),
            ]),
        ),
        (
            Topic::Network,
            KeywordTable::new(&[
                ("reseaux?|antenne|couverture|zone blanche", 1),
                ("signal|connexion|barres?", 1),
            ]),
        ),
        (
            Topic::Router,
            KeywordTable::new(&[
                ("box|freebox|modem|routeur", 1),
                ("decodeur|player|server", 1),
            ]),
        ),
        (
            Topic::Wifi,
            KeywordTable::new(&[("wifi|wi-fi|repeteur", 1)]),
        ),
        (
            Topic::Billing,
            KeywordTable::new(&[
                ("factures?|facturation|surfacturation", 1),
                ("paiement|prelevements?|preleve|debitee?", 1),
                ("montant|prix|tarif|cout|euros?|rembourse(?:ment)?", 1),
                ("abonnement", 1),
            ]),
        ),
        (
            Topic::CustomerService,
            KeywordTable::new(&[
                ("sav|service client|hotline|3244", 1),
                ("conseillere?|attente|personne ne repond", 1),
            ]),
        ),
        (
            Topic::TechnicalSupport,
            KeywordTable::new(&[
                ("support|assistance|technicien", 1),
                ("intervention|depannage|rendez-vous|rdv", 1),
            ]),
        ),
        (
            Topic::Promotion,
            KeywordTable::new(&[
                ("promos?|promotions?|offres?|reductions?", 1),
                ("vente privee|black friday|nouveau forfait", 1),
            ]),
        ),
    ]
});

/// Incident tables in priority order; the first matching table wins.
static INCIDENTS: LazyLock<Vec<(IncidentType, KeywordTable)>> = LazyLock::new(|| {
    vec![
        (
            IncidentType::RouterFault,
            KeywordTable::new(&[
                (
                    "(?:box|freebox|modem|routeur|decodeur)(?: \\S+){0,3} (?:hs|plante|redemarre|bug|bloquee?|clignote)",
                    1,
                ),
                ("redemarre en boucle|clignote|ne s'allume plus", 1),
            ]),
        ),
        (
            IncidentType::ConnectionOutage,
            KeywordTable::new(&[
                ("panne|coupure|coupee?|deconnexion|deconnecte|hs", 1),
                ("(?:pas|plus) de (?:connexion|reseau|internet)|plus d'internet", 1),
                ("sans (?:connexion|internet|reseau)|aucune? (?:connexion|reseau|internet)", 1),
            ]),
        ),
        (
            IncidentType::SlowSpeed,
            KeywordTable::new(&[
                ("lente?|lenteur|ralenti(?:ssement)?|rame", 1),
                ("debit|vitesse", 1),
            ]),
        ),
        (
            IncidentType::BillingIssue,
            KeywordTable::new(&[
                ("factures?|facturation|surfacturation|prelevements?", 1),
                ("montant errone|trop (?:cher|paye|facture)|debitee? deux fois", 1),
                ("rembourse(?:ment|z)?", 1),
            ]),
        ),
        (
            IncidentType::MobileIssue,
            KeywordTable::new(&[
                ("4g|5g|carte sim|sim|sms|appels?", 1),
                ("forfait mobile|reseau mobile|portable", 1),
            ]),
        ),
        (
            IncidentType::ActivationDelay,
            KeywordTable::new(&[
                ("activation|activer|installation|installer", 1),
                ("raccordement|raccorde|mise en service|portabilite", 1),
                ("en attente", 1),
            ]),
        ),
    ]
});

static INFORMATION: LazyLock<KeywordTable> = LazyLock::new(|| {
    KeywordTable::new(&[
        ("comment|pourquoi|quand|quel(?:le)?s?|est-ce que", 1),
        ("savoir|renseigner|renseignements?|informations?|question", 1),
    ])
});

/// Dominant topic and its score, or [`Topic::Other`] when nothing matched.
pub fn detect_topic(folded: &str) -> (Topic, Score) {
    let mut best = (Topic::Other, Score::default());
    for (topic, table) in TOPICS.iter() {
        let score = table.score(folded);
        if score.hits > best.1.hits {
            best = (*topic, score);
        }
    }
    best
}

/// Incident type for a text already judged a claim (or not).
///
/// Claims take the first matching incident table, else `Unspecified`.
/// Non-claims are `Information` when phrased as a question, else `None`.
pub fn detect_incident(folded: &str, is_claim: bool) -> (IncidentType, Score) {
    if !is_claim {
        let score = INFORMATION.score(folded);
        return if folded.contains('?') || !score.is_zero() {
            (IncidentType::Information, score)
        } else {
            (IncidentType::None, Score::default())
        };
    }
    INCIDENTS
        .iter()
        .map(|(incident, table)| (*incident, table.score(folded)))
        .find(|(_, score)| !score.is_zero())
        .unwrap_or((IncidentType::Unspecified, Score::default()))
}

/// Department owning an incident; unspecified incidents route by topic.
pub fn responsible_for(incident: IncidentType, topic: Topic) -> Responsible {
    match incident {
        IncidentType::ConnectionOutage
        | IncidentType::RouterFault
        | IncidentType::SlowSpeed
        | IncidentType::ActivationDelay => Responsible::Technical,
        IncidentType::MobileIssue => Responsible::Network,
        IncidentType::BillingIssue => Responsible::Commercial,
        IncidentType::Information => Responsible::CustomerService,
        IncidentType::None => Responsible::None,
        IncidentType::Unspecified => match topic {
            Topic::Billing | Topic::Promotion => Responsible::Commercial,
            Topic::Network | Topic::Mobile => Responsible::Network,
            Topic::CustomerService => Responsible::CustomerService,
            _ => Responsible::Technical,
        },
    }
}
