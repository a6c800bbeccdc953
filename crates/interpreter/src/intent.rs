//! Intent catalog and the rule-based classifier.
//!
//! Classification is a pure function of the message text: the rule table in
//! [`locale::patterns`](crate::locale::patterns) produces raw scores, then
//! [`adjust`] applies the cross-intent heuristics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    locale::{
        keywords::{EXACT_TRIGGERS, GREETINGS},
        patterns::{
            HOW_MUCH_EARNED, HOW_MUCH_SPENT, INTENT_RULES, TRANSFER_DIRECTION, is_symbols_only,
        },
    },
    text,
};

/// Below this score a message is not understood.
pub const MIN_CONFIDENCE: f64 = 0.4;
const GREETING_CONFIDENCE: f64 = 0.3;
const BASE_SCORE: f64 = 0.7;
const TRANSFER_BOOST: f64 = 0.15;
const QUESTION_BOOST: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    RegistrarGasto,
    RegistrarIngreso,
    Transferencia,
    PagarTarjeta,
    ConsultarSaldo,
    ConsultarGastos,
    ConsultarIngresos,
    UltimosMovimientos,
    ResumenMes,
    Ayuda,
    Menu,
    Cancelar,
    Desconocido,
}

impl Intent {
    pub const ALL: [Intent; 13] = [
        Intent::RegistrarGasto,
        Intent::RegistrarIngreso,
        Intent::Transferencia,
        Intent::PagarTarjeta,
        Intent::ConsultarSaldo,
        Intent::ConsultarGastos,
        Intent::ConsultarIngresos,
        Intent::UltimosMovimientos,
        Intent::ResumenMes,
        Intent::Ayuda,
        Intent::Menu,
        Intent::Cancelar,
        Intent::Desconocido,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Intent::RegistrarGasto => "REGISTRAR_GASTO",
            Intent::RegistrarIngreso => "REGISTRAR_INGRESO",
            Intent::Transferencia => "TRANSFERENCIA",
            Intent::PagarTarjeta => "PAGAR_TARJETA",
            Intent::ConsultarSaldo => "CONSULTAR_SALDO",
            Intent::ConsultarGastos => "CONSULTAR_GASTOS",
            Intent::ConsultarIngresos => "CONSULTAR_INGRESOS",
            Intent::UltimosMovimientos => "ULTIMOS_MOVIMIENTOS",
            Intent::ResumenMes => "RESUMEN_MES",
            Intent::Ayuda => "AYUDA",
            Intent::Menu => "MENU",
            Intent::Cancelar => "CANCELAR",
            Intent::Desconocido => "DESCONOCIDO",
        }
    }

    /// Intents that change the ledger and therefore need confirmation.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Intent::RegistrarGasto
                | Intent::RegistrarIngreso
                | Intent::Transferencia
                | Intent::PagarTarjeta
        )
    }

    /// Queries answered straight away.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Intent::ConsultarSaldo
                | Intent::ConsultarGastos
                | Intent::ConsultarIngresos
                | Intent::UltimosMovimientos
                | Intent::ResumenMes
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Intent {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == code)
            .ok_or_else(|| format!("unknown intent: {value}"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub matched_pattern_id: Option<String>,
}

/// Best score per intent and the rule that produced it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scores(BTreeMap<Intent, (f64, String)>);

impl Scores {
    #[must_use]
    pub fn get(&self, intent: Intent) -> f64 {
        self.0.get(&intent).map_or(0.0, |(score, _)| *score)
    }

    /// Keep the higher of the current and the new score.
    pub fn offer(&mut self, intent: Intent, score: f64, pattern_id: &str) {
        let score = score.clamp(0.0, 1.0);
        match self.0.get(&intent) {
            Some((current, _)) if *current >= score => {}
            _ => {
                self.0.insert(intent, (score, pattern_id.to_string()));
            }
        }
    }

    fn set(&mut self, intent: Intent, score: f64, pattern_id: String) {
        self.0.insert(intent, (score.clamp(0.0, 1.0), pattern_id));
    }

    fn bump(&mut self, intent: Intent, delta: f64) {
        if let Some((score, _)) = self.0.get_mut(&intent) {
            *score = (*score + delta).clamp(0.0, 1.0);
        }
    }

    /// Highest score; ties go to the intent declared first.
    fn best(&self) -> Option<(Intent, f64, &str)> {
        let mut best: Option<(Intent, f64, &str)> = None;
        for (intent, (score, id)) in &self.0 {
            if best.is_none_or(|(_, top, _)| *score > top) {
                best = Some((*intent, *score, id.as_str()));
            }
        }
        best
    }
}

/// Score of a single rule hit: base × weight, +0.1 past 10 matched chars and
/// another +0.1 past 20.
#[must_use]
pub fn rule_score(weight: f64, matched_len: usize) -> f64 {
    let mut score = BASE_SCORE * weight;
    if matched_len > 10 {
        score += 0.1;
    }
    if matched_len > 20 {
        score += 0.1;
    }
    score.min(1.0)
}

/// Raw rule scores before adjustments.
#[must_use]
pub fn score_rules(normalized: &str) -> Scores {
    let mut scores = Scores::default();
    for rule in INTENT_RULES.iter() {
        if let Some(found) = rule.pattern.find(normalized) {
            let matched_len = found.as_str().chars().count();
            scores.offer(rule.intent, rule_score(rule.weight, matched_len), rule.id);
        }
    }
    scores
}

/// Cross-intent heuristics applied after rule scoring.
pub fn adjust(normalized: &str, scores: &mut Scores) {
    if scores.get(Intent::Transferencia) > 0.0 && TRANSFER_DIRECTION.is_match(normalized) {
        scores.bump(Intent::Transferencia, TRANSFER_BOOST);
    }

    for (pattern, write, read) in [
        (&*HOW_MUCH_SPENT, Intent::RegistrarGasto, Intent::ConsultarGastos),
        (&*HOW_MUCH_EARNED, Intent::RegistrarIngreso, Intent::ConsultarIngresos),
    ] {
        if pattern.is_match(normalized) {
            let moved = scores.get(write).max(scores.get(read));
            if moved > 0.0 {
                scores.set(read, moved, format!("{}.pregunta", read.as_str().to_lowercase()));
            }
            scores.0.remove(&write);
        }
    }

    if normalized.trim_end().ends_with('?') {
        for intent in Intent::ALL.into_iter().filter(|i| i.is_read()) {
            scores.bump(intent, QUESTION_BOOST);
        }
    }

    let bare = text::bare(normalized);
    if let Some((word, intent)) = EXACT_TRIGGERS.iter().find(|(word, _)| *word == bare) {
        scores.set(*intent, 1.0, format!("exacto.{word}"));
    }
}

fn is_greeting(normalized: &str) -> bool {
    let bare = text::bare(normalized);
    is_symbols_only(normalized) || GREETINGS.contains(&bare)
}

/// Classify one message.
#[must_use]
pub fn classify(message: &str) -> IntentClassification {
    let normalized = text::normalize(message);

    if is_greeting(&normalized) {
        return IntentClassification {
            intent: Intent::Ayuda,
            confidence: GREETING_CONFIDENCE,
            matched_pattern_id: Some("saludo".to_string()),
        };
    }

    let mut scores = score_rules(&normalized);
    adjust(&normalized, &mut scores);

    match scores.best() {
        Some((intent, score, id)) if score >= MIN_CONFIDENCE => IntentClassification {
            intent,
            confidence: score,
            matched_pattern_id: Some(id.to_string()),
        },
        Some((_, score, _)) => IntentClassification {
            intent: Intent::Desconocido,
            confidence: score,
            matched_pattern_id: None,
        },
        None => IntentClassification {
            intent: Intent::Desconocido,
            confidence: 0.0,
            matched_pattern_id: None,
        },
    }
}
