//! Entity extraction.
//!
//! Each extractor claims a span of the normalized message, which is then
//! blanked out so later extractors (and the note synthesizer) never see it
//! twice. Blanking replaces bytes with spaces, so spans stay valid.

use std::ops::Range;

use chrono::NaiveDate;

use crate::{
    entities::ParsedEntities,
    intent::Intent,
    locale::keywords::{ARS_WORDS, USD_WORDS, is_one_of},
    text,
};

pub mod amount;
pub mod card;
pub mod date;
pub mod installments;
pub mod note;
pub mod refs;

fn mask(text: &mut String, span: Range<usize>) {
    let blank = " ".repeat(span.len());
    text.replace_range(span, &blank);
}

fn currency_spans(text: &str) -> Vec<Range<usize>> {
    refs::tokenize(text)
        .into_iter()
        .filter(|token| {
            let raw = text[token.span.clone()]
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '$');
            is_one_of(raw, USD_WORDS) || is_one_of(raw, ARS_WORDS)
        })
        .map(|token| token.span)
        .collect()
}

/// Everything the message states for `intent`. References come back as
/// free text; nothing is resolved against the user's data here.
#[must_use]
pub fn extract(message: &str, intent: Intent, today: NaiveDate) -> ParsedEntities {
    let (explicit_note, rest) = note::explicit_note(message);
    let mut masked = text::normalize(&rest);
    let mut entities = ParsedEntities {
        currency: amount::detect_currency(&masked),
        ..Default::default()
    };

    if intent == Intent::UltimosMovimientos
        && let Some((limit, span)) = installments::extract_limit(&masked)
    {
        entities.limit = Some(limit);
        mask(&mut masked, span);
    }
    if matches!(
        intent,
        Intent::ConsultarGastos
            | Intent::ConsultarIngresos
            | Intent::UltimosMovimientos
            | Intent::ResumenMes
    ) && let Some(found) = date::extract_period(&masked, today)
    {
        entities.period = Some(found.period);
        mask(&mut masked, found.span);
    }

    if intent == Intent::PagarTarjeta {
        if let Some((month, span)) = card::extract_statement_month(&masked, today) {
            entities.statement_month = Some(month);
            mask(&mut masked, span);
        }
        if let Some((tax, span)) = card::extract_stamp_tax(&masked) {
            entities.stamp_tax_amount = Some(tax);
            mask(&mut masked, span);
        }
    }

    if intent == Intent::RegistrarGasto
        && let Some((count, span)) = installments::extract_installments(&masked)
    {
        entities.installments = Some(count);
        mask(&mut masked, span);
    }

    if intent.is_write() {
        if let Some(found) = date::extract_date(&masked, today) {
            entities.date = Some(found.date);
            mask(&mut masked, found.span);
        }
        if let Some(found) = amount::extract_amount(&masked) {
            entities.amount = Some(found.amount);
            mask(&mut masked, found.span);
        }
    }

    for span in currency_spans(&masked) {
        mask(&mut masked, span);
    }
    if let Some(span) = card::card_kind_span(&masked) {
        mask(&mut masked, span);
    }

    let found = refs::extract_refs(intent, &masked);
    for span in &found.spans {
        mask(&mut masked, span.clone());
    }
    entities.account = found.account;
    entities.category = found.category;
    entities.from_account = found.from_account;
    entities.to_account = found.to_account;
    entities.target_card = found.target_card;

    entities.note = explicit_note.or_else(|| {
        intent
            .is_write()
            .then(|| note::synthesize(&refs::tokenize(&masked)))
            .flatten()
    });
    entities
}

#[cfg(test)]
mod tests {
    use ledger::{Currency, Money};

    use super::*;
    use crate::entities::YearMonth;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn text_of(slot: &Option<crate::entities::EntityRef>) -> Option<&str> {
        slot.as_ref().and_then(|r| r.text.as_deref())
    }

    #[test]
    fn simple_expense() {
        let entities = extract("gasté 500 en comida", Intent::RegistrarGasto, today());
        assert_eq!(entities.amount, Some(Money::from_major(500)));
        assert_eq!(entities.currency, None);
        assert_eq!(text_of(&entities.category), Some("comida"));
        assert_eq!(entities.account, None);
        assert_eq!(entities.date, None);
        assert_eq!(entities.note, None);
    }

    #[test]
    fn expense_with_everything() {
        let entities = extract(
            "ayer gasté 1.500,50 pesos de nafta con la tarjeta de crédito visa",
            Intent::RegistrarGasto,
            today(),
        );
        assert_eq!(entities.amount, Some(Money::new(150_050)));
        assert_eq!(entities.currency, Some(Currency::Ars));
        assert_eq!(entities.date, NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(text_of(&entities.category), Some("nafta"));
        assert_eq!(text_of(&entities.account), Some("visa"));
        assert_eq!(entities.note, None);
    }

    #[test]
    fn installment_purchase() {
        let entities = extract(
            "compré una heladera 900 lucas en 12 cuotas con la visa",
            Intent::RegistrarGasto,
            today(),
        );
        assert_eq!(entities.amount, Some(Money::from_major(900_000)));
        assert_eq!(entities.installments, Some(12));
        assert_eq!(text_of(&entities.account), Some("visa"));
        assert_eq!(text_of(&entities.category), Some("heladera"));
    }

    #[test]
    fn synthesized_and_explicit_notes() {
        let entities = extract(
            "gasté 8000 en salidas birra con amigos en efectivo",
            Intent::RegistrarGasto,
            today(),
        );
        assert_eq!(text_of(&entities.category), Some("salidas birra"));
        assert_eq!(text_of(&entities.account), Some("amigos"));

        let entities = extract("pizza y helado 4500 en comida", Intent::RegistrarGasto, today());
        assert_eq!(text_of(&entities.category), Some("comida"));
        assert_eq!(entities.note.as_deref(), Some("pizza helado"));

        let entities = extract(
            "gasté 500 en comida \"Almuerzo con Pía\"",
            Intent::RegistrarGasto,
            today(),
        );
        assert_eq!(entities.note.as_deref(), Some("Almuerzo con Pía"));
        assert_eq!(text_of(&entities.category), Some("comida"));
    }

    #[test]
    fn transfer() {
        let entities = extract("transferí 10000 de galicia a mp", Intent::Transferencia, today());
        assert_eq!(entities.amount, Some(Money::from_major(10_000)));
        assert_eq!(text_of(&entities.from_account), Some("galicia"));
        assert_eq!(text_of(&entities.to_account), Some("mp"));
    }

    #[test]
    fn card_payment() {
        let entities = extract(
            "pagué el resumen de noviembre de la visa 250 lucas con galicia más sellos 1200",
            Intent::PagarTarjeta,
            today(),
        );
        assert_eq!(entities.amount, Some(Money::from_major(250_000)));
        assert_eq!(entities.statement_month, Some(YearMonth { year: 2026, month: 11 }));
        assert_eq!(entities.stamp_tax_amount, Some(Money::from_major(1_200)));
        assert_eq!(text_of(&entities.target_card), Some("visa"));
        assert_eq!(text_of(&entities.from_account), Some("galicia"));
    }

    #[test]
    fn spending_query() {
        let entities = extract("cuánto gasté en comida este mes", Intent::ConsultarGastos, today());
        assert_eq!(text_of(&entities.category), Some("comida"));
        let period = entities.period.unwrap();
        assert_eq!(period.from, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(entities.amount, None);
        assert_eq!(entities.note, None);
    }

    #[test]
    fn recent_movements_limit() {
        let entities = extract("últimos 10 movimientos de mp", Intent::UltimosMovimientos, today());
        assert_eq!(entities.limit, Some(10));
        assert_eq!(text_of(&entities.account), Some("mp"));
    }
}
