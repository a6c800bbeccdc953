//! Card-payment extras: the statement being paid ("resumen de marzo") and
//! the stamp tax charged with it ("sellos 1500").

use std::{ops::Range, sync::LazyLock};

use chrono::NaiveDate;
use ledger::Money;
use regex::Regex;

use crate::{
    entities::YearMonth,
    extract::{amount::extract_amount, date::month_number},
    locale::compile,
};

static STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"\bresumen\s+(?:de|del)\s+(?:mes\s+de\s+)?(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)(?:\s+(?:de\s+)?(\d{4}))?\b",
    )
});
static STAMP_TAX: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(?:(?:mas|y|con)\s+)?(?:(?:el\s+)?impuesto\s+de\s+)?sellos\s+(?:de\s+|por\s+)?(\$?\s?\d[\d.,]*\s?k?)")
});
static CARD_KIND: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\btarjeta(\s+de\s+(?:credito|debito))\b"));

/// The occurrence of `month` closest to `today` (statements are paid
/// around their due date, in either direction across new year).
fn nearest(month: u32, today: NaiveDate) -> YearMonth {
    let current = YearMonth::of(today);
    [current.year - 1, current.year, current.year + 1]
        .into_iter()
        .map(|year| YearMonth { year, month })
        .min_by_key(|candidate| {
            let distance = (candidate.year - current.year) * 12
                + candidate.month as i32
                - current.month as i32;
            distance.abs()
        })
        .unwrap_or(current)
}

#[must_use]
pub fn extract_statement_month(text: &str, today: NaiveDate) -> Option<(YearMonth, Range<usize>)> {
    let caps = STATEMENT.captures(text)?;
    let whole = caps.get(0)?;
    let month = month_number(caps.get(1)?.as_str())?;
    let year_month = match caps.get(2) {
        Some(year) => YearMonth {
            year: year.as_str().parse().ok()?,
            month,
        },
        None => nearest(month, today),
    };
    Some((year_month, whole.range()))
}

#[must_use]
pub fn extract_stamp_tax(text: &str) -> Option<(Money, Range<usize>)> {
    let caps = STAMP_TAX.captures(text)?;
    let whole = caps.get(0)?;
    let amount = extract_amount(caps.get(1)?.as_str())?.amount;
    Some((amount, whole.range()))
}

/// Span of "de crédito/débito" after "tarjeta", which would otherwise be
/// read as a reference marker.
#[must_use]
pub fn card_kind_span(text: &str) -> Option<Range<usize>> {
    CARD_KIND.captures(text)?.get(1).map(|found| found.range())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn statement_month_is_the_nearest_one() {
        let month = |text: &str| extract_statement_month(text, today()).map(|(m, _)| m);
        assert_eq!(
            month("pague el resumen de noviembre"),
            Some(YearMonth { year: 2026, month: 11 })
        );
        assert_eq!(
            month("resumen de enero"),
            Some(YearMonth { year: 2027, month: 1 })
        );
        assert_eq!(
            month("resumen de mayo"),
            Some(YearMonth { year: 2026, month: 5 })
        );
        assert_eq!(
            month("resumen del mes de marzo 2025"),
            Some(YearMonth { year: 2025, month: 3 })
        );
        assert_eq!(month("el resumen"), None);
    }

    #[test]
    fn stamp_tax_amount() {
        let (amount, _) = extract_stamp_tax("pague la visa 80000 mas sellos 1500").unwrap();
        assert_eq!(amount, Money::from_major(1_500));

        let text = "y el impuesto de sellos de 2.300,50";
        let (amount, span) = extract_stamp_tax(text).unwrap();
        assert_eq!(amount, Money::new(230_050));
        assert_eq!(span, 0..text.len());

        assert_eq!(extract_stamp_tax("pague la visa"), None);
    }

    #[test]
    fn card_kind_phrase() {
        let text = "con la tarjeta de credito galicia";
        let span = card_kind_span(text).unwrap();
        assert_eq!(&text[span], " de credito");
    }
}
