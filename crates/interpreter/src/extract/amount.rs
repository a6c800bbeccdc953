//! Amount and currency parsing.
//!
//! Forms are tried in order: number + multiplier ("50k", "2 palos",
//! "150 lucas"), an Argentine-formatted literal ("1.500,50") and finally a
//! bare digit run.

use std::{ops::Range, sync::LazyLock};

use ledger::{Currency, Money};
use regex::Regex;

use crate::{
    error::{InterpreterError, ResultInterpreter},
    locale::{
        compile,
        keywords::{AMOUNT_MULTIPLIERS, ARS_WORDS, USD_WORDS},
    },
    text,
};

/// Exclusive upper bound, in whole units.
pub const MAX_AMOUNT_MAJOR: i64 = 100_000_000;

static MULTIPLIED: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(\d+(?:[.,]\d+)?)\s*(millones|millon|palos|palo|lucas|luca|mil|k)\b")
});
static ONE_MULTIPLIED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(un|una)\s+(millon|palo|luca)\b"));
static LITERAL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?|\d+[.,]\d+"));
static BARE: LazyLock<Regex> = LazyLock::new(|| compile(r"\d+"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmountMatch {
    /// Not range-checked; see [`check_range`].
    pub amount: Money,
    /// Byte range in the text that was scanned.
    pub span: Range<usize>,
}

fn multiplier_of(word: &str) -> Option<i64> {
    AMOUNT_MULTIPLIERS
        .iter()
        .find(|(suffix, _)| *suffix == word)
        .map(|(_, factor)| *factor)
}

/// Rewrite an Argentine literal with `.` as the only (decimal) separator.
///
/// Both separators: `.` groups thousands and `,` is decimal. Only `,`:
/// decimal unless more than two digits follow the last one. Only `.`:
/// decimal unless exactly three digits follow the last one.
fn canonical_decimal(literal: &str) -> Option<String> {
    let has_dot = literal.contains('.');
    let has_comma = literal.contains(',');
    let trailing = |sep: char| {
        literal
            .rsplit(sep)
            .next()
            .map_or(0, |tail| tail.chars().count())
    };

    let canonical = match (has_dot, has_comma) {
        (true, true) => literal.replace('.', "").replace(',', "."),
        (false, true) if trailing(',') > 2 => literal.replace(',', ""),
        (false, true) => literal.replace(',', "."),
        (true, false) if trailing('.') == 3 => literal.replace('.', ""),
        (true, false) => literal.to_string(),
        (false, false) => literal.to_string(),
    };
    (canonical.matches('.').count() <= 1).then_some(canonical)
}

/// `"123.456"` × `multiplier` → minor units, rounding half up past cents.
fn to_minor(canonical: &str, multiplier: i64) -> Option<Money> {
    let (int_part, frac_part) = canonical.split_once('.').unwrap_or((canonical, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let scale = u32::try_from(frac_part.len()).ok()?;
    let mantissa: i128 = format!("{int_part}{frac_part}").parse().ok()?;
    let divisor = 10_i128.checked_pow(scale)?;
    let numerator = mantissa
        .checked_mul(i128::from(multiplier))?
        .checked_mul(100)?;
    let minor = (numerator + divisor / 2) / divisor;
    i64::try_from(minor).ok().map(Money::new)
}

/// Parse one Argentine-formatted literal (`"1.500,50"` → 150050 minor units).
#[must_use]
pub fn parse_argentine_number(literal: &str) -> Option<Money> {
    to_minor(&canonical_decimal(literal.trim())?, 1)
}

/// First amount in `text` (normalized), trying the forms in priority order.
#[must_use]
pub fn extract_amount(text: &str) -> Option<AmountMatch> {
    if let Some(caps) = MULTIPLIED.captures(text) {
        let whole = caps.get(0)?;
        let factor = multiplier_of(caps.get(2)?.as_str())?;
        let amount = to_minor(&canonical_decimal(caps.get(1)?.as_str())?, factor)?;
        return Some(AmountMatch {
            amount,
            span: whole.range(),
        });
    }

    if let Some(caps) = ONE_MULTIPLIED.captures(text) {
        let whole = caps.get(0)?;
        let factor = multiplier_of(caps.get(2)?.as_str())?;
        return Some(AmountMatch {
            amount: Money::from_major(factor),
            span: whole.range(),
        });
    }

    if let Some(found) = LITERAL.find(text) {
        if let Some(amount) = parse_argentine_number(found.as_str()) {
            return Some(AmountMatch {
                amount,
                span: found.range(),
            });
        }
    }

    // Several bare numbers ("2 pizzas por 3000"): the largest one is the price.
    BARE.find_iter(text)
        .filter_map(|found| {
            let major: i64 = found.as_str().parse().ok()?;
            Some(AmountMatch {
                amount: Money::new(major.checked_mul(100)?),
                span: found.range(),
            })
        })
        .max_by_key(|m| m.amount)
}

/// Currency named in the message, if any.
#[must_use]
pub fn detect_currency(normalized: &str) -> Option<Currency> {
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric() && c != '$'))
        .collect();
    let named = |words: &[&str]| {
        tokens.iter().any(|token| {
            words.contains(token)
                || words
                    .iter()
                    .any(|w| w.contains('$') && token.starts_with(w))
        })
    };
    if named(USD_WORDS) {
        Some(Currency::Usd)
    } else if named(ARS_WORDS) {
        Some(Currency::Ars)
    } else {
        None
    }
}

/// Reject amounts outside `(0, 100.000.000)`.
pub fn check_range(amount: Money) -> ResultInterpreter<Money> {
    if !amount.is_positive() {
        return Err(InterpreterError::validation(
            "El monto tiene que ser mayor a cero.",
        ));
    }
    if amount >= Money::from_major(MAX_AMOUNT_MAJOR) {
        return Err(InterpreterError::validation(
            "El monto tiene que ser menor a 100.000.000.",
        ));
    }
    Ok(amount)
}

/// Parse a reply that should contain just an amount (edit flow).
pub fn parse_amount_input(input: &str) -> ResultInterpreter<(Money, Option<Currency>)> {
    let normalized = text::normalize(input);
    let found = extract_amount(&normalized).ok_or_else(|| {
        InterpreterError::validation("No entendí el monto. Probá con algo como 1500 o 2,5k.")
    })?;
    Ok((check_range(found.amount)?, detect_currency(&normalized)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> Option<i64> {
        extract_amount(text).map(|m| m.amount.minor())
    }

    #[test]
    fn argentine_literals() {
        assert_eq!(parse_argentine_number("1.500,50"), Some(Money::new(150_050)));
        assert_eq!(parse_argentine_number("1.500"), Some(Money::new(150_000)));
        assert_eq!(parse_argentine_number("10.5"), Some(Money::new(1_050)));
        assert_eq!(parse_argentine_number("1,500"), Some(Money::new(150_000)));
        assert_eq!(parse_argentine_number("1,5"), Some(Money::new(150)));
        assert_eq!(parse_argentine_number("1.000.000"), Some(Money::new(100_000_000)));
        assert_eq!(parse_argentine_number("1.2.3"), None);
    }

    #[test]
    fn multipliers() {
        assert_eq!(amount("50k"), Some(5_000_000));
        assert_eq!(amount("2 palos"), Some(200_000_000));
        assert_eq!(amount("150 lucas"), Some(15_000_000));
        assert_eq!(amount("1,5 palos"), Some(150_000_000));
        assert_eq!(amount("una luca"), Some(100_000));
        assert_eq!(amount("3 mil pesos"), Some(300_000));
    }

    #[test]
    fn bare_digits_pick_the_price() {
        assert_eq!(amount("gaste 500 en comida"), Some(50_000));
        assert_eq!(amount("compre 2 pizzas por 3000"), Some(300_000));
        assert_eq!(amount("sin numeros"), None);
    }

    #[test]
    fn literal_span_is_reported() {
        let found = extract_amount("pague 1.500,50 de luz").unwrap();
        assert_eq!(found.span, 6..14);
    }

    #[test]
    fn range_is_enforced() {
        assert!(check_range(Money::ZERO).is_err());
        assert!(check_range(Money::from_major(MAX_AMOUNT_MAJOR)).is_err());
        assert!(check_range(Money::from_major(99_999_999)).is_ok());
        assert!(parse_amount_input("150 palos").is_err());
    }

    #[test]
    fn currency_keywords() {
        assert_eq!(detect_currency("100 dolares"), Some(Currency::Usd));
        assert_eq!(detect_currency("u$s 100"), Some(Currency::Usd));
        assert_eq!(detect_currency("500 pesos"), Some(Currency::Ars));
        assert_eq!(detect_currency("500"), None);
    }

    #[test]
    fn amount_input_reads_currency() {
        let (amount, currency) = parse_amount_input("20 USD").unwrap();
        assert_eq!(amount, Money::from_major(20));
        assert_eq!(currency, Some(Currency::Usd));
        assert!(parse_amount_input("mucho").is_err());
    }
}
