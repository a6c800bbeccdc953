//! Installment counts ("en 3 cuotas", "x12", "6c") and list limits
//! ("últimos 10").

use std::{ops::Range, sync::LazyLock};

use regex::Regex;

use crate::locale::compile;

pub const MAX_INSTALLMENTS: u32 = 48;
pub const MAX_LIMIT: u32 = 50;

static INSTALLMENTS: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"\b(?:en\s+)?(\d{1,3})\s+cuotas?(?:\s+sin\s+interes(?:es)?)?\b|\bx\s?(\d{1,3})\b|\b(\d{1,3})\s?c\b|\b(?:en\s+)?(una|un)\s+(?:sola\s+)?cuota\b",
    )
});
static LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\bultim[oa]s\s+(\d{1,3})\b|\b(\d{1,3})\s+ultim[oa]s\b|\b(\d{1,3})\s+movimientos\b")
});

/// Installment count and its span, clamped to `[1, 48]`.
#[must_use]
pub fn extract_installments(text: &str) -> Option<(u32, Range<usize>)> {
    let caps = INSTALLMENTS.captures(text)?;
    let whole = caps.get(0)?;
    let count = match (1..=3).find_map(|i| caps.get(i)) {
        Some(digits) => digits.as_str().parse::<u32>().ok()?,
        None => 1,
    };
    Some((count.clamp(1, MAX_INSTALLMENTS), whole.range()))
}

/// Requested list length and its span, capped at 50.
#[must_use]
pub fn extract_limit(text: &str) -> Option<(u32, Range<usize>)> {
    let caps = LIMIT.captures(text)?;
    let whole = caps.get(0)?;
    let limit: u32 = (1..=3).find_map(|i| caps.get(i))?.as_str().parse().ok()?;
    Some((limit.clamp(1, MAX_LIMIT), whole.range()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(text: &str) -> Option<u32> {
        extract_installments(text).map(|(n, _)| n)
    }

    #[test]
    fn installment_forms() {
        assert_eq!(count("en 3 cuotas"), Some(3));
        assert_eq!(count("12 cuotas sin interes"), Some(12));
        assert_eq!(count("x6"), Some(6));
        assert_eq!(count("x 18"), Some(18));
        assert_eq!(count("12c"), Some(12));
        assert_eq!(count("en una cuota"), Some(1));
        assert_eq!(count("gaste 500"), None);
    }

    #[test]
    fn installments_are_clamped() {
        assert_eq!(count("en 60 cuotas"), Some(48));
        assert_eq!(count("0 cuotas"), Some(1));
    }

    #[test]
    fn span_covers_the_phrase() {
        let text = "tele 300000 en 12 cuotas con visa";
        let (_, span) = extract_installments(text).unwrap();
        assert_eq!(&text[span], "en 12 cuotas");
    }

    #[test]
    fn limits() {
        assert_eq!(extract_limit("ultimos 10 movimientos").map(|(n, _)| n), Some(10));
        assert_eq!(extract_limit("los 3 ultimos").map(|(n, _)| n), Some(3));
        assert_eq!(extract_limit("ultimos 200").map(|(n, _)| n), Some(50));
        assert_eq!(extract_limit("ultimos movimientos"), None);
    }
}
