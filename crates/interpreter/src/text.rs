//! Text normalization helpers.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Lowercase, strip accents and collapse whitespace, keeping punctuation.
///
/// `"¿Cuánto  GASTÉ?"` → `"¿cuanto gaste?"`. Amount and date parsing rely on
/// `.`, `,` and `/` surviving this step.
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_space = true;
    for ch in input.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
            continue;
        }
        for lower in ch.to_lowercase() {
            out.push(lower);
        }
        prev_space = false;
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Comparison key: like [`normalize`] but every non-alphanumeric run becomes
/// a single space (`"VISA, Galicia"` → `"visa galicia"`).
#[must_use]
pub fn normalize_key(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Words of an already normalized key.
pub fn words(key: &str) -> impl Iterator<Item = &str> {
    key.split(' ').filter(|w| !w.is_empty())
}

/// Message stripped of surrounding punctuation, for whole-message keyword checks.
#[must_use]
pub fn bare(normalized: &str) -> &str {
    normalized.trim_matches(|c: char| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_keeps_punctuation() {
        assert_eq!(normalize("  ¿Cuánto   GASTÉ?  "), "¿cuanto gaste?");
        assert_eq!(normalize("1.500,50 pesos"), "1.500,50 pesos");
        assert_eq!(normalize("Año"), "ano");
    }

    #[test]
    fn normalize_key_drops_punctuation() {
        assert_eq!(normalize_key("VISA, Galicia"), "visa galicia");
        assert_eq!(normalize_key("  Mercado-Pago!! "), "mercado pago");
        assert_eq!(normalize_key("¡!"), "");
    }

    #[test]
    fn bare_trims_punctuation() {
        assert_eq!(bare("¡cancelar!"), "cancelar");
        assert_eq!(bare("si."), "si");
    }
}
