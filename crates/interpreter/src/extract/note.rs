//! Notes: an explicit quoted/labelled note, or a note synthesized from the
//! words no other extractor claimed.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    extract::refs::Token,
    locale::{
        aliases::is_known_vocabulary,
        compile,
        keywords::{MONTHS, NOTE_STOP_WORDS, is_one_of},
    },
};

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| compile(r#""([^"]{2,})"|“([^”]{2,})”|«([^»]{2,})»|'([^']{2,})'"#));
static LABELLED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:nota|por|para)\s*:\s*(.+)$"));

const MIN_NOTE_LETTERS: usize = 3;
const MAX_NOTE_CHARS: usize = 120;

fn clip(note: &str) -> Option<String> {
    let note = note.trim();
    if note.chars().filter(|c| c.is_alphabetic()).count() < MIN_NOTE_LETTERS {
        return None;
    }
    Some(note.chars().take(MAX_NOTE_CHARS).collect())
}

/// Explicit note in the raw message, and the message with it removed.
///
/// The note keeps the user's own spelling; the remainder goes on to the
/// other extractors.
#[must_use]
pub fn explicit_note(message: &str) -> (Option<String>, String) {
    if let Some(caps) = QUOTED.captures(message) {
        let body = (1..=4).find_map(|i| caps.get(i));
        if let (Some(whole), Some(body)) = (caps.get(0), body) {
            let mut rest = message.to_string();
            rest.replace_range(whole.range(), " ");
            return (clip(body.as_str()), rest);
        }
    }
    if let Some(caps) = LABELLED.captures(message)
        && let (Some(whole), Some(body)) = (caps.get(0), caps.get(1))
    {
        let mut rest = message.to_string();
        rest.replace_range(whole.range(), " ");
        return (clip(body.as_str()), rest);
    }
    (None, message.to_string())
}

fn is_noise(word: &str) -> bool {
    !word.chars().any(char::is_alphabetic)
        || is_one_of(word, NOTE_STOP_WORDS)
        || is_known_vocabulary(word)
        || MONTHS.iter().any(|(month, _)| *month == word)
}

/// Note built from the residue tokens of a fully masked message.
#[must_use]
pub fn synthesize(residue: &[Token<'_>]) -> Option<String> {
    let words: Vec<&str> = residue
        .iter()
        .map(|token| token.word)
        .filter(|word| !is_noise(word))
        .collect();
    if words.is_empty() {
        return None;
    }
    clip(&words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::refs::tokenize;

    #[test]
    fn quoted_note_keeps_original_text() {
        let (note, rest) = explicit_note("gasté 500 en comida \"Cumple de Juan\"");
        assert_eq!(note.as_deref(), Some("Cumple de Juan"));
        assert!(!rest.contains("Juan"));
        assert!(rest.contains("comida"));
    }

    #[test]
    fn labelled_note_runs_to_the_end() {
        let (note, rest) = explicit_note("pagué 3000 con mp nota: regalo para Sofi");
        assert_eq!(note.as_deref(), Some("regalo para Sofi"));
        assert_eq!(rest.trim(), "pagué 3000 con mp");

        let (note, _) = explicit_note("gasté 200 por: propina");
        assert_eq!(note.as_deref(), Some("propina"));
    }

    #[test]
    fn por_without_colon_is_not_a_note() {
        let (note, rest) = explicit_note("pagué 200 por el estacionamiento");
        assert_eq!(note, None);
        assert_eq!(rest, "pagué 200 por el estacionamiento");
    }

    #[test]
    fn synthesized_note_skips_vocabulary() {
        let tokens = tokenize("gaste      pizza con amigos");
        assert_eq!(synthesize(&tokens).as_deref(), Some("pizza amigos"));

        let tokens = tokenize("pague      de la visa ayer");
        assert_eq!(synthesize(&tokens), None);

        let tokens = tokenize("gaste 12 x");
        assert_eq!(synthesize(&tokens), None);
    }
}
