//! Free-text account/category/card references.
//!
//! References are slices of the masked message that follow a marker word
//! ("con X", "de X a Y", "en X"). Nothing here looks at the user's data:
//! the slices are handed to the fuzzy matcher as they are.

use std::ops::Range;

use crate::{
    entities::EntityRef,
    intent::Intent,
    locale::{
        aliases::{ACCOUNT_ALIASES, CARD_WORDS, CATEGORY_SYNONYMS},
        keywords::{NOTE_STOP_WORDS, REF_BOUNDARIES, REF_FILLERS, is_one_of},
    },
    text,
};

const MAX_REF_WORDS: usize = 4;

/// Words that only say "this is an account".
const ACCOUNT_FILLERS: &[&str] = &["cuenta", "caja", "banco", "tarjeta"];

/// Query vocabulary ignored when a read intent falls back to residue words.
const QUERY_WORDS: &[&str] = &[
    "saldo", "saldos", "cuanto", "cuanta", "cuantos", "tengo", "tenemos", "hay", "queda",
    "quedan", "plata", "dinero", "disponible", "gastos", "gaste", "gastamos", "ingresos",
    "cobre", "cobramos", "movimientos", "ultimos", "ultimas", "resumen", "como", "vengo",
    "balance", "total", "mostrame", "ver", "dame", "decime", "listado", "todo", "todas",
    "todos",
];

const FROM_MARKERS: &[&str] = &["de", "desde", "del"];
const TO_MARKERS: &[&str] = &["a", "al", "hacia"];
const ACCOUNT_MARKERS: &[&str] = &["con", "desde"];
const OPEN_MARKERS: &[&str] = &["en", "de", "del", "por", "para", "a", "al"];

/// A whitespace-separated word of the masked text, stripped of punctuation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub word: &'a str,
    pub span: Range<usize>,
}

#[must_use]
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut push = |start: usize, end: usize| {
        let word = text::bare(&text[start..end]);
        if !word.is_empty() {
            tokens.push(Token {
                word,
                span: start..end,
            });
        }
    };
    let mut start = None;
    for (index, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(begin) = start.take() {
                push(begin, index);
            }
        } else if start.is_none() {
            start = Some(index);
        }
    }
    if let Some(begin) = start {
        push(begin, text.len());
    }
    tokens
}

/// A reference slice and the bytes it claimed, marker included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefSlice {
    pub text: String,
    pub span: Range<usize>,
    /// The slice was introduced by "cuenta", "tarjeta", …
    pub account_filler: bool,
}

impl RefSlice {
    fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split(' ')
    }

    /// Names a bank, wallet or card rather than a category.
    #[must_use]
    pub fn looks_like_account(&self) -> bool {
        self.account_filler
            || self.words().any(|word| is_one_of(word, CARD_WORDS))
            || ACCOUNT_ALIASES.iter().any(|(alias, _)| {
                if alias.contains(' ') {
                    self.text.contains(alias)
                } else {
                    self.words().any(|word| word == *alias)
                }
            })
    }

    fn into_ref(self) -> EntityRef {
        EntityRef::text(self.text)
    }
}

/// Words after `tokens[marker]` up to the next boundary, leading fillers
/// dropped. `None` when nothing is left.
fn slice_after(tokens: &[Token<'_>], marker: usize) -> Option<RefSlice> {
    slice_from(tokens, marker + 1, tokens.get(marker)?.span.start)
}

fn slice_from(tokens: &[Token<'_>], first: usize, span_start: usize) -> Option<RefSlice> {
    let mut picked: Vec<&str> = Vec::new();
    let mut span_end = span_start;
    let mut account_filler = false;
    for token in tokens.iter().skip(first) {
        if is_one_of(token.word, REF_BOUNDARIES) || token.word.chars().all(|c| c.is_ascii_digit())
        {
            break;
        }
        span_end = token.span.end;
        if picked.is_empty() && is_one_of(token.word, REF_FILLERS) {
            account_filler |= is_one_of(token.word, ACCOUNT_FILLERS);
            continue;
        }
        picked.push(token.word);
        if picked.len() == MAX_REF_WORDS {
            break;
        }
    }
    (!picked.is_empty()).then(|| RefSlice {
        text: picked.join(" "),
        span: span_start..span_end,
        account_filler,
    })
}

/// First slice introduced by any of `markers`, skipping spans already taken.
fn first_slice(tokens: &[Token<'_>], markers: &[&str], taken: &[Range<usize>]) -> Option<RefSlice> {
    tokens.iter().enumerate().find_map(|(index, token)| {
        if !is_one_of(token.word, markers) || overlaps(taken, &token.span) {
            return None;
        }
        slice_after(tokens, index)
    })
}

fn overlaps(taken: &[Range<usize>], span: &Range<usize>) -> bool {
    taken
        .iter()
        .any(|other| other.start < span.end && span.start < other.end)
}

/// References found for one intent, plus the byte ranges they consumed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedRefs {
    pub account: Option<EntityRef>,
    pub category: Option<EntityRef>,
    pub from_account: Option<EntityRef>,
    pub to_account: Option<EntityRef>,
    pub target_card: Option<EntityRef>,
    pub spans: Vec<Range<usize>>,
}

impl ExtractedRefs {
    fn take(&mut self, slice: RefSlice) -> EntityRef {
        self.spans.push(slice.span.clone());
        slice.into_ref()
    }

    fn take_token(&mut self, token: &Token<'_>) -> EntityRef {
        self.spans.push(token.span.clone());
        EntityRef::text(token.word)
    }
}

/// Residue words that could stand on their own as a reference.
fn residue<'t, 'a>(
    tokens: &'t [Token<'a>],
    taken: &'t [Range<usize>],
) -> impl Iterator<Item = &'t Token<'a>> {
    tokens.iter().filter(move |token| {
        !overlaps(taken, &token.span)
            && token.word.chars().all(char::is_alphabetic)
            && token.word.chars().count() >= 2
            && !is_one_of(token.word, NOTE_STOP_WORDS)
            && !is_one_of(token.word, QUERY_WORDS)
    })
}

fn is_account_word(word: &str) -> bool {
    is_one_of(word, CARD_WORDS) || ACCOUNT_ALIASES.iter().any(|(alias, _)| *alias == word)
}

fn is_category_word(word: &str) -> bool {
    CATEGORY_SYNONYMS
        .iter()
        .any(|(alias, canonical)| *alias == word || *canonical == word)
}

fn movement_refs(tokens: &[Token<'_>], refs: &mut ExtractedRefs) {
    for (index, token) in tokens.iter().enumerate() {
        if overlaps(&refs.spans, &token.span) {
            continue;
        }
        let explicit_account = is_one_of(token.word, ACCOUNT_MARKERS);
        if !explicit_account && !is_one_of(token.word, OPEN_MARKERS) {
            continue;
        }
        let Some(slice) = slice_after(tokens, index) else {
            continue;
        };
        if explicit_account || slice.looks_like_account() {
            if refs.account.is_none() {
                refs.account = Some(refs.take(slice));
            }
        } else if refs.category.is_none() {
            refs.category = Some(refs.take(slice));
        }
    }

    // "500 super mp": bare vocabulary words with no marker.
    let account_word = residue(tokens, &refs.spans)
        .find(|token| is_account_word(token.word))
        .cloned();
    if refs.account.is_none()
        && let Some(token) = account_word
    {
        refs.account = Some(refs.take_token(&token));
    }
    if refs.category.is_none() {
        let fallback = residue(tokens, &refs.spans)
            .find(|token| is_category_word(token.word))
            .or_else(|| {
                residue(tokens, &refs.spans).find(|token| {
                    !is_account_word(token.word) && token.word.chars().count() >= 3
                })
            })
            .cloned();
        if let Some(token) = fallback {
            refs.category = Some(refs.take_token(&token));
        }
    }
}

fn transfer_refs(tokens: &[Token<'_>], refs: &mut ExtractedRefs) {
    if let Some(from) = first_slice(tokens, FROM_MARKERS, &refs.spans) {
        refs.from_account = Some(refs.take(from));
    }
    if let Some(to) = first_slice(tokens, TO_MARKERS, &refs.spans) {
        refs.to_account = Some(refs.take(to));
    }
    // "pasé 5000 galicia mp": two bare account words, in order.
    let bare: Vec<Token<'_>> = residue(tokens, &refs.spans)
        .filter(|token| is_account_word(token.word))
        .cloned()
        .collect();
    let mut bare = bare.iter();
    if refs.from_account.is_none()
        && let Some(token) = bare.next()
    {
        refs.from_account = Some(refs.take_token(token));
    }
    if refs.to_account.is_none()
        && let Some(token) = bare.next()
    {
        refs.to_account = Some(refs.take_token(token));
    }
}

fn card_payment_refs(tokens: &[Token<'_>], refs: &mut ExtractedRefs) {
    let card = tokens.iter().enumerate().find_map(|(index, token)| {
        if is_one_of(token.word, CARD_WORDS) {
            slice_from(tokens, index, token.span.start)
        } else if token.word == "tarjeta" {
            slice_after(tokens, index)
        } else {
            None
        }
    });
    if let Some(card) = card {
        refs.target_card = Some(refs.take(card));
    }
    if let Some(from) = first_slice(tokens, ACCOUNT_MARKERS, &refs.spans) {
        refs.from_account = Some(refs.take(from));
        return;
    }
    let bank_word = residue(tokens, &refs.spans)
        .find(|token| is_account_word(token.word) && !is_one_of(token.word, CARD_WORDS))
        .cloned();
    if let Some(token) = bank_word {
        refs.from_account = Some(refs.take_token(&token));
    }
}

fn query_refs(intent: Intent, tokens: &[Token<'_>], refs: &mut ExtractedRefs) {
    let markers: &[&str] = &["de", "del", "en", "con", "por"];
    let slice = first_slice(tokens, markers, &refs.spans);
    let leftover = residue(tokens, &refs.spans).next().cloned();
    match intent {
        Intent::ConsultarGastos | Intent::ConsultarIngresos => match slice {
            Some(slice) if slice.looks_like_account() => refs.account = Some(refs.take(slice)),
            Some(slice) => refs.category = Some(refs.take(slice)),
            None => {
                if let Some(token) = leftover {
                    if is_account_word(token.word) {
                        refs.account = Some(refs.take_token(&token));
                    } else {
                        refs.category = Some(refs.take_token(&token));
                    }
                }
            }
        },
        Intent::ConsultarSaldo | Intent::UltimosMovimientos => {
            if let Some(slice) = slice {
                refs.account = Some(refs.take(slice));
            } else if let Some(token) = leftover {
                refs.account = Some(refs.take_token(&token));
            }
        }
        _ => {}
    }
}

/// References for `intent` in `masked` (normalized, already stripped of
/// amounts, dates and the other extracted spans).
#[must_use]
pub fn extract_refs(intent: Intent, masked: &str) -> ExtractedRefs {
    let tokens = tokenize(masked);
    let mut refs = ExtractedRefs::default();
    match intent {
        Intent::RegistrarGasto | Intent::RegistrarIngreso => movement_refs(&tokens, &mut refs),
        Intent::Transferencia => transfer_refs(&tokens, &mut refs),
        Intent::PagarTarjeta => card_payment_refs(&tokens, &mut refs),
        Intent::ConsultarSaldo
        | Intent::ConsultarGastos
        | Intent::ConsultarIngresos
        | Intent::UltimosMovimientos => query_refs(intent, &tokens, &mut refs),
        _ => {}
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(slot: &Option<EntityRef>) -> Option<&str> {
        slot.as_ref().and_then(|r| r.text.as_deref())
    }

    #[test]
    fn tokens_keep_byte_spans() {
        let tokens = tokenize("¿saldo  de mp?");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].word, "saldo");
        assert_eq!(tokens[2].word, "mp");
        assert_eq!(&"¿saldo  de mp?"[tokens[2].span.clone()], "mp?");
    }

    #[test]
    fn expense_category_and_account() {
        let refs = extract_refs(Intent::RegistrarGasto, "gaste     en comida con mp");
        assert_eq!(text_of(&refs.category), Some("comida"));
        assert_eq!(text_of(&refs.account), Some("mp"));

        let refs = extract_refs(Intent::RegistrarGasto, "pague      de nafta con la visa galicia");
        assert_eq!(text_of(&refs.category), Some("nafta"));
        assert_eq!(text_of(&refs.account), Some("visa galicia"));
    }

    #[test]
    fn expense_account_by_alias_after_open_marker() {
        let refs = extract_refs(Intent::RegistrarGasto, "gaste     en el super en mercado pago");
        assert_eq!(text_of(&refs.category), Some("super"));
        assert_eq!(text_of(&refs.account), Some("mercado pago"));
    }

    #[test]
    fn bare_words_fall_back_to_refs() {
        let refs = extract_refs(Intent::RegistrarGasto, "uber      mp");
        assert_eq!(text_of(&refs.category), Some("uber"));
        assert_eq!(text_of(&refs.account), Some("mp"));

        let refs = extract_refs(Intent::RegistrarIngreso, "cobre el sueldo");
        assert_eq!(text_of(&refs.category), Some("sueldo"));
    }

    #[test]
    fn transfer_direction_both_ways() {
        let refs = extract_refs(Intent::Transferencia, "transferi       de galicia a mp");
        assert_eq!(text_of(&refs.from_account), Some("galicia"));
        assert_eq!(text_of(&refs.to_account), Some("mp"));

        let refs = extract_refs(Intent::Transferencia, "pase       a mp desde la cuenta galicia");
        assert_eq!(text_of(&refs.from_account), Some("galicia"));
        assert_eq!(text_of(&refs.to_account), Some("mp"));
    }

    #[test]
    fn card_payment_refs() {
        let refs = extract_refs(Intent::PagarTarjeta, "pague la visa galicia con mp");
        assert_eq!(text_of(&refs.target_card), Some("visa galicia"));
        assert_eq!(text_of(&refs.from_account), Some("mp"));

        let refs = extract_refs(Intent::PagarTarjeta, "pague la tarjeta santander");
        assert_eq!(text_of(&refs.target_card), Some("santander"));
        assert_eq!(refs.from_account, None);
    }

    #[test]
    fn balance_reference() {
        let refs = extract_refs(Intent::ConsultarSaldo, "saldo galicia");
        assert_eq!(text_of(&refs.account), Some("galicia"));

        let refs = extract_refs(Intent::ConsultarSaldo, "cuanta plata tengo en mp?");
        assert_eq!(text_of(&refs.account), Some("mp"));

        let refs = extract_refs(Intent::ConsultarSaldo, "saldo");
        assert_eq!(refs.account, None);
    }

    #[test]
    fn spending_query_reference() {
        let refs = extract_refs(Intent::ConsultarGastos, "cuanto gaste en comida");
        assert_eq!(text_of(&refs.category), Some("comida"));
        assert_eq!(refs.account, None);
    }
}
