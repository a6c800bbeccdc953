//! Fuzzy resolution of free-text references against the user's accounts
//! and categories.
//!
//! Every candidate gets the best of four scores:
//!
//! - direct similarity: `1.0` on an exact key match, normalized Levenshtein
//!   otherwise, at least `0.8` when the name contains the query;
//! - alias: `0.9` when the query holds a known alias whose canonical key is
//!   in the name ("mp" → "MercadoPago");
//! - all words: `0.85..=0.95` when every query word is in the name
//!   ("visa galicia" → "VISA, Galicia");
//! - partial overlap: a penalized share of matching words.
//!
//! An explicitly requested currency that differs from the account's costs
//! `0.5`. Anything under `0.4` is dropped.

use std::cmp::Ordering;

use ledger::{Account, Category, CategoryKind, Currency, UserContext};
use strsim::normalized_levenshtein;
use uuid::Uuid;

use crate::{
    entities::Field,
    intent::Intent,
    locale::aliases::{ACCOUNT_ALIASES, CATEGORY_SYNONYMS},
    text::{normalize_key, words},
};

pub const EXACT_THRESHOLD: f64 = 0.85;
pub const CLEAR_WINNER_MARGIN: f64 = 0.15;
pub const MIN_SCORE: f64 = 0.4;
pub const MAX_OPTIONS: usize = 5;

const CONTAINMENT_SCORE: f64 = 0.8;
const ALIAS_SCORE: f64 = 0.9;
const ALL_WORDS_BASE: f64 = 0.85;
const ALL_WORDS_SPAN: f64 = 0.10;
const ALL_WORDS_CAP: f64 = 0.95;
const WORD_SIMILARITY: f64 = 0.8;
const CURRENCY_PENALTY: f64 = 0.5;

/// Something a reference can resolve to.
pub trait Candidate {
    /// Multiplier of the partial word-overlap score.
    const PARTIAL_FACTOR: f64;

    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn aliases() -> &'static [(&'static str, &'static str)];

    fn currency(&self) -> Option<Currency> {
        None
    }
}

impl Candidate for Account {
    const PARTIAL_FACTOR: f64 = 0.7;

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn aliases() -> &'static [(&'static str, &'static str)] {
        ACCOUNT_ALIASES
    }

    fn currency(&self) -> Option<Currency> {
        Some(self.currency)
    }
}

impl Candidate for Category {
    const PARTIAL_FACTOR: f64 = 0.8;

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn aliases() -> &'static [(&'static str, &'static str)] {
        CATEGORY_SYNONYMS
    }
}

#[derive(Debug, PartialEq)]
pub struct FuzzyMatch<'a, C> {
    pub candidate: &'a C,
    pub score: f64,
    pub matched_alias: Option<&'static str>,
}

impl<C> Clone for FuzzyMatch<'_, C> {
    fn clone(&self) -> Self {
        Self {
            candidate: self.candidate,
            score: self.score,
            matched_alias: self.matched_alias,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Resolution<'a, C> {
    Resolved(FuzzyMatch<'a, C>),
    /// Two to five ranked options.
    Ambiguous(Vec<FuzzyMatch<'a, C>>),
    NoMatch,
}

fn compact(key: &str) -> String {
    key.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whether `phrase` appears in `key` on word boundaries.
fn contains_phrase(key: &str, phrase: &str) -> bool {
    key == phrase
        || key.starts_with(&format!("{phrase} "))
        || key.ends_with(&format!(" {phrase}"))
        || key.contains(&format!(" {phrase} "))
}

fn word_matches(query_word: &str, name_words: &[&str]) -> bool {
    name_words.iter().any(|word| {
        *word == query_word || normalized_levenshtein(query_word, word) >= WORD_SIMILARITY
    })
}

fn direct_score(query: &str, name: &str) -> f64 {
    if query == name {
        return 1.0;
    }
    if compact(query) == compact(name) {
        return ALL_WORDS_CAP;
    }
    let mut score = normalized_levenshtein(query, name);
    if query.chars().count() >= 3 && name.contains(query) {
        score = score.max(CONTAINMENT_SCORE);
    }
    score
}

fn alias_score<C: Candidate>(query: &str, name: &str) -> Option<&'static str> {
    let compact_name = compact(name);
    C::aliases()
        .iter()
        .find(|(alias, canonical)| {
            contains_phrase(query, alias)
                && (name.contains(canonical) || compact_name.contains(&compact(canonical)))
        })
        .map(|(alias, _)| *alias)
}

fn word_scores(query: &str, name: &str, partial_factor: f64) -> f64 {
    let query_words: Vec<&str> = words(query).collect();
    let name_words: Vec<&str> = words(name).collect();
    if query_words.is_empty() || name_words.is_empty() {
        return 0.0;
    }
    let matched = query_words
        .iter()
        .filter(|word| word_matches(word, &name_words))
        .count();
    if matched == query_words.len() {
        let coverage = query.chars().count() as f64 / name.chars().count().max(1) as f64;
        return (ALL_WORDS_BASE + ALL_WORDS_SPAN * coverage).min(ALL_WORDS_CAP);
    }
    partial_factor * matched as f64 / query_words.len() as f64
}

/// Score one candidate, or `None` when it falls below [`MIN_SCORE`].
pub fn score<'a, C: Candidate>(
    query: &str,
    candidate: &'a C,
    currency: Option<Currency>,
) -> Option<FuzzyMatch<'a, C>> {
    let query = normalize_key(query);
    let name = normalize_key(candidate.name());
    if query.is_empty() || name.is_empty() {
        return None;
    }

    let mut best = direct_score(&query, &name);
    let mut matched_alias = None;
    if best < ALIAS_SCORE
        && let Some(alias) = alias_score::<C>(&query, &name)
    {
        best = ALIAS_SCORE;
        matched_alias = Some(alias);
    }
    let by_words = word_scores(&query, &name, C::PARTIAL_FACTOR);
    if by_words > best {
        best = by_words;
        matched_alias = None;
    }

    if let (Some(wanted), Some(actual)) = (currency, candidate.currency())
        && wanted != actual
    {
        best -= CURRENCY_PENALTY;
    }

    (best >= MIN_SCORE).then_some(FuzzyMatch {
        candidate,
        score: best.min(1.0),
        matched_alias,
    })
}

/// Every candidate above the floor, best first; ties by name.
pub fn rank<'a, C: Candidate + 'a>(
    query: &str,
    pool: impl IntoIterator<Item = &'a C>,
    currency: Option<Currency>,
) -> Vec<FuzzyMatch<'a, C>> {
    let mut matches: Vec<FuzzyMatch<'a, C>> = pool
        .into_iter()
        .filter_map(|candidate| score(query, candidate, currency))
        .collect();
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.candidate.name().cmp(b.candidate.name()))
    });
    matches
}

/// Pick a winner or ask.
///
/// Auto-resolves when there is a single candidate, when the top score clears
/// [`EXACT_THRESHOLD`], or when the top two are [`CLEAR_WINNER_MARGIN`] apart.
pub fn decide<C>(mut matches: Vec<FuzzyMatch<'_, C>>) -> Resolution<'_, C> {
    match matches.len() {
        0 => return Resolution::NoMatch,
        1 => return Resolution::Resolved(matches.remove(0)),
        _ => {}
    }
    let top = matches[0].score;
    let second = matches[1].score;
    if top >= EXACT_THRESHOLD || top - second >= CLEAR_WINNER_MARGIN {
        return Resolution::Resolved(matches.remove(0));
    }
    matches.truncate(MAX_OPTIONS);
    Resolution::Ambiguous(matches)
}

pub fn resolve<'a, C: Candidate + 'a>(
    query: &str,
    pool: impl IntoIterator<Item = &'a C>,
    currency: Option<Currency>,
) -> Resolution<'a, C> {
    decide(rank(query, pool, currency))
}

/// Accounts eligible for `field` of `intent`: card payments draw the card
/// from credit cards and the source from everything else.
#[must_use]
pub fn account_pool<'a>(ctx: &'a UserContext, intent: Intent, field: Field) -> Vec<&'a Account> {
    ctx.accounts
        .iter()
        .filter(|account| match (intent, field) {
            (_, Field::TargetCard) => account.is_credit_card,
            (Intent::PagarTarjeta | Intent::Transferencia, Field::FromAccount) => {
                !account.is_credit_card
            }
            _ => true,
        })
        .collect()
}

/// Category kind booked by `intent`, when it books one.
#[must_use]
pub fn category_kind(intent: Intent) -> Option<CategoryKind> {
    match intent {
        Intent::RegistrarGasto | Intent::ConsultarGastos => Some(CategoryKind::Expense),
        Intent::RegistrarIngreso | Intent::ConsultarIngresos => Some(CategoryKind::Income),
        _ => None,
    }
}

#[must_use]
pub fn category_pool(ctx: &UserContext, intent: Intent) -> Vec<&Category> {
    match category_kind(intent) {
        Some(kind) => ctx.categories_of(kind).collect(),
        None => ctx.categories.iter().collect(),
    }
}
