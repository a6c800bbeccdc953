//! Selection and missing-field prompts.

use ledger::{Account, Category, UserContext};

use crate::{
    entities::{Field, ParsedEntities},
    fuzzy::{self, FuzzyMatch, Resolution},
    intent::Intent,
    locale::templates,
    state::{ConversationState, DisambiguationOption},
    text,
};

/// A question the conversation waits on.
#[derive(Clone, Debug, PartialEq)]
pub struct Prompt {
    pub state: ConversationState,
    pub field: Option<Field>,
    pub text: String,
    pub options: Vec<DisambiguationOption>,
}

impl Prompt {
    #[must_use]
    pub fn value(field: Field, text: String) -> Self {
        Self {
            state: ConversationState::AwaitingEditValue,
            field: Some(field),
            text,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn selection(
        state: ConversationState,
        field: Field,
        text: String,
        options: Vec<DisambiguationOption>,
    ) -> Self {
        Self {
            state,
            field: Some(field),
            text,
            options,
        }
    }

    /// Question plus the numbered option list.
    #[must_use]
    pub fn render(&self) -> String {
        if self.options.is_empty() {
            return self.text.clone();
        }
        let mut out = self.text.clone();
        out.push_str(&options_list(&self.options));
        out
    }
}

#[must_use]
pub fn account_option(account: &Account) -> DisambiguationOption {
    DisambiguationOption {
        id: account.id,
        display_name: account.name.clone(),
        icon: account.icon.clone(),
        balance: Some(account.balance),
        currency: Some(account.currency),
    }
}

#[must_use]
pub fn category_option(category: &Category) -> DisambiguationOption {
    DisambiguationOption {
        id: category.id,
        display_name: category.name.clone(),
        icon: category.icon.clone(),
        balance: None,
        currency: None,
    }
}

fn options_list(options: &[DisambiguationOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let detail = match (option.balance, option.currency) {
                (Some(balance), Some(currency)) => Some(balance.format(currency)),
                _ => None,
            };
            let name = match &option.icon {
                Some(icon) => format!("{icon} {}", option.display_name),
                None => option.display_name.clone(),
            };
            format!("\n{}", templates::option_line(index + 1, &name, detail.as_deref()))
        })
        .collect()
}

/// State that answers a selection for `field`.
#[must_use]
pub fn selection_state(field: Field) -> ConversationState {
    match field {
        Field::Category => ConversationState::AwaitingCategorySelection,
        Field::TargetCard => ConversationState::AwaitingCardSelection,
        _ => ConversationState::AwaitingAccountSelection,
    }
}

fn noun(field: Field) -> &'static str {
    match field {
        Field::Category => "una categoría",
        Field::TargetCard => "una tarjeta",
        _ => "una cuenta",
    }
}

fn plural(field: Field) -> &'static str {
    match field {
        Field::Category => "categorías",
        Field::TargetCard => "tarjetas",
        _ => "cuentas",
    }
}

fn pick_question(intent: Intent, field: Field) -> &'static str {
    match (intent, field) {
        (Intent::RegistrarGasto, Field::Account) => "Con qué cuenta pagaste",
        (Intent::RegistrarIngreso, Field::Account) => "En qué cuenta entró la plata",
        (_, Field::Account) => "Qué cuenta",
        (_, Field::Category) => "En qué categoría lo anoto",
        (Intent::PagarTarjeta, Field::FromAccount) => "Desde qué cuenta pagás",
        (_, Field::FromAccount) => "Desde qué cuenta",
        (_, Field::ToAccount) => "A qué cuenta",
        _ => "Qué tarjeta pagás",
    }
}

#[must_use]
pub fn amount_question(intent: Intent) -> String {
    let action = match intent {
        Intent::RegistrarIngreso => "el ingreso",
        Intent::Transferencia => "la transferencia",
        Intent::PagarTarjeta => "el pago",
        _ => "el gasto",
    };
    templates::ask_amount(action)
}

/// Message shown when the user has nothing to pick from for `field`.
#[must_use]
pub fn empty_pool(field: Field) -> &'static str {
    match field {
        Field::Category => templates::NO_CATEGORIES,
        Field::TargetCard => templates::NO_CARDS,
        _ => templates::NO_ACCOUNTS,
    }
}

/// Everything the user may pick for `field`. Transfers never offer the
/// account already chosen on the other side.
#[must_use]
pub fn options_for(
    ctx: &UserContext,
    intent: Intent,
    field: Field,
    entities: &ParsedEntities,
) -> Vec<DisambiguationOption> {
    if field == Field::Category {
        return fuzzy::category_pool(ctx, intent)
            .into_iter()
            .map(category_option)
            .collect();
    }
    let counterpart = match field {
        Field::FromAccount => entities.resolved_id(Field::ToAccount),
        Field::ToAccount => entities.resolved_id(Field::FromAccount),
        _ => None,
    };
    fuzzy::account_pool(ctx, intent, field)
        .into_iter()
        .filter(|account| Some(account.id) != counterpart)
        .map(account_option)
        .collect()
}

/// Ask for `field` by listing `options`.
#[must_use]
pub fn pick_prompt(intent: Intent, field: Field, options: Vec<DisambiguationOption>) -> Prompt {
    Prompt::selection(
        selection_state(field),
        field,
        templates::ask_pick(pick_question(intent, field)),
        options,
    )
}

/// Outcome of resolving one free-text reference.
#[derive(Clone, Debug, PartialEq)]
pub enum RefOutcome {
    Resolved(uuid::Uuid),
    Ask(Prompt),
}

fn ambiguous_prompt<C>(
    field: Field,
    query: &str,
    matches: &[FuzzyMatch<'_, C>],
    option: impl Fn(&C) -> DisambiguationOption,
) -> Prompt {
    Prompt::selection(
        ConversationState::AwaitingDisambiguation,
        field,
        templates::disambiguation(plural(field), query),
        matches.iter().map(|found| option(found.candidate)).collect(),
    )
}

/// Resolve `query` for `field`, or build the prompt that settles it.
/// `None` means the user has nothing of that kind at all.
#[must_use]
pub fn resolve_ref(
    ctx: &UserContext,
    intent: Intent,
    field: Field,
    query: &str,
    entities: &ParsedEntities,
) -> Option<RefOutcome> {
    let options = options_for(ctx, intent, field, entities);
    if options.is_empty() {
        return None;
    }
    let no_match = || {
        RefOutcome::Ask(Prompt::selection(
            selection_state(field),
            field,
            templates::no_match(noun(field), query),
            options.clone(),
        ))
    };

    let outcome = if field == Field::Category {
        match fuzzy::resolve(query, fuzzy::category_pool(ctx, intent), None) {
            Resolution::Resolved(found) => RefOutcome::Resolved(found.candidate.id),
            Resolution::Ambiguous(matches) => {
                RefOutcome::Ask(ambiguous_prompt(field, query, &matches, category_option))
            }
            Resolution::NoMatch => no_match(),
        }
    } else {
        let pool: Vec<&Account> = fuzzy::account_pool(ctx, intent, field)
            .into_iter()
            .filter(|account| options.iter().any(|option| option.id == account.id))
            .collect();
        match fuzzy::resolve(query, pool, entities.currency) {
            Resolution::Resolved(found) => RefOutcome::Resolved(found.candidate.id),
            Resolution::Ambiguous(matches) => {
                RefOutcome::Ask(ambiguous_prompt(field, query, &matches, account_option))
            }
            Resolution::NoMatch => no_match(),
        }
    };
    Some(outcome)
}

/// Index (0-based) of the option a typed answer points at: its number, or
/// a name that fits exactly one option.
#[must_use]
pub fn pick_from_text(options: &[DisambiguationOption], answer: &str) -> Option<usize> {
    let key = text::normalize_key(answer);
    if let Ok(number) = key.parse::<usize>() {
        return (1..=options.len()).contains(&number).then(|| number - 1);
    }
    if key.is_empty() {
        return None;
    }
    let names: Vec<String> = options
        .iter()
        .map(|option| text::normalize_key(&option.display_name))
        .collect();
    if let Some(exact) = names.iter().position(|name| *name == key) {
        return Some(exact);
    }
    let mut close = names.iter().enumerate().filter(|(_, name)| {
        name.contains(key.as_str())
            || strsim::normalized_levenshtein(name, &key) >= fuzzy::EXACT_THRESHOLD
    });
    match (close.next(), close.next()) {
        (Some((index, _)), None) => Some(index),
        _ => None,
    }
}
