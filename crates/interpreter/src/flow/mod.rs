//! Moving an intent towards execution one question at a time.
//!
//! [`advance`] is called after every change to the entities (first message,
//! a pick, an edited value). It resolves pending references, auto-fills
//! single-candidate fields and then either asks for the first missing field
//! or hands back something ready to confirm or answer.

use chrono::NaiveDate;
use ledger::UserContext;

use crate::{
    entities::{EntityRef, Field, ParsedEntities, ResolvedCommand},
    error::InterpreterError,
    extract::amount,
    fuzzy,
    intent::Intent,
    locale::{
        keywords::{EVERY_ACCOUNT, is_one_of},
        templates,
    },
    state::ConversationState,
    text,
};

pub mod edit;
pub mod preview;
pub mod prompts;
pub mod reply;

use prompts::{Prompt, RefOutcome};

/// Where an intent stands after [`advance`].
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Waiting on the user.
    Ask(Prompt),
    /// A write with every field present.
    Confirm(ResolvedCommand),
    /// A read ready to run.
    Answer,
    /// Nothing can be done; the text says why.
    Stop(&'static str),
}

/// Reference slots of `intent`, in resolution order.
#[must_use]
pub fn reference_fields(intent: Intent) -> &'static [Field] {
    match intent {
        Intent::RegistrarGasto | Intent::RegistrarIngreso => &[Field::Account, Field::Category],
        Intent::Transferencia => &[Field::FromAccount, Field::ToAccount],
        Intent::PagarTarjeta => &[Field::TargetCard, Field::FromAccount],
        Intent::ConsultarSaldo | Intent::UltimosMovimientos => &[Field::Account],
        Intent::ConsultarGastos | Intent::ConsultarIngresos => &[Field::Category, Field::Account],
        _ => &[],
    }
}

fn set_resolved(entities: &mut ParsedEntities, field: Field, id: uuid::Uuid) {
    if let Some(slot) = entities.slot_mut(field) {
        let text = slot.as_ref().and_then(|current| current.text.clone());
        *slot = Some(EntityRef { text, id: Some(id) });
    }
}

fn clear(entities: &mut ParsedEntities, field: Field) {
    if let Some(slot) = entities.slot_mut(field) {
        *slot = None;
    }
}

/// Record the option the user picked for `field`.
pub fn select(entities: &mut ParsedEntities, field: Field, id: uuid::Uuid) {
    if let Some(slot) = entities.slot_mut(field) {
        *slot = Some(EntityRef::resolved(id));
    }
}

/// Transfers and card payments move money between two accounts of the same
/// currency.
fn check_pair(ctx: &UserContext, intent: Intent, entities: &mut ParsedEntities) -> Option<Step> {
    let (source, target) = match intent {
        Intent::Transferencia => (Field::FromAccount, Field::ToAccount),
        Intent::PagarTarjeta => (Field::FromAccount, Field::TargetCard),
        _ => return None,
    };
    let from = ctx.account(entities.resolved_id(source)?)?;
    let to = ctx.account(entities.resolved_id(target)?)?;

    let message = if from.id == to.id {
        templates::SAME_ACCOUNT
    } else if from.currency != to.currency {
        templates::CURRENCY_MISMATCH
    } else {
        return None;
    };
    clear(entities, target);
    let options: Vec<_> = prompts::options_for(ctx, intent, target, entities)
        .into_iter()
        .filter(|option| option.currency == Some(from.currency))
        .collect();
    if options.is_empty() {
        return Some(Step::Stop(message));
    }
    let mut prompt = prompts::pick_prompt(intent, target, options);
    prompt.text = format!("{message}\n{}", prompt.text);
    Some(Step::Ask(prompt))
}

/// An amount outside the bookable range is dropped and asked for again.
fn check_amount(intent: Intent, entities: &mut ParsedEntities) -> Option<Step> {
    let Err(InterpreterError::Validation(reason)) = amount::check_range(entities.amount?) else {
        return None;
    };
    entities.amount = None;
    Some(Step::Ask(Prompt::value(
        Field::Amount,
        format!("{reason}\n{}", prompts::amount_question(intent)),
    )))
}

/// Whether an answer to the balance prompt asks for every account.
#[must_use]
pub fn is_every_account(answer: &str) -> bool {
    is_one_of(&text::normalize_key(answer), EVERY_ACCOUNT)
}

/// A balance query naming no account asks which one when there are several.
fn balance_scope(ctx: &UserContext, entities: &mut ParsedEntities) -> Option<Step> {
    if let Some(slot) = &entities.account {
        if slot.text.as_deref().is_some_and(is_every_account) {
            entities.account = None;
            return Some(Step::Answer);
        }
        return None;
    }
    if ctx.accounts.len() < 2 {
        return None;
    }
    let options = ctx
        .accounts
        .iter()
        .take(fuzzy::MAX_OPTIONS)
        .map(prompts::account_option)
        .collect();
    Some(Step::Ask(Prompt::selection(
        ConversationState::AwaitingDisambiguation,
        Field::Account,
        templates::BALANCE_WHICH.to_string(),
        options,
    )))
}

/// Push `intent` as far as the entities allow.
pub fn advance(
    ctx: &UserContext,
    intent: Intent,
    entities: &mut ParsedEntities,
    today: NaiveDate,
) -> Step {
    if intent.is_write()
        && let Some(step) = check_amount(intent, entities)
    {
        return step;
    }
    if intent == Intent::ConsultarSaldo
        && let Some(step) = balance_scope(ctx, entities)
    {
        return step;
    }

    for field in reference_fields(intent) {
        let Some(query) = entities
            .slot(*field)
            .filter(|slot| !slot.is_resolved())
            .and_then(|slot| slot.text.clone())
        else {
            continue;
        };
        match prompts::resolve_ref(ctx, intent, *field, &query, entities) {
            Some(RefOutcome::Resolved(id)) => set_resolved(entities, *field, id),
            Some(RefOutcome::Ask(prompt)) => {
                clear(entities, *field);
                return Step::Ask(prompt);
            }
            None => return Step::Stop(prompts::empty_pool(*field)),
        }
    }

    if !intent.is_write() {
        return if intent.is_read() {
            Step::Answer
        } else {
            Step::Stop(templates::NOT_UNDERSTOOD)
        };
    }

    let required = Field::required_for(intent);
    for field in required.iter().filter(|field| field.is_reference()) {
        if entities.has(*field) {
            continue;
        }
        if let [only] = prompts::options_for(ctx, intent, *field, entities).as_slice() {
            select(entities, *field, only.id);
        }
    }
    if let Some(missing) = required.iter().find(|field| !entities.has(**field)) {
        if !missing.is_reference() {
            return Step::Ask(Prompt::value(*missing, prompts::amount_question(intent)));
        }
        let options = prompts::options_for(ctx, intent, *missing, entities);
        if options.is_empty() {
            return Step::Stop(prompts::empty_pool(*missing));
        }
        return Step::Ask(prompts::pick_prompt(intent, *missing, options));
    }

    if let Some(step) = check_pair(ctx, intent, entities) {
        return step;
    }

    entities.first_installment_date = None;
    if intent == Intent::RegistrarGasto
        && entities.installments.is_some_and(|count| count > 1)
        && let Some(account) = entities
            .resolved_id(Field::Account)
            .and_then(|id| ctx.account(id))
    {
        entities.first_installment_date = Some(preview::first_installment_date(
            account,
            entities.date.unwrap_or(today),
        ));
    }

    match ResolvedCommand::from_entities(intent, entities, today) {
        Ok(command) => Step::Confirm(command),
        Err(Some(field)) if !field.is_reference() => {
            Step::Ask(Prompt::value(field, prompts::amount_question(intent)))
        }
        Err(_) => Step::Stop(templates::NOT_UNDERSTOOD),
    }
}

#[cfg(test)]
mod tests {
    use ledger::{Account, Category, CategoryKind, Currency, Money, UserSettings};
    use uuid::Uuid;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn account(name: &str, currency: Currency) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            currency,
            balance: Money::from_major(1_000),
            is_credit_card: false,
            closing_day: None,
            icon: None,
        }
    }

    fn category(name: &str, kind: CategoryKind) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            icon: None,
        }
    }

    fn context(accounts: Vec<Account>, categories: Vec<Category>) -> UserContext {
        UserContext {
            user_id: Uuid::new_v4(),
            accounts,
            categories,
            settings: UserSettings {
                display_name: "Ana".to_string(),
                default_currency: Currency::Ars,
            },
        }
    }

    #[test]
    fn single_candidates_fill_themselves() {
        let ctx = context(
            vec![account("Efectivo", Currency::Ars)],
            vec![
                category("Comida", CategoryKind::Expense),
                category("Sueldo", CategoryKind::Income),
            ],
        );
        let mut entities = ParsedEntities {
            amount: Some(Money::from_major(500)),
            ..Default::default()
        };
        match advance(&ctx, Intent::RegistrarGasto, &mut entities, today()) {
            Step::Confirm(ResolvedCommand::Expense(expense)) => {
                assert_eq!(expense.account_id, ctx.accounts[0].id);
                assert_eq!(expense.category_id, ctx.categories[0].id);
                assert_eq!(expense.date, today());
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn missing_amount_is_asked_first() {
        let ctx = context(
            vec![account("Efectivo", Currency::Ars)],
            vec![category("Comida", CategoryKind::Expense)],
        );
        let mut entities = ParsedEntities::default();
        match advance(&ctx, Intent::RegistrarGasto, &mut entities, today()) {
            Step::Ask(prompt) => {
                assert_eq!(prompt.state, ConversationState::AwaitingEditValue);
                assert_eq!(prompt.field, Some(Field::Amount));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn out_of_range_amounts_are_asked_again() {
        let ctx = context(
            vec![account("Efectivo", Currency::Ars)],
            vec![category("Comida", CategoryKind::Expense)],
        );
        for amount in [Money::ZERO, Money::from_major(200_000_000)] {
            let mut entities = ParsedEntities {
                amount: Some(amount),
                ..Default::default()
            };
            match advance(&ctx, Intent::RegistrarGasto, &mut entities, today()) {
                Step::Ask(prompt) => {
                    assert_eq!(prompt.state, ConversationState::AwaitingEditValue);
                    assert_eq!(prompt.field, Some(Field::Amount));
                    assert!(prompt.text.starts_with("El monto tiene que ser"));
                }
                other => panic!("unexpected step {other:?}"),
            }
            assert_eq!(entities.amount, None);
        }
    }

    #[test]
    fn one_prompt_per_turn() {
        let ctx = context(
            vec![account("Efectivo", Currency::Ars), account("MercadoPago", Currency::Ars)],
            vec![
                category("Comida", CategoryKind::Expense),
                category("Transporte", CategoryKind::Expense),
            ],
        );
        let mut entities = ParsedEntities {
            amount: Some(Money::from_major(500)),
            ..Default::default()
        };
        match advance(&ctx, Intent::RegistrarGasto, &mut entities, today()) {
            Step::Ask(prompt) => {
                assert_eq!(prompt.state, ConversationState::AwaitingAccountSelection);
                assert_eq!(prompt.options.len(), 2);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert!(!entities.has(Field::Category));
    }

    #[test]
    fn unknown_reference_offers_the_whole_pool() {
        let ctx = context(
            vec![account("Efectivo", Currency::Ars), account("MercadoPago", Currency::Ars)],
            vec![category("Comida", CategoryKind::Expense)],
        );
        let mut entities = ParsedEntities {
            amount: Some(Money::from_major(500)),
            account: Some(EntityRef::text("santander")),
            ..Default::default()
        };
        match advance(&ctx, Intent::RegistrarGasto, &mut entities, today()) {
            Step::Ask(prompt) => {
                assert_eq!(prompt.state, ConversationState::AwaitingAccountSelection);
                assert!(prompt.text.contains("santander"));
                assert_eq!(prompt.options.len(), 2);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(entities.account, None);
    }

    #[test]
    fn transfers_need_matching_currencies() {
        let ctx = context(
            vec![
                account("Banco Galicia", Currency::Ars),
                account("Cuenta Dólares", Currency::Usd),
                account("MercadoPago", Currency::Ars),
            ],
            vec![],
        );
        let mut entities = ParsedEntities {
            amount: Some(Money::from_major(100)),
            from_account: Some(EntityRef::resolved(ctx.accounts[0].id)),
            to_account: Some(EntityRef::resolved(ctx.accounts[1].id)),
            ..Default::default()
        };
        match advance(&ctx, Intent::Transferencia, &mut entities, today()) {
            Step::Ask(prompt) => {
                assert!(prompt.text.starts_with(templates::CURRENCY_MISMATCH));
                assert_eq!(prompt.field, Some(Field::ToAccount));
                let names: Vec<&str> =
                    prompt.options.iter().map(|o| o.display_name.as_str()).collect();
                assert_eq!(names, vec!["MercadoPago"]);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(entities.to_account, None);
    }

    #[test]
    fn bare_balance_asks_which_account() {
        let ctx = context(
            vec![
                account("Galicia Caja", Currency::Ars),
                account("Galicia Ahorro", Currency::Ars),
                account("Galicia Sueldo", Currency::Ars),
            ],
            vec![],
        );
        let mut entities = ParsedEntities::default();
        match advance(&ctx, Intent::ConsultarSaldo, &mut entities, today()) {
            Step::Ask(prompt) => {
                assert_eq!(prompt.state, ConversationState::AwaitingDisambiguation);
                assert_eq!(prompt.field, Some(Field::Account));
                assert_eq!(prompt.options.len(), 3);
            }
            other => panic!("unexpected step {other:?}"),
        }

        let mut entities = ParsedEntities {
            account: Some(EntityRef::text("todas")),
            ..Default::default()
        };
        assert_eq!(
            advance(&ctx, Intent::ConsultarSaldo, &mut entities, today()),
            Step::Answer
        );
        assert_eq!(entities.account, None);

        let single = context(vec![account("Efectivo", Currency::Ars)], vec![]);
        let mut entities = ParsedEntities::default();
        assert_eq!(
            advance(&single, Intent::ConsultarSaldo, &mut entities, today()),
            Step::Answer
        );
    }

    #[test]
    fn reads_without_references_answer_directly() {
        let ctx = context(vec![account("Efectivo", Currency::Ars)], vec![]);
        let mut entities = ParsedEntities::default();
        assert_eq!(
            advance(&ctx, Intent::ResumenMes, &mut entities, today()),
            Step::Answer
        );
    }
}
