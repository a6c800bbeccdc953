//! The edit menu and typed field values.

use chrono::NaiveDate;
use ledger::UserContext;

use crate::{
    entities::{Field, ParsedEntities},
    error::ResultInterpreter,
    extract::{
        amount::parse_amount_input,
        date::parse_date_input,
        installments::{MAX_INSTALLMENTS, extract_installments},
    },
    flow::preview::{account_name, category_name, format_date, format_in},
    intent::Intent,
    locale::templates,
    text,
};

const MAX_NOTE_CHARS: usize = 120;
const CLEAR_WORDS: &[&str] = &["sin nota", "ninguna", "ninguno", "nada", "borrar", "sin sellos", "0", "-"];

fn keywords(field: Field) -> &'static [&'static str] {
    match field {
        Field::Amount => &["monto", "importe", "plata", "precio", "valor"],
        Field::Account => &["cuenta", "medio", "banco"],
        Field::FromAccount => &["origen", "desde"],
        Field::ToAccount => &["destino", "hacia"],
        Field::Category => &["categoria", "rubro"],
        Field::TargetCard => &["tarjeta"],
        Field::Date => &["fecha", "dia", "cuando"],
        Field::Note => &["nota", "descripcion", "detalle", "comentario"],
        Field::Installments => &["cuotas", "cuota"],
        Field::StampTax => &["sellos", "impuesto"],
    }
}

/// Current value of `field`, as shown in the edit menu.
#[must_use]
pub fn field_value(ctx: &UserContext, entities: &ParsedEntities, field: Field) -> String {
    let unset = || "-".to_string();
    match field {
        Field::Amount => match (entities.amount, entities.resolved_id(Field::Account)) {
            (Some(amount), Some(account)) => format_in(ctx, account, amount),
            (Some(amount), None) => match entities.resolved_id(Field::FromAccount) {
                Some(account) => format_in(ctx, account, amount),
                None => amount.format(ctx.settings.default_currency),
            },
            _ => unset(),
        },
        Field::Category => entities
            .resolved_id(field)
            .map_or_else(unset, |id| category_name(ctx, id)),
        Field::Account | Field::FromAccount | Field::ToAccount | Field::TargetCard => entities
            .resolved_id(field)
            .map_or_else(unset, |id| account_name(ctx, id)),
        Field::Date => entities.date.map_or_else(|| "hoy".to_string(), format_date),
        Field::Note => entities.note.clone().unwrap_or_else(unset),
        Field::Installments => entities.installments.unwrap_or(1).to_string(),
        Field::StampTax => entities
            .stamp_tax_amount
            .map_or_else(unset, |tax| tax.format(ctx.settings.default_currency)),
    }
}

/// "¿Qué querés cambiar?" followed by the numbered fields of `intent`.
#[must_use]
pub fn menu_text(ctx: &UserContext, intent: Intent, entities: &ParsedEntities) -> String {
    let mut out = templates::EDIT_FIELD_QUESTION.to_string();
    for (index, field) in Field::editable_for(intent).iter().enumerate() {
        out.push('\n');
        out.push_str(&templates::field_line(
            index + 1,
            field.label(),
            &field_value(ctx, entities, *field),
        ));
    }
    out
}

/// The field a typed answer to the edit menu names: its number, its label,
/// or one of its keywords.
#[must_use]
pub fn parse_field_choice(intent: Intent, answer: &str) -> Option<Field> {
    let fields = Field::editable_for(intent);
    let key = text::normalize_key(answer);
    if let Ok(number) = key.parse::<usize>() {
        return number.checked_sub(1).and_then(|index| fields.get(index)).copied();
    }
    if let Some(field) = fields
        .iter()
        .find(|field| text::normalize_key(field.label()) == key)
    {
        return Some(*field);
    }
    let words: Vec<&str> = text::words(&key).collect();
    fields
        .iter()
        .find(|field| {
            keywords(**field)
                .iter()
                .any(|keyword| words.contains(keyword))
        })
        .copied()
}

fn wants_clear(answer: &str) -> bool {
    let key = text::normalize_key(answer);
    CLEAR_WORDS.contains(&key.as_str()) || answer.trim() == "-"
}

/// Apply a typed value to `field`. Errors carry the text to re-prompt with;
/// the entities are untouched in that case.
pub fn apply_value(
    entities: &mut ParsedEntities,
    field: Field,
    answer: &str,
    today: NaiveDate,
) -> ResultInterpreter<()> {
    match field {
        Field::Amount => {
            let (amount, currency) = parse_amount_input(answer)?;
            entities.amount = Some(amount);
            if currency.is_some() {
                entities.currency = currency;
            }
        }
        Field::Date => entities.date = Some(parse_date_input(answer, today)?),
        Field::Note => {
            let note = answer.trim();
            if wants_clear(note) {
                entities.note = None;
            } else if note.chars().count() > MAX_NOTE_CHARS {
                return Err(crate::error::InterpreterError::validation(format!(
                    "La nota puede tener hasta {MAX_NOTE_CHARS} caracteres."
                )));
            } else {
                entities.note = Some(note.to_string());
            }
        }
        Field::Installments => {
            let normalized = text::normalize(answer);
            let count = text::bare(&normalized)
                .parse::<u32>()
                .ok()
                .or_else(|| extract_installments(&normalized).map(|(count, _)| count))
                .filter(|count| (1..=MAX_INSTALLMENTS).contains(count))
                .ok_or_else(|| {
                    crate::error::InterpreterError::validation(format!(
                        "Las cuotas tienen que ser un número entre 1 y {MAX_INSTALLMENTS}."
                    ))
                })?;
            entities.installments = Some(count);
        }
        Field::StampTax => {
            if wants_clear(answer) {
                entities.stamp_tax_amount = None;
            } else {
                entities.stamp_tax_amount = Some(parse_amount_input(answer)?.0);
            }
        }
        reference => {
            return Err(crate::error::InterpreterError::validation(format!(
                "{} se elige de la lista.",
                reference.label()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ledger::Money;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn field_choice_by_number_label_or_keyword() {
        assert_eq!(parse_field_choice(Intent::RegistrarGasto, "1"), Some(Field::Amount));
        assert_eq!(parse_field_choice(Intent::RegistrarGasto, "4"), Some(Field::Date));
        assert_eq!(parse_field_choice(Intent::RegistrarGasto, "9"), None);
        assert_eq!(parse_field_choice(Intent::RegistrarGasto, "Categoría"), Some(Field::Category));
        assert_eq!(parse_field_choice(Intent::RegistrarGasto, "el monto"), Some(Field::Amount));
        assert_eq!(
            parse_field_choice(Intent::Transferencia, "la cuenta de destino"),
            Some(Field::ToAccount)
        );
        assert_eq!(parse_field_choice(Intent::RegistrarIngreso, "cuotas"), None);
    }

    #[test]
    fn valid_values_are_applied() {
        let mut entities = ParsedEntities::default();
        apply_value(&mut entities, Field::Amount, "2,5k", today()).unwrap();
        assert_eq!(entities.amount, Some(Money::from_major(2_500)));

        apply_value(&mut entities, Field::Date, "ayer", today()).unwrap();
        assert_eq!(entities.date, NaiveDate::from_ymd_opt(2026, 10, 17));

        apply_value(&mut entities, Field::Installments, "6 cuotas", today()).unwrap();
        assert_eq!(entities.installments, Some(6));

        apply_value(&mut entities, Field::Note, "regalo de Ana", today()).unwrap();
        assert_eq!(entities.note.as_deref(), Some("regalo de Ana"));
        apply_value(&mut entities, Field::Note, "sin nota", today()).unwrap();
        assert_eq!(entities.note, None);
    }

    #[test]
    fn invalid_values_leave_entities_untouched() {
        let mut entities = ParsedEntities {
            amount: Some(Money::from_major(500)),
            installments: Some(3),
            ..Default::default()
        };
        let before = entities.clone();
        assert!(apply_value(&mut entities, Field::Amount, "mucho", today()).is_err());
        assert!(apply_value(&mut entities, Field::Amount, "0", today()).is_err());
        assert!(apply_value(&mut entities, Field::Date, "el otro dia", today()).is_err());
        assert!(apply_value(&mut entities, Field::Installments, "99", today()).is_err());
        assert!(apply_value(&mut entities, Field::Account, "galicia", today()).is_err());
        assert_eq!(entities, before);
    }
}
