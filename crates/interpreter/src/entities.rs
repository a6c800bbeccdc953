//! Extraction results and the commands they turn into.
//!
//! [`ParsedEntities`] is the partial, all-optional bag filled across
//! extraction, resolution and edit turns; it is what gets persisted between
//! turns. Once every required field is present it converts into a
//! [`ResolvedCommand`], whose variants carry non-optional fields only.

use chrono::{Datelike, NaiveDate};
use ledger::{Currency, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{intent::Intent, locale::keywords::MONTH_NAMES};

/// A free-text reference and, once resolved, the id it points to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub text: Option<String>,
    pub id: Option<Uuid>,
}

impl EntityRef {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            id: None,
        }
    }

    #[must_use]
    pub fn resolved(id: Uuid) -> Self {
        Self { text: None, id: Some(id) }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

/// A calendar month, used for statement months.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `self` shifted by `months` (may be negative).
    #[must_use]
    pub fn add_months(self, months: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    #[must_use]
    pub fn days(self) -> u32 {
        match (self.first_day(), self.add_months(1).first_day()) {
            (Some(start), Some(end)) => (end - start).num_days() as u32,
            _ => 28,
        }
    }

    /// `day` of this month, clamped to its last day.
    #[must_use]
    pub fn day_clamped(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day.clamp(1, self.days()))
    }

    /// "noviembre 2026".
    #[must_use]
    pub fn label(self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        format!("{name} {}", self.year)
    }
}

/// Date range of a read query, `[from, to)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub label: String,
}

impl QueryPeriod {
    #[must_use]
    pub fn month(month: YearMonth) -> Option<Self> {
        Some(Self {
            from: month.first_day()?,
            to: month.add_months(1).first_day()?,
            label: month.label(),
        })
    }

    #[must_use]
    pub fn current_month(today: NaiveDate) -> Option<Self> {
        let mut period = Self::month(YearMonth::of(today))?;
        period.label = "este mes".to_string();
        Some(period)
    }
}

/// Raw extraction bag, shared by every intent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedEntities {
    pub amount: Option<Money>,
    /// Only set when the message named a currency.
    pub currency: Option<Currency>,
    pub category: Option<EntityRef>,
    pub account: Option<EntityRef>,
    pub from_account: Option<EntityRef>,
    pub to_account: Option<EntityRef>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub installments: Option<u32>,
    pub first_installment_date: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub target_card: Option<EntityRef>,
    pub statement_month: Option<YearMonth>,
    pub stamp_tax_amount: Option<Money>,
    pub period: Option<QueryPeriod>,
}

impl ParsedEntities {
    /// Fill every empty field of `self` from `other`.
    pub fn fill_gaps(&mut self, other: ParsedEntities) {
        macro_rules! fill {
            ($($field:ident),* $(,)?) => {
                $( if self.$field.is_none() { self.$field = other.$field; } )*
            };
        }
        fill!(
            amount,
            currency,
            category,
            account,
            from_account,
            to_account,
            date,
            note,
            installments,
            first_installment_date,
            limit,
            target_card,
            statement_month,
            stamp_tax_amount,
            period,
        );
    }

    #[must_use]
    pub fn slot(&self, field: Field) -> Option<&EntityRef> {
        match field {
            Field::Account => self.account.as_ref(),
            Field::FromAccount => self.from_account.as_ref(),
            Field::ToAccount => self.to_account.as_ref(),
            Field::Category => self.category.as_ref(),
            Field::TargetCard => self.target_card.as_ref(),
            _ => None,
        }
    }

    /// Mutable access to a reference slot; `None` for value fields.
    pub fn slot_mut(&mut self, field: Field) -> Option<&mut Option<EntityRef>> {
        match field {
            Field::Account => Some(&mut self.account),
            Field::FromAccount => Some(&mut self.from_account),
            Field::ToAccount => Some(&mut self.to_account),
            Field::Category => Some(&mut self.category),
            Field::TargetCard => Some(&mut self.target_card),
            _ => None,
        }
    }

    #[must_use]
    pub fn resolved_id(&self, field: Field) -> Option<Uuid> {
        self.slot(field).and_then(|slot| slot.id)
    }

    #[must_use]
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Amount => self.amount.is_some(),
            Field::Date => self.date.is_some(),
            Field::Note => self.note.is_some(),
            Field::Installments => self.installments.is_some(),
            Field::StampTax => self.stamp_tax_amount.is_some(),
            reference => self.resolved_id(reference).is_some(),
        }
    }
}

/// Editable / promptable fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Amount,
    Account,
    FromAccount,
    ToAccount,
    Category,
    TargetCard,
    Date,
    Note,
    Installments,
    StampTax,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::Account => "account",
            Field::FromAccount => "from_account",
            Field::ToAccount => "to_account",
            Field::Category => "category",
            Field::TargetCard => "target_card",
            Field::Date => "date",
            Field::Note => "note",
            Field::Installments => "installments",
            Field::StampTax => "stamp_tax",
        }
    }

    /// Label shown in the edit menu.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Field::Amount => "Monto",
            Field::Account => "Cuenta",
            Field::FromAccount => "Cuenta de origen",
            Field::ToAccount => "Cuenta de destino",
            Field::Category => "Categoría",
            Field::TargetCard => "Tarjeta",
            Field::Date => "Fecha",
            Field::Note => "Nota",
            Field::Installments => "Cuotas",
            Field::StampTax => "Impuesto de sellos",
        }
    }

    /// Whether the field holds an account/category reference.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Field::Account
                | Field::FromAccount
                | Field::ToAccount
                | Field::Category
                | Field::TargetCard
        )
    }

    /// Fields that must be present before `intent` can be confirmed, in
    /// prompt order.
    #[must_use]
    pub fn required_for(intent: Intent) -> &'static [Field] {
        match intent {
            Intent::RegistrarGasto | Intent::RegistrarIngreso => {
                &[Field::Amount, Field::Account, Field::Category]
            }
            Intent::Transferencia => &[Field::Amount, Field::FromAccount, Field::ToAccount],
            Intent::PagarTarjeta => &[Field::TargetCard, Field::Amount, Field::FromAccount],
            _ => &[],
        }
    }

    /// Fields offered in the edit menu of `intent`, in display order.
    #[must_use]
    pub fn editable_for(intent: Intent) -> &'static [Field] {
        match intent {
            Intent::RegistrarGasto => &[
                Field::Amount,
                Field::Category,
                Field::Account,
                Field::Date,
                Field::Note,
                Field::Installments,
            ],
            Intent::RegistrarIngreso => &[
                Field::Amount,
                Field::Category,
                Field::Account,
                Field::Date,
                Field::Note,
            ],
            Intent::Transferencia => &[
                Field::Amount,
                Field::FromAccount,
                Field::ToAccount,
                Field::Date,
                Field::Note,
            ],
            Intent::PagarTarjeta => &[
                Field::Amount,
                Field::TargetCard,
                Field::FromAccount,
                Field::Date,
                Field::StampTax,
            ],
            _ => &[],
        }
    }
}

impl TryFrom<&str> for Field {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        [
            Field::Amount,
            Field::Account,
            Field::FromAccount,
            Field::ToAccount,
            Field::Category,
            Field::TargetCard,
            Field::Date,
            Field::Note,
            Field::Installments,
            Field::StampTax,
        ]
        .into_iter()
        .find(|field| field.as_str() == value)
        .ok_or_else(|| format!("unknown field: {value}"))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedExpense {
    pub amount: Money,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub note: Option<String>,
    /// `1` for a single payment.
    pub installments: u32,
    /// Date of the first installment row; the purchase date for single
    /// payments.
    pub first_installment_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedIncome {
    pub amount: Money,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTransfer {
    pub amount: Money,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCardPayment {
    pub amount: Money,
    pub from_account_id: Uuid,
    pub card_id: Uuid,
    pub date: NaiveDate,
    pub statement_month: Option<YearMonth>,
    pub stamp_tax: Option<Money>,
    pub note: Option<String>,
}

/// A write whose required fields are all present.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedCommand {
    Expense(ResolvedExpense),
    Income(ResolvedIncome),
    Transfer(ResolvedTransfer),
    CardPayment(ResolvedCardPayment),
}

impl ResolvedCommand {
    /// Build the command, or report the first missing required field.
    ///
    /// Missing dates default to `today`.
    pub fn from_entities(
        intent: Intent,
        entities: &ParsedEntities,
        today: NaiveDate,
    ) -> Result<Self, Option<Field>> {
        if let Some(missing) = Field::required_for(intent)
            .iter()
            .find(|field| !entities.has(**field))
        {
            return Err(Some(*missing));
        }
        let amount = entities.amount.ok_or(Some(Field::Amount))?;
        let date = entities.date.unwrap_or(today);
        let note = entities.note.clone();
        let id = |field: Field| entities.resolved_id(field).ok_or(Some(field));

        let command = match intent {
            Intent::RegistrarGasto => ResolvedCommand::Expense(ResolvedExpense {
                amount,
                account_id: id(Field::Account)?,
                category_id: id(Field::Category)?,
                date,
                note,
                installments: entities.installments.unwrap_or(1).max(1),
                first_installment_date: entities.first_installment_date.unwrap_or(date),
            }),
            Intent::RegistrarIngreso => ResolvedCommand::Income(ResolvedIncome {
                amount,
                account_id: id(Field::Account)?,
                category_id: id(Field::Category)?,
                date,
                note,
            }),
            Intent::Transferencia => ResolvedCommand::Transfer(ResolvedTransfer {
                amount,
                from_account_id: id(Field::FromAccount)?,
                to_account_id: id(Field::ToAccount)?,
                date,
                note,
            }),
            Intent::PagarTarjeta => ResolvedCommand::CardPayment(ResolvedCardPayment {
                amount,
                from_account_id: id(Field::FromAccount)?,
                card_id: id(Field::TargetCard)?,
                date,
                statement_month: entities.statement_month,
                stamp_tax: entities.stamp_tax_amount.filter(|tax| tax.is_positive()),
                note,
            }),
            _ => return Err(None),
        };
        Ok(command)
    }

    #[must_use]
    pub fn intent(&self) -> Intent {
        match self {
            ResolvedCommand::Expense(_) => Intent::RegistrarGasto,
            ResolvedCommand::Income(_) => Intent::RegistrarIngreso,
            ResolvedCommand::Transfer(_) => Intent::Transferencia,
            ResolvedCommand::CardPayment(_) => Intent::PagarTarjeta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_month_arithmetic_wraps_years() {
        let dec = YearMonth { year: 2026, month: 12 };
        assert_eq!(dec.add_months(1), YearMonth { year: 2027, month: 1 });
        assert_eq!(dec.add_months(-12), YearMonth { year: 2025, month: 12 });
        assert_eq!(
            YearMonth { year: 2027, month: 1 }.add_months(-1),
            YearMonth { year: 2026, month: 12 }
        );
        assert_eq!(YearMonth { year: 2028, month: 2 }.days(), 29);
        assert_eq!(
            YearMonth { year: 2026, month: 2 }.day_clamped(31),
            Some(day(2026, 2, 28))
        );
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let mut entities = ParsedEntities {
            amount: Some(Money::from_major(500)),
            ..Default::default()
        };
        assert_eq!(
            ResolvedCommand::from_entities(Intent::RegistrarGasto, &entities, day(2026, 10, 18)),
            Err(Some(Field::Account))
        );

        entities.account = Some(EntityRef::resolved(Uuid::new_v4()));
        entities.category = Some(EntityRef::text("comida"));
        assert_eq!(
            ResolvedCommand::from_entities(Intent::RegistrarGasto, &entities, day(2026, 10, 18)),
            Err(Some(Field::Category))
        );

        entities.category = Some(EntityRef::resolved(Uuid::new_v4()));
        let command =
            ResolvedCommand::from_entities(Intent::RegistrarGasto, &entities, day(2026, 10, 18))
                .unwrap();
        match command {
            ResolvedCommand::Expense(expense) => {
                assert_eq!(expense.date, day(2026, 10, 18));
                assert_eq!(expense.installments, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn fill_gaps_keeps_existing_values() {
        let mut regex = ParsedEntities {
            amount: Some(Money::from_major(10)),
            ..Default::default()
        };
        regex.fill_gaps(ParsedEntities {
            amount: Some(Money::from_major(99)),
            note: Some("pizza".to_string()),
            ..Default::default()
        });
        assert_eq!(regex.amount, Some(Money::from_major(10)));
        assert_eq!(regex.note.as_deref(), Some("pizza"));
    }
}
