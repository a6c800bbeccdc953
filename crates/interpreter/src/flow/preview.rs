//! Confirmation previews and the card/installment calendar they show.

use chrono::{Datelike, NaiveDate};
use ledger::{Account, Category, CategoryKind, Money, UserContext};
use uuid::Uuid;

use crate::{
    config::InstallmentRounding,
    entities::{ResolvedCommand, YearMonth},
    fuzzy::{self, Resolution},
    locale::{aliases::STAMP_TAX_CATEGORY, templates},
};

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub(crate) fn account_name(ctx: &UserContext, id: Uuid) -> String {
    ctx.account(id)
        .map_or_else(|| "?".to_string(), |account| account.name.clone())
}

pub(crate) fn category_name(ctx: &UserContext, id: Uuid) -> String {
    ctx.category(id)
        .map_or_else(|| "?".to_string(), |category| category.name.clone())
}

/// Amount formatted in the currency of `account_id`.
pub(crate) fn format_in(ctx: &UserContext, account_id: Uuid, amount: Money) -> String {
    let currency = ctx
        .account(account_id)
        .map_or(ctx.settings.default_currency, |account| account.currency);
    amount.format(currency)
}

/// Statement a card purchase made on `date` is billed in: the next month
/// up to the closing day, the one after past it.
#[must_use]
pub fn statement_month(closing_day: u32, date: NaiveDate) -> YearMonth {
    let offset = if date.day() <= closing_day { 1 } else { 2 };
    YearMonth::of(date).add_months(offset)
}

/// First installment of a purchase on `account`: same day of month within
/// the statement month for cards, the purchase date otherwise.
#[must_use]
pub fn first_installment_date(account: &Account, purchase_date: NaiveDate) -> NaiveDate {
    match (account.is_credit_card, account.closing_day) {
        (true, Some(closing_day)) => statement_month(closing_day, purchase_date)
            .day_clamped(purchase_date.day())
            .unwrap_or(purchase_date),
        _ => purchase_date,
    }
}

/// `count` monthly dates starting at `first`. The day of month is the
/// smallest that exists in every month of the range.
#[must_use]
pub fn installment_dates(first: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let start = YearMonth::of(first);
    let months: Vec<YearMonth> = (0..count as i32).map(|i| start.add_months(i)).collect();
    let day = months
        .iter()
        .map(|month| month.days())
        .fold(first.day(), u32::min);
    months
        .into_iter()
        .filter_map(|month| month.day_clamped(day))
        .collect()
}

/// Row amounts of an installment purchase.
#[must_use]
pub fn installment_amounts(
    total: Money,
    count: u32,
    rounding: InstallmentRounding,
) -> Option<Vec<Money>> {
    let each = total.div_round(count)?;
    let mut rows = vec![each; count as usize];
    if rounding == InstallmentRounding::ReconcileLast {
        let head = Money::new(each.minor().checked_mul(i64::from(count.saturating_sub(1)))?);
        let last = total.checked_sub(head)?;
        if let Some(slot) = rows.last_mut() {
            *slot = last;
        }
    }
    Some(rows)
}

/// Expense category the stamp tax of a card payment is booked in.
#[must_use]
pub fn stamp_tax_category(ctx: &UserContext) -> Option<&Category> {
    match fuzzy::resolve(
        STAMP_TAX_CATEGORY,
        ctx.categories_of(CategoryKind::Expense),
        None,
    ) {
        Resolution::Resolved(found) => Some(found.candidate),
        _ => None,
    }
}

/// The preview of `command`, followed by the confirmation question.
#[must_use]
pub fn confirmation_text(ctx: &UserContext, command: &ResolvedCommand) -> String {
    let mut text = match command {
        ResolvedCommand::Expense(expense) => {
            let account = ctx.account(expense.account_id);
            let amount = format_in(ctx, expense.account_id, expense.amount);
            let category = category_name(ctx, expense.category_id);
            let account_label = account_name(ctx, expense.account_id);
            let date = format_date(expense.date);
            if expense.installments > 1 {
                let each = expense
                    .amount
                    .div_round(expense.installments)
                    .map_or_else(|| "?".to_string(), |each| format_in(ctx, expense.account_id, each));
                templates::preview_installments(
                    &amount,
                    expense.installments,
                    &each,
                    &category,
                    &account_label,
                    &date,
                    &format_date(expense.first_installment_date),
                )
            } else if let Some(closing_day) = account
                .filter(|account| account.is_credit_card)
                .and_then(|account| account.closing_day)
            {
                templates::preview_card_expense(
                    &amount,
                    &category,
                    &account_label,
                    &date,
                    &statement_month(closing_day, expense.date).label(),
                )
            } else {
                templates::preview_expense(&amount, &category, &account_label, &date)
            }
        }
        ResolvedCommand::Income(income) => templates::preview_income(
            &format_in(ctx, income.account_id, income.amount),
            &category_name(ctx, income.category_id),
            &account_name(ctx, income.account_id),
            &format_date(income.date),
        ),
        ResolvedCommand::Transfer(transfer) => templates::preview_transfer(
            &format_in(ctx, transfer.from_account_id, transfer.amount),
            &account_name(ctx, transfer.from_account_id),
            &account_name(ctx, transfer.to_account_id),
            &format_date(transfer.date),
        ),
        ResolvedCommand::CardPayment(payment) => {
            let mut text = templates::preview_card_payment(
                &format_in(ctx, payment.from_account_id, payment.amount),
                &account_name(ctx, payment.card_id),
                &account_name(ctx, payment.from_account_id),
                &format_date(payment.date),
            );
            if let Some(month) = payment.statement_month {
                text.push('\n');
                text.push_str(&templates::statement_line(&month.label()));
            }
            if let Some(tax) = payment.stamp_tax {
                let tax = format_in(ctx, payment.card_id, tax);
                text.push('\n');
                match stamp_tax_category(ctx) {
                    Some(category) => {
                        text.push_str(&templates::stamp_tax_line(&tax, &category.name));
                    }
                    None => text.push_str(&templates::stamp_tax_skipped(&tax)),
                }
            }
            text
        }
    };

    let note = match command {
        ResolvedCommand::Expense(expense) => expense.note.as_deref(),
        ResolvedCommand::Income(income) => income.note.as_deref(),
        ResolvedCommand::Transfer(transfer) => transfer.note.as_deref(),
        ResolvedCommand::CardPayment(payment) => payment.note.as_deref(),
    };
    if let Some(note) = note {
        text.push('\n');
        text.push_str(&templates::note_line(note));
    }
    text.push_str("\n\n");
    text.push_str(templates::CONFIRM_QUESTION);
    text
}

#[cfg(test)]
mod tests {
    use ledger::Currency;

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(closing_day: u32) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Visa Galicia".to_string(),
            currency: Currency::Ars,
            balance: Money::ZERO,
            is_credit_card: true,
            closing_day: Some(closing_day),
            icon: None,
        }
    }

    #[test]
    fn statement_month_depends_on_closing_day() {
        assert_eq!(statement_month(20, day(2026, 10, 18)), YearMonth { year: 2026, month: 11 });
        assert_eq!(statement_month(20, day(2026, 10, 20)), YearMonth { year: 2026, month: 11 });
        assert_eq!(statement_month(20, day(2026, 10, 21)), YearMonth { year: 2026, month: 12 });
        assert_eq!(statement_month(5, day(2026, 12, 10)), YearMonth { year: 2027, month: 2 });
    }

    #[test]
    fn first_installment_on_cards_only() {
        assert_eq!(first_installment_date(&card(20), day(2026, 10, 18)), day(2026, 11, 18));
        assert_eq!(first_installment_date(&card(10), day(2026, 12, 31)), day(2027, 2, 28));

        let mut cash = card(20);
        cash.is_credit_card = false;
        cash.closing_day = None;
        assert_eq!(first_installment_date(&cash, day(2026, 10, 18)), day(2026, 10, 18));
    }

    #[test]
    fn installment_days_clamp_to_shortest_month() {
        let dates = installment_dates(day(2026, 12, 31), 3);
        assert_eq!(dates, vec![day(2026, 12, 28), day(2027, 1, 28), day(2027, 2, 28)]);

        let dates = installment_dates(day(2026, 3, 15), 12);
        assert_eq!(dates.len(), 12);
        assert!(dates.iter().all(|date| date.day() == 15));
        assert_eq!(dates[11], day(2027, 2, 15));
    }

    #[test]
    fn installment_rounding_modes() {
        let total = Money::new(100_000);
        let even = installment_amounts(total, 3, InstallmentRounding::Even).unwrap();
        assert_eq!(even, vec![Money::new(33_333); 3]);

        let reconciled = installment_amounts(total, 3, InstallmentRounding::ReconcileLast).unwrap();
        assert_eq!(reconciled[2], Money::new(33_334));
        assert_eq!(reconciled.into_iter().sum::<Money>(), total);
    }
}
