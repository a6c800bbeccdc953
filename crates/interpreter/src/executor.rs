//! Running confirmed writes and answering reads against the ledger.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ledger::{
    CategoryKind, Currency, LedgerError, Money, Movement, MovementFilter, MovementKind,
    NewInstallmentPurchase, NewMovement, NewTransfer, Transfer, TransferFilter, UserContext,
};
use uuid::Uuid;

use crate::{
    config::InstallmentRounding,
    entities::{
        Field, ParsedEntities, QueryPeriod, ResolvedCardPayment, ResolvedCommand,
        ResolvedExpense, ResolvedIncome, ResolvedTransfer,
    },
    error::{InterpreterError, ResultInterpreter},
    flow::preview::{
        account_name, category_name, format_date, format_in, installment_amounts,
        installment_dates, stamp_tax_category,
    },
    intent::Intent,
    locale::templates,
    ports::LedgerRepository,
};

pub const DEFAULT_RECENT: u32 = 5;
const MAX_RECENT: u32 = 50;
const TOP_ITEMS: usize = 5;
const STAMP_TAX_NOTE: &str = "Impuesto de sellos";

/// Runs commands for one user turn.
pub struct Executor<'a> {
    ledger: &'a dyn LedgerRepository,
    ctx: &'a UserContext,
    rounding: InstallmentRounding,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(
        ledger: &'a dyn LedgerRepository,
        ctx: &'a UserContext,
        rounding: InstallmentRounding,
    ) -> Self {
        Self {
            ledger,
            ctx,
            rounding,
        }
    }

    fn user_id(&self) -> Uuid {
        self.ctx.user_id
    }

    /// Book `command` and describe the result.
    pub async fn execute(&self, command: &ResolvedCommand) -> ResultInterpreter<String> {
        match command {
            ResolvedCommand::Expense(expense) if expense.installments > 1 => {
                self.installments(expense).await
            }
            ResolvedCommand::Expense(expense) => self.expense(expense).await,
            ResolvedCommand::Income(income) => self.income(income).await,
            ResolvedCommand::Transfer(transfer) => self.transfer(transfer).await,
            ResolvedCommand::CardPayment(payment) => self.card_payment(payment).await,
        }
    }

    /// Balance after a write; a failed read only loses the extra line.
    async fn balance_after(&self, account_id: Uuid) -> Option<String> {
        match self.ledger.account_balance(self.user_id(), account_id).await {
            Ok(balance) => Some(format_in(self.ctx, account_id, balance)),
            Err(err) => {
                tracing::warn!(%account_id, error = %err, "balance unavailable after write");
                None
            }
        }
    }

    async fn expense(&self, expense: &ResolvedExpense) -> ResultInterpreter<String> {
        let cmd = NewMovement::new(
            self.user_id(),
            MovementKind::Expense,
            expense.date,
            expense.amount,
            expense.account_id,
            expense.category_id,
        )
        .note(expense.note.as_deref());
        let id = self.ledger.insert_movement(cmd).await?;
        tracing::info!(%id, "expense booked");

        let balance = self.balance_after(expense.account_id).await;
        Ok(templates::expense_saved(
            &format_in(self.ctx, expense.account_id, expense.amount),
            &category_name(self.ctx, expense.category_id),
            balance.as_deref(),
        ))
    }

    async fn income(&self, income: &ResolvedIncome) -> ResultInterpreter<String> {
        let cmd = NewMovement::new(
            self.user_id(),
            MovementKind::Income,
            income.date,
            income.amount,
            income.account_id,
            income.category_id,
        )
        .note(income.note.as_deref());
        let id = self.ledger.insert_movement(cmd).await?;
        tracing::info!(%id, "income booked");

        let balance = self.balance_after(income.account_id).await;
        Ok(templates::income_saved(
            &format_in(self.ctx, income.account_id, income.amount),
            &category_name(self.ctx, income.category_id),
            balance.as_deref(),
        ))
    }

    /// Parent purchase plus one expense row per installment. Rows are not
    /// atomic with the parent: if any row fails, the parent (and the rows
    /// already booked under it) is deleted before the error is returned.
    async fn installments(&self, expense: &ResolvedExpense) -> ResultInterpreter<String> {
        let count = expense.installments;
        let amounts = installment_amounts(expense.amount, count, self.rounding)
            .ok_or_else(|| InterpreterError::validation("No pude dividir el monto en cuotas."))?;
        let dates = installment_dates(expense.first_installment_date, count);

        let purchase_id = self
            .ledger
            .insert_installment_purchase(NewInstallmentPurchase {
                user_id: self.user_id(),
                account_id: expense.account_id,
                category_id: expense.category_id,
                total: expense.amount,
                installments: count,
                purchase_date: expense.date,
                first_installment_date: expense.first_installment_date,
                note: expense.note.clone(),
            })
            .await?;

        for (number, (date, amount)) in (1..).zip(dates.iter().zip(&amounts)) {
            let row = NewMovement::new(
                self.user_id(),
                MovementKind::Expense,
                *date,
                *amount,
                expense.account_id,
                expense.category_id,
            )
            .note(expense.note.as_deref())
            .installment_of(purchase_id, number);
            if let Err(err) = self.ledger.insert_movement(row).await {
                tracing::error!(%purchase_id, number, error = %err, "installment row failed, compensating");
                if let Err(cleanup) = self
                    .ledger
                    .delete_installment_purchase(self.user_id(), purchase_id)
                    .await
                {
                    tracing::error!(%purchase_id, error = %cleanup, "compensating delete failed");
                }
                return Err(err.into());
            }
        }
        tracing::info!(%purchase_id, count, "installment purchase booked");

        let each = amounts.first().copied().unwrap_or(expense.amount);
        Ok(templates::installments_saved(
            count,
            &format_in(self.ctx, expense.account_id, each),
            &format_date(expense.first_installment_date),
        ))
    }

    fn check_transfer(&self, from: Uuid, to: Uuid) -> ResultInterpreter<()> {
        if from == to {
            return Err(InterpreterError::validation(templates::SAME_ACCOUNT));
        }
        match (self.ctx.account(from), self.ctx.account(to)) {
            (Some(source), Some(target)) if source.currency != target.currency => {
                Err(InterpreterError::validation(templates::CURRENCY_MISMATCH))
            }
            (Some(_), Some(_)) => Ok(()),
            _ => Err(LedgerError::KeyNotFound("account".to_string()).into()),
        }
    }

    async fn transfer(&self, transfer: &ResolvedTransfer) -> ResultInterpreter<String> {
        self.check_transfer(transfer.from_account_id, transfer.to_account_id)?;
        let cmd = NewTransfer::new(
            self.user_id(),
            transfer.from_account_id,
            transfer.to_account_id,
            transfer.amount,
            transfer.date,
        )
        .note(transfer.note.as_deref());
        let id = self.ledger.insert_transfer(cmd).await?;
        tracing::info!(%id, "transfer booked");

        Ok(templates::transfer_saved(
            &format_in(self.ctx, transfer.from_account_id, transfer.amount),
            &account_name(self.ctx, transfer.from_account_id),
            &account_name(self.ctx, transfer.to_account_id),
        ))
    }

    /// A transfer from the paying account to the card, plus the stamp tax as
    /// an expense on the card when one was given and a tax category exists.
    async fn card_payment(&self, payment: &ResolvedCardPayment) -> ResultInterpreter<String> {
        self.check_transfer(payment.from_account_id, payment.card_id)?;
        let note = payment.note.clone().or_else(|| {
            payment
                .statement_month
                .map(|month| format!("Resumen {}", month.label()))
        });
        let cmd = NewTransfer::new(
            self.user_id(),
            payment.from_account_id,
            payment.card_id,
            payment.amount,
            payment.date,
        )
        .note(note.as_deref());
        let id = self.ledger.insert_transfer(cmd).await?;
        tracing::info!(%id, "card payment booked");

        let mut text = templates::card_payment_saved(
            &format_in(self.ctx, payment.from_account_id, payment.amount),
            &account_name(self.ctx, payment.card_id),
            &account_name(self.ctx, payment.from_account_id),
        );
        if let Some(tax) = payment.stamp_tax {
            match stamp_tax_category(self.ctx) {
                Some(category) => {
                    let cmd = NewMovement::new(
                        self.user_id(),
                        MovementKind::Expense,
                        payment.date,
                        tax,
                        payment.card_id,
                        category.id,
                    )
                    .note(Some(STAMP_TAX_NOTE));
                    let amount = format_in(self.ctx, payment.card_id, tax);
                    // The payment is booked by now; the turn succeeds either way.
                    let line = match self.ledger.insert_movement(cmd).await {
                        Ok(_) => templates::stamp_tax_saved(&amount),
                        Err(err) => {
                            tracing::error!(%id, error = %err, "stamp tax not booked");
                            templates::stamp_tax_failed(&amount)
                        }
                    };
                    text.push('\n');
                    text.push_str(&line);
                }
                None => tracing::warn!("no stamp tax category, tax not booked"),
            }
        }
        Ok(text)
    }

    /// Answer a read intent.
    pub async fn answer(
        &self,
        intent: Intent,
        entities: &ParsedEntities,
        today: NaiveDate,
    ) -> ResultInterpreter<String> {
        match intent {
            Intent::ConsultarSaldo => self.balances(entities).await,
            Intent::ConsultarGastos => {
                self.totals(MovementKind::Expense, entities, today).await
            }
            Intent::ConsultarIngresos => self.totals(MovementKind::Income, entities, today).await,
            Intent::UltimosMovimientos => self.recent(entities).await,
            Intent::ResumenMes => self.summary(entities, today).await,
            _ => Err(InterpreterError::validation(templates::NOT_UNDERSTOOD)),
        }
    }

    async fn balances(&self, entities: &ParsedEntities) -> ResultInterpreter<String> {
        if let Some(account_id) = entities.resolved_id(Field::Account) {
            let balance = self.ledger.account_balance(self.user_id(), account_id).await?;
            return Ok(templates::single_balance(
                &account_name(self.ctx, account_id),
                &format_in(self.ctx, account_id, balance),
            ));
        }
        if self.ctx.accounts.is_empty() {
            return Ok(templates::NO_ACCOUNTS.to_string());
        }

        let mut lines = vec![templates::BALANCES_HEADER.to_string()];
        let mut totals: BTreeMap<Currency, Money> = BTreeMap::new();
        for account in &self.ctx.accounts {
            lines.push(templates::balance_line(
                &account.name,
                &account.balance.format(account.currency),
            ));
            *totals.entry(account.currency).or_default() += account.balance;
        }
        for (currency, total) in totals {
            lines.push(templates::balance_total(&total.format(currency)));
        }
        Ok(lines.join("\n"))
    }

    fn period(entities: &ParsedEntities, today: NaiveDate) -> ResultInterpreter<QueryPeriod> {
        entities
            .period
            .clone()
            .or_else(|| QueryPeriod::current_month(today))
            .ok_or_else(|| InterpreterError::validation("Período inválido."))
    }

    fn movement_label(&self, movement: &Movement) -> String {
        let category = category_name(self.ctx, movement.category_id);
        match &movement.note {
            Some(note) => format!("{category} ({note})"),
            None => category,
        }
    }

    async fn totals(
        &self,
        kind: MovementKind,
        entities: &ParsedEntities,
        today: NaiveDate,
    ) -> ResultInterpreter<String> {
        let period = Self::period(entities, today)?;
        let category = entities.resolved_id(Field::Category);
        let mut filter = MovementFilter::for_user(self.user_id())
            .kind(kind)
            .range(period.from, period.to)
            .category(category);
        let mut scope = String::new();
        if let Some(category) = category {
            scope = format!(" en {}", category_name(self.ctx, category));
        }
        if let Some(account) = entities.resolved_id(Field::Account) {
            filter = filter.account(account);
            scope.push_str(&format!(" de {}", account_name(self.ctx, account)));
        }
        let movements = self.ledger.query_movements(&filter).await?;

        let (noun, title) = match kind {
            MovementKind::Expense => ("gastos", "Gastos"),
            MovementKind::Income => ("ingresos", "Ingresos"),
        };
        if movements.is_empty() {
            return Ok(templates::spending_empty(noun, &period.label));
        }

        let mut lines = vec![
            templates::spending_header(title, &scope, &period.label),
            templates::spending_totals(&sum_by_currency(&movements), movements.len()),
        ];
        for movement in movements.iter().take(TOP_ITEMS) {
            lines.push(templates::movement_line(
                &format_date(movement.date),
                "",
                &movement.amount.format(movement.currency),
                &self.movement_label(movement),
            ));
        }
        Ok(lines.join("\n"))
    }

    async fn recent(&self, entities: &ParsedEntities) -> ResultInterpreter<String> {
        let limit = entities.limit.unwrap_or(DEFAULT_RECENT).clamp(1, MAX_RECENT);
        let mut movements = MovementFilter::for_user(self.user_id()).limit(u64::from(limit));
        let mut transfers = TransferFilter::for_user(self.user_id()).limit(u64::from(limit));
        if let Some(account) = entities.resolved_id(Field::Account) {
            movements = movements.account(account);
            transfers = transfers.account(account);
        }
        if let Some(period) = &entities.period {
            movements = movements.range(period.from, period.to);
            transfers = transfers.range(period.from, period.to);
        }
        let movements = self.ledger.query_movements(&movements).await?;
        let transfers = self.ledger.query_transfers(&transfers).await?;

        let mut items: Vec<Activity<'_>> = movements
            .iter()
            .map(Activity::Movement)
            .chain(transfers.iter().map(Activity::Transfer))
            .collect();
        items.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        items.truncate(limit as usize);
        if items.is_empty() {
            return Ok(templates::NO_MOVEMENTS.to_string());
        }

        let mut lines = vec![templates::recent_header(items.len())];
        for item in items {
            lines.push(match item {
                Activity::Movement(movement) => templates::movement_line(
                    &format_date(movement.date),
                    if movement.kind == MovementKind::Income { "+" } else { "-" },
                    &movement.amount.format(movement.currency),
                    &self.movement_label(movement),
                ),
                Activity::Transfer(transfer) => templates::movement_line(
                    &format_date(transfer.date),
                    "",
                    &format_in(self.ctx, transfer.from_account_id, transfer.from_amount),
                    &format!(
                        "{} → {}",
                        account_name(self.ctx, transfer.from_account_id),
                        account_name(self.ctx, transfer.to_account_id)
                    ),
                ),
            });
        }
        Ok(lines.join("\n"))
    }

    async fn summary(&self, entities: &ParsedEntities, today: NaiveDate) -> ResultInterpreter<String> {
        let period = Self::period(entities, today)?;
        let filter = MovementFilter::for_user(self.user_id()).range(period.from, period.to);
        let movements = self.ledger.query_movements(&filter).await?;
        if movements.is_empty() {
            return Ok(templates::spending_empty("movimientos", &period.label));
        }

        let mut lines = vec![templates::summary_header(&period.label)];
        let currencies: std::collections::BTreeSet<Currency> =
            movements.iter().map(|movement| movement.currency).collect();
        for currency in currencies {
            let income = total_of(&movements, currency, MovementKind::Income);
            let expenses = total_of(&movements, currency, MovementKind::Expense);
            lines.push(templates::summary_totals(
                &income.format(currency),
                &expenses.format(currency),
                &(income - expenses).format(currency),
            ));

            let mut by_category: BTreeMap<Uuid, Money> = BTreeMap::new();
            for movement in movements
                .iter()
                .filter(|m| m.currency == currency && m.kind == MovementKind::Expense)
            {
                *by_category.entry(movement.category_id).or_default() += movement.amount;
            }
            let mut ranked: Vec<(Uuid, Money)> = by_category.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));
            if !ranked.is_empty() {
                lines.push(templates::SUMMARY_TOP_HEADER.to_string());
            }
            for (rank, (category, amount)) in ranked.into_iter().take(TOP_ITEMS).enumerate() {
                lines.push(templates::summary_category_line(
                    rank + 1,
                    &self.category_label(category),
                    &amount.format(currency),
                    amount.percent_of(expenses),
                ));
            }
        }
        Ok(lines.join("\n"))
    }

    fn category_label(&self, id: Uuid) -> String {
        match self.ctx.category(id) {
            Some(category) if category.kind == CategoryKind::Expense => category.name.clone(),
            Some(category) => format!("{} (ingreso)", category.name),
            None => "?".to_string(),
        }
    }
}

/// One line of the recent-activity list.
enum Activity<'a> {
    Movement(&'a Movement),
    Transfer(&'a Transfer),
}

impl Activity<'_> {
    fn sort_key(&self) -> (NaiveDate, chrono::DateTime<chrono::Utc>) {
        match self {
            Activity::Movement(movement) => (movement.date, movement.created_at),
            Activity::Transfer(transfer) => (transfer.date, transfer.created_at),
        }
    }
}

fn total_of(movements: &[Movement], currency: Currency, kind: MovementKind) -> Money {
    movements
        .iter()
        .filter(|m| m.currency == currency && m.kind == kind)
        .map(|m| m.amount)
        .sum()
}

fn sum_by_currency(movements: &[Movement]) -> String {
    let mut totals: BTreeMap<Currency, Money> = BTreeMap::new();
    for movement in movements {
        *totals.entry(movement.currency).or_default() += movement.amount;
    }
    totals
        .into_iter()
        .map(|(currency, total)| total.format(currency))
        .collect::<Vec<_>>()
        .join(" + ")
}
