//! Command structs for ledger operations.
//!
//! These types group parameters for write operations and queries, keeping
//! call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{CategoryKind, Currency, Money, MovementKind};

/// Book a single income or expense movement.
#[derive(Clone, Debug)]
pub struct NewMovement {
    pub user_id: Uuid,
    pub kind: MovementKind,
    pub date: NaiveDate,
    pub amount: Money,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub note: Option<String>,
    pub purchase_id: Option<Uuid>,
    pub installment_number: Option<u32>,
}

impl NewMovement {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        kind: MovementKind,
        date: NaiveDate,
        amount: Money,
        account_id: Uuid,
        category_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            kind,
            date,
            amount,
            account_id,
            category_id,
            note: None,
            purchase_id: None,
            installment_number: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: Option<impl Into<String>>) -> Self {
        self.note = note.map(Into::into);
        self
    }

    /// Marks the movement as installment `number` of `purchase_id`.
    #[must_use]
    pub fn installment_of(mut self, purchase_id: Uuid, number: u32) -> Self {
        self.purchase_id = Some(purchase_id);
        self.installment_number = Some(number);
        self
    }
}

/// Move money between two accounts of the same user.
#[derive(Clone, Debug)]
pub struct NewTransfer {
    pub user_id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub from_amount: Money,
    pub to_amount: Money,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl NewTransfer {
    /// A same-currency transfer: the destination receives what the source sends.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            from_account_id,
            to_account_id,
            from_amount: amount,
            to_amount: amount,
            date,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: Option<impl Into<String>>) -> Self {
        self.note = note.map(Into::into);
        self
    }
}

/// Parent record of a credit-card purchase split in installments.
#[derive(Clone, Debug)]
pub struct NewInstallmentPurchase {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub total: Money,
    pub installments: u32,
    pub purchase_date: NaiveDate,
    pub first_installment_date: NaiveDate,
    pub note: Option<String>,
}

/// Bootstrap a new account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub user_id: Uuid,
    pub name: String,
    pub currency: Currency,
    pub initial_balance: Money,
    pub is_credit_card: bool,
    pub closing_day: Option<u32>,
    pub icon: Option<String>,
}

impl NewAccount {
    #[must_use]
    pub fn new(user_id: Uuid, name: impl Into<String>, currency: Currency) -> Self {
        Self {
            user_id,
            name: name.into(),
            currency,
            initial_balance: Money::ZERO,
            is_credit_card: false,
            closing_day: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn initial_balance(mut self, balance: Money) -> Self {
        self.initial_balance = balance;
        self
    }

    #[must_use]
    pub fn credit_card(mut self, closing_day: u32) -> Self {
        self.is_credit_card = true;
        self.closing_day = Some(closing_day);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Bootstrap a new category.
#[derive(Clone, Debug)]
pub struct NewCategory {
    pub user_id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
}

impl NewCategory {
    #[must_use]
    pub fn new(user_id: Uuid, name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            user_id,
            name: name.into(),
            kind,
            icon: None,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Filters for listing movements.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`).
#[derive(Clone, Debug)]
pub struct MovementFilter {
    pub user_id: Uuid,
    pub kind: Option<MovementKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub limit: Option<u64>,
}

impl MovementFilter {
    #[must_use]
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            kind: None,
            from: None,
            to: None,
            account_id: None,
            category_id: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Option<Uuid>) -> Self {
        self.category_id = category_id;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filters for listing transfers. `account_id` matches either side.
#[derive(Clone, Debug)]
pub struct TransferFilter {
    pub user_id: Uuid,
    pub account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
}

impl TransferFilter {
    #[must_use]
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            account_id: None,
            from: None,
            to: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}
