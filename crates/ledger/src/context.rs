//! Per-turn read-only snapshot of a user's ledger.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Account, Category, CategoryKind, Currency};

/// User-level preferences exposed to the interpreter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub display_name: String,
    pub default_currency: Currency,
}

/// Accounts, categories and settings of one user, fetched fresh every turn.
///
/// Balances inside the snapshot are computed when the snapshot is taken and
/// must never be reused across turns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub settings: UserSettings,
}

impl UserContext {
    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn categories_of(&self, kind: CategoryKind) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(move |c| c.kind == kind)
    }

    pub fn credit_cards(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| a.is_credit_card)
    }
}
