//! Personal ledger storage.
//!
//! The ledger owns users, their accounts and categories, the booked
//! movements/transfers/installment purchases and the persisted conversation
//! records of the chat interpreter. Everything is stored through sea-orm; the
//! [`Ledger`] handle is cheap to clone and safe to share between requests.

pub use accounts::Account;
pub use categories::{Category, CategoryKind};
pub use commands::{
    MovementFilter, NewAccount, NewCategory, NewInstallmentPurchase, NewMovement, NewTransfer,
    TransferFilter,
};
pub use context::{UserContext, UserSettings};
pub use conversation_states::StoredConversation;
pub use currency::Currency;
pub use error::LedgerError;
pub use money::Money;
pub use movements::{Movement, MovementKind};
pub use ops::{Ledger, LedgerBuilder};
pub use platform_users::PlatformUser;
pub use purchases::InstallmentPurchase;
pub use transfers::Transfer;

mod accounts;
mod categories;
mod commands;
mod context;
mod conversation_states;
mod currency;
mod error;
mod money;
mod movements;
mod ops;
mod platform_users;
mod purchases;
mod transfers;
mod users;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;
