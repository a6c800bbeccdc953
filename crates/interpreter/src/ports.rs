//! The storage and model seams of the interpreter.
//!
//! The orchestrator only talks to these traits. [`ledger::Ledger`]
//! implements the three storage ports; the language-model fallback lives in
//! [`crate::llm`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledger::{
    Ledger, LedgerError, Money, Movement, MovementFilter, NewInstallmentPurchase, NewMovement,
    NewTransfer, PlatformUser, StoredConversation, Transfer, TransferFilter, UserContext,
};
use uuid::Uuid;

use crate::{entities::ParsedEntities, intent::Intent};

type PortResult<T> = Result<T, LedgerError>;

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn platform_user(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> PortResult<Option<PlatformUser>>;

    async fn user_context(&self, user_id: Uuid) -> PortResult<UserContext>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn insert_movement(&self, cmd: NewMovement) -> PortResult<Uuid>;
    async fn insert_transfer(&self, cmd: NewTransfer) -> PortResult<Uuid>;
    async fn insert_installment_purchase(&self, cmd: NewInstallmentPurchase) -> PortResult<Uuid>;
    async fn delete_installment_purchase(&self, user_id: Uuid, purchase_id: Uuid)
    -> PortResult<()>;
    async fn query_movements(&self, filter: &MovementFilter) -> PortResult<Vec<Movement>>;
    async fn query_transfers(&self, filter: &TransferFilter) -> PortResult<Vec<Transfer>>;
    async fn account_balance(&self, user_id: Uuid, account_id: Uuid) -> PortResult<Money>;
}

/// Persisted conversations. `save` is a compare-and-swap on
/// `record.version` (`0` creates) and returns the stored version.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> PortResult<Option<StoredConversation>>;
    async fn save(&self, record: &StoredConversation) -> PortResult<i64>;
    async fn delete(&self, platform: &str, platform_user_id: &str) -> PortResult<bool>;
    async fn sweep_expired(&self, now: DateTime<Utc>) -> PortResult<u64>;
}

/// What the user's data looks like, as far as the model needs to know.
#[derive(Clone, Debug, Default)]
pub struct LlmContext {
    pub today: NaiveDate,
    pub account_names: Vec<String>,
    pub category_names: Vec<String>,
}

impl LlmContext {
    #[must_use]
    pub fn from_user(ctx: &UserContext, today: NaiveDate) -> Self {
        Self {
            today,
            account_names: ctx.accounts.iter().map(|a| a.name.clone()).collect(),
            category_names: ctx.categories.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Output of the model after validation; every field already checked.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmParse {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: ParsedEntities,
}

/// Best effort: implementations return `Ok(None)` when they have nothing
/// usable and errors only for transport failures.
#[async_trait]
pub trait LlmFallback: Send + Sync {
    async fn parse(
        &self,
        text: &str,
        context: &LlmContext,
    ) -> crate::error::ResultInterpreter<Option<LlmParse>>;
}

#[async_trait]
impl IdentityRepository for Ledger {
    async fn platform_user(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> PortResult<Option<PlatformUser>> {
        Ledger::platform_user(self, platform, platform_user_id).await
    }

    async fn user_context(&self, user_id: Uuid) -> PortResult<UserContext> {
        Ledger::user_context(self, user_id).await
    }
}

#[async_trait]
impl LedgerRepository for Ledger {
    async fn insert_movement(&self, cmd: NewMovement) -> PortResult<Uuid> {
        Ledger::insert_movement(self, cmd).await
    }

    async fn insert_transfer(&self, cmd: NewTransfer) -> PortResult<Uuid> {
        Ledger::insert_transfer(self, cmd).await
    }

    async fn insert_installment_purchase(&self, cmd: NewInstallmentPurchase) -> PortResult<Uuid> {
        Ledger::insert_installment_purchase(self, cmd).await
    }

    async fn delete_installment_purchase(
        &self,
        user_id: Uuid,
        purchase_id: Uuid,
    ) -> PortResult<()> {
        Ledger::delete_installment_purchase(self, user_id, purchase_id).await
    }

    async fn query_movements(&self, filter: &MovementFilter) -> PortResult<Vec<Movement>> {
        Ledger::query_movements(self, filter).await
    }

    async fn query_transfers(&self, filter: &TransferFilter) -> PortResult<Vec<Transfer>> {
        Ledger::query_transfers(self, filter).await
    }

    async fn account_balance(&self, user_id: Uuid, account_id: Uuid) -> PortResult<Money> {
        Ledger::account_balance(self, user_id, account_id).await
    }
}

#[async_trait]
impl ConversationStore for Ledger {
    async fn load(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> PortResult<Option<StoredConversation>> {
        self.load_conversation(platform, platform_user_id).await
    }

    async fn save(&self, record: &StoredConversation) -> PortResult<i64> {
        self.save_conversation(record).await
    }

    async fn delete(&self, platform: &str, platform_user_id: &str) -> PortResult<bool> {
        self.delete_conversation(platform, platform_user_id).await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> PortResult<u64> {
        self.sweep_expired_conversations(now).await
    }
}
