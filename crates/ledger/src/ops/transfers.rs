use chrono::Utc;
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    LedgerError, NewTransfer, ResultLedger, Transfer, TransferFilter, transfers,
    util::{ensure_bookable, normalize_optional_text},
};

use super::{Ledger, movements::require_account, with_tx};

impl Ledger {
    /// Book a transfer between two distinct accounts of the same user.
    pub async fn insert_transfer(&self, cmd: NewTransfer) -> ResultLedger<Uuid> {
        if cmd.from_account_id == cmd.to_account_id {
            return Err(LedgerError::SameAccount);
        }
        ensure_bookable(cmd.from_amount, "from_amount")?;
        ensure_bookable(cmd.to_amount, "to_amount")?;

        let id = with_tx!(self, |db_tx| {
            require_account(&db_tx, cmd.user_id, cmd.from_account_id).await?;
            require_account(&db_tx, cmd.user_id, cmd.to_account_id).await?;

            let transfer = Transfer {
                id: Uuid::new_v4(),
                from_account_id: cmd.from_account_id,
                to_account_id: cmd.to_account_id,
                from_amount: cmd.from_amount,
                to_amount: cmd.to_amount,
                date: cmd.date,
                note: normalize_optional_text(cmd.note.as_deref()),
                created_at: Utc::now(),
            };
            transfers::active_model(cmd.user_id, &transfer)
                .insert(&db_tx)
                .await?;
            Ok::<_, LedgerError>(transfer.id)
        })?;
        tracing::debug!(%id, "transfer inserted");
        Ok(id)
    }

    /// Transfers matching `filter`, most recent first.
    pub async fn query_transfers(&self, filter: &TransferFilter) -> ResultLedger<Vec<Transfer>> {
        let mut query =
            transfers::Entity::find().filter(transfers::Column::UserId.eq(filter.user_id));
        if let Some(account_id) = filter.account_id {
            query = query.filter(
                Condition::any()
                    .add(transfers::Column::FromAccountId.eq(account_id))
                    .add(transfers::Column::ToAccountId.eq(account_id)),
            );
        }
        if let Some(from) = filter.from {
            query = query.filter(transfers::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transfers::Column::OccurredOn.lt(to));
        }
        query = query
            .order_by_desc(transfers::Column::OccurredOn)
            .order_by_desc(transfers::Column::CreatedAt);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transfer::try_from)
            .collect()
    }
}
