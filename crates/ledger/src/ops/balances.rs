use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryFilter, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, Money, MovementKind, ResultLedger, accounts, movements, transfers};

use super::Ledger;

/// Net ledger activity per account (everything except the initial balance).
///
/// `balance = initial + Σincomes − Σexpenses + Σincoming transfers − Σoutgoing transfers`
pub(super) async fn ledger_deltas<C>(db: &C, user_id: Uuid) -> ResultLedger<HashMap<Uuid, Money>>
where
    C: ConnectionTrait,
{
    let mut deltas: HashMap<Uuid, Money> = HashMap::new();

    let movement_totals: Vec<(Uuid, String, Option<i64>)> = movements::Entity::find()
        .select_only()
        .column(movements::Column::AccountId)
        .column(movements::Column::Kind)
        .column_as(movements::Column::AmountMinor.sum(), "total")
        .filter(movements::Column::UserId.eq(user_id))
        .group_by(movements::Column::AccountId)
        .group_by(movements::Column::Kind)
        .into_tuple()
        .all(db)
        .await?;
    for (account_id, kind, total) in movement_totals {
        let total = Money::new(total.unwrap_or_default());
        let entry = deltas.entry(account_id).or_default();
        match MovementKind::try_from(kind.as_str())? {
            MovementKind::Income => *entry += total,
            MovementKind::Expense => *entry -= total,
        }
    }

    let outgoing: Vec<(Uuid, Option<i64>)> = transfers::Entity::find()
        .select_only()
        .column(transfers::Column::FromAccountId)
        .column_as(transfers::Column::FromAmountMinor.sum(), "total")
        .filter(transfers::Column::UserId.eq(user_id))
        .group_by(transfers::Column::FromAccountId)
        .into_tuple()
        .all(db)
        .await?;
    for (account_id, total) in outgoing {
        *deltas.entry(account_id).or_default() -= Money::new(total.unwrap_or_default());
    }

    let incoming: Vec<(Uuid, Option<i64>)> = transfers::Entity::find()
        .select_only()
        .column(transfers::Column::ToAccountId)
        .column_as(transfers::Column::ToAmountMinor.sum(), "total")
        .filter(transfers::Column::UserId.eq(user_id))
        .group_by(transfers::Column::ToAccountId)
        .into_tuple()
        .all(db)
        .await?;
    for (account_id, total) in incoming {
        *deltas.entry(account_id).or_default() += Money::new(total.unwrap_or_default());
    }

    Ok(deltas)
}

impl Ledger {
    /// Current balance of one account, in the account currency.
    pub async fn account_balance(&self, user_id: Uuid, account_id: Uuid) -> ResultLedger<Money> {
        let account = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("account not exists".to_string()))?;

        let deltas = ledger_deltas(&self.database, user_id).await?;
        let delta = deltas.get(&account_id).copied().unwrap_or_default();
        Ok(Money::new(account.initial_balance_minor) + delta)
    }
}
