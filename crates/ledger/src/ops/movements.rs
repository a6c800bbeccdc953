use chrono::Utc;
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    CategoryKind, LedgerError, Movement, MovementFilter, MovementKind, NewMovement,
    ResultLedger, accounts, categories, movements,
    util::{ensure_bookable, model_currency, normalize_optional_text},
};

use super::{Ledger, with_tx};

pub(super) async fn require_account<C>(
    db: &C,
    user_id: Uuid,
    account_id: Uuid,
) -> ResultLedger<accounts::Model>
where
    C: ConnectionTrait,
{
    accounts::Entity::find_by_id(account_id)
        .filter(accounts::Column::UserId.eq(user_id))
        .filter(accounts::Column::Archived.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::KeyNotFound("account not exists".to_string()))
}

pub(super) async fn require_category<C>(
    db: &C,
    user_id: Uuid,
    category_id: Uuid,
    kind: MovementKind,
) -> ResultLedger<categories::Model>
where
    C: ConnectionTrait,
{
    let model = categories::Entity::find_by_id(category_id)
        .filter(categories::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::KeyNotFound("category not exists".to_string()))?;
    let expected = match kind {
        MovementKind::Income => CategoryKind::Income,
        MovementKind::Expense => CategoryKind::Expense,
    };
    if CategoryKind::try_from(model.kind.as_str())? != expected {
        return Err(LedgerError::InvalidData(format!(
            "category '{}' is not an {} category",
            model.name,
            expected.as_str()
        )));
    }
    Ok(model)
}

pub(super) async fn insert_movement_with<C>(db: &C, cmd: NewMovement) -> ResultLedger<Uuid>
where
    C: ConnectionTrait,
{
    ensure_bookable(cmd.amount, "amount")?;
    let account = require_account(db, cmd.user_id, cmd.account_id).await?;
    require_category(db, cmd.user_id, cmd.category_id, cmd.kind).await?;

    let movement = Movement {
        id: Uuid::new_v4(),
        kind: cmd.kind,
        date: cmd.date,
        amount: cmd.amount,
        currency: model_currency(&account.currency)?,
        account_id: cmd.account_id,
        category_id: cmd.category_id,
        note: normalize_optional_text(cmd.note.as_deref()),
        purchase_id: cmd.purchase_id,
        installment_number: cmd.installment_number,
        created_at: Utc::now(),
    };
    movements::active_model(cmd.user_id, &movement)
        .insert(db)
        .await?;
    Ok(movement.id)
}

impl Ledger {
    /// Book one income/expense movement.
    pub async fn insert_movement(&self, cmd: NewMovement) -> ResultLedger<Uuid> {
        let kind = cmd.kind;
        let id = with_tx!(self, |db_tx| {
            let id = insert_movement_with(&db_tx, cmd).await?;
            Ok::<_, LedgerError>(id)
        })?;
        tracing::debug!(%id, kind = kind.as_str(), "movement inserted");
        Ok(id)
    }

    /// Movements matching `filter`, most recent first.
    pub async fn query_movements(&self, filter: &MovementFilter) -> ResultLedger<Vec<Movement>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from >= to
        {
            return Err(LedgerError::InvalidData(
                "invalid range: from must be < to".to_string(),
            ));
        }

        let mut query =
            movements::Entity::find().filter(movements::Column::UserId.eq(filter.user_id));
        if let Some(kind) = filter.kind {
            query = query.filter(movements::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(movements::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(movements::Column::OccurredOn.lt(to));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(movements::Column::AccountId.eq(account_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(movements::Column::CategoryId.eq(category_id));
        }
        query = query
            .order_by_desc(movements::Column::OccurredOn)
            .order_by_desc(movements::Column::CreatedAt);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Movement::try_from)
            .collect()
    }
}
