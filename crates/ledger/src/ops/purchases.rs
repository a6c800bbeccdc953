use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    LedgerError, MovementKind, NewInstallmentPurchase, ResultLedger, movements, purchases,
    util::{ensure_bookable, normalize_optional_text},
};

use super::{
    Ledger,
    movements::{require_account, require_category},
    with_tx,
};

const MAX_INSTALLMENTS: u32 = 48;

impl Ledger {
    /// Store the parent record of an installment purchase.
    ///
    /// Installment movements are booked separately through
    /// [`Ledger::insert_movement`]; callers that fail half-way are expected to
    /// undo the parent with [`Ledger::delete_installment_purchase`].
    pub async fn insert_installment_purchase(
        &self,
        cmd: NewInstallmentPurchase,
    ) -> ResultLedger<Uuid> {
        ensure_bookable(cmd.total, "total")?;
        if cmd.installments == 0 || cmd.installments > MAX_INSTALLMENTS {
            return Err(LedgerError::InvalidAmount(format!(
                "installments must be between 1 and {MAX_INSTALLMENTS}"
            )));
        }
        if cmd.first_installment_date < cmd.purchase_date {
            return Err(LedgerError::InvalidData(
                "first installment cannot precede the purchase".to_string(),
            ));
        }

        let id = with_tx!(self, |db_tx| {
            let account = require_account(&db_tx, cmd.user_id, cmd.account_id).await?;
            require_category(&db_tx, cmd.user_id, cmd.category_id, MovementKind::Expense).await?;

            let id = Uuid::new_v4();
            purchases::ActiveModel {
                id: ActiveValue::Set(id),
                user_id: ActiveValue::Set(cmd.user_id),
                account_id: ActiveValue::Set(cmd.account_id),
                category_id: ActiveValue::Set(cmd.category_id),
                total_minor: ActiveValue::Set(cmd.total.minor()),
                currency: ActiveValue::Set(account.currency),
                installments: ActiveValue::Set(cmd.installments as i32),
                purchased_on: ActiveValue::Set(cmd.purchase_date),
                first_installment_on: ActiveValue::Set(cmd.first_installment_date),
                note: ActiveValue::Set(normalize_optional_text(cmd.note.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok::<_, LedgerError>(id)
        })?;
        tracing::debug!(%id, installments = cmd.installments, "installment purchase inserted");
        Ok(id)
    }

    /// Remove an installment purchase together with any installment already
    /// booked for it.
    pub async fn delete_installment_purchase(
        &self,
        user_id: Uuid,
        purchase_id: Uuid,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let removed = movements::Entity::delete_many()
                .filter(movements::Column::UserId.eq(user_id))
                .filter(movements::Column::PurchaseId.eq(purchase_id))
                .exec(&db_tx)
                .await?;
            let parent = purchases::Entity::delete_many()
                .filter(purchases::Column::UserId.eq(user_id))
                .filter(purchases::Column::Id.eq(purchase_id))
                .exec(&db_tx)
                .await?;
            if parent.rows_affected == 0 {
                return Err(LedgerError::KeyNotFound(
                    "installment purchase not exists".to_string(),
                ));
            }
            tracing::debug!(
                %purchase_id,
                movements = removed.rows_affected,
                "installment purchase deleted"
            );
            Ok::<_, LedgerError>(())
        })
    }
}
