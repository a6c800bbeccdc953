//! Transfers move money between two accounts of the same user.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    /// Amount leaving the source account, in its currency.
    pub from_amount: Money,
    /// Amount entering the destination account, in its currency.
    pub to_amount: Money,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub from_amount_minor: i64,
    pub to_amount_minor: i64,
    pub occurred_on: Date,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Transfer {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        if model.from_account_id == model.to_account_id {
            return Err(LedgerError::InvalidData(format!(
                "transfer {} has the same source and destination",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            from_account_id: model.from_account_id,
            to_account_id: model.to_account_id,
            from_amount: Money::new(model.from_amount_minor),
            to_amount: Money::new(model.to_amount_minor),
            date: model.occurred_on,
            note: model.note,
            created_at: model.created_at,
        })
    }
}

pub(crate) fn active_model(user_id: Uuid, transfer: &Transfer) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(transfer.id),
        user_id: ActiveValue::Set(user_id),
        from_account_id: ActiveValue::Set(transfer.from_account_id),
        to_account_id: ActiveValue::Set(transfer.to_account_id),
        from_amount_minor: ActiveValue::Set(transfer.from_amount.minor()),
        to_amount_minor: ActiveValue::Set(transfer.to_amount.minor()),
        occurred_on: ActiveValue::Set(transfer.date),
        note: ActiveValue::Set(transfer.note.clone()),
        created_at: ActiveValue::Set(transfer.created_at),
    }
}
