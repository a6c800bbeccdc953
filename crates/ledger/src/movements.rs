//! Ledger movements.
//!
//! A `Movement` is a single income or expense booked on one account under one
//! category. Installment purchases are stored as one movement per installment,
//! all pointing at their parent purchase.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money, util::model_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Income,
    Expense,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::InvalidData(format!(
                "invalid movement kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    pub date: NaiveDate,
    /// Always positive; the kind carries the direction.
    pub amount: Money,
    pub currency: Currency,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub note: Option<String>,
    pub purchase_id: Option<Uuid>,
    pub installment_number: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub occurred_on: Date,
    pub amount_minor: i64,
    pub currency: String,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub note: Option<String>,
    pub purchase_id: Option<Uuid>,
    pub installment_number: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::purchases::Entity",
        from = "Column::PurchaseId",
        to = "super::purchases::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Purchases,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Movement {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            kind: MovementKind::try_from(model.kind.as_str())?,
            date: model.occurred_on,
            amount: Money::new(model.amount_minor),
            currency: model_currency(&model.currency)?,
            account_id: model.account_id,
            category_id: model.category_id,
            note: model.note,
            purchase_id: model.purchase_id,
            installment_number: model.installment_number.map(|n| n.max(0) as u32),
            created_at: model.created_at,
        })
    }
}

pub(crate) fn active_model(user_id: Uuid, movement: &Movement) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(movement.id),
        user_id: ActiveValue::Set(user_id),
        kind: ActiveValue::Set(movement.kind.as_str().to_string()),
        occurred_on: ActiveValue::Set(movement.date),
        amount_minor: ActiveValue::Set(movement.amount.minor()),
        currency: ActiveValue::Set(movement.currency.code().to_string()),
        account_id: ActiveValue::Set(movement.account_id),
        category_id: ActiveValue::Set(movement.category_id),
        note: ActiveValue::Set(movement.note.clone()),
        purchase_id: ActiveValue::Set(movement.purchase_id),
        installment_number: ActiveValue::Set(movement.installment_number.map(|n| n as i32)),
        created_at: ActiveValue::Set(movement.created_at),
    }
}
