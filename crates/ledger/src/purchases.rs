//! Installment purchases ("compras en cuotas").
//!
//! The purchase row is the parent record; each installment is a separate
//! expense movement linked through `movements.purchase_id`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money, util::model_currency};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPurchase {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub total: Money,
    pub currency: Currency,
    pub installments: u32,
    pub purchase_date: NaiveDate,
    pub first_installment_date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "installment_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub total_minor: i64,
    pub currency: String,
    pub installments: i32,
    pub purchased_on: Date,
    pub first_installment_on: Date,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for InstallmentPurchase {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let installments = u32::try_from(model.installments).map_err(|_| {
            LedgerError::InvalidData(format!("invalid installments for purchase {}", model.id))
        })?;
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            category_id: model.category_id,
            total: Money::new(model.total_minor),
            currency: model_currency(&model.currency)?,
            installments,
            purchase_date: model.purchased_on,
            first_installment_date: model.first_installment_on,
            note: model.note,
        })
    }
}
