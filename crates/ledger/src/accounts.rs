//! The module contains the `Account` struct and its storage model.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money, util::model_currency};

/// An account.
///
/// An account is anywhere money is kept or owed: cash, a bank account, a
/// digital wallet or a credit card. Credit cards carry the statement closing
/// day used to date their installments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub currency: Currency,
    /// Current balance, computed from the ledger when the snapshot was taken.
    pub balance: Money,
    pub is_credit_card: bool,
    /// Day of month the card statement closes (1..=31), only for credit cards.
    pub closing_day: Option<u32>,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub currency: String,
    pub initial_balance_minor: i64,
    pub is_credit_card: bool,
    pub closing_day: Option<i32>,
    pub icon: Option<String>,
    pub archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<(Model, Money)> for Account {
    type Error = LedgerError;

    fn try_from((model, balance): (Model, Money)) -> Result<Self, Self::Error> {
        let closing_day = match model.closing_day {
            Some(day) if (1..=31).contains(&day) => Some(day as u32),
            Some(day) => {
                return Err(LedgerError::InvalidData(format!(
                    "invalid closing day {day} for account {}",
                    model.id
                )));
            }
            None => None,
        };
        Ok(Self {
            id: model.id,
            name: model.name,
            currency: model_currency(&model.currency)?,
            balance,
            is_credit_card: model.is_credit_card,
            closing_day,
            icon: model.icon,
        })
    }
}
