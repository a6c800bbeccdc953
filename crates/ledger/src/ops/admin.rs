//! Bootstrap operations used by the admin CLI and tests.
//!
//! Day-to-day management of accounts and categories happens elsewhere; these
//! only create the minimum a chat user needs.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, NewAccount, NewCategory, ResultLedger, accounts, categories,
    platform_users, users,
    util::{normalize_optional_text, normalize_required_name},
};

use super::Ledger;

impl Ledger {
    pub async fn create_user(
        &self,
        display_name: &str,
        default_currency: Currency,
    ) -> ResultLedger<Uuid> {
        let id = Uuid::new_v4();
        users::ActiveModel {
            id: ActiveValue::Set(id),
            display_name: ActiveValue::Set(normalize_required_name(display_name, "user")?),
            default_currency: ActiveValue::Set(default_currency.code().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(id)
    }

    /// Link (or re-link) a chat identity to a user.
    pub async fn link_platform_user(
        &self,
        platform: &str,
        platform_user_id: &str,
        user_id: Uuid,
        verified: bool,
    ) -> ResultLedger<()> {
        if users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(LedgerError::KeyNotFound("user not exists".to_string()));
        }

        platform_users::Entity::delete_many()
            .filter(platform_users::Column::Platform.eq(platform))
            .filter(platform_users::Column::PlatformUserId.eq(platform_user_id))
            .exec(&self.database)
            .await?;
        platform_users::ActiveModel {
            platform: ActiveValue::Set(platform.to_string()),
            platform_user_id: ActiveValue::Set(platform_user_id.to_string()),
            user_id: ActiveValue::Set(user_id),
            verified: ActiveValue::Set(verified),
        }
        .insert(&self.database)
        .await?;
        Ok(())
    }

    pub async fn create_account(&self, cmd: NewAccount) -> ResultLedger<Uuid> {
        let name = normalize_required_name(&cmd.name, "account")?;
        match (cmd.is_credit_card, cmd.closing_day) {
            (true, Some(day)) if (1..=31).contains(&day) => {}
            (true, _) => {
                return Err(LedgerError::InvalidData(
                    "credit cards need a closing day between 1 and 31".to_string(),
                ));
            }
            (false, Some(_)) => {
                return Err(LedgerError::InvalidData(
                    "only credit cards have a closing day".to_string(),
                ));
            }
            (false, None) => {}
        }
        if accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(cmd.user_id))
            .filter(accounts::Column::Name.eq(name.as_str()))
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(LedgerError::ExistingKey(name));
        }

        let id = Uuid::new_v4();
        accounts::ActiveModel {
            id: ActiveValue::Set(id),
            user_id: ActiveValue::Set(cmd.user_id),
            name: ActiveValue::Set(name),
            currency: ActiveValue::Set(cmd.currency.code().to_string()),
            initial_balance_minor: ActiveValue::Set(cmd.initial_balance.minor()),
            is_credit_card: ActiveValue::Set(cmd.is_credit_card),
            closing_day: ActiveValue::Set(cmd.closing_day.map(|d| d as i32)),
            icon: ActiveValue::Set(normalize_optional_text(cmd.icon.as_deref())),
            archived: ActiveValue::Set(false),
        }
        .insert(&self.database)
        .await?;
        Ok(id)
    }

    pub async fn create_category(&self, cmd: NewCategory) -> ResultLedger<Uuid> {
        let name = normalize_required_name(&cmd.name, "category")?;
        if categories::Entity::find()
            .filter(categories::Column::UserId.eq(cmd.user_id))
            .filter(categories::Column::Kind.eq(cmd.kind.as_str()))
            .filter(categories::Column::Name.eq(name.as_str()))
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(LedgerError::ExistingKey(name));
        }

        let id = Uuid::new_v4();
        categories::ActiveModel {
            id: ActiveValue::Set(id),
            user_id: ActiveValue::Set(cmd.user_id),
            name: ActiveValue::Set(name),
            kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
            icon: ActiveValue::Set(normalize_optional_text(cmd.icon.as_deref())),
            archived: ActiveValue::Set(false),
        }
        .insert(&self.database)
        .await?;
        Ok(id)
    }
}
