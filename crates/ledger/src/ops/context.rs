use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Account, Category, LedgerError, Money, PlatformUser, ResultLedger, UserContext, UserSettings,
    accounts, categories, platform_users, users, util::model_currency,
};

use super::{Ledger, balances::ledger_deltas};

impl Ledger {
    /// Resolve a chat identity to its ledger user, if linked.
    pub async fn platform_user(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> ResultLedger<Option<PlatformUser>> {
        let model = platform_users::Entity::find_by_id((
            platform.to_string(),
            platform_user_id.to_string(),
        ))
        .one(&self.database)
        .await?;
        Ok(model.map(PlatformUser::from))
    }

    /// Snapshot of the user's active accounts (with fresh balances),
    /// categories and settings.
    pub async fn user_context(&self, user_id: Uuid) -> ResultLedger<UserContext> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("user not exists".to_string()))?;

        let account_models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::Archived.eq(false))
            .order_by_asc(accounts::Column::Name)
            .all(&self.database)
            .await?;
        let deltas = ledger_deltas(&self.database, user_id).await?;

        let mut accounts = Vec::with_capacity(account_models.len());
        for model in account_models {
            let delta = deltas.get(&model.id).copied().unwrap_or_default();
            let balance = Money::new(model.initial_balance_minor) + delta;
            accounts.push(Account::try_from((model, balance))?);
        }

        let categories = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Archived.eq(false))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;

        tracing::debug!(
            %user_id,
            accounts = accounts.len(),
            categories = categories.len(),
            "loaded user context"
        );

        Ok(UserContext {
            user_id,
            accounts,
            categories,
            settings: UserSettings {
                default_currency: model_currency(&user.default_currency)?,
                display_name: user.display_name,
            },
        })
    }
}
