use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, SqlErr, prelude::*};

use crate::{LedgerError, ResultLedger, StoredConversation, conversation_states};

use super::Ledger;

fn record_key(platform: &str, platform_user_id: &str) -> String {
    format!("{platform}:{platform_user_id}")
}

impl Ledger {
    /// Load the conversation record for a chat identity.
    ///
    /// Expiry is not evaluated here: callers decide what "now" is.
    pub async fn load_conversation(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> ResultLedger<Option<StoredConversation>> {
        conversation_states::Entity::find_by_id((
            platform.to_string(),
            platform_user_id.to_string(),
        ))
        .one(&self.database)
        .await?
        .map(StoredConversation::try_from)
        .transpose()
    }

    /// Compare-and-swap write of a conversation record.
    ///
    /// `record.version` must be the version the caller read (`0` for a new
    /// record). Returns the stored version; fails with
    /// [`LedgerError::VersionConflict`] when somebody else wrote in between.
    pub async fn save_conversation(&self, record: &StoredConversation) -> ResultLedger<i64> {
        let key = record_key(&record.platform, &record.platform_user_id);

        if record.version == 0 {
            let model = conversation_states::active_model(record, 1);
            return match conversation_states::Entity::insert(model)
                .exec(&self.database)
                .await
            {
                Ok(_) => Ok(1),
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    Err(LedgerError::VersionConflict(key))
                }
                Err(err) => Err(err.into()),
            };
        }

        let next = record.version + 1;
        let mut model = conversation_states::active_model(record, next);
        model.platform = ActiveValue::NotSet;
        model.platform_user_id = ActiveValue::NotSet;
        let result = conversation_states::Entity::update_many()
            .set(model)
            .filter(conversation_states::Column::Platform.eq(record.platform.as_str()))
            .filter(
                conversation_states::Column::PlatformUserId.eq(record.platform_user_id.as_str()),
            )
            .filter(conversation_states::Column::Version.eq(record.version))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::VersionConflict(key));
        }
        Ok(next)
    }

    /// Delete the conversation record unconditionally. Returns whether a row existed.
    pub async fn delete_conversation(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> ResultLedger<bool> {
        let result = conversation_states::Entity::delete_many()
            .filter(conversation_states::Column::Platform.eq(platform))
            .filter(conversation_states::Column::PlatformUserId.eq(platform_user_id))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Remove every record whose `expires_at` is not after `now`.
    pub async fn sweep_expired_conversations(&self, now: DateTime<Utc>) -> ResultLedger<u64> {
        let result = conversation_states::Entity::delete_many()
            .filter(conversation_states::Column::ExpiresAt.lte(now))
            .exec(&self.database)
            .await?;
        if result.rows_affected > 0 {
            tracing::info!(removed = result.rows_affected, "swept expired conversations");
        }
        Ok(result.rows_affected)
    }
}
