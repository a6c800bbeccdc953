//! Persisted conversation records.
//!
//! The ledger treats the conversation payload as opaque: `state`, `intent`
//! and the JSON columns are owned by the interpreter. The ledger only enforces
//! the storage invariants: one row per (`platform`, `platform_user_id`) and a
//! monotonically increasing `version` used for compare-and-swap writes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredConversation {
    pub platform: String,
    pub platform_user_id: String,
    pub user_id: Uuid,
    pub state: String,
    pub intent: String,
    pub entities: serde_json::Value,
    pub edit_field: Option<String>,
    pub options: Option<serde_json::Value>,
    /// `0` for a record that has never been stored.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredConversation {
    /// Returns `true` once `expires_at` is not in the future anymore.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "conversation_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub platform: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub platform_user_id: String,
    pub user_id: Uuid,
    pub state: String,
    pub intent: String,
    pub entities: String,
    pub edit_field: Option<String>,
    pub options: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for StoredConversation {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let entities = serde_json::from_str(&model.entities).map_err(|err| {
            LedgerError::InvalidData(format!("corrupted conversation entities: {err}"))
        })?;
        let options = model
            .options
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|err| {
                LedgerError::InvalidData(format!("corrupted conversation options: {err}"))
            })?;
        Ok(Self {
            platform: model.platform,
            platform_user_id: model.platform_user_id,
            user_id: model.user_id,
            state: model.state,
            intent: model.intent,
            entities,
            edit_field: model.edit_field,
            options,
            version: model.version,
            created_at: model.created_at,
            expires_at: model.expires_at,
        })
    }
}

pub(crate) fn active_model(record: &StoredConversation, version: i64) -> ActiveModel {
    ActiveModel {
        platform: ActiveValue::Set(record.platform.clone()),
        platform_user_id: ActiveValue::Set(record.platform_user_id.clone()),
        user_id: ActiveValue::Set(record.user_id),
        state: ActiveValue::Set(record.state.clone()),
        intent: ActiveValue::Set(record.intent.clone()),
        entities: ActiveValue::Set(record.entities.to_string()),
        edit_field: ActiveValue::Set(record.edit_field.clone()),
        options: ActiveValue::Set(record.options.as_ref().map(ToString::to_string)),
        version: ActiveValue::Set(version),
        created_at: ActiveValue::Set(record.created_at),
        expires_at: ActiveValue::Set(record.expires_at),
    }
}
