//! Persisted multi-turn conversations.
//!
//! A [`Conversation`] is the typed view of a [`StoredConversation`] row. At
//! most one lives per (platform, platform user); it expires `state_ttl` after
//! its last write and is deleted on the first read past that point.

use chrono::{DateTime, Utc};
use ledger::{Currency, LedgerError, Money, StoredConversation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{Field, ParsedEntities},
    error::{InterpreterError, ResultInterpreter},
    intent::Intent,
    locale::keywords::RESET,
    ports::ConversationStore,
    text,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingConfirmation,
    AwaitingEditField,
    AwaitingEditValue,
    AwaitingAccountSelection,
    AwaitingCategorySelection,
    AwaitingDisambiguation,
    AwaitingCardSelection,
}

impl ConversationState {
    pub const ALL: [ConversationState; 7] = [
        ConversationState::AwaitingConfirmation,
        ConversationState::AwaitingEditField,
        ConversationState::AwaitingEditValue,
        ConversationState::AwaitingAccountSelection,
        ConversationState::AwaitingCategorySelection,
        ConversationState::AwaitingDisambiguation,
        ConversationState::AwaitingCardSelection,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConversationState::AwaitingConfirmation => "awaiting_confirmation",
            ConversationState::AwaitingEditField => "awaiting_edit_field",
            ConversationState::AwaitingEditValue => "awaiting_edit_value",
            ConversationState::AwaitingAccountSelection => "awaiting_account_selection",
            ConversationState::AwaitingCategorySelection => "awaiting_category_selection",
            ConversationState::AwaitingDisambiguation => "awaiting_disambiguation",
            ConversationState::AwaitingCardSelection => "awaiting_card_selection",
        }
    }

    /// States answered by picking one of the stored options.
    #[must_use]
    pub const fn is_selection(self) -> bool {
        matches!(
            self,
            ConversationState::AwaitingAccountSelection
                | ConversationState::AwaitingCategorySelection
                | ConversationState::AwaitingDisambiguation
                | ConversationState::AwaitingCardSelection
        )
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConversationState {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ConversationState::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| format!("unknown conversation state: {value}"))
    }
}

/// One numbered choice of a selection prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationOption {
    pub id: Uuid,
    pub display_name: String,
    pub icon: Option<String>,
    pub balance: Option<Money>,
    pub currency: Option<Currency>,
}

/// A pending exchange with one chat user.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversation {
    pub platform: String,
    pub platform_user_id: String,
    pub user_id: Uuid,
    pub state: ConversationState,
    pub intent: Intent,
    pub entities: ParsedEntities,
    /// Field being edited or selected.
    pub edit_field: Option<Field>,
    pub options: Vec<DisambiguationOption>,
    /// `0` until first stored.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> InterpreterError {
    InterpreterError::Persistence(LedgerError::InvalidData(format!(
        "conversation {what}: {err}"
    )))
}

impl Conversation {
    #[must_use]
    pub fn new(
        platform: &str,
        platform_user_id: &str,
        user_id: Uuid,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            platform_user_id: platform_user_id.to_string(),
            user_id,
            state: ConversationState::AwaitingConfirmation,
            intent,
            entities: ParsedEntities::default(),
            edit_field: None,
            options: Vec::new(),
            version: 0,
            created_at: now,
            expires_at: now,
        }
    }

    pub fn to_record(&self) -> ResultInterpreter<StoredConversation> {
        let entities = serde_json::to_value(&self.entities).map_err(|err| corrupt("entities", err))?;
        let options = if self.options.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&self.options).map_err(|err| corrupt("options", err))?)
        };
        Ok(StoredConversation {
            platform: self.platform.clone(),
            platform_user_id: self.platform_user_id.clone(),
            user_id: self.user_id,
            state: self.state.as_str().to_string(),
            intent: self.intent.as_str().to_string(),
            entities,
            edit_field: self.edit_field.map(|field| field.as_str().to_string()),
            options,
            version: self.version,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }

    pub fn from_record(record: StoredConversation) -> ResultInterpreter<Self> {
        let state =
            ConversationState::try_from(record.state.as_str()).map_err(|err| corrupt("state", err))?;
        let intent = Intent::try_from(record.intent.as_str()).map_err(|err| corrupt("intent", err))?;
        let entities: ParsedEntities =
            serde_json::from_value(record.entities).map_err(|err| corrupt("entities", err))?;
        let edit_field = record
            .edit_field
            .as_deref()
            .map(Field::try_from)
            .transpose()
            .map_err(|err| corrupt("edit field", err))?;
        let options: Vec<DisambiguationOption> = match record.options {
            Some(value) => serde_json::from_value(value).map_err(|err| corrupt("options", err))?,
            None => Vec::new(),
        };
        Ok(Self {
            platform: record.platform,
            platform_user_id: record.platform_user_id,
            user_id: record.user_id,
            state,
            intent,
            entities,
            edit_field,
            options,
            version: record.version,
            created_at: record.created_at,
            expires_at: record.expires_at,
        })
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The live conversation of a user, if any. Expired and unreadable records
/// are deleted and reported as absent.
pub async fn load_live(
    store: &dyn ConversationStore,
    platform: &str,
    platform_user_id: &str,
    now: DateTime<Utc>,
) -> ResultInterpreter<Option<Conversation>> {
    let Some(record) = store.load(platform, platform_user_id).await? else {
        return Ok(None);
    };
    if record.is_expired(now) {
        tracing::debug!(platform, state = %record.state, "conversation expired");
        store.delete(platform, platform_user_id).await?;
        return Ok(None);
    }
    match Conversation::from_record(record) {
        Ok(conversation) => Ok(Some(conversation)),
        Err(err) => {
            tracing::warn!(platform, error = %err, "dropping unreadable conversation");
            store.delete(platform, platform_user_id).await?;
            Ok(None)
        }
    }
}

/// Store `conversation`, refreshing its expiry. A concurrent write from
/// another turn surfaces as [`InterpreterError::StateConflict`].
pub async fn persist(
    store: &dyn ConversationStore,
    conversation: &mut Conversation,
    ttl: chrono::Duration,
    now: DateTime<Utc>,
) -> ResultInterpreter<()> {
    conversation.expires_at = now + ttl;
    let record = conversation.to_record()?;
    match store.save(&record).await {
        Ok(version) => {
            conversation.version = version;
            tracing::debug!(
                platform = %conversation.platform,
                state = %conversation.state,
                version,
                "conversation stored"
            );
            Ok(())
        }
        Err(LedgerError::VersionConflict(_)) => Err(InterpreterError::StateConflict),
        Err(err) => Err(err.into()),
    }
}

pub async fn clear(
    store: &dyn ConversationStore,
    platform: &str,
    platform_user_id: &str,
) -> ResultInterpreter<bool> {
    Ok(store.delete(platform, platform_user_id).await?)
}

/// Whether the message asks to drop whatever is pending: a reset word on its
/// own, or leading a two-word message ("cancelar todo", "no gracias").
#[must_use]
pub fn is_reset(message: &str) -> bool {
    let normalized = text::normalize(message);
    let bare = text::bare(&normalized);
    if RESET.contains(&bare) {
        return true;
    }
    let key = text::normalize_key(bare);
    let words: Vec<&str> = text::words(&key).collect();
    words.len() <= 2 && words.first().is_some_and(|first| RESET.contains(first))
}
