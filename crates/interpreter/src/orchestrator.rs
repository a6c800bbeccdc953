//! The single entry point: one call per inbound message or button press.
//!
//! A turn never fails from the adapter's point of view. Every error below
//! this layer ends up as a [`Reply`] with `success == false`.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use ledger::UserContext;
use tracing::Instrument;

use crate::{
    config::{InterpreterConfig, LlmConfig},
    entities::{Field, ParsedEntities, ResolvedCommand},
    error::{InterpreterError, ResultInterpreter},
    executor::Executor,
    extract,
    flow::{
        self, Step, edit,
        preview::confirmation_text,
        prompts::{self, Prompt},
        reply::{
            CallbackToken, Confirmation, Input, Reply, confirm_buttons, field_buttons,
            pick_buttons,
        },
    },
    intent::{self, Intent, IntentClassification},
    llm,
    locale::{self, templates},
    ports::{ConversationStore, IdentityRepository, LedgerRepository, LlmContext, LlmFallback},
    state::{self, Conversation, ConversationState},
};

/// Confidence a new message needs to replace a pending confirmation.
const TAKEOVER_CONFIDENCE: f64 = 0.7;
const GREETING_PATTERN: &str = "saludo";

pub struct Interpreter {
    identity: Arc<dyn IdentityRepository>,
    ledger: Arc<dyn LedgerRepository>,
    conversations: Arc<dyn ConversationStore>,
    llm: Option<Arc<dyn LlmFallback>>,
    llm_timeout: Duration,
    config: InterpreterConfig,
    timezone: Tz,
}

/// Everything a turn needs once the user is known.
struct Turn<'a> {
    platform: &'a str,
    platform_user_id: &'a str,
    ctx: UserContext,
    now: DateTime<Utc>,
    today: NaiveDate,
}

impl Interpreter {
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::default()
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub async fn process_message(&self, platform: &str, platform_user_id: &str, text: &str) -> Reply {
        self.process_message_at(platform, platform_user_id, text, Utc::now())
            .await
    }

    pub async fn process_callback(
        &self,
        platform: &str,
        platform_user_id: &str,
        token: &str,
    ) -> Reply {
        self.process_callback_at(platform, platform_user_id, token, Utc::now())
            .await
    }

    /// [`process_message`](Self::process_message) with an explicit clock.
    pub async fn process_message_at(
        &self,
        platform: &str,
        platform_user_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Reply {
        let span = tracing::info_span!("turn", platform, kind = "message");
        async {
            tracing::debug!(text, "message received");
            let result = self
                .message_turn(platform, platform_user_id, text, now)
                .await;
            self.settle(platform, platform_user_id, result).await
        }
        .instrument(span)
        .await
    }

    /// [`process_callback`](Self::process_callback) with an explicit clock.
    pub async fn process_callback_at(
        &self,
        platform: &str,
        platform_user_id: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Reply {
        let span = tracing::info_span!("turn", platform, kind = "callback");
        async {
            tracing::debug!(token, "callback received");
            let result = self
                .callback_turn(platform, platform_user_id, token, now)
                .await;
            self.settle(platform, platform_user_id, result).await
        }
        .instrument(span)
        .await
    }

    /// Remove every expired conversation.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> ResultInterpreter<u64> {
        Ok(self.conversations.sweep_expired(now).await?)
    }

    /// Turn a failed turn into text. Persistence and unexpected failures
    /// also drop the pending conversation.
    async fn settle(
        &self,
        platform: &str,
        platform_user_id: &str,
        result: ResultInterpreter<Reply>,
    ) -> Reply {
        let err = match result {
            Ok(reply) => return reply,
            Err(err) => err,
        };
        match err {
            InterpreterError::StateConflict => {
                tracing::warn!("conversation changed concurrently");
                Reply::failure(templates::STATE_CONFLICT)
            }
            InterpreterError::Validation(message) => Reply::failure(message),
            InterpreterError::ClassificationAmbiguous(confidence) => {
                tracing::debug!(confidence, "message not understood");
                Reply::failure(templates::NOT_UNDERSTOOD)
            }
            err @ (InterpreterError::Persistence(_) | InterpreterError::External(_)) => {
                tracing::error!(error = %err, "turn failed");
                if let Err(cleanup) =
                    state::clear(self.conversations.as_ref(), platform, platform_user_id).await
                {
                    tracing::error!(error = %cleanup, "could not clear conversation");
                }
                Reply::failure(templates::GENERIC_ERROR)
            }
        }
    }

    /// Identity and context; `Err(reply)` when the user cannot go on.
    async fn start<'a>(
        &self,
        platform: &'a str,
        platform_user_id: &'a str,
        now: DateTime<Utc>,
    ) -> ResultInterpreter<Result<Turn<'a>, Reply>> {
        let Some(user) = self
            .identity
            .platform_user(platform, platform_user_id)
            .await?
        else {
            tracing::info!("unlinked platform user");
            return Ok(Err(Reply::failure(templates::UNLINKED)));
        };
        if !user.verified {
            return Ok(Err(Reply::failure(templates::UNVERIFIED)));
        }
        let ctx = self.identity.user_context(user.user_id).await?;
        Ok(Ok(Turn {
            platform,
            platform_user_id,
            ctx,
            now,
            today: now.with_timezone(&self.timezone).date_naive(),
        }))
    }

    async fn message_turn(
        &self,
        platform: &str,
        platform_user_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> ResultInterpreter<Reply> {
        let turn = match self.start(platform, platform_user_id, now).await? {
            Ok(turn) => turn,
            Err(reply) => return Ok(reply),
        };
        let pending =
            state::load_live(self.conversations.as_ref(), platform, platform_user_id, now).await?;
        match pending {
            Some(conversation) if state::is_reset(text) => {
                tracing::info!(state = %conversation.state, "conversation reset");
                state::clear(self.conversations.as_ref(), platform, platform_user_id).await?;
                Ok(Reply::text(templates::CANCELLED))
            }
            Some(conversation) => self.continue_with(&turn, conversation, Input::Text(text)).await,
            None => self.fresh(&turn, text).await,
        }
    }

    async fn callback_turn(
        &self,
        platform: &str,
        platform_user_id: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultInterpreter<Reply> {
        let turn = match self.start(platform, platform_user_id, now).await? {
            Ok(turn) => turn,
            Err(reply) => return Ok(reply),
        };
        let Some(token) = CallbackToken::parse(token) else {
            tracing::warn!(token, "unknown callback token");
            return Ok(Reply::failure(templates::STALE_BUTTON));
        };
        match state::load_live(self.conversations.as_ref(), platform, platform_user_id, now).await? {
            Some(conversation) => {
                self.continue_with(&turn, conversation, Input::Callback(token))
                    .await
            }
            None => Ok(Reply::failure(templates::STALE_BUTTON)),
        }
    }

    /// Consult the model when the rules are unsure. Any failure keeps the
    /// rule result.
    async fn consult_llm(
        &self,
        turn: &Turn<'_>,
        text: &str,
        classification: IntentClassification,
        entities: ParsedEntities,
    ) -> (IntentClassification, ParsedEntities) {
        let Some(llm) = &self.llm else {
            return (classification, entities);
        };
        if classification.confidence >= self.config.llm_threshold
            || classification.matched_pattern_id.as_deref() == Some(GREETING_PATTERN)
        {
            return (classification, entities);
        }

        let context = LlmContext::from_user(&turn.ctx, turn.today);
        match tokio::time::timeout(self.llm_timeout, llm.parse(text, &context)).await {
            Ok(Ok(Some(parse))) => {
                tracing::info!(
                    intent = %parse.intent,
                    confidence = parse.confidence,
                    "llm fallback answered"
                );
                llm::merge(text, turn.today, classification, entities, parse)
            }
            Ok(Ok(None)) => {
                tracing::debug!("llm fallback had nothing usable");
                (classification, entities)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "llm fallback failed");
                (classification, entities)
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.llm_timeout.as_millis() as u64, "llm fallback timed out");
                (classification, entities)
            }
        }
    }

    /// A message with nothing pending.
    async fn fresh(&self, turn: &Turn<'_>, text: &str) -> ResultInterpreter<Reply> {
        let classification = intent::classify(text);
        let entities = extract::extract(text, classification.intent, turn.today);
        let (classification, entities) =
            self.consult_llm(turn, text, classification, entities).await;
        tracing::info!(
            intent = %classification.intent,
            confidence = classification.confidence,
            pattern = classification.matched_pattern_id.as_deref().unwrap_or("-"),
            "message classified"
        );

        match classification.intent {
            Intent::Desconocido => Err(InterpreterError::ClassificationAmbiguous(
                classification.confidence,
            )),
            Intent::Ayuda => {
                let greeting =
                    classification.matched_pattern_id.as_deref() == Some(GREETING_PATTERN);
                Ok(Reply::text(if greeting {
                    templates::greeting(&turn.ctx.settings.display_name)
                } else {
                    templates::HELP.to_string()
                }))
            }
            Intent::Menu => Ok(Reply::text(templates::MENU)),
            Intent::Cancelar => Ok(Reply::text(templates::NOTHING_TO_CANCEL)),
            intent => {
                let mut conversation = Conversation::new(
                    turn.platform,
                    turn.platform_user_id,
                    turn.ctx.user_id,
                    intent,
                    turn.now,
                );
                conversation.entities = entities;
                self.drive(turn, conversation).await
            }
        }
    }

    /// Re-evaluate the conversation after its entities changed.
    async fn drive(&self, turn: &Turn<'_>, mut conversation: Conversation) -> ResultInterpreter<Reply> {
        match flow::advance(
            &turn.ctx,
            conversation.intent,
            &mut conversation.entities,
            turn.today,
        ) {
            Step::Ask(prompt) => self.ask(turn, conversation, prompt).await,
            Step::Confirm(command) => {
                conversation.state = ConversationState::AwaitingConfirmation;
                conversation.edit_field = None;
                conversation.options.clear();
                self.store(turn, &mut conversation).await?;
                Ok(Reply::text(confirmation_text(&turn.ctx, &command))
                    .with_buttons(confirm_buttons())
                    .in_state(ConversationState::AwaitingConfirmation))
            }
            Step::Answer => self.answer(turn, &conversation).await,
            Step::Stop(message) => {
                self.finish(turn, &conversation).await?;
                Ok(Reply::failure(message))
            }
        }
    }

    async fn answer(&self, turn: &Turn<'_>, conversation: &Conversation) -> ResultInterpreter<Reply> {
        let answer = self
            .executor(turn)
            .answer(conversation.intent, &conversation.entities, turn.today)
            .await?;
        self.finish(turn, conversation).await?;
        Ok(Reply::text(answer))
    }

    async fn ask(
        &self,
        turn: &Turn<'_>,
        mut conversation: Conversation,
        prompt: Prompt,
    ) -> ResultInterpreter<Reply> {
        conversation.state = prompt.state;
        conversation.edit_field = prompt.field;
        conversation.options = prompt.options.clone();
        self.store(turn, &mut conversation).await?;
        Ok(Reply::text(prompt.render())
            .with_buttons(pick_buttons(&prompt.options))
            .in_state(prompt.state))
    }

    async fn store(&self, turn: &Turn<'_>, conversation: &mut Conversation) -> ResultInterpreter<()> {
        state::persist(
            self.conversations.as_ref(),
            conversation,
            self.config.state_ttl(),
            turn.now,
        )
        .await
    }

    /// Drop the conversation if it was ever stored.
    async fn finish(&self, turn: &Turn<'_>, conversation: &Conversation) -> ResultInterpreter<()> {
        if conversation.version > 0 {
            state::clear(
                self.conversations.as_ref(),
                turn.platform,
                turn.platform_user_id,
            )
            .await?;
        }
        Ok(())
    }

    fn executor<'t>(&'t self, turn: &'t Turn<'_>) -> Executor<'t> {
        Executor::new(
            self.ledger.as_ref(),
            &turn.ctx,
            self.config.installment_rounding,
        )
    }

    /// Answer to whatever the conversation is waiting on.
    async fn continue_with(
        &self,
        turn: &Turn<'_>,
        conversation: Conversation,
        input: Input<'_>,
    ) -> ResultInterpreter<Reply> {
        tracing::debug!(state = %conversation.state, intent = %conversation.intent, "continuing");
        match conversation.state {
            ConversationState::AwaitingConfirmation => {
                self.on_confirmation(turn, conversation, input).await
            }
            ConversationState::AwaitingEditField => self.on_edit_field(turn, conversation, input).await,
            ConversationState::AwaitingEditValue => self.on_edit_value(turn, conversation, input).await,
            ConversationState::AwaitingAccountSelection
            | ConversationState::AwaitingCategorySelection
            | ConversationState::AwaitingDisambiguation
            | ConversationState::AwaitingCardSelection => {
                self.on_selection(turn, conversation, input).await
            }
        }
    }

    async fn on_confirmation(
        &self,
        turn: &Turn<'_>,
        mut conversation: Conversation,
        input: Input<'_>,
    ) -> ResultInterpreter<Reply> {
        let choice = match input {
            Input::Text(text) => Confirmation::parse(text),
            Input::Callback(CallbackToken::Confirm(choice)) => Some(choice),
            Input::Callback(_) => None,
        };
        match choice {
            Some(Confirmation::Yes) => {
                let command = match ResolvedCommand::from_entities(
                    conversation.intent,
                    &conversation.entities,
                    turn.today,
                ) {
                    Ok(command) => command,
                    Err(_) => return self.drive(turn, conversation).await,
                };
                let text = self.executor(turn).execute(&command).await?;
                self.finish(turn, &conversation).await?;
                tracing::info!(intent = %conversation.intent, "command executed");
                Ok(Reply::text(text))
            }
            Some(Confirmation::No) => {
                self.finish(turn, &conversation).await?;
                Ok(Reply::text(templates::CANCELLED))
            }
            Some(Confirmation::Edit) => {
                conversation.state = ConversationState::AwaitingEditField;
                conversation.edit_field = None;
                self.store(turn, &mut conversation).await?;
                Ok(self.edit_menu(turn, &conversation, None))
            }
            None => {
                if let Input::Text(text) = input {
                    let classification = intent::classify(text);
                    if classification.confidence >= TAKEOVER_CONFIDENCE
                        && (classification.intent.is_write() || classification.intent.is_read())
                    {
                        tracing::info!(intent = %classification.intent, "new command replaces confirmation");
                        self.finish(turn, &conversation).await?;
                        return self.fresh(turn, text).await;
                    }
                }
                Ok(Reply::failure(templates::CONFIRM_NOT_UNDERSTOOD)
                    .with_buttons(confirm_buttons())
                    .in_state(ConversationState::AwaitingConfirmation))
            }
        }
    }

    fn edit_menu(&self, turn: &Turn<'_>, conversation: &Conversation, error: Option<&str>) -> Reply {
        let menu = edit::menu_text(&turn.ctx, conversation.intent, &conversation.entities);
        let reply = match error {
            Some(error) => Reply::failure(format!("{error}\n{menu}")),
            None => Reply::text(menu),
        };
        reply
            .with_buttons(field_buttons(Field::editable_for(conversation.intent)))
            .in_state(ConversationState::AwaitingEditField)
    }

    async fn on_edit_field(
        &self,
        turn: &Turn<'_>,
        mut conversation: Conversation,
        input: Input<'_>,
    ) -> ResultInterpreter<Reply> {
        let editable = Field::editable_for(conversation.intent);
        let field = match input {
            Input::Text(text) => edit::parse_field_choice(conversation.intent, text),
            Input::Callback(CallbackToken::Field(field)) => {
                editable.contains(&field).then_some(field)
            }
            Input::Callback(_) => None,
        };
        let Some(field) = field else {
            return Ok(self.edit_menu(
                turn,
                &conversation,
                Some(templates::EDIT_FIELD_NOT_UNDERSTOOD),
            ));
        };

        if field.is_reference() {
            let options =
                prompts::options_for(&turn.ctx, conversation.intent, field, &conversation.entities);
            if options.is_empty() {
                return Ok(self.edit_menu(turn, &conversation, Some(prompts::empty_pool(field))));
            }
            let prompt = prompts::pick_prompt(conversation.intent, field, options);
            return self.ask(turn, conversation, prompt).await;
        }
        conversation.state = ConversationState::AwaitingEditValue;
        conversation.edit_field = Some(field);
        conversation.options.clear();
        self.store(turn, &mut conversation).await?;
        Ok(Reply::text(templates::ask_value(field.label()))
            .in_state(ConversationState::AwaitingEditValue))
    }

    fn value_question(conversation: &Conversation, field: Field) -> String {
        if field == Field::Amount && conversation.entities.amount.is_none() {
            prompts::amount_question(conversation.intent)
        } else {
            templates::ask_value(field.label())
        }
    }

    async fn on_edit_value(
        &self,
        turn: &Turn<'_>,
        mut conversation: Conversation,
        input: Input<'_>,
    ) -> ResultInterpreter<Reply> {
        let Some(field) = conversation.edit_field else {
            return self.drive(turn, conversation).await;
        };
        let Input::Text(text) = input else {
            return Ok(Reply::failure(Self::value_question(&conversation, field))
                .in_state(ConversationState::AwaitingEditValue));
        };
        match edit::apply_value(&mut conversation.entities, field, text, turn.today) {
            Ok(()) => {
                tracing::debug!(field = field.as_str(), "value edited");
                conversation.edit_field = None;
                self.drive(turn, conversation).await
            }
            Err(InterpreterError::Validation(message)) => Ok(Reply::failure(format!(
                "{message}\n{}",
                Self::value_question(&conversation, field)
            ))
            .in_state(ConversationState::AwaitingEditValue)),
            Err(err) => Err(err),
        }
    }

    async fn on_selection(
        &self,
        turn: &Turn<'_>,
        mut conversation: Conversation,
        input: Input<'_>,
    ) -> ResultInterpreter<Reply> {
        if conversation.intent == Intent::ConsultarSaldo
            && let Input::Text(text) = input
            && flow::is_every_account(text)
        {
            conversation.entities.account = None;
            return self.answer(turn, &conversation).await;
        }

        let index = match input {
            Input::Text(text) => prompts::pick_from_text(&conversation.options, text),
            Input::Callback(CallbackToken::Pick(number)) => number.checked_sub(1),
            Input::Callback(_) => None,
        };
        let picked = index.and_then(|index| conversation.options.get(index)).cloned();
        let (Some(option), Some(field)) = (picked, conversation.edit_field) else {
            let mut text = templates::PICK_NOT_UNDERSTOOD.to_string();
            for (index, option) in conversation.options.iter().enumerate() {
                text.push('\n');
                text.push_str(&templates::option_line(index + 1, &option.display_name, None));
            }
            return Ok(Reply::failure(text)
                .with_buttons(pick_buttons(&conversation.options))
                .in_state(conversation.state));
        };

        tracing::debug!(field = field.as_str(), "option picked");
        flow::select(&mut conversation.entities, field, option.id);
        conversation.edit_field = None;
        conversation.options.clear();
        self.drive(turn, conversation).await
    }
}

#[derive(Default)]
pub struct InterpreterBuilder {
    identity: Option<Arc<dyn IdentityRepository>>,
    ledger: Option<Arc<dyn LedgerRepository>>,
    conversations: Option<Arc<dyn ConversationStore>>,
    llm: Option<Arc<dyn LlmFallback>>,
    llm_timeout: Option<Duration>,
    config: InterpreterConfig,
    timezone: Option<Tz>,
}

impl InterpreterBuilder {
    /// Use one store for identity, ledger and conversations.
    pub fn store<S>(mut self, store: Arc<S>) -> InterpreterBuilder
    where
        S: IdentityRepository + LedgerRepository + ConversationStore + 'static,
    {
        self.identity = Some(store.clone());
        self.ledger = Some(store.clone());
        self.conversations = Some(store);
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityRepository>) -> InterpreterBuilder {
        self.identity = Some(identity);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn LedgerRepository>) -> InterpreterBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn conversations(mut self, conversations: Arc<dyn ConversationStore>) -> InterpreterBuilder {
        self.conversations = Some(conversations);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LlmFallback>) -> InterpreterBuilder {
        self.llm = Some(llm);
        self
    }

    /// Build the HTTP fallback from `config`; a config without API key
    /// leaves the fallback off.
    pub fn llm_config(mut self, config: &LlmConfig) -> ResultInterpreter<InterpreterBuilder> {
        self.llm_timeout = Some(config.timeout());
        if config.enabled() {
            self.llm = Some(Arc::new(llm::HttpLlmClient::new(config.clone())?));
        }
        Ok(self)
    }

    pub fn llm_timeout(mut self, timeout: Duration) -> InterpreterBuilder {
        self.llm_timeout = Some(timeout);
        self
    }

    pub fn config(mut self, config: InterpreterConfig) -> InterpreterBuilder {
        self.config = config;
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> InterpreterBuilder {
        self.timezone = Some(timezone);
        self
    }

    pub fn build(self) -> ResultInterpreter<Interpreter> {
        let missing = |what: &str| InterpreterError::External(format!("{what} not configured"));
        tracing::info!(llm = self.llm.is_some(), "Initializing interpreter...");
        Ok(Interpreter {
            identity: self.identity.ok_or_else(|| missing("identity repository"))?,
            ledger: self.ledger.ok_or_else(|| missing("ledger repository"))?,
            conversations: self.conversations.ok_or_else(|| missing("conversation store"))?,
            llm: self.llm,
            llm_timeout: self
                .llm_timeout
                .unwrap_or_else(|| LlmConfig::default().timeout()),
            config: self.config,
            timezone: self.timezone.unwrap_or(locale::TIMEZONE),
        })
    }
}
