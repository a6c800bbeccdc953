use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use interpreter::{
    ConversationState, ConversationStore, IdentityRepository, Intent, Interpreter,
    InterpreterConfig, LedgerRepository, LlmContext, LlmFallback, LlmParse, ResultInterpreter,
    entities::{EntityRef, Field, ParsedEntities},
    locale::templates,
    state::Conversation,
};
use ledger::{
    CategoryKind, Currency, Ledger, LedgerError, Money, Movement, MovementFilter, MovementKind,
    NewAccount, NewCategory, NewInstallmentPurchase, NewMovement, NewTransfer, PlatformUser,
    StoredConversation, Transfer, TransferFilter, UserContext,
};
use migration::MigratorTrait;

const PLATFORM: &str = "telegram";
const CHAT: &str = "1001";

struct Fixture {
    ledger: Ledger,
    user_id: Uuid,
}

impl Fixture {
    async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let ledger = Ledger::builder().database(db).build().await.unwrap();
        let user_id = ledger.create_user("Lucía", Currency::Ars).await.unwrap();
        ledger
            .link_platform_user(PLATFORM, CHAT, user_id, true)
            .await
            .unwrap();
        Self { ledger, user_id }
    }

    async fn account(&self, name: &str, balance: i64) -> Uuid {
        self.ledger
            .create_account(
                NewAccount::new(self.user_id, name, Currency::Ars)
                    .initial_balance(Money::from_major(balance)),
            )
            .await
            .unwrap()
    }

    async fn card(&self, name: &str, closing_day: u32) -> Uuid {
        self.ledger
            .create_account(NewAccount::new(self.user_id, name, Currency::Ars).credit_card(closing_day))
            .await
            .unwrap()
    }

    async fn category(&self, name: &str, kind: CategoryKind) -> Uuid {
        self.ledger
            .create_category(NewCategory::new(self.user_id, name, kind))
            .await
            .unwrap()
    }

    fn interpreter(&self) -> Interpreter {
        Interpreter::builder()
            .store(Arc::new(self.ledger.clone()))
            .build()
            .unwrap()
    }

    async fn movements(&self) -> Vec<Movement> {
        self.ledger
            .query_movements(&MovementFilter::for_user(self.user_id))
            .await
            .unwrap()
    }

    async fn pending(&self) -> Option<StoredConversation> {
        self.ledger.load_conversation(PLATFORM, CHAT).await.unwrap()
    }
}

/// Noon in Buenos Aires on 2026-10-18.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn say(interpreter: &Interpreter, text: &str) -> interpreter::Reply {
    interpreter
        .process_message_at(PLATFORM, CHAT, text, now())
        .await
}

async fn press(interpreter: &Interpreter, token: &str) -> interpreter::Reply {
    interpreter
        .process_callback_at(PLATFORM, CHAT, token, now())
        .await
}

#[tokio::test]
async fn expense_with_single_candidates_confirms_and_books() {
    let fx = Fixture::new().await;
    let cash = fx.account("Efectivo", 10_000).await;
    let food = fx.category("Comida", CategoryKind::Expense).await;
    fx.category("Sueldo", CategoryKind::Income).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "gasté 500 en comida").await;
    assert!(reply.success, "{}", reply.response_text);
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    assert_eq!(reply.buttons.len(), 3);
    for needle in ["$500.00 ARS", "Comida", "Efectivo", "18/10/2026"] {
        assert!(reply.response_text.contains(needle), "{needle} missing");
    }

    let reply = say(&interpreter, "sí").await;
    assert!(reply.success);
    assert_eq!(reply.new_state, None);
    assert!(reply.response_text.contains("Registré el gasto"));
    assert!(reply.response_text.contains("$9,500.00 ARS"));

    let movements = fx.movements().await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, Money::from_major(500));
    assert_eq!(movements[0].account_id, cash);
    assert_eq!(movements[0].category_id, food);
    assert_eq!(movements[0].date, day(2026, 10, 18));
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn transfer_resolves_aliases_in_both_directions() {
    let fx = Fixture::new().await;
    let galicia = fx.account("Banco Galicia", 50_000).await;
    let mp = fx.account("MercadoPago", 1_000).await;
    fx.account("Efectivo", 100).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "transferí 10000 de galicia a mp").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    let text = &reply.response_text;
    assert!(text.contains("$10,000.00 ARS"));
    assert!(text.contains("Desde: Banco Galicia"));
    assert!(text.contains("Hacia: MercadoPago"));

    let reply = press(&interpreter, "confirm:yes").await;
    assert!(reply.success, "{}", reply.response_text);

    let transfers = fx
        .ledger
        .query_transfers(&TransferFilter::for_user(fx.user_id))
        .await
        .unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from_account_id, galicia);
    assert_eq!(transfers[0].to_account_id, mp);
    assert_eq!(transfers[0].from_amount, Money::from_major(10_000));
}

#[tokio::test]
async fn spending_query_answers_without_confirmation() {
    let fx = Fixture::new().await;
    let cash = fx.account("Efectivo", 10_000).await;
    let food = fx.category("Comida", CategoryKind::Expense).await;
    let transport = fx.category("Transporte", CategoryKind::Expense).await;
    for (date, amount, category) in [
        (day(2026, 10, 5), 1_200, food),
        (day(2026, 10, 9), 300, food),
        (day(2026, 10, 9), 900, transport),
        (day(2026, 9, 30), 5_000, food),
    ] {
        fx.ledger
            .insert_movement(NewMovement::new(
                fx.user_id,
                MovementKind::Expense,
                date,
                Money::from_major(amount),
                cash,
                category,
            ))
            .await
            .unwrap();
    }
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "cuánto gasté en comida este mes").await;
    assert!(reply.success, "{}", reply.response_text);
    assert_eq!(reply.new_state, None);
    assert!(reply.buttons.is_empty());
    assert!(reply.response_text.contains("$1,500.00 ARS"));
    assert!(reply.response_text.contains("2 movimientos"));
    assert!(!reply.response_text.contains("$5,000.00"));
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn bare_balance_with_several_accounts_asks_which_one() {
    let fx = Fixture::new().await;
    fx.account("Galicia Caja", 100).await;
    let savings = fx.account("Galicia Ahorro", 2_500).await;
    fx.account("Galicia Sueldo", 300).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "saldo").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingDisambiguation));
    assert_eq!(reply.buttons.len(), 3);
    assert!(reply.response_text.contains("1. "));
    assert!(reply.response_text.contains("3. "));
    assert!(!reply.response_text.contains("4. "));

    let position = reply
        .buttons
        .iter()
        .position(|button| button.label.contains("Galicia Ahorro"))
        .unwrap();
    let reply = press(&interpreter, &format!("pick:{}", position + 1)).await;
    assert!(reply.success, "{}", reply.response_text);
    assert_eq!(reply.new_state, None);
    assert!(reply.response_text.contains("Galicia Ahorro"));
    assert!(reply.response_text.contains("$2,500.00 ARS"));
    assert!(fx.pending().await.is_none());
    assert_eq!(
        fx.ledger.account_balance(fx.user_id, savings).await.unwrap(),
        Money::from_major(2_500)
    );
}

#[tokio::test]
async fn every_balance_is_one_answer_away() {
    let fx = Fixture::new().await;
    fx.account("Galicia Caja", 100).await;
    fx.account("Galicia Ahorro", 2_500).await;
    let interpreter = fx.interpreter();

    say(&interpreter, "saldo").await;
    let reply = say(&interpreter, "todas").await;
    assert_eq!(reply.new_state, None);
    assert!(reply.response_text.contains("Galicia Caja"));
    assert!(reply.response_text.contains("Galicia Ahorro"));
    assert!(reply.response_text.contains("$2,600.00 ARS"));
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn strong_account_match_answers_directly() {
    let fx = Fixture::new().await;
    fx.account("Banco Galicia", 4_000).await;
    fx.account("Visa Galicia", 0).await;
    fx.account("Efectivo", 100).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "saldo de galicia").await;
    assert!(reply.success, "{}", reply.response_text);
    assert_eq!(reply.new_state, None);
    assert!(reply.buttons.is_empty());
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn out_of_range_amounts_are_asked_again() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    for message in ["gasté 200 palos en comida", "gasté 0 en comida"] {
        let reply = say(&interpreter, message).await;
        assert_eq!(reply.new_state, Some(ConversationState::AwaitingEditValue), "{message}");
        assert!(
            reply.response_text.starts_with("El monto tiene que ser"),
            "{}",
            reply.response_text
        );
        assert!(fx.pending().await.is_some());

        let reply = say(&interpreter, "500").await;
        assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
        assert!(reply.response_text.contains("$500.00 ARS"));
        say(&interpreter, "no").await;
    }
    assert!(fx.movements().await.is_empty());
}

#[tokio::test]
async fn reset_words_clear_every_state() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    for (index, waiting) in ConversationState::ALL.into_iter().enumerate() {
        let mut conversation =
            Conversation::new(PLATFORM, CHAT, fx.user_id, Intent::RegistrarGasto, now());
        conversation.state = waiting;
        conversation.entities.amount = Some(Money::from_major(500));
        conversation.edit_field = match waiting {
            ConversationState::AwaitingConfirmation | ConversationState::AwaitingEditField => None,
            ConversationState::AwaitingEditValue => Some(Field::Amount),
            ConversationState::AwaitingCategorySelection => Some(Field::Category),
            _ => Some(Field::Account),
        };
        conversation.expires_at = now() + chrono::Duration::minutes(10);
        fx.ledger
            .save_conversation(&conversation.to_record().unwrap())
            .await
            .unwrap();

        let word = ["cancelar", "no", "volver"][index % 3];
        let reply = say(&interpreter, word).await;
        assert_eq!(reply.response_text, templates::CANCELLED, "{waiting} / {word}");
        assert_eq!(reply.new_state, None);
        assert!(fx.pending().await.is_none(), "{waiting} still stored");
    }
    assert!(fx.movements().await.is_empty());
}

#[tokio::test]
async fn cancel_while_editing_a_value_drops_the_state() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "gasté en comida").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingEditValue));
    assert!(fx.pending().await.is_some());

    let reply = say(&interpreter, "cancelar").await;
    assert_eq!(reply.response_text, templates::CANCELLED);
    assert_eq!(reply.new_state, None);
    assert!(fx.pending().await.is_none());
    assert!(fx.movements().await.is_empty());
}

#[tokio::test]
async fn edit_menu_changes_the_amount() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    say(&interpreter, "gasté 500 en comida").await;
    let reply = press(&interpreter, "confirm:edit").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingEditField));
    assert!(reply.response_text.contains("1. Monto: $500.00 ARS"));

    let reply = say(&interpreter, "monto").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingEditValue));

    let reply = say(&interpreter, "mucho").await;
    assert!(!reply.success);
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingEditValue));

    let reply = say(&interpreter, "800").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    assert!(reply.response_text.contains("$800.00 ARS"));

    say(&interpreter, "dale").await;
    let movements = fx.movements().await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, Money::from_major(800));
}

#[tokio::test]
async fn ambiguous_account_is_asked_before_confirming() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    let mp = fx.account("MercadoPago", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "gasté 500 en comida").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingAccountSelection));
    assert_eq!(reply.buttons.len(), 2);

    let reply = say(&interpreter, "cualquiera").await;
    assert!(!reply.success);
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingAccountSelection));

    let reply = say(&interpreter, "mercadopago").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    say(&interpreter, "si").await;
    assert_eq!(fx.movements().await[0].account_id, mp);
}

#[tokio::test]
async fn installment_purchase_books_one_row_per_installment() {
    let fx = Fixture::new().await;
    let visa = fx.card("Visa", 25).await;
    fx.category("Electro", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    let reply = say(&interpreter, "compré una tele 300k en 3 cuotas con la visa").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    assert!(reply.response_text.contains("3 cuotas de $100,000.00 ARS"));
    assert!(reply.response_text.contains("18/11/2026"));

    let reply = say(&interpreter, "si").await;
    assert!(reply.success, "{}", reply.response_text);

    let mut movements = fx.movements().await;
    movements.sort_by_key(|movement| movement.installment_number);
    assert_eq!(movements.len(), 3);
    assert!(movements.iter().all(|movement| movement.account_id == visa));
    let dates: Vec<_> = movements.iter().map(|movement| movement.date).collect();
    assert_eq!(dates, vec![day(2026, 11, 18), day(2026, 12, 18), day(2027, 1, 18)]);
}

/// Fails every movement insert `fail` picks.
#[derive(Clone)]
struct FlakyLedger {
    inner: Ledger,
    fail: fn(&NewMovement) -> bool,
}

#[async_trait]
impl IdentityRepository for FlakyLedger {
    async fn platform_user(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> Result<Option<PlatformUser>, LedgerError> {
        self.inner.platform_user(platform, platform_user_id).await
    }

    async fn user_context(&self, user_id: Uuid) -> Result<UserContext, LedgerError> {
        self.inner.user_context(user_id).await
    }
}

#[async_trait]
impl LedgerRepository for FlakyLedger {
    async fn insert_movement(&self, cmd: NewMovement) -> Result<Uuid, LedgerError> {
        if (self.fail)(&cmd) {
            return Err(LedgerError::InvalidData("disk full".to_string()));
        }
        self.inner.insert_movement(cmd).await
    }

    async fn insert_transfer(&self, cmd: NewTransfer) -> Result<Uuid, LedgerError> {
        self.inner.insert_transfer(cmd).await
    }

    async fn insert_installment_purchase(
        &self,
        cmd: NewInstallmentPurchase,
    ) -> Result<Uuid, LedgerError> {
        self.inner.insert_installment_purchase(cmd).await
    }

    async fn delete_installment_purchase(
        &self,
        user_id: Uuid,
        purchase_id: Uuid,
    ) -> Result<(), LedgerError> {
        self.inner.delete_installment_purchase(user_id, purchase_id).await
    }

    async fn query_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, LedgerError> {
        self.inner.query_movements(filter).await
    }

    async fn query_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, LedgerError> {
        self.inner.query_transfers(filter).await
    }

    async fn account_balance(&self, user_id: Uuid, account_id: Uuid) -> Result<Money, LedgerError> {
        self.inner.account_balance(user_id, account_id).await
    }
}

#[async_trait]
impl ConversationStore for FlakyLedger {
    async fn load(
        &self,
        platform: &str,
        platform_user_id: &str,
    ) -> Result<Option<StoredConversation>, LedgerError> {
        self.inner.load_conversation(platform, platform_user_id).await
    }

    async fn save(&self, record: &StoredConversation) -> Result<i64, LedgerError> {
        self.inner.save_conversation(record).await
    }

    async fn delete(&self, platform: &str, platform_user_id: &str) -> Result<bool, LedgerError> {
        self.inner.delete_conversation(platform, platform_user_id).await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        self.inner.sweep_expired_conversations(now).await
    }
}

#[tokio::test]
async fn failed_installment_rolls_back_the_purchase() {
    let fx = Fixture::new().await;
    fx.card("Visa", 25).await;
    fx.category("Electro", CategoryKind::Expense).await;
    let interpreter = Interpreter::builder()
        .store(Arc::new(FlakyLedger {
            inner: fx.ledger.clone(),
            fail: |cmd| cmd.installment_number == Some(2),
        }))
        .build()
        .unwrap();

    say(&interpreter, "compré una tele 300k en 3 cuotas con la visa").await;
    let reply = say(&interpreter, "si").await;
    assert!(!reply.success);
    assert_eq!(reply.response_text, templates::GENERIC_ERROR);
    assert!(fx.movements().await.is_empty());
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn card_payment_survives_a_failed_stamp_tax() {
    let fx = Fixture::new().await;
    let galicia = fx.account("Banco Galicia", 200_000).await;
    let visa = fx.card("Visa", 25).await;
    fx.category("Impuestos", CategoryKind::Expense).await;
    let interpreter = Interpreter::builder()
        .store(Arc::new(FlakyLedger {
            inner: fx.ledger.clone(),
            fail: |cmd| cmd.installment_number.is_none(),
        }))
        .build()
        .unwrap();

    let reply = say(&interpreter, "pagué la visa 80000 con galicia más sellos 1500").await;
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    let reply = say(&interpreter, "si").await;
    assert!(reply.success, "{}", reply.response_text);
    assert!(reply.response_text.contains("Registré el pago"));
    assert!(reply.response_text.contains("El pago quedó registrado"));

    let transfers = fx
        .ledger
        .query_transfers(&TransferFilter::for_user(fx.user_id))
        .await
        .unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from_account_id, galicia);
    assert_eq!(transfers[0].to_account_id, visa);
    assert!(fx.movements().await.is_empty());
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn unknown_and_unverified_users_are_turned_away() {
    let fx = Fixture::new().await;
    let interpreter = fx.interpreter();

    let reply = interpreter
        .process_message_at(PLATFORM, "999", "gasté 500", now())
        .await;
    assert!(!reply.success);
    assert_eq!(reply.response_text, templates::UNLINKED);

    fx.ledger
        .link_platform_user(PLATFORM, "777", fx.user_id, false)
        .await
        .unwrap();
    let reply = interpreter
        .process_message_at(PLATFORM, "777", "gasté 500", now())
        .await;
    assert_eq!(reply.response_text, templates::UNVERIFIED);
}

#[tokio::test]
async fn buttons_without_a_pending_conversation_are_stale() {
    let fx = Fixture::new().await;
    let interpreter = fx.interpreter();

    let reply = press(&interpreter, "confirm:yes").await;
    assert!(!reply.success);
    assert_eq!(reply.response_text, templates::STALE_BUTTON);

    let reply = press(&interpreter, "launch:rockets").await;
    assert_eq!(reply.response_text, templates::STALE_BUTTON);
}

#[tokio::test]
async fn expired_confirmation_is_not_executed() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    say(&interpreter, "gasté 500 en comida").await;
    let later = now() + chrono::Duration::minutes(11);
    let reply = interpreter
        .process_callback_at(PLATFORM, CHAT, "confirm:yes", later)
        .await;
    assert_eq!(reply.response_text, templates::STALE_BUTTON);
    assert!(fx.movements().await.is_empty());
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn sweep_removes_expired_conversations() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    say(&interpreter, "gasté 500 en comida").await;
    assert_eq!(interpreter.sweep_expired(now()).await.unwrap(), 0);
    let later = now() + chrono::Duration::hours(1);
    assert_eq!(interpreter.sweep_expired(later).await.unwrap(), 1);
    assert!(fx.pending().await.is_none());
}

#[tokio::test]
async fn confident_new_command_replaces_the_confirmation() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let interpreter = fx.interpreter();

    say(&interpreter, "gasté 500 en comida").await;
    let reply = say(&interpreter, "saldo").await;
    assert_eq!(reply.new_state, None);
    assert!(reply.response_text.contains("Efectivo"));
    assert!(fx.pending().await.is_none());
    assert!(fx.movements().await.is_empty());
}

/// Answers with a fixed parse and counts calls.
struct FixedLlm {
    parse: Option<LlmParse>,
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmFallback for FixedLlm {
    async fn parse(&self, _text: &str, _context: &LlmContext) -> ResultInterpreter<Option<LlmParse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.parse.clone())
    }
}

fn always_consult() -> InterpreterConfig {
    InterpreterConfig {
        llm_threshold: 1.01,
        ..Default::default()
    }
}

#[tokio::test]
async fn llm_fills_what_the_rules_missed() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    fx.category("Ropa", CategoryKind::Expense).await;
    let llm = Arc::new(FixedLlm {
        parse: Some(LlmParse {
            intent: Intent::RegistrarGasto,
            confidence: 0.99,
            entities: ParsedEntities {
                amount: Some(Money::from_major(500)),
                category: Some(EntityRef::text("comida")),
                ..Default::default()
            },
        }),
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    });
    let interpreter = Interpreter::builder()
        .store(Arc::new(fx.ledger.clone()))
        .llm(llm.clone())
        .config(always_consult())
        .build()
        .unwrap();

    let reply = say(&interpreter, "500").await;
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
    assert!(reply.response_text.contains("Comida"));
    assert!(reply.response_text.contains("$500.00 ARS"));
}

#[tokio::test]
async fn slow_llm_is_ignored() {
    let fx = Fixture::new().await;
    fx.account("Efectivo", 10_000).await;
    fx.category("Comida", CategoryKind::Expense).await;
    let llm = Arc::new(FixedLlm {
        parse: Some(LlmParse {
            intent: Intent::ResumenMes,
            confidence: 1.0,
            entities: ParsedEntities::default(),
        }),
        delay: Duration::from_millis(500),
        calls: AtomicUsize::new(0),
    });
    let interpreter = Interpreter::builder()
        .store(Arc::new(fx.ledger.clone()))
        .llm(llm.clone())
        .llm_timeout(Duration::from_millis(20))
        .config(always_consult())
        .build()
        .unwrap();

    let reply = say(&interpreter, "gasté 500 en comida").await;
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(reply.new_state, Some(ConversationState::AwaitingConfirmation));
}

#[tokio::test]
async fn greetings_never_reach_the_llm() {
    let fx = Fixture::new().await;
    let llm = Arc::new(FixedLlm {
        parse: None,
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    });
    let interpreter = Interpreter::builder()
        .store(Arc::new(fx.ledger.clone()))
        .llm(llm.clone())
        .config(always_consult())
        .build()
        .unwrap();

    let reply = say(&interpreter, "hola").await;
    assert!(reply.success);
    assert!(reply.response_text.contains("Lucía"));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}
