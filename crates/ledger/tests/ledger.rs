use chrono::{Duration, NaiveDate, Utc};
use sea_orm::Database;
use uuid::Uuid;

use ledger::{
    CategoryKind, Currency, Ledger, LedgerError, Money, MovementFilter, MovementKind,
    NewAccount, NewCategory, NewInstallmentPurchase, NewMovement, NewTransfer,
    StoredConversation, TransferFilter,
};
use migration::MigratorTrait;

struct Fixture {
    ledger: Ledger,
    user_id: Uuid,
    cash: Uuid,
    bank: Uuid,
    card: Uuid,
    food: Uuid,
    salary: Uuid,
}

async fn ledger_with_user() -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let ledger = Ledger::builder().database(db).build().await.unwrap();

    let user_id = ledger.create_user("Lucía", Currency::Ars).await.unwrap();
    let cash = ledger
        .create_account(
            NewAccount::new(user_id, "Efectivo", Currency::Ars)
                .initial_balance(Money::from_major(10_000)),
        )
        .await
        .unwrap();
    let bank = ledger
        .create_account(
            NewAccount::new(user_id, "Banco Galicia", Currency::Ars)
                .initial_balance(Money::from_major(100_000)),
        )
        .await
        .unwrap();
    let card = ledger
        .create_account(NewAccount::new(user_id, "Visa Galicia", Currency::Ars).credit_card(25))
        .await
        .unwrap();
    let food = ledger
        .create_category(NewCategory::new(user_id, "Comida", CategoryKind::Expense))
        .await
        .unwrap();
    let salary = ledger
        .create_category(NewCategory::new(user_id, "Sueldo", CategoryKind::Income))
        .await
        .unwrap();

    Fixture {
        ledger,
        user_id,
        cash,
        bank,
        card,
        food,
        salary,
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn conversation(user_id: Uuid) -> StoredConversation {
    let now = Utc::now();
    StoredConversation {
        platform: "telegram".to_string(),
        platform_user_id: "42".to_string(),
        user_id,
        state: "awaiting_confirmation".to_string(),
        intent: "REGISTRAR_GASTO".to_string(),
        entities: serde_json::json!({"amount": 50000}),
        edit_field: None,
        options: None,
        version: 0,
        created_at: now,
        expires_at: now + Duration::minutes(10),
    }
}

#[tokio::test]
async fn balances_follow_movements_and_transfers() {
    let fx = ledger_with_user().await;
    let date = day(2026, 10, 1);

    fx.ledger
        .insert_movement(NewMovement::new(
            fx.user_id,
            MovementKind::Expense,
            date,
            Money::from_major(500),
            fx.cash,
            fx.food,
        ))
        .await
        .unwrap();
    fx.ledger
        .insert_movement(NewMovement::new(
            fx.user_id,
            MovementKind::Income,
            date,
            Money::from_major(2_000),
            fx.bank,
            fx.salary,
        ))
        .await
        .unwrap();
    fx.ledger
        .insert_transfer(NewTransfer::new(
            fx.user_id,
            fx.bank,
            fx.cash,
            Money::from_major(1_000),
            date,
        ))
        .await
        .unwrap();

    assert_eq!(
        fx.ledger.account_balance(fx.user_id, fx.cash).await.unwrap(),
        Money::from_major(10_000 - 500 + 1_000)
    );
    assert_eq!(
        fx.ledger.account_balance(fx.user_id, fx.bank).await.unwrap(),
        Money::from_major(100_000 + 2_000 - 1_000)
    );

    let context = fx.ledger.user_context(fx.user_id).await.unwrap();
    let cash = context.account(fx.cash).unwrap();
    assert_eq!(cash.balance, Money::from_major(10_500));
    assert_eq!(context.credit_cards().count(), 1);
    assert_eq!(context.categories_of(CategoryKind::Expense).count(), 1);
}

#[tokio::test]
async fn movement_rejects_category_of_wrong_kind() {
    let fx = ledger_with_user().await;

    let err = fx
        .ledger
        .insert_movement(NewMovement::new(
            fx.user_id,
            MovementKind::Expense,
            day(2026, 10, 1),
            Money::from_major(10),
            fx.cash,
            fx.salary,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidData(_)));
}

#[tokio::test]
async fn movement_rejects_non_positive_amount() {
    let fx = ledger_with_user().await;

    let err = fx
        .ledger
        .insert_movement(NewMovement::new(
            fx.user_id,
            MovementKind::Expense,
            day(2026, 10, 1),
            Money::ZERO,
            fx.cash,
            fx.food,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn transfer_to_same_account_fails() {
    let fx = ledger_with_user().await;

    let err = fx
        .ledger
        .insert_transfer(NewTransfer::new(
            fx.user_id,
            fx.cash,
            fx.cash,
            Money::from_major(1),
            day(2026, 10, 1),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::SameAccount);
}

#[tokio::test]
async fn query_movements_filters_and_orders_by_date() {
    let fx = ledger_with_user().await;
    for (d, amount) in [(3, 100), (1, 200), (5, 300)] {
        fx.ledger
            .insert_movement(
                NewMovement::new(
                    fx.user_id,
                    MovementKind::Expense,
                    day(2026, 10, d),
                    Money::from_major(amount),
                    fx.cash,
                    fx.food,
                )
                .note(Some("súper")),
            )
            .await
            .unwrap();
    }

    let all = fx
        .ledger
        .query_movements(&MovementFilter::for_user(fx.user_id).kind(MovementKind::Expense))
        .await
        .unwrap();
    let dates: Vec<_> = all.iter().map(|m| m.date).collect();
    assert_eq!(dates, vec![day(2026, 10, 5), day(2026, 10, 3), day(2026, 10, 1)]);

    let ranged = fx
        .ledger
        .query_movements(
            &MovementFilter::for_user(fx.user_id).range(day(2026, 10, 2), day(2026, 10, 5)),
        )
        .await
        .unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].amount, Money::from_major(100));
    assert_eq!(ranged[0].note.as_deref(), Some("súper"));

    let limited = fx
        .ledger
        .query_movements(&MovementFilter::for_user(fx.user_id).limit(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);

    let err = fx
        .ledger
        .query_movements(
            &MovementFilter::for_user(fx.user_id).range(day(2026, 10, 5), day(2026, 10, 5)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidData(_)));
}

#[tokio::test]
async fn query_transfers_matches_either_side() {
    let fx = ledger_with_user().await;
    fx.ledger
        .insert_transfer(NewTransfer::new(
            fx.user_id,
            fx.bank,
            fx.card,
            Money::from_major(5_000),
            day(2026, 10, 2),
        ))
        .await
        .unwrap();

    for account in [fx.bank, fx.card] {
        let found = fx
            .ledger
            .query_transfers(&TransferFilter::for_user(fx.user_id).account(account))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
    let none = fx
        .ledger
        .query_transfers(&TransferFilter::for_user(fx.user_id).account(fx.cash))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn deleting_installment_purchase_removes_its_movements() {
    let fx = ledger_with_user().await;
    let purchase_id = fx
        .ledger
        .insert_installment_purchase(NewInstallmentPurchase {
            user_id: fx.user_id,
            account_id: fx.card,
            category_id: fx.food,
            total: Money::from_major(3_000),
            installments: 3,
            purchase_date: day(2026, 10, 1),
            first_installment_date: day(2026, 11, 1),
            note: None,
        })
        .await
        .unwrap();
    for n in 1..=2 {
        fx.ledger
            .insert_movement(
                NewMovement::new(
                    fx.user_id,
                    MovementKind::Expense,
                    day(2026, 10 + n, 1),
                    Money::from_major(1_000),
                    fx.card,
                    fx.food,
                )
                .installment_of(purchase_id, n),
            )
            .await
            .unwrap();
    }

    fx.ledger
        .delete_installment_purchase(fx.user_id, purchase_id)
        .await
        .unwrap();

    let left = fx
        .ledger
        .query_movements(&MovementFilter::for_user(fx.user_id).account(fx.card))
        .await
        .unwrap();
    assert!(left.is_empty());

    let err = fx
        .ledger
        .delete_installment_purchase(fx.user_id, purchase_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::KeyNotFound(_)));
}

#[tokio::test]
async fn installment_purchase_validates_count() {
    let fx = ledger_with_user().await;
    let err = fx
        .ledger
        .insert_installment_purchase(NewInstallmentPurchase {
            user_id: fx.user_id,
            account_id: fx.card,
            category_id: fx.food,
            total: Money::from_major(3_000),
            installments: 0,
            purchase_date: day(2026, 10, 1),
            first_installment_date: day(2026, 10, 1),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn duplicate_account_name_is_rejected() {
    let fx = ledger_with_user().await;
    let err = fx
        .ledger
        .create_account(NewAccount::new(fx.user_id, "Efectivo", Currency::Ars))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::ExistingKey("Efectivo".to_string()));
}

#[tokio::test]
async fn platform_user_link_resolves() {
    let fx = ledger_with_user().await;
    assert!(
        fx.ledger
            .platform_user("telegram", "42")
            .await
            .unwrap()
            .is_none()
    );

    fx.ledger
        .link_platform_user("telegram", "42", fx.user_id, true)
        .await
        .unwrap();
    let linked = fx.ledger.platform_user("telegram", "42").await.unwrap().unwrap();
    assert_eq!(linked.user_id, fx.user_id);
    assert!(linked.verified);
}

#[tokio::test]
async fn conversation_save_is_compare_and_swap() {
    let fx = ledger_with_user().await;
    let mut record = conversation(fx.user_id);

    let version = fx.ledger.save_conversation(&record).await.unwrap();
    assert_eq!(version, 1);

    // A second "fresh" insert races with the first one and loses.
    let err = fx.ledger.save_conversation(&record).await.unwrap_err();
    assert!(matches!(err, LedgerError::VersionConflict(_)));

    record.version = version;
    record.state = "awaiting_edit_field".to_string();
    let version = fx.ledger.save_conversation(&record).await.unwrap();
    assert_eq!(version, 2);

    // Stale writer still holds version 1.
    record.version = 1;
    let err = fx.ledger.save_conversation(&record).await.unwrap_err();
    assert!(matches!(err, LedgerError::VersionConflict(_)));

    let loaded = fx
        .ledger
        .load_conversation("telegram", "42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.version, 2);
    assert_eq!(loaded.state, "awaiting_edit_field");
    assert_eq!(loaded.entities, serde_json::json!({"amount": 50000}));

    assert!(fx.ledger.delete_conversation("telegram", "42").await.unwrap());
    assert!(!fx.ledger.delete_conversation("telegram", "42").await.unwrap());
}

#[tokio::test]
async fn sweep_removes_only_expired_conversations() {
    let fx = ledger_with_user().await;
    let now = Utc::now();

    let mut expired = conversation(fx.user_id);
    expired.platform_user_id = "1".to_string();
    expired.expires_at = now - Duration::minutes(1);
    fx.ledger.save_conversation(&expired).await.unwrap();

    let live = conversation(fx.user_id);
    fx.ledger.save_conversation(&live).await.unwrap();

    assert_eq!(fx.ledger.sweep_expired_conversations(now).await.unwrap(), 1);
    assert!(fx.ledger.load_conversation("telegram", "1").await.unwrap().is_none());
    assert!(fx.ledger.load_conversation("telegram", "42").await.unwrap().is_some());
}
