//! Conversation store integration tests
//!
//! Exercise find-or-create uniqueness, ordered append, monotonic delivery
//! bookkeeping, and soft deletion against a real PostgreSQL. Each test uses
//! fresh user ids, so reruns and parallel tests never collide on the
//! pair+cause unique index.

#[macro_use]
mod common;

use pretty_assertions::assert_eq;
use uuid::Uuid;

use sawari_chat::backend::chat::db;
use sawari_chat::backend::error::ChatError;
use sawari_chat::shared::chat::{Cause, DeliveryStatus, MessageKind};

#[tokio::test]
async fn test_find_or_create_ignores_direction() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let first = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    let second = db::find_or_create(pool, driver, rider, Cause::Driver)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.initiator_id, rider);
    assert_eq!(first.counterpart_id, driver);
}

#[tokio::test]
async fn test_same_pair_different_cause_is_a_new_conversation() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let other = Uuid::new_v4();

    let as_driver = db::find_or_create(pool, rider, other, Cause::Driver)
        .await
        .unwrap();
    let as_transporter = db::find_or_create(pool, rider, other, Cause::Transporter)
        .await
        .unwrap();

    assert_ne!(as_driver.id, as_transporter.id);
}

#[tokio::test]
async fn test_concurrent_creates_yield_one_conversation() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let (a, b) = tokio::join!(
        db::find_or_create(pool, rider, driver, Cause::Rickshaw),
        db::find_or_create(pool, driver, rider, Cause::Rickshaw),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.id, b.id);

    // And the row really is unique
    let again = db::find_or_create(pool, rider, driver, Cause::Rickshaw)
        .await
        .unwrap();
    assert_eq!(again.id, a.id);
}

#[tokio::test]
async fn test_append_preserves_order_and_bumps_activity() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();

    for body in ["one", "two", "three"] {
        db::append_message(pool, conversation.id, rider, MessageKind::Text, body)
            .await
            .unwrap();
    }

    let history = db::get_messages(pool, conversation.id).await.unwrap();
    let bodies: Vec<&str> = history.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
    assert!(history
        .iter()
        .all(|m| m.delivery_status == DeliveryStatus::Sent));

    let refreshed = db::get_conversation(pool, conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.updated_at >= conversation.updated_at);
}

#[tokio::test]
async fn test_append_to_missing_conversation_is_not_found() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;

    let result = db::append_message(
        pool,
        Uuid::new_v4(),
        Uuid::new_v4(),
        MessageKind::Text,
        "hello?",
    )
    .await;

    assert!(matches!(result, Err(ChatError::NotFound { .. })));
}

#[tokio::test]
async fn test_delivery_status_is_monotonic() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    let message = db::append_message(pool, conversation.id, rider, MessageKind::Text, "salaam")
        .await
        .unwrap();

    db::mark_delivered(pool, conversation.id, message.id, driver)
        .await
        .unwrap();
    let stored = db::get_message(pool, conversation.id, message.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(stored.delivered_to, vec![driver]);

    let marked = db::mark_read(pool, conversation.id, message.id, driver)
        .await
        .unwrap();
    assert!(marked);

    // A late delivery confirmation must not regress the read status
    db::mark_delivered(pool, conversation.id, message.id, driver)
        .await
        .unwrap();
    let stored = db::get_message(pool, conversation.id, message.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.delivery_status, DeliveryStatus::Read);
    // And the delivered set did not grow a duplicate
    assert_eq!(stored.delivered_to, vec![driver]);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    let message = db::append_message(pool, conversation.id, rider, MessageKind::Text, "hi")
        .await
        .unwrap();

    assert!(db::mark_read(pool, conversation.id, message.id, driver)
        .await
        .unwrap());
    // Second read is a no-op
    assert!(!db::mark_read(pool, conversation.id, message.id, driver)
        .await
        .unwrap());

    let stored = db::get_message(pool, conversation.id, message.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.read_by, vec![driver]);
}

#[tokio::test]
async fn test_sender_cannot_read_mark_own_message() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    let message = db::append_message(pool, conversation.id, rider, MessageKind::Text, "hi")
        .await
        .unwrap();

    assert!(!db::mark_read(pool, conversation.id, message.id, rider)
        .await
        .unwrap());
    let stored = db::get_message(pool, conversation.id, message.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.read_by.is_empty());
}

#[tokio::test]
async fn test_mark_all_read_targets_only_unread_from_others() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();

    db::append_message(pool, conversation.id, rider, MessageKind::Text, "mine")
        .await
        .unwrap();
    db::append_message(pool, conversation.id, driver, MessageKind::Text, "theirs 1")
        .await
        .unwrap();
    db::append_message(pool, conversation.id, driver, MessageKind::Text, "theirs 2")
        .await
        .unwrap();

    assert_eq!(db::unread_count(pool, conversation.id, rider).await.unwrap(), 2);
    assert_eq!(db::mark_all_read(pool, conversation.id, rider).await.unwrap(), 2);
    assert_eq!(db::unread_count(pool, conversation.id, rider).await.unwrap(), 0);
    // Idempotent: nothing left to mark
    assert_eq!(db::mark_all_read(pool, conversation.id, rider).await.unwrap(), 0);

    // The rider's own message was not touched
    let history = db::get_messages(pool, conversation.id).await.unwrap();
    assert!(history[0].read_by.is_empty());
    assert_eq!(history[1].read_by, vec![rider]);
}

#[tokio::test]
async fn test_soft_delete_hides_for_one_side_only() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();

    db::soft_delete(pool, conversation.id, rider).await.unwrap();

    let rider_list = db::list_for_user(pool, rider).await.unwrap();
    assert!(rider_list.iter().all(|c| c.id != conversation.id));

    let driver_list = db::list_for_user(pool, driver).await.unwrap();
    assert!(driver_list.iter().any(|c| c.id == conversation.id));

    // Second delete by the same user conflicts
    let result = db::soft_delete(pool, conversation.id, rider).await;
    assert!(matches!(result, Err(ChatError::Conflict { .. })));
}

#[tokio::test]
async fn test_soft_delete_missing_conversation_is_not_found() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;

    let result = db::soft_delete(pool, Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(ChatError::NotFound { .. })));
}

#[tokio::test]
async fn test_find_or_create_unhides_soft_deleted_conversation() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();

    let conversation = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    db::soft_delete(pool, conversation.id, rider).await.unwrap();

    // Re-initiating finds the same row and un-hides it for the caller
    let again = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    assert_eq!(again.id, conversation.id);
    assert!(!again.deleted_for.contains(&rider));

    let rider_list = db::list_for_user(pool, rider).await.unwrap();
    assert!(rider_list.iter().any(|c| c.id == conversation.id));
}

#[tokio::test]
async fn test_list_orders_by_recent_activity() {
    let db_fixture = require_test_db!();
    let pool = &db_fixture.pool;
    let rider = Uuid::new_v4();
    let driver = Uuid::new_v4();
    let transporter = Uuid::new_v4();

    let older = db::find_or_create(pool, rider, driver, Cause::Driver)
        .await
        .unwrap();
    let newer = db::find_or_create(pool, rider, transporter, Cause::Transporter)
        .await
        .unwrap();

    // Activity in the older conversation moves it to the front
    db::append_message(pool, older.id, rider, MessageKind::Text, "bump")
        .await
        .unwrap();

    let list = db::list_for_user(pool, rider).await.unwrap();
    let older_pos = list.iter().position(|c| c.id == older.id).unwrap();
    let newer_pos = list.iter().position(|c| c.id == newer.id).unwrap();
    assert!(older_pos < newer_pos);
}
