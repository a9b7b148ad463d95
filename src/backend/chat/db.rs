//! Database operations for conversations and their message logs
//!
//! This is the single source of truth. Concurrent appends to one
//! conversation serialize at the storage layer (each message insert is one
//! atomic statement ordered by the `seq` sequence), and concurrent
//! find-or-create races are decided by the unique pair+cause index, so the
//! same guarantees hold with several server processes running.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::backend::error::ChatError;
use crate::shared::chat::{Cause, ChatMessage, Conversation, DeliveryStatus, MessageKind};

fn conversation_from_row(row: &sqlx::postgres::PgRow) -> Conversation {
    Conversation {
        id: row.get("id"),
        initiator_id: row.get("initiator_id"),
        counterpart_id: row.get("counterpart_id"),
        cause: Cause::from_db_str(row.get::<String, _>("cause").as_str()).unwrap_or(Cause::Driver),
        deleted_for: row.get("deleted_for"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn message_from_row(row: &sqlx::postgres::PgRow) -> ChatMessage {
    ChatMessage {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        kind: MessageKind::from_db_str(row.get::<String, _>("kind").as_str())
            .unwrap_or(MessageKind::Text),
        body: row.get("body"),
        sent_at: row.get("sent_at"),
        delivery_status: DeliveryStatus::from_db_str(
            row.get::<String, _>("delivery_status").as_str(),
        )
        .unwrap_or(DeliveryStatus::Sent),
        read_by: row.get("read_by"),
        delivered_to: row.get("delivered_to"),
    }
}

const CONVERSATION_COLUMNS: &str =
    "id, initiator_id, counterpart_id, cause, deleted_for, created_at, updated_at";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, kind, body, sent_at, delivery_status, read_by, delivered_to";

/// Find the conversation for a participant pair + cause, ignoring direction
async fn find_for_pair(
    pool: &PgPool,
    user_a: Uuid,
    user_b: Uuid,
    cause: Cause,
) -> Result<Option<Conversation>, ChatError> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {CONVERSATION_COLUMNS}
        FROM conversations
        WHERE cause = $3
          AND ((initiator_id = $1 AND counterpart_id = $2)
            OR (initiator_id = $2 AND counterpart_id = $1))
        "#
    ))
    .bind(user_a)
    .bind(user_b)
    .bind(cause.as_db_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| conversation_from_row(&r)))
}

/// Find or create the unique conversation between two users for a cause.
///
/// Safe to call concurrently from several processes: the loser of an insert
/// race hits the pair+cause unique index and picks up the winner's row. If
/// the caller had previously soft-deleted the conversation it is un-hidden
/// for them rather than duplicated.
pub async fn find_or_create(
    pool: &PgPool,
    user_id: Uuid,
    counterpart_id: Uuid,
    cause: Cause,
) -> Result<Conversation, ChatError> {
    if let Some(conversation) = find_for_pair(pool, user_id, counterpart_id, cause).await? {
        return unhide_for(pool, conversation, user_id).await;
    }

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO conversations (id, initiator_id, counterpart_id, cause)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        RETURNING {CONVERSATION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(counterpart_id)
    .bind(cause.as_db_str())
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        return Ok(conversation_from_row(&row));
    }

    // A concurrent create won the race on the unique index
    let conversation = find_for_pair(pool, user_id, counterpart_id, cause)
        .await?
        .ok_or_else(|| ChatError::not_found("Chat"))?;
    unhide_for(pool, conversation, user_id).await
}

/// Remove `user_id` from the conversation's tombstone set if present
async fn unhide_for(
    pool: &PgPool,
    mut conversation: Conversation,
    user_id: Uuid,
) -> Result<Conversation, ChatError> {
    if conversation.deleted_for.contains(&user_id) {
        sqlx::query(
            r#"
            UPDATE conversations SET deleted_for = array_remove(deleted_for, $2) WHERE id = $1
            "#,
        )
        .bind(conversation.id)
        .bind(user_id)
        .execute(pool)
        .await?;
        conversation.deleted_for.retain(|id| *id != user_id);
    }
    Ok(conversation)
}

/// Get a conversation by id
pub async fn get_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Option<Conversation>, ChatError> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1
        "#
    ))
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| conversation_from_row(&r)))
}

/// All conversations `user_id` participates in and has not hidden,
/// most recently active first
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Conversation>, ChatError> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {CONVERSATION_COLUMNS}
        FROM conversations
        WHERE (initiator_id = $1 OR counterpart_id = $1)
          AND NOT ($1 = ANY(deleted_for))
        ORDER BY updated_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(conversation_from_row).collect())
}

/// Append a message to a conversation's log and bump its activity time.
///
/// Returns the stored message with its server-assigned id and timestamp.
/// Fails with `NotFound` if the conversation does not exist.
pub async fn append_message(
    pool: &PgPool,
    conversation_id: Uuid,
    sender_id: Uuid,
    kind: MessageKind,
    body: &str,
) -> Result<ChatMessage, ChatError> {
    let id = Uuid::new_v4();

    let row = sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, kind, body)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING sent_at
        "#,
    )
    .bind(id)
    .bind(conversation_id)
    .bind(sender_id)
    .bind(kind.as_db_str())
    .bind(body)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
        {
            ChatError::not_found("Chat")
        }
        _ => ChatError::from(e),
    })?;

    let sent_at: chrono::DateTime<chrono::Utc> = row.get("sent_at");

    sqlx::query(
        r#"
        UPDATE conversations SET updated_at = $2 WHERE id = $1
        "#,
    )
    .bind(conversation_id)
    .bind(sent_at)
    .execute(pool)
    .await?;

    Ok(ChatMessage {
        id,
        conversation_id,
        sender_id,
        kind,
        body: body.to_string(),
        sent_at,
        delivery_status: DeliveryStatus::Sent,
        read_by: Vec::new(),
        delivered_to: Vec::new(),
    })
}

/// Full ordered history of a conversation
pub async fn get_messages(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<ChatMessage>, ChatError> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE conversation_id = $1
        ORDER BY seq ASC
        "#
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(message_from_row).collect())
}

/// Get a single message of a conversation
pub async fn get_message(
    pool: &PgPool,
    conversation_id: Uuid,
    message_id: Uuid,
) -> Result<Option<ChatMessage>, ChatError> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE conversation_id = $1 AND id = $2
        "#
    ))
    .bind(conversation_id)
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| message_from_row(&r)))
}

/// The most recent message of a conversation, if any
pub async fn last_message(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Option<ChatMessage>, ChatError> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE conversation_id = $1
        ORDER BY seq DESC
        LIMIT 1
        "#
    ))
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| message_from_row(&r)))
}

/// Messages from the other participant the user has not read yet
pub async fn unread_count(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<u32, ChatError> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count
        FROM messages
        WHERE conversation_id = $1
          AND sender_id <> $2
          AND NOT ($2 = ANY(read_by))
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count") as u32)
}

/// Mark every message from the other participant that `user_id` has not read
/// yet as read by them. Idempotent; read state never shrinks.
pub async fn mark_all_read(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<u64, ChatError> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET read_by = array_append(read_by, $2),
            delivery_status = 'read'
        WHERE conversation_id = $1
          AND sender_id <> $2
          AND NOT ($2 = ANY(read_by))
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Mark one message as read by `user_id`. Idempotent; a repeat call or the
/// sender marking their own message is a no-op.
pub async fn mark_read(
    pool: &PgPool,
    conversation_id: Uuid,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<bool, ChatError> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET read_by = array_append(read_by, $3),
            delivery_status = 'read'
        WHERE conversation_id = $1
          AND id = $2
          AND sender_id <> $3
          AND NOT ($3 = ANY(read_by))
        "#,
    )
    .bind(conversation_id)
    .bind(message_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record delivery of a message to `user_id`. The message-level status only
/// advances (`sent` -> `delivered`), never regresses from `read`.
pub async fn mark_delivered(
    pool: &PgPool,
    conversation_id: Uuid,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<(), ChatError> {
    sqlx::query(
        r#"
        UPDATE messages
        SET delivered_to = CASE
                WHEN $3 = ANY(delivered_to) THEN delivered_to
                ELSE array_append(delivered_to, $3)
            END,
            delivery_status = CASE
                WHEN delivery_status = 'sent' THEN 'delivered'
                ELSE delivery_status
            END
        WHERE conversation_id = $1 AND id = $2
        "#,
    )
    .bind(conversation_id)
    .bind(message_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Hide a conversation from `user_id`'s list. The other participant's view
/// and the message log are untouched. A second call is a conflict.
pub async fn soft_delete(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<(), ChatError> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET deleted_for = array_append(deleted_for, $2)
        WHERE id = $1 AND NOT ($2 = ANY(deleted_for))
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return match get_conversation(pool, conversation_id).await? {
            Some(_) => Err(ChatError::conflict("Chat already deleted for this user")),
            None => Err(ChatError::not_found("Chat")),
        };
    }

    Ok(())
}
