//! Chat HTTP Handlers
//!
//! The companion REST surface over the same store the live protocol uses:
//! create-or-find a conversation, list the caller's chat list, fetch history
//! (marking unread messages from the other participant as read), soft-delete
//! a conversation, and translate a stored message.
//!
//! The upstream gateway authenticates requests and forwards the caller's
//! identity in the `x-user-id` header; handlers validate its shape and check
//! participation before touching state.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::backend::chat::{db, directory};
use crate::backend::error::ChatError;
use crate::backend::server::state::AppState;
use crate::shared::chat::{
    Conversation, ConversationSummary, CreateConversationRequest, CreateConversationResponse,
    ListConversationsResponse, ListMessagesResponse, MessageView, TranslateMessageRequest,
    TranslateMessageResponse,
};

/// Extract the gateway-verified caller identity from headers
fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, ChatError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ChatError::validation("User ID is required"))?;

    Uuid::parse_str(raw).map_err(|_| ChatError::validation("Invalid user ID"))
}

/// Load a conversation the caller participates in.
///
/// Non-participants get the same `NotFound` as a missing conversation, so
/// probing for foreign conversation ids reveals nothing.
async fn load_for_participant(
    state: &AppState,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, ChatError> {
    let conversation = db::get_conversation(&state.pool, conversation_id)
        .await?
        .ok_or_else(|| ChatError::not_found("Chat"))?;

    if !conversation.has_participant(user_id) {
        return Err(ChatError::not_found("Chat"));
    }

    Ok(conversation)
}

/// Whether the counterpart should be resolved as a plain user.
///
/// Conversations are opened by the plain user towards a provider, so the
/// initiator side resolves through the user profile and the other side
/// through the cause's provider profile.
fn counterpart_is_plain_user(conversation: &Conversation, counterpart_id: Uuid) -> bool {
    conversation.initiator_id == counterpart_id
}

/// Create or find the conversation with a counterpart (POST /conversations)
pub async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<CreateConversationResponse>, ChatError> {
    let user_id = extract_user_id(&headers)?;

    if user_id == request.id {
        return Err(ChatError::validation("You cannot chat with yourself"));
    }

    let conversation =
        db::find_or_create(&state.pool, user_id, request.id, request.cause).await?;

    let counterpart_id = conversation.other_participant(user_id);
    let profile = directory::get_participant_info(
        &state.pool,
        conversation.cause,
        counterpart_is_plain_user(&conversation, counterpart_id),
        counterpart_id,
    )
    .await;

    Ok(Json(CreateConversationResponse {
        conversation_id: conversation.id,
        name: profile.name,
        image: profile.image,
        number: profile.number,
        counterpart_profile_id: profile.profile_id,
        counterpart_user_id: profile.user_id,
    }))
}

/// The caller's chat list, most recently active first (GET /conversations)
pub async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListConversationsResponse>, ChatError> {
    let user_id = extract_user_id(&headers)?;

    let conversations = db::list_for_user(&state.pool, user_id).await?;

    let mut summaries = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let counterpart_id = conversation.other_participant(user_id);

        let profile = directory::get_participant_info(
            &state.pool,
            conversation.cause,
            counterpart_is_plain_user(&conversation, counterpart_id),
            counterpart_id,
        )
        .await;

        let last_message = db::last_message(&state.pool, conversation.id).await?;
        let unread_count = db::unread_count(&state.pool, conversation.id, user_id).await?;
        let presence = state.presence.snapshot(conversation.id, counterpart_id);

        summaries.push(ConversationSummary {
            conversation_id: conversation.id,
            name: profile.name,
            image: profile.image,
            counterpart_user_id: profile.user_id,
            counterpart_profile_id: profile.profile_id,
            timestamp: last_message
                .map(|m| m.sent_at)
                .unwrap_or(conversation.updated_at),
            cause: conversation.cause,
            unread_count,
            is_online: presence.is_online,
            last_seen: presence.last_seen,
            is_typing: presence.is_typing,
        });
    }

    Ok(Json(ListConversationsResponse {
        conversations: summaries,
    }))
}

/// Conversation history (GET /conversations/{conversation_id})
///
/// As a side effect every message from the other participant the caller has
/// not read yet is marked read. The returned rows show the state as fetched,
/// before that mark lands.
pub async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ListMessagesResponse>, ChatError> {
    let user_id = extract_user_id(&headers)?;
    load_for_participant(&state, conversation_id, user_id).await?;

    let messages = db::get_messages(&state.pool, conversation_id).await?;
    let views = messages
        .iter()
        .map(|message| MessageView::for_user(message, user_id))
        .collect();

    let marked = db::mark_all_read(&state.pool, conversation_id, user_id).await?;
    if marked > 0 {
        tracing::debug!(
            "[Chat] Marked {} messages read for user {} in chat {}",
            marked,
            user_id,
            conversation_id
        );
    }

    Ok(Json(ListMessagesResponse { messages: views }))
}

/// Hide a conversation from the caller's list (DELETE /conversations/{conversation_id})
pub async fn delete_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, ChatError> {
    let user_id = extract_user_id(&headers)?;
    load_for_participant(&state, conversation_id, user_id).await?;

    db::soft_delete(&state.pool, conversation_id, user_id).await?;

    Ok(StatusCode::OK)
}

/// Translate a stored message (POST /translate-message)
///
/// Unlike the live-frame path, a collaborator failure here falls back to the
/// original text; only a missing translator configuration is an error.
pub async fn translate_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TranslateMessageRequest>,
) -> Result<Json<TranslateMessageResponse>, ChatError> {
    let user_id = extract_user_id(&headers)?;
    load_for_participant(&state, request.conversation_id, user_id).await?;

    let message = db::get_message(&state.pool, request.conversation_id, request.message_id)
        .await?
        .ok_or_else(|| ChatError::not_found("Message"))?;

    if !state.translator.is_configured() {
        return Err(ChatError::upstream("Translation service not configured"));
    }

    let translated_text = match state
        .translator
        .translate(&message.body, &request.target_language)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("[Chat] Translation failed, returning original text: {:?}", e);
            message.body.clone()
        }
    };

    Ok(Json(TranslateMessageResponse {
        message_id: message.id,
        original_text: message.body,
        translated_text,
        target_language: request.target_language,
    }))
}
