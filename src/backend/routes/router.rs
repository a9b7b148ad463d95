/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Details
 *
 * ## Conversations
 *
 * - `POST /conversations` - create or find a conversation with a counterpart
 * - `GET /conversations` - the caller's chat list
 * - `GET /conversations/{conversation_id}` - history (marks unread as read)
 * - `DELETE /conversations/{conversation_id}` - soft-delete for the caller
 *
 * ## Messages
 *
 * - `POST /translate-message` - request/response translation of a message
 *
 * ## Live protocol
 *
 * - `GET /ws?userId=..&chatId=..` - WebSocket upgrade into a chat session
 */

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::chat::handlers::{
    create_conversation, delete_conversation, get_messages, list_conversations,
    translate_message,
};
use crate::backend::realtime::session::handle_chat_upgrade;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route(
            "/conversations",
            axum::routing::post(create_conversation).get(list_conversations),
        )
        .route(
            "/conversations/{conversation_id}",
            axum::routing::get(get_messages).delete(delete_conversation),
        )
        .route("/translate-message", axum::routing::post(translate_message))
        .route("/ws", axum::routing::get(handle_chat_upgrade))
        .route("/", axum::routing::get(|| async { "Sawari Chat Service" }))
        .fallback(|| async { "404 Not Found" })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
