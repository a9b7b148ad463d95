//! Live Chat Session Handler
//!
//! One task per open WebSocket connection. The task owns the read side of
//! the socket and processes its frames strictly in order; a spawned writer
//! task drains the session's outbound channel onto the socket, which is how
//! other sessions (and the typing-expiry timer) reach this connection.
//!
//! Lifecycle: on upgrade the connection is checked against the conversation
//! (the upstream gateway authenticated the user, but only true participants
//! may join), registered in the presence registry, announced with
//! `user_online`, and confirmed with `connection_established`. Frames are
//! then handled until the client disconnects, errors, or stays silent past
//! the idle timeout; teardown always deregisters and, while peers remain,
//! announces `user_offline`.
//!
//! A malformed or failing frame answers with an `error` frame and keeps the
//! connection open; only transport-level events end the session.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::chat::db;
use crate::backend::server::state::AppState;
use crate::shared::chat::{epoch_millis, InboundFrame, MessageKind, OutboundFrame};

/// RFC 6455 policy-violation close code
const POLICY_VIOLATION: u16 = 1008;

/// Query parameters of the connection URL
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "chatId")]
    pub chat_id: Option<Uuid>,
}

/// Handle the WebSocket upgrade (GET /ws)
pub async fn handle_chat_upgrade(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(state, params, socket))
}

async fn close_policy_violation(mut socket: WebSocket, reason: &'static str) {
    let frame = CloseFrame {
        code: POLICY_VIOLATION,
        reason: reason.into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("[Session] Failed to send close frame: {:?}", e);
    }
}

/// Drive one connection from registration to teardown
async fn run_session(state: AppState, params: ConnectParams, socket: WebSocket) {
    let (user_id, conversation_id) = match (params.user_id, params.chat_id) {
        (Some(user_id), Some(chat_id)) => (user_id, chat_id),
        _ => {
            close_policy_violation(socket, "Missing userId or chatId").await;
            return;
        }
    };

    // Only true participants may register presence or mutate chat state
    match db::get_conversation(&state.pool, conversation_id).await {
        Ok(Some(conversation)) if conversation.has_participant(user_id) => {}
        Ok(_) => {
            close_policy_violation(socket, "Not a participant of this chat").await;
            return;
        }
        Err(e) => {
            tracing::error!("[Session] Failed to load chat {}: {:?}", conversation_id, e);
            close_policy_violation(socket, "Chat lookup failed").await;
            return;
        }
    }

    tracing::info!(
        "[Session] New connection: user={} chat={}",
        user_id,
        conversation_id
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundFrame>();

    // Writer task: everything addressed to this connection funnels through
    // the channel, so the socket sink has a single owner
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx
                .send(Message::Text(frame.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    state.presence.register(conversation_id, user_id, tx.clone());
    state.presence.broadcast(
        conversation_id,
        OutboundFrame::UserOnline {
            user_id,
            timestamp: epoch_millis(),
        },
        Some(user_id),
    );

    let session = Session {
        state: state.clone(),
        conversation_id,
        user_id,
        tx,
    };
    session.send(OutboundFrame::ConnectionEstablished {
        timestamp: epoch_millis(),
    });

    loop {
        match tokio::time::timeout(state.config.idle_timeout, ws_rx.next()).await {
            Err(_) => {
                tracing::info!(
                    "[Session] Closing idle connection: user={} chat={}",
                    user_id,
                    conversation_id
                );
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::warn!(
                    "[Session] Socket error for user {} in chat {}: {:?}",
                    user_id,
                    conversation_id,
                    e
                );
                break;
            }
            Ok(Some(Ok(Message::Text(text)))) => {
                // Any frame counts as liveness
                state.presence.touch_last_seen(conversation_id, user_id);
                session.handle_text(&text).await;
            }
            Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Ok(_))) => {} // ping/pong/binary: transport noise
        }
    }

    let (was_typing, peers_remain) = state.presence.deregister(conversation_id, user_id);
    if was_typing {
        state.presence.broadcast(
            conversation_id,
            OutboundFrame::UserTypingStop {
                user_id,
                timestamp: epoch_millis(),
            },
            Some(user_id),
        );
    }
    if peers_remain {
        state.presence.broadcast(
            conversation_id,
            OutboundFrame::UserOffline {
                user_id,
                timestamp: epoch_millis(),
            },
            Some(user_id),
        );
    }

    writer.abort();
    tracing::info!(
        "[Session] Connection closed: user={} chat={}",
        user_id,
        conversation_id
    );
}

/// Per-connection context shared by the frame handlers
struct Session {
    state: AppState,
    conversation_id: Uuid,
    user_id: Uuid,
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl Session {
    /// Queue a frame for this connection
    fn send(&self, frame: OutboundFrame) {
        if self.tx.send(frame).is_err() {
            tracing::debug!(
                "[Session] Writer gone for user {} in chat {}",
                self.user_id,
                self.conversation_id
            );
        }
    }

    async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => self.dispatch(frame).await,
            Err(e) => {
                tracing::warn!(
                    "[Session] Malformed frame from user {}: {:?}",
                    self.user_id,
                    e
                );
                self.send(OutboundFrame::error(format!(
                    "Failed to process message: {e}"
                )));
            }
        }
    }

    async fn dispatch(&self, frame: InboundFrame) {
        match frame {
            InboundFrame::Message {
                message,
                recipient_id,
                message_type,
            } => self.handle_message(message, recipient_id, message_type).await,
            InboundFrame::TypingStart => self.handle_typing_start(),
            InboundFrame::TypingStop => self.handle_typing_stop(),
            InboundFrame::MessageRead { message_id } => self.handle_message_read(message_id).await,
            InboundFrame::TranslateMessage {
                message_id,
                target_language,
            } => self.handle_translate_message(message_id, target_language).await,
            InboundFrame::Heartbeat => self.send(OutboundFrame::HeartbeatAck {
                timestamp: epoch_millis(),
            }),
            InboundFrame::Unknown => {
                tracing::debug!("[Session] Unknown frame type from user {}", self.user_id);
            }
        }
    }

    /// Persist, ack the sender, then hand off to the recipient's live
    /// connection or to push dispatch
    async fn handle_message(&self, body: String, recipient_id: Uuid, kind: MessageKind) {
        if body.is_empty() {
            self.send(OutboundFrame::error(
                "Message blocked by server - missing required fields",
            ));
            return;
        }

        let stored = match db::append_message(
            &self.state.pool,
            self.conversation_id,
            self.user_id,
            kind,
            &body,
        )
        .await
        {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("[Session] Database save error: {:?}", e);
                self.send(OutboundFrame::error("Failed to save message"));
                return;
            }
        };

        // The sender now has durable-storage confirmation; everything past
        // this point is advisory
        self.send(OutboundFrame::MessageSent {
            message_id: stored.id,
            is_sent: true,
            message: stored.body.clone(),
            message_type: stored.kind,
            at: stored.sent_at,
            delivery_status: stored.delivery_status,
            timestamp: epoch_millis(),
        });

        let delivered = self.state.presence.send_to(
            self.conversation_id,
            recipient_id,
            OutboundFrame::MessageReceived {
                message_id: stored.id,
                is_sent: false,
                message: stored.body.clone(),
                message_type: stored.kind,
                at: stored.sent_at,
                sender_id: self.user_id,
                timestamp: epoch_millis(),
            },
        );

        if delivered {
            if let Err(e) = db::mark_delivered(
                &self.state.pool,
                self.conversation_id,
                stored.id,
                recipient_id,
            )
            .await
            {
                tracing::error!("[Session] Error updating delivery status: {:?}", e);
            }
            self.send(OutboundFrame::MessageDelivered {
                message_id: stored.id,
                delivered_to: recipient_id,
                timestamp: epoch_millis(),
            });
        } else {
            tracing::debug!(
                "[Session] Recipient {} offline, dispatching push notification",
                recipient_id
            );
            self.state.notifier.dispatch_chat_push(
                recipient_id,
                self.conversation_id,
                kind,
                body,
            );
        }
    }

    fn handle_typing_start(&self) {
        if self
            .state
            .presence
            .start_typing(self.conversation_id, self.user_id)
        {
            self.state.presence.broadcast(
                self.conversation_id,
                OutboundFrame::UserTypingStart {
                    user_id: self.user_id,
                    timestamp: epoch_millis(),
                },
                Some(self.user_id),
            );
        }
    }

    fn handle_typing_stop(&self) {
        // Transition-guarded: a stop after the expiry timer already fired
        // broadcasts nothing
        if self
            .state
            .presence
            .stop_typing(self.conversation_id, self.user_id)
        {
            self.state.presence.broadcast(
                self.conversation_id,
                OutboundFrame::UserTypingStop {
                    user_id: self.user_id,
                    timestamp: epoch_millis(),
                },
                Some(self.user_id),
            );
        }
    }

    /// Persist the read mark; push a receipt to the sender when they are
    /// connected, drop it otherwise (the readBy set stays authoritative)
    async fn handle_message_read(&self, message_id: Uuid) {
        let marked = match db::mark_read(
            &self.state.pool,
            self.conversation_id,
            message_id,
            self.user_id,
        )
        .await
        {
            Ok(marked) => marked,
            Err(e) => {
                tracing::error!("[Session] Error handling message read: {:?}", e);
                return;
            }
        };

        if !marked {
            // Already read, own message, or unknown id: nothing to announce
            return;
        }

        match db::get_message(&self.state.pool, self.conversation_id, message_id).await {
            Ok(Some(message)) if message.sender_id != self.user_id => {
                let pushed = self.state.presence.send_to(
                    self.conversation_id,
                    message.sender_id,
                    OutboundFrame::MessageRead {
                        message_id,
                        read_by: self.user_id,
                        timestamp: epoch_millis(),
                    },
                );
                if !pushed {
                    tracing::debug!(
                        "[Session] Sender {} offline, read receipt dropped",
                        message.sender_id
                    );
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("[Session] Error loading message for receipt: {:?}", e);
            }
        }
    }

    /// Look the message up and round-trip the translation collaborator; any
    /// failure is an error frame, the connection stays open
    async fn handle_translate_message(&self, message_id: Uuid, target_language: String) {
        let message =
            match db::get_message(&self.state.pool, self.conversation_id, message_id).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    self.send(OutboundFrame::error("Message not found"));
                    return;
                }
                Err(e) => {
                    tracing::error!("[Session] Error loading message to translate: {:?}", e);
                    self.send(OutboundFrame::error("Failed to load message"));
                    return;
                }
            };

        match self
            .state
            .translator
            .translate(&message.body, &target_language)
            .await
        {
            Ok(translated_text) => self.send(OutboundFrame::MessageTranslated {
                message_id,
                original_text: message.body,
                translated_text,
                target_language,
                timestamp: epoch_millis(),
            }),
            Err(e) => {
                tracing::error!("[Session] Translation error: {:?}", e);
                self.send(OutboundFrame::error(e.message()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_params_parse() {
        let user_id = Uuid::new_v4();
        let chat_id = Uuid::new_v4();
        let params: ConnectParams = serde_json::from_str(&format!(
            r#"{{"userId":"{user_id}","chatId":"{chat_id}"}}"#
        ))
        .unwrap();
        assert_eq!(params.user_id, Some(user_id));
        assert_eq!(params.chat_id, Some(chat_id));
    }

    #[test]
    fn test_connect_params_tolerate_missing() {
        let params: ConnectParams = serde_json::from_str("{}").unwrap();
        assert!(params.user_id.is_none());
        assert!(params.chat_id.is_none());
    }
}
