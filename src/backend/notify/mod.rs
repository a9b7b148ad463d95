//! Push-Notification Dispatch
//!
//! When a message's recipient has no live connection, the notification
//! service takes over and reaches them through their device push channel.
//! From this service's point of view the call is fire-and-forget: the
//! message is already durably stored, so a dispatch failure is logged and
//! dropped, never surfaced to the sender.

use serde::Serialize;
use uuid::Uuid;

use crate::backend::error::ChatError;
use crate::shared::chat::MessageKind;

/// Payload the notification service expects on its push endpoint
#[derive(Debug, Clone, Serialize)]
struct ChatPushPayload<'a> {
    message: &'a str,
    #[serde(rename = "messageType")]
    message_type: MessageKind,
    #[serde(rename = "chatId")]
    chat_id: Uuid,
    /// Recipient user id
    id: Uuid,
}

/// Client for the notification service's push endpoint
#[derive(Clone)]
pub struct NotificationClient {
    http: reqwest::Client,
    base_url: Option<String>,
    service_token: String,
}

impl NotificationClient {
    pub fn new(base_url: Option<String>, service_token: String) -> Self {
        if base_url.is_none() {
            tracing::warn!(
                "[Notify] NOTIFICATION_SERVICE_URL not set, offline recipients will not be paged"
            );
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            service_token,
        }
    }

    /// Ask the notification service to page an offline recipient
    pub async fn send_chat_push(
        &self,
        recipient_id: Uuid,
        conversation_id: Uuid,
        message_type: MessageKind,
        message: &str,
    ) -> Result<(), ChatError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| ChatError::upstream("Notification service not configured"))?;

        let payload = ChatPushPayload {
            message,
            message_type,
            chat_id: conversation_id,
            id: recipient_id,
        };

        let response = self
            .http
            .post(format!("{base_url}/send-push-endpoint"))
            .bearer_auth(&self.service_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChatError::upstream(format!("Notification request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::upstream(format!(
                "Notification request failed: {status} {body}"
            )));
        }

        Ok(())
    }

    /// Fire-and-forget dispatch with its own error boundary. The spawned
    /// task logs failures and drops them; the caller never waits on it.
    pub fn dispatch_chat_push(
        &self,
        recipient_id: Uuid,
        conversation_id: Uuid,
        message_type: MessageKind,
        message: String,
    ) {
        let client = self.clone();
        tokio::spawn(async move {
            match client
                .send_chat_push(recipient_id, conversation_id, message_type, &message)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        "[Notify] Push dispatched to user {} for chat {}",
                        recipient_id,
                        conversation_id
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "[Notify] Error dispatching push to user {}: {:?}",
                        recipient_id,
                        e
                    );
                }
            }
        });
    }
}
