//! Presence Registry
//!
//! In-memory table of which users hold a live connection to which
//! conversation, with their typing state and last-seen timestamp. Process
//! local by design: presence is best-effort knowledge, the database stays
//! the source of truth, and a restart simply forgets who was online.
//! A horizontally-scaled deployment would need a shared presence store;
//! this registry is constructed once in server init and injected, so that
//! swap stays contained.
//!
//! All operations are synchronous and never await while holding the lock.
//! Outbound frames go through each entry's unbounded channel; the session's
//! writer task drains it onto the socket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::shared::chat::OutboundFrame;

/// Seconds after a `typing_start` with no explicit stop before the registry
/// broadcasts the stop itself
pub const TYPING_EXPIRY_SECS: u64 = 10;

/// One live connection in one conversation
struct PresenceEntry {
    tx: mpsc::UnboundedSender<OutboundFrame>,
    last_seen: DateTime<Utc>,
    is_typing: bool,
    typing_timer: Option<JoinHandle<()>>,
}

/// A snapshot of one user's presence, as shown in the chat list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceSnapshot {
    pub is_online: bool,
    pub is_typing: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl PresenceSnapshot {
    fn offline() -> Self {
        Self {
            is_online: false,
            is_typing: false,
            last_seen: None,
        }
    }
}

/// Registry of live connections, keyed by (conversation, user)
#[derive(Clone)]
pub struct PresenceRegistry {
    conversations: Arc<Mutex<HashMap<Uuid, HashMap<Uuid, PresenceEntry>>>>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a connection. An existing entry for the same (conversation,
    /// user) is replaced, superseding the older connection.
    pub fn register(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        tx: mpsc::UnboundedSender<OutboundFrame>,
    ) {
        let mut conversations = self.conversations.lock().unwrap();
        let replaced = conversations
            .entry(conversation_id)
            .or_default()
            .insert(
                user_id,
                PresenceEntry {
                    tx,
                    last_seen: Utc::now(),
                    is_typing: false,
                    typing_timer: None,
                },
            );
        if let Some(old) = replaced {
            if let Some(timer) = old.typing_timer {
                timer.abort();
            }
            tracing::debug!(
                "[Presence] Superseded connection for user {} in chat {}",
                user_id,
                conversation_id
            );
        }
    }

    /// Remove a connection. Returns whether the user was still marked as
    /// typing (the caller owes peers a typing-stop broadcast) and whether
    /// any participants remain in the conversation.
    pub fn deregister(&self, conversation_id: Uuid, user_id: Uuid) -> (bool, bool) {
        let mut conversations = self.conversations.lock().unwrap();
        let Some(entries) = conversations.get_mut(&conversation_id) else {
            return (false, false);
        };

        let was_typing = match entries.remove(&user_id) {
            Some(entry) => {
                if let Some(timer) = entry.typing_timer {
                    timer.abort();
                }
                entry.is_typing
            }
            None => false,
        };

        let peers_remain = !entries.is_empty();
        if !peers_remain {
            // Garbage-collect the empty per-conversation map
            conversations.remove(&conversation_id);
        }

        (was_typing, peers_remain)
    }

    /// Whether the user has a live connection to the conversation
    pub fn is_online(&self, conversation_id: Uuid, user_id: Uuid) -> bool {
        let conversations = self.conversations.lock().unwrap();
        conversations
            .get(&conversation_id)
            .and_then(|entries| entries.get(&user_id))
            .map(|entry| !entry.tx.is_closed())
            .unwrap_or(false)
    }

    /// Online/typing/last-seen snapshot for the chat-list enrichment
    pub fn snapshot(&self, conversation_id: Uuid, user_id: Uuid) -> PresenceSnapshot {
        let conversations = self.conversations.lock().unwrap();
        conversations
            .get(&conversation_id)
            .and_then(|entries| entries.get(&user_id))
            .map(|entry| PresenceSnapshot {
                is_online: !entry.tx.is_closed(),
                is_typing: entry.is_typing,
                last_seen: Some(entry.last_seen),
            })
            .unwrap_or_else(PresenceSnapshot::offline)
    }

    /// Refresh the user's last-seen timestamp; called on every inbound frame
    pub fn touch_last_seen(&self, conversation_id: Uuid, user_id: Uuid) {
        let mut conversations = self.conversations.lock().unwrap();
        if let Some(entry) = conversations
            .get_mut(&conversation_id)
            .and_then(|entries| entries.get_mut(&user_id))
        {
            entry.last_seen = Utc::now();
        }
    }

    /// Mark the user as typing and arm the auto-stop timer, replacing any
    /// timer already running. Returns false if the user has no entry.
    pub fn start_typing(&self, conversation_id: Uuid, user_id: Uuid) -> bool {
        let registry = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(TYPING_EXPIRY_SECS)).await;
            registry.expire_typing(conversation_id, user_id);
        });

        let mut conversations = self.conversations.lock().unwrap();
        match conversations
            .get_mut(&conversation_id)
            .and_then(|entries| entries.get_mut(&user_id))
        {
            Some(entry) => {
                entry.is_typing = true;
                if let Some(old) = entry.typing_timer.replace(timer) {
                    old.abort();
                }
                true
            }
            None => {
                timer.abort();
                false
            }
        }
    }

    /// Clear the typing flag and cancel the timer. Returns true only when the
    /// entry actually flipped from typing to idle, so an explicit stop racing
    /// the expiry timer broadcasts exactly once.
    pub fn stop_typing(&self, conversation_id: Uuid, user_id: Uuid) -> bool {
        let mut conversations = self.conversations.lock().unwrap();
        let Some(entry) = conversations
            .get_mut(&conversation_id)
            .and_then(|entries| entries.get_mut(&user_id))
        else {
            return false;
        };

        if let Some(timer) = entry.typing_timer.take() {
            timer.abort();
        }

        let was_typing = entry.is_typing;
        entry.is_typing = false;
        was_typing
    }

    /// Timer callback: the entry may be gone or already stopped by the time
    /// this fires, in which case it is a no-op.
    fn expire_typing(&self, conversation_id: Uuid, user_id: Uuid) {
        if self.stop_typing(conversation_id, user_id) {
            tracing::debug!(
                "[Presence] Typing expired for user {} in chat {}",
                user_id,
                conversation_id
            );
            self.broadcast(
                conversation_id,
                OutboundFrame::UserTypingStop {
                    user_id,
                    timestamp: crate::shared::chat::epoch_millis(),
                },
                Some(user_id),
            );
        }
    }

    /// Send a frame to one present user. Returns false if they have no open
    /// connection.
    pub fn send_to(&self, conversation_id: Uuid, user_id: Uuid, frame: OutboundFrame) -> bool {
        let conversations = self.conversations.lock().unwrap();
        let Some(entry) = conversations
            .get(&conversation_id)
            .and_then(|entries| entries.get(&user_id))
        else {
            return false;
        };

        match entry.tx.send(frame) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "[Presence] Failed to queue frame for user {} in chat {}: {:?}",
                    user_id,
                    conversation_id,
                    e
                );
                false
            }
        }
    }

    /// Fan a frame out to every present connection in the conversation except
    /// `exclude_user_id`. Failures are logged per recipient and never abort
    /// the rest of the fan-out.
    pub fn broadcast(
        &self,
        conversation_id: Uuid,
        frame: OutboundFrame,
        exclude_user_id: Option<Uuid>,
    ) {
        let conversations = self.conversations.lock().unwrap();
        let Some(entries) = conversations.get(&conversation_id) else {
            return;
        };

        for (user_id, entry) in entries.iter() {
            if Some(*user_id) == exclude_user_id {
                continue;
            }
            if let Err(e) = entry.tx.send(frame.clone()) {
                tracing::warn!(
                    "[Presence] Error sending frame to user {} in chat {}: {:?}",
                    user_id,
                    conversation_id,
                    e
                );
            }
        }
    }
}
