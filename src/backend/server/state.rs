/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Thread Safety
 *
 * All state is designed to be cheaply cloned per request:
 * - `PgPool` is an `Arc`-backed pool
 * - `PresenceRegistry` shares its table behind an `Arc<Mutex<..>>`
 * - Collaborator clients wrap a shared `reqwest::Client`
 */

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::notify::NotificationClient;
use crate::backend::realtime::presence::PresenceRegistry;
use crate::backend::server::config::ServerConfig;
use crate::backend::translate::Translator;

/// Application state that holds the store pool and the live-chat services
///
/// The presence registry lives here (constructed once in `create_app`) so
/// every connection handler and REST handler talks to the same table; there
/// is deliberately no global.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool, the message store's source of truth
    pub pool: PgPool,

    /// Process-local table of live connections per conversation
    pub presence: PresenceRegistry,

    /// Push-notification dispatch for offline recipients
    pub notifier: NotificationClient,

    /// Translation collaborator client
    pub translator: Translator,

    /// Environment configuration (idle timeout, ports)
    pub config: ServerConfig,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for PresenceRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for NotificationClient {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notifier.clone()
    }
}

impl FromRef<AppState> for Translator {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.translator.clone()
    }
}
