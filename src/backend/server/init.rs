/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, database connection, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Connect the database pool and run migrations
 * 2. Create the presence registry (one per process)
 * 3. Create the collaborator clients (notifications, translation)
 * 4. Create and configure the router
 */

use axum::Router;

use crate::backend::notify::NotificationClient;
use crate::backend::realtime::presence::PresenceRegistry;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{connect_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails when the database is unreachable or migrations cannot be applied;
/// the chat store is the source of truth, so there is no degraded mode
/// without it.
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("Initializing chat service");

    let pool = connect_database(&config.database_url).await?;

    let presence = PresenceRegistry::new();
    let notifier = NotificationClient::new(
        config.notification_service_url.clone(),
        config.service_auth_token.clone(),
    );
    let translator = crate::backend::translate::Translator::new(config.translator.clone());

    let app_state = AppState {
        pool,
        presence,
        notifier,
        translator,
        config,
    };

    tracing::info!("Presence registry and collaborator clients initialized");

    Ok(create_router(app_state))
}
