/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration from
 * environment variables (optionally seeded from a `.env` file by `main`).
 *
 * # Configuration Sources
 *
 * - `SERVER_PORT` - listen port (default 3006)
 * - `DATABASE_URL` - PostgreSQL connection string, required: the message
 *   store is the source of truth and the service refuses to start without it
 * - `NOTIFICATION_SERVICE_URL` - base URL of the push-notification service;
 *   unset disables paging offline recipients
 * - `SERVICE_AUTH_TOKEN` - bearer token for service-to-service calls
 * - `GOOGLE_PROJECT_ID` / `TRANSLATE_API_URL` / `TRANSLATE_API_KEY` -
 *   translation collaborator; unset disables translation
 * - `IDLE_TIMEOUT_SECS` - close live connections silent for this long
 *   (default 90, three missed heartbeat intervals)
 */

use sqlx::PgPool;

use crate::backend::translate::TranslatorConfig;

const DEFAULT_PORT: u16 = 3006;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 90;
const DEFAULT_SERVICE_TOKEN: &str = "INTER_SERVICE_COMMUNICATION";

/// Environment configuration for the chat service
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub notification_service_url: Option<String>,
    pub service_auth_token: String,
    pub translator: Option<TranslatorConfig>,
    pub idle_timeout: std::time::Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error message if `DATABASE_URL` is missing; everything
    /// else falls back to a default or disables its feature.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL is required".to_string())?;

        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let idle_timeout_secs = std::env::var("IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);

        Ok(Self {
            port,
            database_url,
            notification_service_url: std::env::var("NOTIFICATION_SERVICE_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string()),
            service_auth_token: std::env::var("SERVICE_AUTH_TOKEN")
                .unwrap_or_else(|_| DEFAULT_SERVICE_TOKEN.to_string()),
            translator: TranslatorConfig::from_env(),
            idle_timeout: std::time::Duration::from_secs(idle_timeout_secs),
        })
    }
}

/// Connect the database pool and run migrations
///
/// Unlike optional services, a failed connection here is fatal: the caller
/// is expected to log and exit.
pub async fn connect_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url).await?;
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {:?}", e);
        sqlx::Error::Migrate(Box::new(e))
    })?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "DATABASE_URL",
            "SERVER_PORT",
            "NOTIFICATION_SERVICE_URL",
            "SERVICE_AUTH_TOKEN",
            "GOOGLE_PROJECT_ID",
            "TRANSLATE_API_URL",
            "TRANSLATE_API_KEY",
            "IDLE_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_database_url_is_required() {
        clear_env();
        assert!(ServerConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/chat");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.service_auth_token, DEFAULT_SERVICE_TOKEN);
        assert_eq!(
            config.idle_timeout,
            std::time::Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)
        );
        assert!(config.notification_service_url.is_none());
        assert!(config.translator.is_none());
    }

    #[test]
    #[serial]
    fn test_notification_url_is_normalized() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/chat");
        std::env::set_var("NOTIFICATION_SERVICE_URL", "http://notify:3003/");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(
            config.notification_service_url.as_deref(),
            Some("http://notify:3003")
        );
    }

    #[test]
    #[serial]
    fn test_invalid_port_falls_back() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/chat");
        std::env::set_var("SERVER_PORT", "not-a-port");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
