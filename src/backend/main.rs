/**
 * Chat Service Entry Point
 *
 * Initializes tracing, loads configuration from the environment, builds the
 * Axum app (database pool, presence registry, collaborator clients) and
 * serves HTTP + WebSocket traffic.
 */

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = sawari_chat::backend::server::ServerConfig::from_env()?;
    let port = config.port;

    let app = sawari_chat::backend::server::create_app(config).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Chat service running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
