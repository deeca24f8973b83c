use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use chatvault_api::auth::{self, AppState, AppStateInner};
use chatvault_auth::AuthFlow;
use chatvault_crypto::CredentialCipher;
use chatvault_platform::{ApiCredentials, BridgeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatvault=debug,tower_http=debug".into()),
        )
        .init();

    // Secrets and config. The signing secret and encryption key are
    // required; losing the key invalidates every stored session.
    let bot_token = require_env("CHATVAULT_BOT_TOKEN")?;
    let encryption_key = require_env("CHATVAULT_ENCRYPTION_KEY")?;
    let api_id: i32 = require_env("CHATVAULT_API_ID")?.parse()?;
    let api_hash = require_env("CHATVAULT_API_HASH")?;
    let bridge_url = require_env("CHATVAULT_BRIDGE_URL")?;

    let db_path = std::env::var("CHATVAULT_DB_PATH").unwrap_or_else(|_| "chatvault.db".into());
    let host = std::env::var("CHATVAULT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CHATVAULT_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    let cipher = Arc::new(CredentialCipher::from_base64(&encryption_key)?);
    let db = Arc::new(chatvault_db::Database::open(&PathBuf::from(&db_path))?);

    let flow = AuthFlow::new(
        db,
        cipher,
        BridgeClient::new(bridge_url),
        bot_token,
        ApiCredentials { api_id, api_hash },
    );
    let state: AppState = Arc::new(AppStateInner { flow });

    let mut app = Router::new()
        .route("/auth/send_code", post(auth::send_code))
        .route("/auth/confirm_code", post(auth::confirm_code))
        .route("/auth/confirm_password", post(auth::confirm_password))
        .route("/health", get(auth::health))
        .with_state(state);

    // Serve the login webapp when a static dir is configured
    if let Ok(static_dir) = std::env::var("CHATVAULT_STATIC_DIR") {
        app = app.nest_service("/webapp", ServeDir::new(static_dir));
    }

    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ChatVault auth server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn require_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{name} must be set"))
}
