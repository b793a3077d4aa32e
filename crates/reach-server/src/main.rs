use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use reach_api::auth::{AppState, AppStateInner};
use reach_api::routes;

/// Placeholder JWT secrets that MUST NOT be used outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reach=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("REACH_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: REACH_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let db_path = std::env::var("REACH_DB_PATH").unwrap_or_else(|_| "reach.db".into());
    let media_dir: PathBuf = std::env::var("REACH_MEDIA_DIR")
        .unwrap_or_else(|_| "./media-storage".into())
        .into();
    let host = std::env::var("REACH_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("REACH_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let public_url = std::env::var("REACH_PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://localhost:{port}"));

    // Init database and media storage
    let db = reach_db::Database::open(&PathBuf::from(&db_path))?;
    let media = reach_media::Storage::new(media_dir).await?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        media,
        jwt_secret,
        public_url,
    });

    let app = routes::router(state)
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024)) // 32 MB uploads
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Reach server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
