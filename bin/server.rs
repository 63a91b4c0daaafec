// Finance Tracker - Web Server

use anyhow::{Context, Result};
use finance_tracker::server::{router, AppState};
use finance_tracker::{init_tracing, open_database, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_tracing(&config.log_filter);

    tracing::info!(version = finance_tracker::VERSION, "starting finance tracker server");

    let conn = open_database(&config.db_path)?;
    tracing::info!(path = ?config.db_path, "database ready");

    let engine = config.build_engine()?;
    match &config.keywords_path {
        Some(path) => tracing::info!(path = ?path, "loaded keyword dictionary"),
        None => tracing::info!("using built-in keyword dictionary"),
    }

    let app = router(AppState::new(conn, engine));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
