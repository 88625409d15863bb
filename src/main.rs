//! FinQuest - gamified personal finance coach
//!
//! A Rust backend implementing a per-user conversation state machine for
//! guided money tracking: onboarding, expenses, debts, and goals.

mod api;
mod db;
mod dispatch;
mod domain;
mod flows;
mod parse;
mod session;
mod state_machine;
mod views;

use db::Database;
use dispatch::{Dispatcher, DispatcherManager, OutputSink, SqliteStore, TraceSink, WebhookSink};
use session::SessionStore;
use state_machine::Registry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finquest=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let db_path = std::env::var("FINQUEST_DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.finquest/finquest.db")
    });

    let port: u16 = std::env::var("FINQUEST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %db_path, "Opening database");
    let db = Database::open(&db_path)?;

    // Outgoing messages go to the delivery webhook when one is configured,
    // otherwise to the log.
    let sink: Box<dyn OutputSink> = match std::env::var("FINQUEST_DELIVERY_URL") {
        Ok(url) => {
            tracing::info!(%url, "Delivering messages via webhook");
            Box::new(WebhookSink::new(url))
        }
        Err(_) => {
            tracing::warn!("FINQUEST_DELIVERY_URL not set, logging outgoing messages");
            Box::new(TraceSink)
        }
    };

    let dispatcher = Dispatcher::new(
        Arc::new(Registry::new()),
        Arc::new(SessionStore::new()),
        SqliteStore::new(db),
        sink,
    );
    let manager = Arc::new(DispatcherManager::new(dispatcher));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(manager)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("FinQuest server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
