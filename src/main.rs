//! Support Chat server binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use support_chat::adapters::http::{build_router, ApiState};
use support_chat::adapters::{OpenAiCompletionClient, PostgresConversationStore};
use support_chat::application::{run_retention_loop, RetentionSweeper};
use support_chat::config::AppConfig;
use support_chat::ports::ConversationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_tracing(&config);

    if !config.ai.has_credential() {
        tracing::warn!("No completion provider credential configured; visitors will see the error message");
    }
    if !config.admin.is_enabled() {
        tracing::warn!("No admin token configured; admin endpoints will reject every request");
    }

    // Database
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    if config.database.run_migrations {
        PostgresConversationStore::migrate(&pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Database migrations applied");
    }

    let store: Arc<dyn ConversationStore> = Arc::new(PostgresConversationStore::new(pool));
    let completion = Arc::new(
        OpenAiCompletionClient::new(&config.ai).context("Failed to build completion client")?,
    );

    // Shutdown broadcast
    let (shutdown_tx, _) = broadcast::channel(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = signal_tx.send(());
    });

    // Retention sweep
    if let Some(interval) = config.chat.retention_sweep_interval() {
        let sweeper = RetentionSweeper::new(store.clone(), config.chat.retention_days);
        tokio::spawn(run_retention_loop(sweeper, interval, shutdown_tx.subscribe()));
    }

    // HTTP
    let state = ApiState::new(&config, store, completion, None);
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, environment = ?config.server.environment, "Support chat listening");

    let mut shutdown_rx = shutdown_tx.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// `server.log_level`.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
