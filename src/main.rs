//! sap-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sap_gateway::api;
use sap_gateway::app_state::AppState;
use sap_gateway::config::SapConfig;
use sap_gateway::persistence::{DurableStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = SapConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        strict_persistence = config.strict_persistence,
        "starting sap-gateway"
    );

    // Select the durable store
    let store: Arc<dyn DurableStore> = match &config.database {
        Some(db) => {
            let store = PostgresStore::connect(db)
                .await
                .context("connecting to PostgreSQL")?;
            tracing::info!(max_connections = db.max_connections, "using PostgreSQL store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, totals and payments are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // Build application state and resume the totals
    let app_state = AppState::from_config(&config, store).context("building HTTP client")?;
    match app_state.tracking.aggregates().hydrate().await {
        Ok(snapshot) => tracing::info!(
            total_prompts = snapshot.total_prompts,
            total_energy = snapshot.total_energy,
            total_co2 = snapshot.total_co2,
            "totals restored"
        ),
        Err(e) => tracing::warn!(error = %e, "could not restore totals, starting from zero"),
    }

    if config.payment.webhook_secret.is_none() {
        tracing::warn!("SAP_STRIPE_WEBHOOK_SECRET not set, every webhook will be rejected");
    }

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
