//! Server entry points for the HTTP and stdio transports.
//!
//! [`serve_http`] exposes the REST API with the MCP tools nested at `/mcp`;
//! [`serve_stdio`] exposes only the MCP tools. Both open the store, start the
//! background validation worker, and share one [`AppState`].

pub mod error;
pub mod routes;

use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

use crate::config::NeuroVaultConfig;
use crate::db::{self, SharedDb};
use crate::tools::NeuroVaultTools;
use crate::validation::queue::{spawn_validation_worker, ValidationQueue};

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub queue: ValidationQueue,
    pub config: Arc<NeuroVaultConfig>,
}

impl AppState {
    pub fn new(db: SharedDb, queue: ValidationQueue, config: Arc<NeuroVaultConfig>) -> Self {
        Self { db, queue, config }
    }
}

/// Open the store and start the validation worker.
fn setup_shared_state(config: NeuroVaultConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let db = db::shared(conn);
    let (queue, rx) = ValidationQueue::channel();
    spawn_validation_worker(db.clone(), rx);
    tracing::info!("validation worker ready");

    Ok(AppState::new(db, queue, Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: NeuroVaultConfig) -> Result<()> {
    tracing::info!("starting NeuroVault MCP server on stdio");

    let state = setup_shared_state(config)?;
    let tools = NeuroVaultTools::new(state);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the REST API with MCP over Streamable HTTP at `/mcp`.
pub async fn serve_http(config: NeuroVaultConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "starting NeuroVault HTTP server");

    let state = setup_shared_state(config)?;

    let mcp_state = state.clone();
    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(NeuroVaultTools::new(mcp_state.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = routes::router(state).nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr} (MCP at /mcp)");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
