//! HTTP server with HTMX support
//!
//! Serves the vault page and the HTMX endpoints its controls call:
//! - routes::vault: account table, dialogs, password toggle and search

pub mod error;
pub mod routes;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use vaultweb_config::Config;
use vaultweb_core::VaultSession;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub vault: VaultSession,
    pub config: Config,
}

impl AppState {
    pub fn new(vault: VaultSession, config: Config) -> Self {
        Self { vault, config }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::vault::{
        htmx_account_create, htmx_account_update, htmx_delete_confirm, htmx_dialog_close,
        htmx_dialog_add, htmx_dialog_delete, htmx_dialog_edit, htmx_password_toggle,
        htmx_search, page_vault,
    };

    Router::new()
        .route("/api/health", get(health_check))
        // Full page
        .route("/", get(page_vault))
        // HTMX partial routes
        .route("/vault/dialogs/add", get(htmx_dialog_add))
        .route("/vault/dialogs/:kind/close", post(htmx_dialog_close))
        .route("/vault/accounts", post(htmx_account_create).put(htmx_account_update))
        .route("/vault/accounts/:id/edit", get(htmx_dialog_edit))
        .route("/vault/accounts/:id/delete", get(htmx_dialog_delete))
        .route("/vault/accounts/:id/toggle", post(htmx_password_toggle))
        .route("/vault/delete/confirm", post(htmx_delete_confirm))
        .route("/vault/search", post(htmx_search))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Vault</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css">
    <style>
        .htmx-request button[type=submit] {{ opacity: 0.5; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        vaultweb_utils::escape_html(title),
        content
    )
}

/// Bind and serve until Ctrl-C
pub async fn start_server(config: Config, vault: VaultSession) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let store_url = config.store.base_url.clone();
    let router = create_router(AppState::new(vault, config));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("Starting vaultweb on http://{}", addr);
    log::info!("Account store: {}", store_url);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
