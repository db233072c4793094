pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::user_auth::{handlers as auth_handlers, middleware as auth_middleware};
use state::AppState;

/// Assemble every route on top of `state`
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Public Routes (no auth required)
    // ==========================================================================
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login));

    // ==========================================================================
    // Resource Routes - access token
    // ==========================================================================
    let access_routes = Router::new()
        // Items
        .route("/item", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/item/{item_id}",
            get(handlers::get_item)
                .put(handlers::put_item)
                .delete(handlers::delete_item),
        )
        .route(
            "/item/{item_id}/tag/{tag_id}",
            post(handlers::link_tag).delete(handlers::unlink_tag),
        )
        // Stores
        .route("/store", get(handlers::list_stores).post(handlers::create_store))
        .route(
            "/store/{store_id}",
            get(handlers::get_store).delete(handlers::delete_store),
        )
        .route(
            "/store/{store_id}/tag",
            get(handlers::list_store_tags).post(handlers::create_tag),
        )
        // Tags
        .route(
            "/tag/{tag_id}",
            get(handlers::get_tag).delete(handlers::delete_tag),
        )
        // Users and session
        .route(
            "/user/{user_id}",
            get(auth_handlers::get_user).delete(auth_handlers::delete_user),
        )
        .route("/logout", post(auth_handlers::logout))
        .route_layer(from_fn_with_state(
            state.clone(),
            auth_middleware::require_access_token,
        ));

    // ==========================================================================
    // Refresh Route - refresh token
    // ==========================================================================
    let refresh_routes = Router::new()
        .route("/refresh", post(auth_handlers::refresh))
        .route_layer(from_fn_with_state(
            state.clone(),
            auth_middleware::require_refresh_token,
        ));

    Router::new()
        .merge(public_routes)
        .merge(access_routes)
        .merge(refresh_routes)
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

/// Start HTTP Gateway server
///
/// Runs until Ctrl-C / SIGTERM, then stops the revocation sweeper.
pub async fn run_server(config: &AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = state.revocations.clone().spawn_sweeper(
        Duration::from_secs(config.auth.revocation_sweep_secs.max(1)),
        shutdown_rx,
    );

    let app = build_router(state);

    // Bind address
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::warn!("Revocation sweeper ended abnormally: {}", e);
    }

    served.map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
