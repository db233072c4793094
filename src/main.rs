use std::sync::Arc;

use anyhow::Context;

use store_tag_api::{AppConfig, AppState, DataStore, MemoryStore, PgStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = store_tag_api::logging::init_logging(&app_config);

    tracing::info!(
        version = env!("GIT_HASH"),
        "Starting Store Tag API in {} mode",
        env
    );

    let store: Arc<dyn DataStore> = match app_config.postgres_url.as_deref() {
        Some(url) => Arc::new(
            PgStore::connect(url)
                .await
                .context("Failed to initialize PostgreSQL store")?,
        ),
        None => {
            tracing::warn!("No postgres_url configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!("Data store: {}", store.name());

    let state = Arc::new(AppState::from_config(&app_config, store));
    store_tag_api::run_server(&app_config, state).await
}
