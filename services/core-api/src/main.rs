use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use core_api::audit::FileAuditSink;
use core_api::{build_router, AppConfig, AppState, API_DESCRIPTION, API_TITLE, API_VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = AppConfig::from_env()?;

    // RUST_LOG wins over ZONE_GPT_LOG_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cfg.reload {
        warn!("ZONE_GPT_RELOAD is set; hot reload is not built in, run under an external file watcher");
    }
    if cfg.repo_path.is_none() {
        warn!("ZONE_GPT_REPO_PATH is not set; /repo/sync will fail until it is");
    }

    let audit = FileAuditSink::open(&cfg.audit_log)
        .with_context(|| format!("Failed to open audit log {}", cfg.audit_log.display()))?;
    info!(path = %audit.path().display(), "audit log: ok");

    let addr = cfg.bind_addr();
    let state = Arc::new(AppState::new(cfg, Arc::new(audit)));
    info!(root = %state.store.root().display(), "dataset store: ok");

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        title = API_TITLE,
        version = API_VERSION,
        description = API_DESCRIPTION,
        "listening on http://{addr}"
    );

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
