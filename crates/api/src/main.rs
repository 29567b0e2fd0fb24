use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use recipebook_api::app::{build_app, AppServices};
use recipebook_api::config::ApiConfig;
use recipebook_core::Storage;
use recipebook_infra::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    recipebook_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let addr = config.socket_addr();

    let storage: Arc<dyn Storage> = Arc::new(InMemoryStore::new());
    let services = AppServices::new(config, storage).context("failed to build services")?;

    let shutdown = CancellationToken::new();
    let app = build_app(Arc::new(services), shutdown.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("could not install ctrl-c handler");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    Ok(())
}
