use anyhow::Context;

use manualhub_store::StoreConfig;

const LISTEN_ADDR: &str = "MANUALHUB_LISTEN_ADDR";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    manualhub_observability::init();

    let config = StoreConfig::from_env();
    if config.table.is_none() {
        tracing::warn!("table storage not configured; table routes will answer 500");
    }
    if config.public_blob.is_none() || config.restricted_blob.is_none() {
        tracing::warn!("blob storage not fully configured; affected uploads and deletes will answer 500");
    }

    let app = manualhub_api::app::build_app_with_config(config);

    let addr = std::env::var(LISTEN_ADDR).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
