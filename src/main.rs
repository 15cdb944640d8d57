//! RELIEVE storefront - local cart service

use anyhow::Result;
use relieve_storefront::{api, AppConfig, BackgroundWriter, CartPersistence, CartStore, FileStorage, LocalCartPersistence, LogFormat};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer().json()).init(),
    }

    let local = LocalCartPersistence::new(FileStorage::new(&config.storage_dir));
    let writer = Arc::new(BackgroundWriter::spawn(Arc::new(local)));
    let persistence: Box<dyn CartPersistence> = Box::new(Arc::clone(&writer));
    let state = api::AppState::new(CartStore::open(persistence));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), storage = %config.storage_dir.display(), "RELIEVE cart service listening");
    axum::serve(listener, api::router(state.clone()))
        .with_graceful_shutdown(async { tokio::signal::ctrl_c().await.ok(); })
        .await?;

    // Drop the store so the writer holds the last reference, then flush it.
    drop(state);
    match Arc::try_unwrap(writer) {
        Ok(writer) => writer.shutdown().await,
        Err(_) => tracing::warn!("Cart writer still shared at shutdown; pending writes may be lost"),
    }
    Ok(())
}
