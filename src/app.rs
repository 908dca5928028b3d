//! Process bootstrap.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_db::{MongoStore, RecordStore};
use bookshelf_kernel::{InitCtx, ModuleRegistry, Settings};

use crate::modules;

/// Connect to the configured record store.
///
/// Fails when no URI is configured or the store does not answer; callers
/// treat that as fatal.
pub async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<dyn RecordStore>> {
    let uri = settings.database_uri()?;
    let store = MongoStore::connect(uri, &settings.database.name)
        .await
        .context("failed to connect to the record store")?;

    tracing::info!("MongoDB Connected");
    Ok(Arc::new(store))
}

/// Build the registry with every resource module bound to `store`.
pub fn build_registry(store: Arc<dyn RecordStore>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);
    registry
}

/// Connect, initialise modules, and serve until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = connect_store(&settings).await?;
    let registry = build_registry(store.clone());

    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.ensure_indexes(store.as_ref()).await;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_modules().await?;
    served
}

/// Resolves on the first Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
