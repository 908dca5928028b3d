pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::RecordStore;
use bookshelf_kernel::{IndexSpec, InitCtx, Module};

use crate::modules::resource::{self, ResourceState};

/// Books module: CRUD over the `books` collection
pub struct BooksModule {
    state: ResourceState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            state: ResourceState::new(store, &models::BOOKS),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        resource::routes(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(resource::openapi(&models::BOOKS))
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec {
            collection: models::BOOKS.collection,
            field: "title",
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn RecordStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
