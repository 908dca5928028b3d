pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::RecordStore;
use bookshelf_kernel::{InitCtx, Module};

use crate::modules::resource::{self, ResourceState};

/// Users module: CRUD over the `users` collection
pub struct UsersModule {
    state: ResourceState,
}

impl UsersModule {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            state: ResourceState::new(store, &models::USERS),
        }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        resource::routes(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(resource::openapi(&models::USERS))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create a new instance of the users module
pub fn create_module(store: Arc<dyn RecordStore>) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(store))
}
