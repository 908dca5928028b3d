use anyhow::Context;
use std::sync::Arc;

use bookshelf_db::RecordStore;

use crate::module::{IndexSpec, InitCtx, Module};

/// Module registry for managing module lifecycle
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect index requirements from all modules, deduplicated and sorted
    pub fn collect_indexes(&self) -> Vec<IndexSpec> {
        let mut indexes: Vec<IndexSpec> = self
            .modules
            .iter()
            .flat_map(|module| module.indexes())
            .collect();

        indexes.sort_by(|a, b| {
            a.collection
                .cmp(b.collection)
                .then_with(|| a.field.cmp(b.field))
        });
        indexes.dedup();

        indexes
    }

    /// Ask the store to build every collected index.
    ///
    /// A failed index build is logged and skipped; lookups still work without it.
    pub async fn ensure_indexes(&self, store: &dyn RecordStore) {
        for index in self.collect_indexes() {
            match store.ensure_index(index.collection, index.field).await {
                Ok(()) => tracing::info!(
                    collection = index.collection,
                    field = index.field,
                    "index ready"
                ),
                Err(err) => tracing::warn!(
                    collection = index.collection,
                    field = index.field,
                    error = %err,
                    "failed to build index"
                ),
            }
        }
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
