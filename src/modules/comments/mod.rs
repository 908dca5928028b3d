pub mod models;
pub mod populate;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bookshelf_db::{document_to_json, RecordStore};
use bookshelf_http::ApiError;
use bookshelf_kernel::{IndexSpec, InitCtx, Module};
use serde_json::{json, Value};

use crate::modules::resource::{self, ResourceState};
use models::{COMMENTS, REFERENCES};

/// Comments module: CRUD over `comments`, with user and book summaries
/// embedded on reads
pub struct CommentsModule {
    state: ResourceState,
}

impl CommentsModule {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            state: ResourceState::new(store, &COMMENTS),
        }
    }
}

#[async_trait]
impl Module for CommentsModule {
    fn name(&self) -> &'static str {
        "comments"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "comments module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                &COMMENTS.collection_path(),
                get(list_comments).post(resource::create_record),
            )
            .route(
                &COMMENTS.record_path(),
                get(get_comment)
                    .put(resource::update_record)
                    .delete(resource::delete_record),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let mut spec = resource::openapi(&COMMENTS);
        let populated = &mut spec["components"]["schemas"]["Comment"]["properties"];
        populated["userId"] = json!({
            "type": ["object", "null"],
            "properties": { "_id": { "type": "string" }, "name": { "type": "string" } }
        });
        populated["bookId"] = json!({
            "type": ["object", "null"],
            "properties": {
                "_id": { "type": "string" },
                "title": { "type": "string" },
                "author": { "type": "string" }
            }
        });
        Some(spec)
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        REFERENCES
            .iter()
            .map(|reference| IndexSpec {
                collection: COMMENTS.collection,
                field: reference.field,
            })
            .collect()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "comments module stopped");
        Ok(())
    }
}

async fn list_comments(State(state): State<ResourceState>) -> Result<Json<Vec<Value>>, ApiError> {
    let comments = state
        .store
        .find_all(COMMENTS.collection)
        .await
        .map_err(ApiError::store)?;

    let comments = populate::resolve_references(state.store.as_ref(), comments, &REFERENCES)
        .await
        .map_err(ApiError::store)?;

    Ok(Json(comments.iter().map(document_to_json).collect()))
}

async fn get_comment(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let comment = resource::find_record(&state, &id).await?;

    let mut populated =
        populate::resolve_references(state.store.as_ref(), vec![comment], &REFERENCES)
            .await
            .map_err(ApiError::store)?;

    match populated.pop() {
        Some(comment) => Ok(Json(document_to_json(&comment))),
        None => Err(ApiError::not_found(COMMENTS.name())),
    }
}

/// Create a new instance of the comments module
pub fn create_module(store: Arc<dyn RecordStore>) -> Arc<dyn Module> {
    Arc::new(CommentsModule::new(store))
}
