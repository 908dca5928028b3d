//! CRUD handlers shared by every resource module.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_db::{document_to_json, Document, ObjectId, RecordStore, ID_FIELD};
use bookshelf_http::ApiError;
use serde_json::{json, Map, Value};

use crate::schema::Schema;

/// A record type exposed under `/{collection}`.
#[derive(Debug)]
pub struct Resource {
    /// Store collection and URL segment (e.g. `books`).
    pub collection: &'static str,
    pub schema: &'static Schema,
}

impl Resource {
    /// Singular display name (e.g. `Book`).
    pub fn name(&self) -> &'static str {
        self.schema.model
    }

    pub fn collection_path(&self) -> String {
        format!("/{}", self.collection)
    }

    pub fn record_path(&self) -> String {
        format!("/{}/{{id}}", self.collection)
    }

    /// Parse a path identifier; anything but a 24-digit hex string is rejected.
    pub fn parse_id(&self, raw: &str) -> Result<ObjectId, ApiError> {
        ObjectId::parse_str(raw).map_err(|_| ApiError::invalid_id(self.name()))
    }
}

/// Handler state: the injected store plus the resource being served.
#[derive(Clone)]
pub struct ResourceState {
    pub store: Arc<dyn RecordStore>,
    pub resource: &'static Resource,
}

impl ResourceState {
    pub fn new(store: Arc<dyn RecordStore>, resource: &'static Resource) -> Self {
        Self { store, resource }
    }
}

/// All five endpoints backed by the generic handlers.
pub fn routes(state: ResourceState) -> Router {
    Router::new()
        .route(
            &state.resource.collection_path(),
            get(list_records).post(create_record),
        )
        .route(
            &state.resource.record_path(),
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(state)
}

pub async fn list_records(
    State(state): State<ResourceState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let records = state
        .store
        .find_all(state.resource.collection)
        .await
        .map_err(ApiError::store)?;

    Ok(Json(records.iter().map(document_to_json).collect()))
}

pub async fn get_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = find_record(&state, &id).await?;
    Ok(Json(document_to_json(&record)))
}

pub async fn create_record(
    State(state): State<ResourceState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let resource = state.resource;
    let body = json_object(body)?;
    let fields = resource
        .schema
        .cast_create(&body)
        .map_err(|err| ApiError::validation(err.to_string()))?;

    let record = state
        .store
        .insert(resource.collection, fields)
        .await
        .map_err(ApiError::store)?;

    tracing::info!(
        resource = resource.name(),
        id = %record_id(&record),
        "record created"
    );

    Ok((StatusCode::CREATED, Json(document_to_json(&record))))
}

pub async fn update_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let resource = state.resource;
    let id = resource.parse_id(&id)?;
    let body = json_object(body)?;
    let changes = resource
        .schema
        .cast_update(&body)
        .map_err(|err| ApiError::validation(err.to_string()))?;

    let record = state
        .store
        .update_by_id(resource.collection, id, changes)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::not_found(resource.name()))?;

    tracing::info!(resource = resource.name(), %id, "record updated");

    Ok(Json(document_to_json(&record)))
}

pub async fn delete_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let resource = state.resource;
    let id = resource.parse_id(&id)?;

    state
        .store
        .delete_by_id(resource.collection, id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::not_found(resource.name()))?;

    tracing::info!(resource = resource.name(), %id, "record deleted");

    Ok(Json(
        json!({ "message": format!("{} deleted successfully", resource.name()) }),
    ))
}

/// Look up one record by its raw path identifier.
pub async fn find_record(state: &ResourceState, raw_id: &str) -> Result<Document, ApiError> {
    let resource = state.resource;
    let id = resource.parse_id(raw_id)?;

    state
        .store
        .find_by_id(resource.collection, id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::not_found(resource.name()))
}

fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    let Json(value) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

fn record_id(record: &Document) -> String {
    record
        .get_object_id(ID_FIELD)
        .map(|id| id.to_hex())
        .unwrap_or_default()
}

/// OpenAPI fragment for the five endpoints of `resource`.
pub fn openapi(resource: &Resource) -> Value {
    let name = resource.name();
    let lower = name.to_lowercase();
    let record_ref = json!({ "$ref": format!("#/components/schemas/{}", name) });
    let input_ref = json!({ "$ref": format!("#/components/schemas/New{}", name) });
    let error = json_response("Error", json!({ "$ref": "#/components/schemas/ErrorResponse" }));
    let missing = json_response(
        &format!("{} not found", name),
        json!({ "$ref": "#/components/schemas/MessageResponse" }),
    );
    let id_param = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "pattern": "^[0-9a-fA-F]{24}$" }
    }]);
    let tags = json!([name]);
    let body = json!({
        "required": true,
        "content": { "application/json": { "schema": input_ref } }
    });

    let mut paths = Map::new();
    paths.insert(
        resource.collection_path(),
        json!({
            "get": {
                "summary": format!("List {}", resource.collection),
                "tags": tags,
                "responses": {
                    "200": json_response(
                        &format!("All {}", resource.collection),
                        json!({ "type": "array", "items": record_ref }),
                    ),
                    "500": error,
                }
            },
            "post": {
                "summary": format!("Create a {}", lower),
                "tags": tags,
                "requestBody": body,
                "responses": {
                    "201": json_response(&format!("Created {}", lower), record_ref.clone()),
                    "400": error,
                }
            }
        }),
    );
    paths.insert(
        resource.record_path(),
        json!({
            "get": {
                "summary": format!("Get a {}", lower),
                "tags": tags,
                "parameters": id_param,
                "responses": {
                    "200": json_response(name, record_ref.clone()),
                    "400": error,
                    "404": missing,
                }
            },
            "put": {
                "summary": format!("Update a {}", lower),
                "tags": tags,
                "parameters": id_param,
                "requestBody": body,
                "responses": {
                    "200": json_response(&format!("Updated {}", lower), record_ref),
                    "400": error,
                    "404": missing,
                }
            },
            "delete": {
                "summary": format!("Delete a {}", lower),
                "tags": tags,
                "parameters": id_param,
                "responses": {
                    "200": json_response(
                        &format!("{} deleted successfully", name),
                        json!({ "$ref": "#/components/schemas/MessageResponse" }),
                    ),
                    "400": error,
                    "404": missing,
                }
            }
        }),
    );

    let mut schemas = Map::new();
    schemas.insert(name.to_string(), resource.schema.openapi_record());
    schemas.insert(format!("New{}", name), resource.schema.openapi_input());

    json!({ "paths": paths, "components": { "schemas": schemas } })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}
