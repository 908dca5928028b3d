use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::StoreError;

/// Collection-level operations the HTTP layer depends on.
///
/// Identifiers are already parsed into [`ObjectId`] by the caller, so a
/// malformed identifier never reaches the store. Lookups that match nothing
/// return `Ok(None)` rather than an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return every document in `collection` in natural order.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Fetch a single document by identifier.
    async fn find_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError>;

    /// Fetch the documents whose identifier is in `ids`, keeping only `_id`
    /// and the listed `fields`. Unknown identifiers are skipped.
    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[ObjectId],
        fields: &[&str],
    ) -> Result<Vec<Document>, StoreError>;

    /// Store `fields` as a new document under a freshly assigned identifier
    /// and return the stored document, `_id` first.
    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError>;

    /// Overwrite the listed fields of an existing document and return the
    /// document as it is after the update.
    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        changes: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Remove a document and return it.
    async fn delete_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError>;

    /// Create an ascending single-field index if it does not exist yet.
    async fn ensure_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Round-trip to the backend to confirm it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
