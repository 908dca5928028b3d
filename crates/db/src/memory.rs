//! Process-local record store.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Document};
use tokio::sync::RwLock;

use crate::{RecordStore, StoreError, ID_FIELD};

/// Insertion-ordered collections held in memory.
///
/// Mirrors the observable behavior of [`crate::MongoStore`]; state is lost
/// when the value is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    indexes: RwLock<BTreeSet<(String, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes requested so far as `(collection, field)` pairs.
    pub async fn indexes(&self) -> Vec<(String, String)> {
        self.indexes.read().await.iter().cloned().collect()
    }
}

fn has_id(document: &Document, id: &ObjectId) -> bool {
    document.get_object_id(ID_FIELD).ok() == Some(*id)
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|record| has_id(record, &id)))
            .cloned())
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[ObjectId],
        fields: &[&str],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let projected = records
            .iter()
            .filter(|record| ids.iter().any(|id| has_id(record, id)))
            .map(|record| {
                record
                    .iter()
                    .filter(|(key, _)| key.as_str() == ID_FIELD || fields.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<Document>()
            })
            .collect();
        Ok(projected)
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError> {
        let mut record = doc! { ID_FIELD: ObjectId::new() };
        for (key, value) in fields {
            record.insert(key, value);
        }

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(record) = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|record| has_id(record, &id)))
        else {
            return Ok(None);
        };

        for (key, value) in changes {
            record.insert(key, value);
        }
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(None);
        };

        Ok(records
            .iter()
            .position(|record| has_id(record, &id))
            .map(|index| records.remove(index)))
    }

    async fn ensure_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.indexes
            .write()
            .await
            .insert((collection.to_string(), field.to_string()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[tokio::test]
    async fn insert_assigns_identifier_first() {
        let store = InMemoryStore::new();
        let record = store
            .insert("books", doc! { "title": "Dune" })
            .await
            .unwrap();

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_id", "title"]);
        assert!(record.get_object_id("_id").is_ok());
    }

    #[tokio::test]
    async fn update_only_touches_listed_fields() {
        let store = InMemoryStore::new();
        let record = store
            .insert("books", doc! { "title": "Dune", "pages": 412_i64 })
            .await
            .unwrap();
        let id = record.get_object_id("_id").unwrap();

        let updated = store
            .update_by_id("books", id, doc! { "pages": 500_i64 })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_str("title").unwrap(), "Dune");
        assert_eq!(updated.get("pages"), Some(&Bson::Int64(500)));
    }

    #[tokio::test]
    async fn missing_records_yield_none() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        assert!(store.find_by_id("books", id).await.unwrap().is_none());
        assert!(store
            .update_by_id("books", id, doc! { "title": "x" })
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_by_id("books", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_record_once() {
        let store = InMemoryStore::new();
        let record = store.insert("users", doc! { "name": "Ann" }).await.unwrap();
        let id = record.get_object_id("_id").unwrap();

        assert!(store.delete_by_id("users", id).await.unwrap().is_some());
        assert!(store.delete_by_id("users", id).await.unwrap().is_none());
        assert!(store.find_all("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_ids_projects_fields() {
        let store = InMemoryStore::new();
        let book = store
            .insert("books", doc! { "title": "Dune", "author": "Herbert", "pages": 412_i64 })
            .await
            .unwrap();
        store.insert("books", doc! { "title": "Other" }).await.unwrap();
        let id = book.get_object_id("_id").unwrap();

        let found = store
            .find_by_ids("books", &[id, ObjectId::new()], &["title", "author"])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        let keys: Vec<&str> = found[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_id", "title", "author"]);
    }

    #[tokio::test]
    async fn ensure_index_is_recorded_once() {
        let store = InMemoryStore::new();
        store.ensure_index("books", "title").await.unwrap();
        store.ensure_index("books", "title").await.unwrap();

        assert_eq!(
            store.indexes().await,
            vec![("books".to_string(), "title".to_string())]
        );
    }
}
