//! MongoDB-backed record store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::{ClientOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};

use crate::{RecordStore, StoreError, ID_FIELD};

const APP_NAME: &str = "bookshelf";

/// Record store backed by a single MongoDB database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect to `uri` and confirm the server answers a ping.
    ///
    /// The database named in the URI wins; `fallback_database` is used when
    /// the URI does not name one.
    pub async fn connect(uri: &str, fallback_database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(StoreError::Connect)?;
        options.app_name = Some(APP_NAME.to_string());

        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| fallback_database.to_string());

        let client = Client::with_options(options).map_err(StoreError::Connect)?;
        let store = Self {
            database: client.database(&database_name),
        };

        store
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(StoreError::Connect)?;

        tracing::info!(
            target: "bookshelf-db",
            database = %database_name,
            "record store connected"
        );

        Ok(store)
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let records: Vec<Document> = cursor.try_collect().await?;
        Ok(records)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one(doc! { ID_FIELD: id })
            .await?)
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[ObjectId],
        fields: &[&str],
    ) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut projection = Document::new();
        for field in fields {
            projection.insert(*field, 1);
        }

        let cursor = self
            .collection(collection)
            .find(doc! { ID_FIELD: { "$in": ids.to_vec() } })
            .projection(projection)
            .await?;
        let records: Vec<Document> = cursor.try_collect().await?;
        Ok(records)
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError> {
        let mut record = doc! { ID_FIELD: ObjectId::new() };
        for (key, value) in fields {
            record.insert(key, value);
        }

        self.collection(collection).insert_one(&record).await?;
        Ok(record)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        // An empty `$set` is rejected by older servers.
        if changes.is_empty() {
            return self.find_by_id(collection, id).await;
        }

        Ok(self
            .collection(collection)
            .find_one_and_update(doc! { ID_FIELD: id }, doc! { "$set": changes })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one_and_delete(doc! { ID_FIELD: id })
            .await?)
    }

    async fn ensure_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1);

        let created = self
            .collection(collection)
            .create_index(IndexModel::builder().keys(keys).build())
            .await?;

        tracing::debug!(
            target: "bookshelf-db",
            collection,
            index = %created.index_name,
            "index ensured"
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
