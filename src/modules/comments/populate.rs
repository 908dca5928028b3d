//! Read-time resolution of reference fields.

use std::collections::{HashMap, HashSet};

use bookshelf_db::{Bson, Document, ObjectId, RecordStore, StoreError, ID_FIELD};

use super::models::Reference;

/// Replace each reference field with a projection of the record it points
/// at, or `null` when that record no longer exists.
///
/// One batched lookup is issued per reference, however many records are
/// passed. Fields that do not hold an identifier are left untouched.
pub async fn resolve_references(
    store: &dyn RecordStore,
    mut records: Vec<Document>,
    references: &[Reference],
) -> Result<Vec<Document>, StoreError> {
    for reference in references {
        let targets = fetch_targets(store, &records, reference).await?;

        for record in &mut records {
            let Ok(id) = record.get_object_id(reference.field) else {
                continue;
            };
            let resolved = targets
                .get(&id)
                .cloned()
                .map(Bson::Document)
                .unwrap_or(Bson::Null);
            record.insert(reference.field, resolved);
        }
    }

    Ok(records)
}

async fn fetch_targets(
    store: &dyn RecordStore,
    records: &[Document],
    reference: &Reference,
) -> Result<HashMap<ObjectId, Document>, StoreError> {
    let ids: Vec<ObjectId> = records
        .iter()
        .filter_map(|record| record.get_object_id(reference.field).ok())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let found = store
        .find_by_ids(reference.collection, &ids, reference.projection)
        .await?;

    Ok(found
        .into_iter()
        .filter_map(|target| {
            target
                .get_object_id(ID_FIELD)
                .ok()
                .map(|id| (id, target))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::comments::models::REFERENCES;
    use bookshelf_db::{doc, InMemoryStore};

    #[tokio::test]
    async fn embeds_projected_summaries() {
        let store = InMemoryStore::new();
        let user = store
            .insert("users", doc! { "name": "Ann", "joined": bson_now() })
            .await
            .unwrap();
        let book = store
            .insert("books", doc! { "title": "Dune", "author": "Herbert", "pages": 412_i64 })
            .await
            .unwrap();
        let user_id = user.get_object_id(ID_FIELD).unwrap();
        let book_id = book.get_object_id(ID_FIELD).unwrap();

        let comments = vec![
            doc! { "userId": user_id, "bookId": book_id, "text": "great" },
            doc! { "userId": user_id, "bookId": book_id, "text": "again" },
        ];
        let resolved = resolve_references(&store, comments, &REFERENCES)
            .await
            .unwrap();

        for comment in &resolved {
            assert_eq!(
                comment.get_document("userId").unwrap(),
                &doc! { "_id": user_id, "name": "Ann" }
            );
            assert_eq!(
                comment.get_document("bookId").unwrap(),
                &doc! { "_id": book_id, "title": "Dune", "author": "Herbert" }
            );
        }
    }

    #[tokio::test]
    async fn dangling_references_become_null() {
        let store = InMemoryStore::new();
        let comments = vec![doc! {
            "userId": ObjectId::new(),
            "bookId": ObjectId::new(),
            "text": "orphan",
        }];

        let resolved = resolve_references(&store, comments, &REFERENCES)
            .await
            .unwrap();

        assert_eq!(resolved[0].get("userId"), Some(&Bson::Null));
        assert_eq!(resolved[0].get("bookId"), Some(&Bson::Null));
        assert_eq!(resolved[0].get_str("text").unwrap(), "orphan");
    }

    fn bson_now() -> Bson {
        Bson::DateTime(bookshelf_db::bson::DateTime::now())
    }
}
