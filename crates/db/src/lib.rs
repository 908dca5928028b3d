//! Record store for the bookshelf service.
//!
//! Handlers talk to a [`RecordStore`] trait object; [`MongoStore`] backs it in
//! production and [`InMemoryStore`] backs it in tests.

pub mod codec;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod store;

pub use codec::document_to_json;
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use mongo::MongoStore;
pub use store::RecordStore;

/// Re-exported so callers build documents with the driver's own BSON version.
pub use mongodb::bson;
pub use mongodb::bson::{doc, oid::ObjectId, Bson, Document};

/// Name of the identifier field every stored record carries.
pub const ID_FIELD: &str = "_id";
