use crate::modules::resource::Resource;
use crate::schema::{FieldDefault, FieldKind, FieldRule, Schema};

pub static COMMENT_SCHEMA: Schema = Schema {
    model: "Comment",
    fields: &[
        FieldRule::required("userId", FieldKind::ObjectId),
        FieldRule::required("bookId", FieldKind::ObjectId),
        FieldRule::required("text", FieldKind::Text),
        FieldRule::optional("createdAt", FieldKind::Date).with_default(FieldDefault::Now),
    ],
};

pub static COMMENTS: Resource = Resource {
    collection: "comments",
    schema: &COMMENT_SCHEMA,
};

/// A reference field replaced at read time by a projection of its target.
#[derive(Debug)]
pub struct Reference {
    pub field: &'static str,
    pub collection: &'static str,
    pub projection: &'static [&'static str],
}

pub static REFERENCES: [Reference; 2] = [
    Reference {
        field: "userId",
        collection: "users",
        projection: &["name"],
    },
    Reference {
        field: "bookId",
        collection: "books",
        projection: &["title", "author"],
    },
];
