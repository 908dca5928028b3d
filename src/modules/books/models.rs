use crate::modules::resource::Resource;
use crate::schema::{FieldKind, FieldRule, Schema};

/// Field rules for stored books.
pub static BOOK_SCHEMA: Schema = Schema {
    model: "Book",
    fields: &[
        FieldRule::required("title", FieldKind::Text),
        FieldRule::optional("author", FieldKind::Text),
        FieldRule::optional("publishedYear", FieldKind::Number),
        FieldRule::optional("pages", FieldKind::Number),
        FieldRule::optional("genre", FieldKind::Text),
    ],
};

pub static BOOKS: Resource = Resource {
    collection: "books",
    schema: &BOOK_SCHEMA,
};
