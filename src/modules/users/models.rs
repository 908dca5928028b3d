use crate::modules::resource::Resource;
use crate::schema::{FieldDefault, FieldKind, FieldRule, Schema};

pub static USER_SCHEMA: Schema = Schema {
    model: "User",
    fields: &[
        FieldRule::required("name", FieldKind::Text),
        FieldRule::optional("joined", FieldKind::Date).with_default(FieldDefault::Now),
    ],
};

pub static USERS: Resource = Resource {
    collection: "users",
    schema: &USER_SCHEMA,
};
