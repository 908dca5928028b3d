//! Post records. The schema is defined for stored documents but no HTTP
//! routes are mounted for it.

use crate::schema::{FieldDefault, FieldKind, FieldRule, Schema};

pub static POST_SCHEMA: Schema = Schema {
    model: "Post",
    fields: &[
        FieldRule::optional("title", FieldKind::Text).with_default(FieldDefault::Text("Example")),
        FieldRule::optional("body", FieldKind::Text),
        FieldRule::required("author", FieldKind::Text).with_alias("a"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test body must be an object"),
        }
    }

    #[test]
    fn title_defaults_to_example() {
        let document = POST_SCHEMA
            .cast_create(&body(json!({ "author": "kim" })))
            .unwrap();

        assert_eq!(document.get_str("title").unwrap(), "Example");
        assert!(!document.contains_key("body"));
    }

    #[test]
    fn author_accepts_short_alias() {
        let document = POST_SCHEMA
            .cast_create(&body(json!({ "a": "kim", "body": "hello" })))
            .unwrap();

        assert_eq!(document.get_str("author").unwrap(), "kim");
        assert_eq!(POST_SCHEMA.field("author").unwrap().alias, Some("a"));
    }

    #[test]
    fn author_is_required() {
        let err = POST_SCHEMA
            .cast_create(&body(json!({ "title": "Hi" })))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Post validation failed: author: Path `author` is required."
        );
    }
}
