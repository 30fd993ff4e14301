//! Core data types shared across the crate

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// A raw JSON object as returned by the upstream API
///
/// Records stay schemaless until validation: collection endpoints return
/// arrays of objects and we only commit to field types once the required
/// fields have been checked.
pub type Record = serde_json::Map<String, Value>;

/// Identifier of a user record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a post record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(pub i64);

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the final CSV report
///
/// Field declaration order doubles as the CSV column order; the writer
/// derives the header from the serialized field names.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    /// Id of the user who wrote the post
    pub user_id: i64,
    /// Full name of the user
    pub user_name: String,
    /// Id of the post the comment belongs to
    pub post_id: i64,
    /// Title of the post
    pub post_title: String,
    /// Id of the comment
    pub comment_id: i64,
    /// Body text of the comment
    pub comment_body: String,
    /// Email address of the comment author
    pub comment_author_email: String,
}

/// Outcome of a completed report run
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Number of users that passed the even-id filter
    pub qualifying_users: usize,
    /// Number of rows assembled for the report
    pub rows: usize,
    /// Where the CSV landed, or `None` when no rows were produced
    pub output: Option<PathBuf>,
}

/// Read an integer field from a record, tolerating JSON numbers only
pub(crate) fn field_i64(record: &Record, field: &str) -> Option<i64> {
    record.get(field).and_then(Value::as_i64)
}

/// Read a string field from a record
pub(crate) fn field_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    #[test]
    fn ids_display_as_bare_numbers() {
        assert_eq!(UserId(4).to_string(), "4");
        assert_eq!(PostId(17).to_string(), "17");
        assert_eq!(UserId::from(4), UserId(4));
        assert_eq!(PostId::from(17), PostId(17));
    }

    #[test]
    fn field_i64_reads_integers_and_rejects_other_types() {
        let rec = record(json!({"id": 3, "name": "Ann", "score": 1.5}));

        assert_eq!(field_i64(&rec, "id"), Some(3));
        assert_eq!(field_i64(&rec, "name"), None);
        assert_eq!(field_i64(&rec, "score"), None);
        assert_eq!(field_i64(&rec, "missing"), None);
    }

    #[test]
    fn field_str_reads_strings_only() {
        let rec = record(json!({"name": "Ann", "id": 3, "note": null}));

        assert_eq!(field_str(&rec, "name"), Some("Ann"));
        assert_eq!(field_str(&rec, "id"), None);
        assert_eq!(field_str(&rec, "note"), None);
    }

    #[test]
    fn report_row_column_order_follows_field_declaration() {
        let row = ReportRow {
            user_id: 2,
            user_name: "Ervin Howell".to_string(),
            post_id: 11,
            post_title: "et ea vero".to_string(),
            comment_id: 55,
            comment_body: "nihil".to_string(),
            comment_author_email: "a@b.example".to_string(),
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&row).unwrap();
        let rendered = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert!(rendered.starts_with(
            "user_id,user_name,post_id,post_title,comment_id,comment_body,comment_author_email\n"
        ));
        assert!(rendered.ends_with("2,Ervin Howell,11,et ea vero,55,nihil,a@b.example\n"));
    }
}
