//! Presence validation for raw API records
//!
//! Collection endpoints return schemaless JSON objects; before a record can
//! contribute to the report we check that its required fields are present
//! and non-null. Validation is deliberately shallow: a field that exists
//! with a falsy value (`0`, `""`, `false`) passes, only absence and JSON
//! `null` fail.

use crate::types::Record;
use serde_json::Value;

/// Fields a user record must carry to participate in the report
pub const USER_REQUIRED_FIELDS: &[&str] = &["id", "name"];

/// Fields a post record must carry to participate in the report
pub const POST_REQUIRED_FIELDS: &[&str] = &["id", "title"];

/// Fields a comment record must carry to participate in the report
pub const COMMENT_REQUIRED_FIELDS: &[&str] = &["id", "body", "email"];

/// Check that a record carries every required field with a non-null value
///
/// Logs a warning naming the first offending field and returns `false`;
/// the caller decides what skipping the record means.
pub fn validate_record(record: &Record, required: &[&str]) -> bool {
    for field in required {
        let missing = match record.get(*field) {
            None | Some(Value::Null) => true,
            Some(_) => false,
        };
        if missing {
            tracing::warn!(
                field = *field,
                record = ?record,
                "Validation failed: missing or invalid field"
            );
            return false;
        }
    }
    true
}
