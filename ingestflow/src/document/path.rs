//! Dotted-path parsing helpers for document field access.

use crate::errors::DocumentError;
use serde_json::Value;

/// Splits a dotted path into its segments.
///
/// Rejects empty paths and paths with empty segments (leading, trailing, or
/// doubled dots).
pub(crate) fn split(path: &str) -> Result<Vec<&str>, DocumentError> {
    if path.is_empty() {
        return Err(DocumentError::invalid_path(path, "path is empty"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(DocumentError::invalid_path(path, "path contains an empty segment"));
    }
    Ok(segments)
}

/// Interprets a path segment as a sequence index.
///
/// A segment that is not a base-ten integer cannot address a sequence.
pub(crate) fn parse_index(segment: &str, path: &str) -> Result<usize, DocumentError> {
    segment
        .parse::<usize>()
        .map_err(|_| DocumentError::type_conflict(path, segment, "array"))
}

/// A short name for a JSON value's shape, used in error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
