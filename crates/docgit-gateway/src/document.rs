//! Documents as exchanged with the database.

use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};

/// A JSON object as stored in a collection.
pub type Document = Map<String, Value>;

/// Borrow a string field, failing with `InvalidDocument` if absent.
pub fn str_field<'a>(doc: &'a Document, field: &str) -> GatewayResult<&'a str> {
    doc.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::InvalidDocument(format!("missing string field `{field}`")))
}
