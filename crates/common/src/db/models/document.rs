//! Schemaless documents as persisted in the JSONB collections

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A JSON object as stored in a collection
pub type Document = Map<String, Value>;

/// Key generated by the store when a document is inserted
pub type DocumentId = Uuid;

/// Field under which the generated key is exposed to readers
pub const ID_FIELD: &str = "_id";

/// A document together with the key the store generated for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub document: Document,
}

impl StoredDocument {
    /// Flatten into a single object with the key under `_id`, first.
    pub fn into_row(self) -> Document {
        let mut row = Document::with_capacity(self.document.len() + 1);
        row.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        for (field, value) in self.document {
            if field != ID_FIELD {
                row.insert(field, value);
            }
        }
        row
    }
}

/// Serialize any value that must become a top-level JSON object
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::InvalidFormat {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
