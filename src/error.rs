use thiserror::Error;

use crate::node::Keyword;
use crate::pool::PoolError;
use crate::reference::ReferenceError;

/// First failure hit while building a schema tree. Every variant names the
/// dotted path of the schema node being parsed, e.g. `(root).address.zip`.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{path}: {context} must be an object")]
    NotAnObject { context: &'static str, path: String },

    #[error("{path}: {keyword} is required")]
    MissingRequiredKeyword { keyword: Keyword, path: String },

    #[error("{path}: {keyword} must be of type {expected}")]
    WrongType {
        keyword: Keyword,
        expected: &'static str,
        path: String,
    },

    #[error("{path}: type `{value}` is invalid")]
    InvalidType { value: String, path: String },

    #[error("{path}: no $ref is allowed in root schema")]
    RefInRoot { path: String },

    #[error("{path}: {source}")]
    Reference {
        path: String,
        #[source]
        source: ReferenceError,
    },

    #[error("{path}: pointer `{pointer}` not found in {document}")]
    PointerNotFound {
        pointer: String,
        document: String,
        path: String,
    },

    #[error("{path}: $ref `{reference}` expands into itself")]
    ReferenceCycle { reference: String, path: String },

    #[error("{path}: {source}")]
    Pool {
        path: String,
        #[source]
        source: PoolError,
    },
}

impl SchemaError {
    /// Dotted path of the schema node the error was raised for.
    pub fn path(&self) -> &str {
        match self {
            SchemaError::NotAnObject { path, .. }
            | SchemaError::MissingRequiredKeyword { path, .. }
            | SchemaError::WrongType { path, .. }
            | SchemaError::InvalidType { path, .. }
            | SchemaError::RefInRoot { path }
            | SchemaError::Reference { path, .. }
            | SchemaError::PointerNotFound { path, .. }
            | SchemaError::ReferenceCycle { path, .. }
            | SchemaError::Pool { path, .. } => path,
        }
    }

    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaError::NotAnObject { .. } => "not_an_object",
            SchemaError::MissingRequiredKeyword { .. } => "missing_required_keyword",
            SchemaError::WrongType { .. } => "wrong_type",
            SchemaError::InvalidType { .. } => "invalid_type",
            SchemaError::RefInRoot { .. } => "ref_in_root",
            SchemaError::Reference { source: ReferenceError::Invalid { .. }, .. } => "invalid_reference",
            SchemaError::Reference { source: ReferenceError::Inheritance { .. }, .. } => {
                "reference_inheritance"
            }
            SchemaError::PointerNotFound { .. } => "pointer_not_found",
            SchemaError::ReferenceCycle { .. } => "reference_cycle",
            SchemaError::Pool { source: PoolError::Decode { .. }, .. } => "decode",
            SchemaError::Pool { .. } => "fetch",
        }
    }
}
