//! Error types for descriptor loading and linking.

use thiserror::Error;

/// Error type for schema loading and reference checking.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// JSON decoding error.
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Duplicate definition.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (file, message, enum).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// Unknown type reference.
    #[error("unknown type '{type_name}' referenced by field '{field}'")]
    UnknownType {
        /// Referenced type name.
        type_name: String,
        /// Fully-qualified field name.
        field: String,
    },

    /// A field references a type of the wrong kind.
    #[error("field '{field}' expects {expected} type but '{type_name}' is not one")]
    KindMismatch {
        /// Referenced type name.
        type_name: String,
        /// Fully-qualified field name.
        field: String,
        /// Expected kind ("message" or "enum").
        expected: String,
    },

    /// A file depends on a file that is not part of the set.
    #[error("file '{file}' depends on '{dependency}', which is not loaded")]
    MissingDependency {
        /// Depending file.
        file: String,
        /// Missing dependency.
        dependency: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl SchemaError {
    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
