//! Error types for code generation.

use protojs_schema::SchemaError;
use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema loading or linking error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or incompatible generation options.
    #[error("configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// A requested file is not part of the schema set.
    #[error("file '{name}' is not part of the schema set")]
    UnknownFile {
        /// Requested file name.
        name: String,
    },

    /// A referenced type cannot be reached from the unit being generated.
    #[error("cannot resolve type '{type_name}' from '{unit}': its defining file is not compiled")]
    UnresolvedType {
        /// Fully-qualified type name.
        type_name: String,
        /// Unit that references the type.
        unit: String,
    },

    /// Generator defect: grouping/edge mismatch or an impossible field shape.
    #[error("internal consistency error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// A default value literal that cannot be rendered for its field type.
    #[error("invalid default value '{value}' for field '{field}'")]
    InvalidDefault {
        /// Fully-qualified field name.
        field: String,
        /// Literal as written in the schema.
        value: String,
    },
}

impl CodegenError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an internal consistency error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an unresolved type error.
    pub fn unresolved(type_name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::UnresolvedType {
            type_name: type_name.into(),
            unit: unit.into(),
        }
    }
}
