//! File-level descriptor definition.

use crate::messages::{SchemaEnum, SchemaField, SchemaMessage};
use crate::types::Syntax;
use serde::{Deserialize, Serialize};

/// One schema file: a package, its top-level definitions and the files it
/// imports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    /// File name, relative to the import root (`foo/bar.proto`).
    pub name: String,
    /// Package name, possibly empty.
    #[serde(default)]
    pub package: String,
    /// Declared syntax.
    #[serde(default)]
    pub syntax: Syntax,
    /// Names of directly imported files.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Top-level messages.
    #[serde(default)]
    pub messages: Vec<SchemaMessage>,
    /// Top-level enums.
    #[serde(default)]
    pub enums: Vec<SchemaEnum>,
    /// File-level extensions.
    #[serde(default)]
    pub extensions: Vec<SchemaField>,
}

impl SchemaFile {
    /// Creates an empty proto2 file.
    #[must_use]
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            ..Self::default()
        }
    }

    /// Sets the file syntax.
    #[must_use]
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Adds an imported file.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Adds a top-level message.
    #[must_use]
    pub fn with_message(mut self, message: SchemaMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Adds a top-level enum.
    #[must_use]
    pub fn with_enum(mut self, enumeration: SchemaEnum) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// Adds a file-level extension.
    #[must_use]
    pub fn with_extension(mut self, field: SchemaField) -> Self {
        self.extensions.push(field);
        self
    }

    /// Returns the fully-qualified name of a top-level definition.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        if self.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.package, name)
        }
    }

    /// Returns true if the file defines no messages, enums or extensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.enums.is_empty() && self.extensions.is_empty()
    }
}
