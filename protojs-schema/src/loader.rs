//! JSON descriptor loading.
//!
//! The descriptor document mirrors the shape of a `FileDescriptorSet`:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "name": "shop/order.proto",
//!       "package": "shop",
//!       "syntax": "proto3",
//!       "dependencies": ["shop/item.proto"],
//!       "messages": [
//!         {
//!           "name": "Order",
//!           "fields": [
//!             { "name": "id", "number": 1, "type": "string" },
//!             { "name": "items", "number": 2, "label": "repeated",
//!               "type": { "message": ".shop.Item" } }
//!           ]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::SchemaError;
use crate::file::SchemaFile;
use crate::set::SchemaSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level descriptor document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorDocument {
    /// Files in dependency-agnostic order.
    pub files: Vec<SchemaFile>,
}

/// Loads and links a schema set from a JSON descriptor document.
///
/// # Errors
/// Returns `SchemaError` if decoding, linking or reference checks fail.
pub fn load_json(json: &str) -> Result<SchemaSet, SchemaError> {
    let document: DescriptorDocument = serde_json::from_str(json)?;
    tracing::debug!("decoded descriptor document with {} files", document.files.len());
    SchemaSet::new(document.files)
}

/// Loads and links a schema set from a JSON descriptor file.
///
/// # Errors
/// Returns `SchemaError` if reading, decoding, linking or reference checks
/// fail.
pub fn load_file(path: &Path) -> Result<SchemaSet, SchemaError> {
    let json = std::fs::read_to_string(path)?;
    load_json(&json)
}

impl SchemaSet {
    /// Loads and links a schema set from a JSON descriptor document.
    ///
    /// # Errors
    /// See [`load_json`].
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        load_json(json)
    }
}
