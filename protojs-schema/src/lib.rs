//! # protojs Schema
//!
//! Protocol buffer descriptor model for JavaScript code generation.
//!
//! This crate provides:
//! - Descriptor types for files, messages, fields, oneofs and enums
//! - JSON descriptor loading
//! - Linking and fully-qualified name lookup
//! - Reference validation
//! - Strongly-connected component grouping for dependency graphs

pub mod error;
pub mod file;
pub mod graph;
pub mod loader;
pub mod messages;
pub mod set;
pub mod types;
pub mod validation;

pub use error::SchemaError;
pub use file::SchemaFile;
pub use graph::strongly_connected_components;
pub use loader::{DescriptorDocument, load_file, load_json};
pub use messages::{EnumValue, ExtensionRange, SchemaEnum, SchemaField, SchemaMessage, SchemaOneof};
pub use set::SchemaSet;
pub use types::{FieldType, JsType, Label, Syntax};
pub use validation::validate_set;
