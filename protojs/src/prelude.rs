//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types.
//!
//! ```ignore
//! use protojs::prelude::*;
//! ```

// Schema types
pub use protojs_schema::{
    FieldType, JsType, Label, SchemaEnum, SchemaError, SchemaField, SchemaFile, SchemaMessage,
    SchemaSet, Syntax, load_file, load_json,
};

// Codegen types
pub use protojs_codegen::{
    CodegenError, GeneratedUnit, GenerationOptions, Generator, ImportStyle, OutputMode,
    write_units,
};
