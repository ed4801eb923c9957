//! # protojs
//!
//! Protocol buffer to JavaScript code generator targeting the `jspb`
//! runtime of `google-protobuf`.
//!
//! ## Features
//!
//! - **Message classes** - Typed accessors, `toObject`/`fromObject` and binary codecs
//! - **Module systems** - Closure, CommonJS, browser globals and ES6 modules
//! - **Output layouts** - One file per input, per dependency cycle, or one library
//! - **Deterministic output** - Same descriptors and options, byte-identical files
//! - **Source annotations** - Optional mapping from generated spans to descriptors
//!
//! ## Quick Start
//!
//! ```ignore
//! use protojs::prelude::*;
//! use std::path::Path;
//!
//! let set = load_file(Path::new("descriptors.json"))?;
//! let options = GenerationOptions::default()
//!     .with_import_style(ImportStyle::CommonJs)
//!     .with_output_dir("out");
//! let generator = Generator::new(&set, options)?;
//! let units = generator.generate(&["shop/order.proto"])?;
//! generator.write(&units)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Descriptor model, JSON loading and linking
//! - [`codegen`] - JavaScript generation

pub mod prelude;

/// Descriptor model, loading and linking.
pub mod schema {
    pub use protojs_schema::*;
}

/// JavaScript code generation.
pub mod codegen {
    pub use protojs_codegen::*;
}

// Re-export commonly used items at the crate root
pub use protojs_codegen::{
    CodegenError, GeneratedUnit, GenerationOptions, Generator, ImportStyle, OutputMode,
    generate_from_file, generate_from_json, write_units,
};
pub use protojs_schema::{SchemaError, SchemaSet, load_file, load_json};
