//! # protojs Codegen
//!
//! JavaScript code generation from protocol buffer descriptors.
//!
//! This crate provides:
//! - Message classes with accessors, object conversion and binary codecs
//! - Enum constant tables and extension field registration
//! - Closure, CommonJS, browser and ES6 module output
//! - Per-file, per-cycle and single-library output units
//! - Optional source annotations for generated code

pub mod annotations;
pub mod error;
pub mod generator;
pub mod js;
pub mod names;
pub mod options;
pub mod order;
pub mod requires;
pub mod writer;

pub use error::CodegenError;
pub use generator::{GeneratedUnit, Generator, write_units};
pub use options::{GenerationOptions, ImportStyle, OutputMode};

/// Generates JavaScript from a JSON descriptor document.
///
/// # Arguments
/// * `json` - Descriptor document content
/// * `files` - Names of the files to generate; empty generates every file
/// * `options` - Generation options
///
/// # Returns
/// The generated units.
///
/// # Errors
/// Returns `CodegenError` if loading, validation or generation fails.
pub fn generate_from_json(
    json: &str,
    files: &[&str],
    options: GenerationOptions,
) -> Result<Vec<GeneratedUnit>, CodegenError> {
    let set = protojs_schema::load_json(json)?;
    let generator = Generator::new(&set, options)?;
    if files.is_empty() {
        generator.generate_all()
    } else {
        generator.generate(files)
    }
}

/// Generates JavaScript from a JSON descriptor file.
///
/// # Arguments
/// * `path` - Path to the descriptor document
/// * `files` - Names of the files to generate; empty generates every file
/// * `options` - Generation options
///
/// # Returns
/// The generated units.
///
/// # Errors
/// Returns `CodegenError` if reading, loading, validation or generation
/// fails.
pub fn generate_from_file(
    path: &std::path::Path,
    files: &[&str],
    options: GenerationOptions,
) -> Result<Vec<GeneratedUnit>, CodegenError> {
    let json = std::fs::read_to_string(path)?;
    generate_from_json(&json, files, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
      "files": [
        {
          "name": "shop/item.proto",
          "package": "shop",
          "syntax": "proto3",
          "messages": [
            { "name": "Item", "fields": [ { "name": "sku", "number": 1, "type": "string" } ] }
          ]
        },
        {
          "name": "shop/order.proto",
          "package": "shop",
          "syntax": "proto3",
          "dependencies": ["shop/item.proto"],
          "messages": [
            {
              "name": "Order",
              "fields": [
                { "name": "id", "number": 1, "type": "string" },
                { "name": "items", "number": 2, "label": "repeated",
                  "type": { "message": ".shop.Item" } }
              ]
            }
          ]
        }
      ]
    }"#;

    #[test]
    fn test_generate_from_json_commonjs() {
        let options = GenerationOptions::default()
            .with_import_style(ImportStyle::CommonJs)
            .with_binary(true);
        let units = generate_from_json(DOC, &["shop/order.proto"], options).expect("Failed to generate");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "shop/order_pb.js");
        assert!(units[0].content.contains("var shop_item_pb = require('../shop/item_pb.js');"));
        assert!(units[0].content.contains("proto.shop.Order.prototype.addItems = function(opt_value, opt_index)"));
    }

    #[test]
    fn test_generate_all_files() {
        let options = GenerationOptions::default().with_import_style(ImportStyle::Es6);
        let units = generate_from_json(DOC, &[], options).expect("Failed to generate");
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["shop/item_pb.js", "shop/order_pb.js"]);
    }

    #[test]
    fn test_generate_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("descriptors.json");
        std::fs::write(&path, DOC).expect("Failed to write descriptors");

        let options = GenerationOptions::default().with_one_output_file_per_input_file(true);
        let units = generate_from_file(&path, &["shop/item.proto"], options).expect("Failed to generate");
        assert_eq!(units[0].name, "shop/item.js");
        assert!(units[0].content.contains("goog.provide('proto.shop.Item');"));

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            generate_from_file(&missing, &[], GenerationOptions::default()),
            Err(CodegenError::Io(_))
        ));
    }

    #[test]
    fn test_broken_reference_is_schema_error() {
        let doc = r#"{ "files": [ { "name": "a.proto", "package": "a", "messages": [
            { "name": "A", "fields": [ { "name": "b", "number": 1, "type": { "message": ".a.B" } } ] } ] } ] }"#;
        assert!(matches!(
            generate_from_json(doc, &[], GenerationOptions::default()),
            Err(CodegenError::Schema(_))
        ));
    }
}
