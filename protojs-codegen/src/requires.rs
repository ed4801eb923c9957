//! Namespace dependency analysis.
//!
//! For one output unit, the analyzer walks every field the unit's messages
//! and extensions declare and partitions the referenced types into three
//! disjoint sets: types the unit defines (*provided*), types it needs at
//! runtime (*required*) and types it only mentions (*forward-declared*).
//! The sets are then rendered as the declaration block of the module system.

use crate::error::CodegenError;
use crate::names::{TypeNames, import_path, module_alias};
use crate::options::{GenerationOptions, ImportStyle};
use crate::writer::CodeWriter;
use protojs_schema::{FieldType, SchemaEnum, SchemaField, SchemaFile, SchemaMessage, SchemaSet};
use std::collections::BTreeSet;

/// Definitions one source file contributes to a unit.
#[derive(Debug, Clone)]
pub struct UnitSection<'a> {
    /// Defining file.
    pub file: &'a SchemaFile,
    /// Top-level messages; nested types come along with their parent.
    pub messages: Vec<&'a SchemaMessage>,
    /// Top-level enums.
    pub enums: Vec<&'a SchemaEnum>,
    /// File-level extensions.
    pub extensions: Vec<&'a SchemaField>,
}

impl<'a> UnitSection<'a> {
    /// Creates a section holding every top-level definition of `file`.
    #[must_use]
    pub fn whole_file(file: &'a SchemaFile) -> Self {
        Self {
            file,
            messages: file.messages.iter().collect(),
            enums: file.enums.iter().collect(),
            extensions: file.extensions.iter().collect(),
        }
    }

    /// Creates an empty section for `file`.
    #[must_use]
    pub fn empty(file: &'a SchemaFile) -> Self {
        Self {
            file,
            messages: Vec::new(),
            enums: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

/// The definitions emitted into one unit, grouped by source file.
#[derive(Debug, Clone, Default)]
pub struct UnitContents<'a> {
    /// Sections in emission order.
    pub sections: Vec<UnitSection<'a>>,
}

impl<'a> UnitContents<'a> {
    /// Returns the source file of a single-file unit.
    #[must_use]
    pub fn single_file(&self) -> Option<&'a SchemaFile> {
        match self.sections.as_slice() {
            [section] => Some(section.file),
            _ => None,
        }
    }

    /// Returns every extension the unit defines, message-scoped ones first.
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&'a SchemaField> {
        let mut out = Vec::new();
        for section in &self.sections {
            for message in &section.messages {
                collect_message_extensions(message, &mut out);
            }
            out.extend(section.extensions.iter().copied());
        }
        out
    }
}

fn collect_message_extensions<'a>(message: &'a SchemaMessage, out: &mut Vec<&'a SchemaField>) {
    out.extend(message.extensions.iter());
    for nested in &message.nested {
        collect_message_extensions(nested, out);
    }
}

/// Provide/require partition of one unit. All type sets hold fully-qualified
/// schema names; `runtime` holds runtime library symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireSets {
    /// Types defined by the unit.
    pub provided: BTreeSet<String>,
    /// Types that must be imported.
    pub required: BTreeSet<String>,
    /// Types that are only forward-declared.
    pub forwards: BTreeSet<String>,
    /// Runtime symbols the unit uses.
    pub runtime: BTreeSet<&'static str>,
}

/// Computes the provide/require partition of a unit.
///
/// Message and group fields are required; enum fields are required only
/// with `add_require_for_enums`, and forward-declared otherwise. Map fields
/// follow the rule of their value type. Extensions require the message they
/// extend. A type that is both required and forward-declarable is required.
#[must_use]
pub fn compute_requires(
    set: &SchemaSet,
    contents: &UnitContents<'_>,
    options: &GenerationOptions,
) -> RequireSets {
    let mut walker = RequireWalker {
        set,
        enums_required: options.add_require_for_enums,
        sets: RequireSets::default(),
        have_message: false,
        have_extension: false,
        have_map: false,
    };

    for section in &contents.sections {
        for message in &section.messages {
            walker.walk_message(message);
        }
        for enumeration in &section.enums {
            walker.sets.provided.insert(enumeration.full_name.clone());
        }
        for ext in &section.extensions {
            walker.have_extension = true;
            if let Some(extendee) = &ext.extendee {
                walker.sets.required.insert(extendee.clone());
            }
            // A file-level extension of enum type needs no import.
            if ext.field_type.is_message() {
                if let Some(name) = ext.field_type.type_name() {
                    walker.sets.required.insert(name.to_string());
                }
            }
        }
    }

    walker.finish()
}

struct RequireWalker<'s> {
    set: &'s SchemaSet,
    enums_required: bool,
    sets: RequireSets,
    have_message: bool,
    have_extension: bool,
    have_map: bool,
}

impl RequireWalker<'_> {
    fn walk_message(&mut self, message: &SchemaMessage) {
        if message.map_entry {
            return;
        }
        self.have_message = true;
        self.sets.provided.insert(message.full_name.clone());
        for enumeration in &message.enums {
            self.sets.provided.insert(enumeration.full_name.clone());
        }
        for field in &message.fields {
            self.add_field(field);
        }
        for ext in &message.extensions {
            self.have_extension = true;
            if let Some(extendee) = &ext.extendee {
                self.sets.required.insert(extendee.clone());
            }
            self.add_field(ext);
        }
        for nested in &message.nested {
            self.walk_message(nested);
        }
    }

    fn add_field(&mut self, field: &SchemaField) {
        if let Some(entry) = self.set.map_entry(field) {
            self.have_map = true;
            if let Some(value) = entry.map_value() {
                self.add_type(&value.field_type);
            }
            return;
        }
        self.add_type(&field.field_type);
    }

    fn add_type(&mut self, field_type: &FieldType) {
        match field_type {
            FieldType::Message(name) | FieldType::Group(name) => {
                self.sets.required.insert(name.clone());
            }
            FieldType::Enum(name) if self.enums_required => {
                self.sets.required.insert(name.clone());
            }
            FieldType::Enum(name) => {
                self.sets.forwards.insert(name.clone());
            }
            _ => {}
        }
    }

    fn finish(mut self) -> RequireSets {
        let provided = &self.sets.provided;
        self.sets.required.retain(|name| !provided.contains(name));
        let required = &self.sets.required;
        self.sets
            .forwards
            .retain(|name| !provided.contains(name) && !required.contains(name));

        if self.have_message {
            self.sets.runtime.extend(["jspb.BinaryReader", "jspb.BinaryWriter", "jspb.Message"]);
        }
        if self.have_extension {
            self.sets
                .runtime
                .extend(["jspb.ExtensionFieldBinaryInfo", "jspb.ExtensionFieldInfo"]);
        }
        if self.have_map {
            self.sets.runtime.insert("jspb.Map");
        }
        self.sets
    }
}

/// Renders the declaration block of a unit: provides, imports and exported
/// symbols, according to the module system.
///
/// # Errors
/// Returns `CodegenError::UnresolvedType` when a referenced type has no
/// expression in this unit.
pub fn render_declarations(
    w: &mut CodeWriter,
    contents: &UnitContents<'_>,
    sets: &RequireSets,
    names: &TypeNames<'_>,
    options: &GenerationOptions,
) -> Result<(), CodegenError> {
    let provided = provided_symbols(contents, sets, names)?;

    match options.import_style {
        ImportStyle::Closure => {
            for symbol in &provided {
                w.push_str(&format!("goog.provide('{symbol}');\n"));
            }
            w.push_str("\n");
            if options.testonly {
                w.push_str("goog.setTestOnly();\n\n");
            }
            let mut required: BTreeSet<String> =
                sets.runtime.iter().map(|s| s.to_string()).collect();
            for name in &sets.required {
                required.insert(names.resolve(name)?);
            }
            for symbol in &required {
                w.push_str(&format!("goog.require('{symbol}');\n"));
            }
            let mut forwards = BTreeSet::new();
            for name in &sets.forwards {
                forwards.insert(names.resolve(name)?);
            }
            for symbol in &forwards {
                w.push_str(&format!("goog.forwardDeclare('{symbol}');\n"));
            }
            w.push_str("\n");
        }
        ImportStyle::CommonJs | ImportStyle::CommonJsStrict => {
            let strict = options.import_style == ImportStyle::CommonJsStrict;
            let root = names.resolver().prefix().split('.').next().unwrap_or("proto");
            w.push_str("var jspb = require('google-protobuf');\n");
            w.push_str("var goog = jspb;\n");
            if strict {
                w.push_str(&format!("var {root} = {{}};\n\n"));
            } else {
                w.push_str(
                    "var global =\n    (typeof globalThis !== 'undefined' && globalThis) ||\n    \
                     (typeof window !== 'undefined' && window) ||\n    \
                     (typeof global !== 'undefined' && global) ||\n    \
                     (typeof self !== 'undefined' && self) ||\n    \
                     (function () { return this; }).call(null) ||\n    \
                     Function('return this')();\n\n",
                );
            }
            let mut deps = BTreeSet::new();
            for section in &contents.sections {
                deps.extend(section.file.dependencies.iter().map(String::as_str));
            }
            let from = contents
                .single_file()
                .map(|f| f.name.as_str())
                .unwrap_or_default();
            for dep in deps {
                let alias = module_alias(dep);
                w.push_str(&format!(
                    "var {alias} = require('{}');\n",
                    import_path(from, dep)
                ));
                w.push_str(&format!("goog.object.extend({root}, {alias});\n"));
            }
            for symbol in &provided {
                if strict {
                    let relative = symbol
                        .strip_prefix(root)
                        .and_then(|s| s.strip_prefix('.'))
                        .unwrap_or(symbol);
                    w.push_str(&format!("goog.exportSymbol('{relative}', null, {root});\n"));
                } else {
                    w.push_str(&format!("goog.exportSymbol('{symbol}', null, global);\n"));
                }
            }
            w.push_str("\n");
        }
        ImportStyle::Browser => {
            for symbol in &provided {
                w.push_str(&format!("goog.exportSymbol('{symbol}', null, goog.global);\n"));
            }
            w.push_str("\n");
        }
        ImportStyle::Es6 => {
            w.push_str("import * as jspb from 'google-protobuf';\n");
            let from = contents
                .single_file()
                .map(|f| f.name.as_str())
                .unwrap_or_default();
            for import in names.imports() {
                let bindings: Vec<String> = import
                    .bindings
                    .iter()
                    .map(|(exported, local)| {
                        if exported == local {
                            exported.clone()
                        } else {
                            format!("{exported} as {local}")
                        }
                    })
                    .collect();
                w.push_str(&format!(
                    "import {{ {} }} from '{}';\n",
                    bindings.join(", "),
                    import_path(from, &import.file)
                ));
            }
            w.push_str("\n");
        }
    }
    Ok(())
}

/// Returns the sorted expressions of every symbol the unit defines: types
/// and extensions.
fn provided_symbols(
    contents: &UnitContents<'_>,
    sets: &RequireSets,
    names: &TypeNames<'_>,
) -> Result<BTreeSet<String>, CodegenError> {
    let mut symbols = BTreeSet::new();
    for name in &sets.provided {
        symbols.insert(names.resolve(name)?);
    }
    for ext in contents.all_extensions() {
        symbols.insert(names.extension(ext)?);
    }
    Ok(symbols)
}
