//! Generation driver.
//!
//! Plans the output units implied by the options, then renders each unit:
//! header, declaration block, definitions and module trailer.

use crate::error::CodegenError;
use crate::js::{EmitContext, emit_section};
use crate::names::{NameResolver, strip_proto};
use crate::options::{GenerationOptions, ImportStyle, OutputMode};
use crate::order::order_files;
use crate::requires::{UnitContents, UnitSection, compute_requires, render_declarations};
use crate::writer::CodeWriter;
use protojs_schema::{SchemaFile, SchemaMessage, SchemaSet, strongly_connected_components};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// File name relative to the output directory.
    pub name: String,
    /// Rendered JavaScript.
    pub content: String,
    /// Full names of the types the unit defines, in emission order.
    pub types: Vec<String>,
}

/// A unit before rendering.
#[derive(Debug)]
struct PlannedUnit<'a> {
    name: String,
    contents: UnitContents<'a>,
}

/// JavaScript code generator over a linked schema set.
#[derive(Debug)]
pub struct Generator<'a> {
    set: &'a SchemaSet,
    options: GenerationOptions,
}

impl<'a> Generator<'a> {
    /// Creates a generator.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` if the options are incompatible.
    pub fn new(set: &'a SchemaSet, options: GenerationOptions) -> Result<Self, CodegenError> {
        options.validate()?;
        Ok(Self { set, options })
    }

    /// Returns the generation options.
    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generates the units for the requested files.
    ///
    /// Every file the requested files import, directly or transitively, is
    /// part of the compiled closure and may be referenced, but only the
    /// requested files produce output.
    ///
    /// # Arguments
    /// * `files` - Names of the schema files to generate
    ///
    /// # Errors
    /// Returns `CodegenError::UnknownFile` for a name outside the set, and
    /// any resolution, dispatch or default-value error. No partial output is
    /// returned.
    pub fn generate(&self, files: &[&str]) -> Result<Vec<GeneratedUnit>, CodegenError> {
        for name in files {
            if self.set.file(name).is_none() {
                return Err(CodegenError::UnknownFile {
                    name: (*name).to_string(),
                });
            }
        }
        let closure = self.set.transitive_closure(files);
        let resolver = NameResolver::new(self.set, &self.options, &closure);
        let units = self.plan(files)?;
        tracing::debug!(
            "planned {} units for {} files ({} compiled, mode {:?})",
            units.len(),
            files.len(),
            closure.len(),
            self.options.output_mode()
        );
        units
            .iter()
            .map(|unit| self.render_unit(&resolver, unit))
            .collect()
    }

    /// Generates every file of the set.
    ///
    /// # Errors
    /// See [`Generator::generate`].
    pub fn generate_all(&self) -> Result<Vec<GeneratedUnit>, CodegenError> {
        let names: Vec<&str> = self.set.files().iter().map(|f| f.name.as_str()).collect();
        self.generate(&names)
    }

    /// Writes units below the configured `output_dir`.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if a directory or file cannot be written.
    pub fn write(&self, units: &[GeneratedUnit]) -> Result<Vec<PathBuf>, CodegenError> {
        write_units(units, &self.options.output_dir)
    }

    fn file(&self, name: &str) -> Result<&'a SchemaFile, CodegenError> {
        self.set.file(name).ok_or_else(|| CodegenError::UnknownFile {
            name: name.to_string(),
        })
    }

    fn plan(&self, files: &[&str]) -> Result<Vec<PlannedUnit<'a>>, CodegenError> {
        match self.options.output_mode() {
            OutputMode::OneOutputFilePerInputFile => files
                .iter()
                .map(|name| {
                    let file = self.file(name)?;
                    Ok(PlannedUnit {
                        name: format!(
                            "{}{}",
                            strip_proto(&file.name),
                            self.options.file_name_extension()
                        ),
                        contents: UnitContents {
                            sections: vec![UnitSection::whole_file(file)],
                        },
                    })
                })
                .collect(),
            OutputMode::EverythingInOneFile => {
                let mut sections = Vec::new();
                for block in order_files(self.set, files)? {
                    for name in &block {
                        sections.push(UnitSection::whole_file(self.file(name)?));
                    }
                }
                Ok(vec![PlannedUnit {
                    name: format!("{}{}", self.options.library, self.options.extension),
                    contents: UnitContents { sections },
                }])
            }
            OutputMode::OneOutputFilePerScc => {
                let mut units = Vec::new();
                let mut taken = BTreeSet::new();
                for name in files {
                    self.plan_scc_units(self.file(name)?, &mut units, &mut taken);
                }
                Ok(units)
            }
        }
    }

    /// One unit per cycle of top-level messages, one per top-level enum and
    /// one for the file-level extensions. Units follow declaration order.
    fn plan_scc_units(
        &self,
        file: &'a SchemaFile,
        units: &mut Vec<PlannedUnit<'a>>,
        taken: &mut BTreeSet<String>,
    ) {
        let index: HashMap<&str, usize> = file
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| (m.full_name.as_str(), i))
            .collect();
        let edges: Vec<Vec<usize>> = file
            .messages
            .iter()
            .map(|message| {
                let mut referenced = BTreeSet::new();
                collect_references(message, &mut referenced);
                referenced
                    .iter()
                    .filter_map(|name| self.set.top_level_name(name))
                    .filter_map(|top| index.get(top.as_str()).copied())
                    .collect()
            })
            .collect();

        let mut components = strongly_connected_components(&edges);
        components.sort_by_key(|component| component.first().copied());
        for component in components {
            let messages: Vec<&'a SchemaMessage> =
                component.iter().map(|&i| &file.messages[i]).collect();
            let Some(representative) = messages.first() else {
                continue;
            };
            let mut section = UnitSection::empty(file);
            let name = self.scc_unit_name(&representative.full_name, taken);
            section.messages = messages;
            units.push(PlannedUnit {
                name,
                contents: UnitContents {
                    sections: vec![section],
                },
            });
        }
        for enumeration in &file.enums {
            let mut section = UnitSection::empty(file);
            section.enums.push(enumeration);
            units.push(PlannedUnit {
                name: self.scc_unit_name(&enumeration.full_name, taken),
                contents: UnitContents {
                    sections: vec![section],
                },
            });
        }
        if !file.extensions.is_empty() {
            let mut section = UnitSection::empty(file);
            section.extensions = file.extensions.iter().collect();
            let stem = format!("{}_extensions", strip_proto(&file.name));
            units.push(PlannedUnit {
                name: self.claim_unit_name(stem, taken),
                contents: UnitContents {
                    sections: vec![section],
                },
            });
        }
    }

    /// `proto.shop.Order` becomes `proto/shop/order.js`.
    fn scc_unit_name(&self, full_name: &str, taken: &mut BTreeSet<String>) -> String {
        let stem = format!("{}.{}", self.options.namespace_prefix, full_name)
            .to_lowercase()
            .replace('.', "/");
        self.claim_unit_name(stem, taken)
    }

    /// Appends the extension to `stem`, adding `_<n>` when the name is
    /// already used by another unit of the run.
    fn claim_unit_name(&self, stem: String, taken: &mut BTreeSet<String>) -> String {
        let mut name = format!("{stem}{}", self.options.extension);
        let mut n = 1;
        while taken.contains(&name) {
            name = format!("{stem}_{n}{}", self.options.extension);
            n += 1;
        }
        if n > 1 {
            tracing::debug!("unit name {stem}{} is taken, using {name}", self.options.extension);
        }
        taken.insert(name.clone());
        name
    }

    fn render_unit<'r>(
        &self,
        resolver: &'r NameResolver<'r>,
        unit: &PlannedUnit<'r>,
    ) -> Result<GeneratedUnit, CodegenError> {
        let sets = compute_requires(self.set, &unit.contents, &self.options);
        let names = resolver.for_unit(&unit.name, unit.contents.single_file(), &sets.required)?;
        let mut w = CodeWriter::new(self.options.annotate_code);

        self.write_header(&mut w, &unit.contents);
        render_declarations(&mut w, &unit.contents, &sets, &names, &self.options)?;
        for section in &unit.contents.sections {
            let ctx = EmitContext {
                set: self.set,
                options: &self.options,
                names: &names,
                file: section.file,
            };
            emit_section(&ctx, section, &mut w)?;
        }

        match self.options.import_style {
            ImportStyle::CommonJs => {
                if let Some(file) = unit.contents.single_file() {
                    w.push_str(&format!(
                        "goog.object.extend(exports, {});\n",
                        resolver.namespace(file)
                    ));
                }
            }
            ImportStyle::CommonJsStrict => {
                let root = resolver.prefix().split('.').next().unwrap_or("proto");
                w.push_str(&format!("goog.object.extend(exports, {root});\n"));
            }
            ImportStyle::Closure | ImportStyle::Browser | ImportStyle::Es6 => {}
        }

        tracing::debug!(
            "rendered unit {} ({} required, {} forward-declared)",
            unit.name,
            sets.required.len(),
            sets.forwards.len()
        );
        Ok(GeneratedUnit {
            name: unit.name.clone(),
            content: w.finish(),
            types: defined_types(&unit.contents),
        })
    }

    fn write_header(&self, w: &mut CodeWriter, contents: &UnitContents<'_>) {
        let mut sources = Vec::new();
        for section in &contents.sections {
            if !sources.contains(&section.file.name.as_str()) {
                sources.push(section.file.name.as_str());
            }
        }
        for source in sources {
            w.push_str(&format!("// source: {source}\n"));
        }
        w.push_str(
            "/**\n * @fileoverview\n * @enhanceable\n \
             * @suppress {missingRequire} reports error on implicit type usages.\n \
             * @suppress {messageConventions} JS Compiler reports an error if a variable or\n \
             *     field starts with 'MSG_' and isn't a translatable message.\n \
             * @public\n */\n// GENERATED CODE -- DO NOT EDIT!\n",
        );
        if self.options.import_style != ImportStyle::Closure {
            w.push_str("/* eslint-disable */\n// @ts-nocheck\n");
        }
        w.push_str("\n");
    }
}

/// Type names referenced by a message's fields, nested messages and
/// extensions, including extendees.
fn collect_references(message: &SchemaMessage, out: &mut BTreeSet<String>) {
    for field in message.fields.iter().chain(&message.extensions) {
        if let Some(name) = field.field_type.type_name() {
            out.insert(name.to_string());
        }
        if let Some(extendee) = &field.extendee {
            out.insert(extendee.clone());
        }
    }
    for nested in &message.nested {
        collect_references(nested, out);
    }
}

/// Full names of the types a unit defines, in emission order.
fn defined_types(contents: &UnitContents<'_>) -> Vec<String> {
    fn visit(message: &SchemaMessage, out: &mut Vec<String>) {
        if message.map_entry {
            return;
        }
        out.push(message.full_name.clone());
        out.extend(message.enums.iter().map(|e| e.full_name.clone()));
        for nested in &message.nested {
            visit(nested, out);
        }
    }
    let mut out = Vec::new();
    for section in &contents.sections {
        for message in &section.messages {
            visit(message, &mut out);
        }
        out.extend(section.enums.iter().map(|e| e.full_name.clone()));
    }
    out
}

/// Writes units below `dir`, creating intermediate directories.
///
/// # Arguments
/// * `units` - Units to write
/// * `dir` - Output directory
///
/// # Returns
/// Paths of the written files.
///
/// # Errors
/// Returns `CodegenError::Io` if a directory or file cannot be written.
pub fn write_units(units: &[GeneratedUnit], dir: &Path) -> Result<Vec<PathBuf>, CodegenError> {
    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = dir.join(&unit.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &unit.content)?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
