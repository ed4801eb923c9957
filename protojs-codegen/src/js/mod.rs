//! JavaScript emission for messages, enums and extensions.
//!
//! Closure-family output assigns methods onto dotted constructor paths;
//! ES6 output renders the same members inside `class` bodies with static
//! data assigned after the class.

pub mod enums;
pub mod extensions;
pub mod fields;
pub mod messages;

use crate::error::CodegenError;
use crate::names::TypeNames;
use crate::options::GenerationOptions;
use crate::requires::UnitSection;
use crate::writer::CodeWriter;
use protojs_schema::{SchemaFile, SchemaSet};

/// Everything an emitter needs while rendering one section of a unit.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    /// Schema set of the run.
    pub set: &'a SchemaSet,
    /// Generation options.
    pub options: &'a GenerationOptions,
    /// Name view of the unit being rendered.
    pub names: &'a TypeNames<'a>,
    /// Source file of the section.
    pub file: &'a SchemaFile,
}

impl EmitContext<'_> {
    /// Resolves a type to its expression in the current unit.
    ///
    /// # Errors
    /// Returns `CodegenError::UnresolvedType` if the type has no expression.
    pub fn resolve(&self, full_name: &str) -> Result<String, CodegenError> {
        self.names.resolve(full_name)
    }

    /// Returns true when rendering ES6 classes.
    #[must_use]
    pub fn es6(&self) -> bool {
        self.options.want_es6()
    }

    /// Appends `text`, annotated with `path` when one is given.
    pub fn write_name(&self, w: &mut CodeWriter, text: &str, path: Option<&[i32]>) {
        match path {
            Some(path) => w.push_annotated(text, &self.file.name, path),
            None => w.push_str(text),
        }
    }
}

/// One generated function, rendered either as a prototype/static assignment
/// or as a class member.
#[derive(Debug, Clone, Default)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Parameter list, without parentheses.
    pub params: String,
    /// Static (constructor-level) rather than prototype method.
    pub is_static: bool,
    /// JSDoc tag lines.
    pub doc: Vec<String>,
    /// Body lines, relative to the body indentation.
    pub body: Vec<String>,
    /// Descriptor path annotated on the method name.
    pub path: Option<Vec<i32>>,
}

impl Method {
    /// Creates a prototype method.
    #[must_use]
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            ..Self::default()
        }
    }

    /// Creates a static method.
    #[must_use]
    pub fn new_static(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::new(name, params)
        }
    }

    /// Appends a JSDoc line.
    #[must_use]
    pub fn with_doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<String>) -> Self {
        self.body = body;
        self
    }

    /// Sets the annotation path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<i32>) -> Self {
        self.path = Some(path);
        self
    }
}

/// A run of methods, optionally wrapped in a runtime feature guard.
#[derive(Debug, Clone, Default)]
pub struct Section {
    /// Guard expression (`jspb.Message.GENERATE_TO_OBJECT`).
    pub guard: Option<&'static str>,
    /// Methods in emission order.
    pub methods: Vec<Method>,
}

/// Writes a JSDoc block with every line indented by `indent`.
pub fn write_doc(w: &mut CodeWriter, indent: &str, doc: &[String]) {
    if doc.is_empty() {
        return;
    }
    w.push_str(&format!("{indent}/**\n"));
    for line in doc {
        if line.is_empty() {
            w.push_str(&format!("{indent} *\n"));
        } else {
            w.push_str(&format!("{indent} * {line}\n"));
        }
    }
    w.push_str(&format!("{indent} */\n"));
}

fn write_body(w: &mut CodeWriter, indent: &str, body: &[String]) {
    for line in body {
        if line.is_empty() {
            w.push_str("\n");
        } else {
            w.push_str(&format!("{indent}{line}\n"));
        }
    }
}

/// Renders `method` as `Class.prototype.name = function(...) {...};`, or as
/// a static assignment.
pub fn write_assigned_method(
    ctx: &EmitContext<'_>,
    w: &mut CodeWriter,
    indent: &str,
    class: &str,
    method: &Method,
) {
    write_doc(w, indent, &method.doc);
    let target = if method.is_static {
        class.to_string()
    } else {
        format!("{class}.prototype")
    };
    w.push_str(&format!("{indent}{target}."));
    ctx.write_name(w, &method.name, method.path.as_deref());
    w.push_str(&format!(" = function({}) {{\n", method.params));
    write_body(w, &format!("{indent}  "), &method.body);
    w.push_str(&format!("{indent}}};\n\n"));
}

/// Renders `method` as a class member.
pub fn write_class_method(ctx: &EmitContext<'_>, w: &mut CodeWriter, method: &Method) {
    write_doc(w, "  ", &method.doc);
    w.push_str("  ");
    if method.is_static {
        w.push_str("static ");
    }
    ctx.write_name(w, &method.name, method.path.as_deref());
    w.push_str(&format!("({}) {{\n", method.params));
    write_body(w, "    ", &method.body);
    w.push_str("  }\n\n");
}

/// Emits every definition of a unit section: messages, enums, then all
/// extensions, so that registrations run after every class they touch.
///
/// # Errors
/// Propagates emitter errors.
pub fn emit_section(
    ctx: &EmitContext<'_>,
    section: &UnitSection<'_>,
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    for &message in &section.messages {
        let index = position(&section.file.messages, message)?;
        messages::emit_message(ctx, message, &[4, index], w)?;
    }
    for &enumeration in &section.enums {
        let index = position(&section.file.enums, enumeration)?;
        enums::emit_enum(ctx, enumeration, &[5, index], w)?;
    }
    for &message in &section.messages {
        let index = position(&section.file.messages, message)?;
        for (field, path) in extensions::scoped_extensions(message, vec![4, index]) {
            extensions::emit_extension(ctx, field, &path, w)?;
        }
    }
    for &ext in &section.extensions {
        let index = position(&section.file.extensions, ext)?;
        extensions::emit_extension(ctx, ext, &[7, index], w)?;
    }
    Ok(())
}

/// Index of `item` within `items`, by identity.
fn position<T>(items: &[T], item: &T) -> Result<i32, CodegenError> {
    items
        .iter()
        .position(|candidate| std::ptr::eq(candidate, item))
        .and_then(|index| i32::try_from(index).ok())
        .ok_or_else(|| CodegenError::internal("definition is not part of its section's file"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameResolver;
    use protojs_schema::SchemaMessage;
    use std::collections::BTreeSet;

    #[test]
    fn test_assigned_and_class_methods() {
        let file = SchemaFile::new("a.proto", "pkg").with_message(SchemaMessage::new("Foo"));
        let set = SchemaSet::new(vec![file]).expect("Failed to link");
        let options = GenerationOptions::default();
        let files: Vec<&SchemaFile> = set.files().iter().collect();
        let resolver = NameResolver::new(&set, &options, &files);
        let names = resolver
            .for_unit("a.js", Some(&set.files()[0]), &BTreeSet::new())
            .expect("Failed to build names");
        let ctx = EmitContext {
            set: &set,
            options: &options,
            names: &names,
            file: &set.files()[0],
        };

        let method = Method::new("getX", "")
            .with_doc("@return {number}")
            .with_body(vec!["return 1;".to_string()]);

        let mut w = CodeWriter::new(false);
        write_assigned_method(&ctx, &mut w, "", "proto.pkg.Foo", &method);
        assert_eq!(
            w.as_str(),
            "/**\n * @return {number}\n */\nproto.pkg.Foo.prototype.getX = function() {\n  return 1;\n};\n\n"
        );

        let mut w = CodeWriter::new(false);
        write_class_method(&ctx, &mut w, &Method::new_static("make", "a").with_body(vec![]));
        assert_eq!(w.as_str(), "  static make(a) {\n  }\n\n");
    }

    #[test]
    fn test_position_by_identity() {
        let items = vec![1, 1, 2];
        assert_eq!(position(&items, &items[1]).expect("missing"), 1);
        let other = 1;
        assert!(position(&items, &other).is_err());
    }
}
