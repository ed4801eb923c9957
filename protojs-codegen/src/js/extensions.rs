//! Extension field emission.

use super::fields::{Cardinality, FieldKind, FieldPlan, js_type, wire_suffix};
use super::{EmitContext, write_doc};
use crate::error::CodegenError;
use crate::names::extension_ident;
use crate::writer::CodeWriter;
use protojs_schema::{SchemaField, SchemaMessage};

/// Collects the extensions declared inside `message` and its nested
/// messages, with their descriptor paths.
#[must_use]
pub fn scoped_extensions(message: &SchemaMessage, path: Vec<i32>) -> Vec<(&SchemaField, Vec<i32>)> {
    let mut out = Vec::new();
    collect(message, path, &mut out);
    out
}

fn collect<'a>(message: &'a SchemaMessage, path: Vec<i32>, out: &mut Vec<(&'a SchemaField, Vec<i32>)>) {
    for (index, ext) in (0i32..).zip(&message.extensions) {
        let mut ext_path = path.clone();
        ext_path.extend([6, index]);
        out.push((ext, ext_path));
    }
    for (index, nested) in (0i32..).zip(&message.nested) {
        let mut nested_path = path.clone();
        nested_path.extend([3, index]);
        collect(nested, nested_path, out);
    }
}

/// Emits the field info object of an extension and registers it on the
/// extended message (`extensions`, plus `extensionsBinary` when binary
/// support is on).
///
/// # Errors
/// Returns `CodegenError::Internal` for an extension without extendee and
/// propagates resolution errors.
pub fn emit_extension(
    ctx: &EmitContext<'_>,
    field: &SchemaField,
    path: &[i32],
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    let plan = FieldPlan::new(ctx.set, None, field)?;
    let extendee = field.extendee.as_deref().ok_or_else(|| {
        CodegenError::internal(format!("extension '{}' has no extendee", field.full_name()))
    })?;
    let target = ctx.resolve(extendee)?;
    let expr = ctx.names.extension(field)?;
    let n = field.number;

    let message_type = match plan.kind {
        FieldKind::Message(m) | FieldKind::Group(m) => Some(ctx.resolve(&m.full_name)?),
        FieldKind::Int
        | FieldKind::IntString
        | FieldKind::Float
        | FieldKind::Bool
        | FieldKind::String
        | FieldKind::Bytes
        | FieldKind::Enum(_)
        | FieldKind::Map { .. } => None,
    };
    let ctor = message_type.clone().unwrap_or_else(|| "null".to_string());
    let to_object = message_type
        .as_ref()
        .map_or_else(|| "null".to_string(), |t| format!("{t}.toObject"));
    let repeated = u8::from(field.is_repeated());

    write_doc(
        w,
        "",
        &[
            format!(
                "A tuple of {{field number, class constructor}} for the extension field named `{}`.",
                plan.object_key()
            ),
            format!("@type {{!jspb.ExtensionFieldInfo<{}>}}", js_type(ctx, &plan)),
        ],
    );
    let file_level = ctx.set.message(&field.scope).is_none();
    if ctx.es6() && file_level {
        w.push_str("export const ");
        ctx.write_name(w, &extension_ident(&field.name), Some(path));
    } else {
        ctx.write_name(w, &expr, Some(path));
    }
    w.push_str(&format!(
        " = new jspb.ExtensionFieldInfo(\n    {n},\n    {{{}: 0}},\n    {ctor},\n     /** @type {{?function((boolean|undefined),!jspb.Message=): !Object}} */ (\n         {to_object}),\n    {repeated});\n\n",
        plan.object_key()
    ));

    if ctx.options.binary {
        let writer_prefix = match plan.cardinality {
            Cardinality::Repeated { packed: true } => "Packed",
            Cardinality::Repeated { packed: false } => "Repeated",
            Cardinality::Singular { .. } | Cardinality::OneofMember { .. } => "",
        };
        let suffix = wire_suffix(field);
        let (serialize, deserialize) = match &message_type {
            Some(t) => (
                format!("{t}.serializeBinaryToWriter"),
                format!("{t}.deserializeBinaryFromReader"),
            ),
            None => ("undefined".to_string(), "undefined".to_string()),
        };
        w.push_str(&format!(
            "{target}.extensionsBinary[{n}] = new jspb.ExtensionFieldBinaryInfo(\n    {expr},\n    jspb.BinaryReader.prototype.read{suffix},\n    jspb.BinaryWriter.prototype.write{writer_prefix}{suffix},\n    {serialize},\n    {deserialize},\n    {});\n",
            field.is_packed()
        ));
    }
    w.push_str(&format!(
        "// This registers the extension field with the extended class, so that\n// toObject() will function correctly.\n{target}.extensions[{n}] = {expr};\n\n"
    ));
    tracing::debug!("emitted extension {} on {}", field.full_name(), extendee);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameResolver;
    use crate::options::{GenerationOptions, ImportStyle};
    use protojs_schema::{FieldType, SchemaFile, SchemaSet};
    use std::collections::BTreeSet;

    fn fixture() -> SchemaSet {
        let file = SchemaFile::new("ext.proto", "pkg")
            .with_message(SchemaMessage::new("Target").with_extension_range(100, 536_870_912))
            .with_message(
                SchemaMessage::new("Holder")
                    .with_extension(
                        SchemaField::new("holder", 101, FieldType::Message("pkg.Holder".to_string()))
                            .extending("pkg.Target"),
                    )
                    .with_nested(SchemaMessage::new("Inner").with_extension(
                        SchemaField::new("deep", 102, FieldType::Int32).extending("pkg.Target"),
                    )),
            )
            .with_extension(
                SchemaField::new("tags", 100, FieldType::String)
                    .repeated()
                    .extending("pkg.Target"),
            );
        SchemaSet::new(vec![file]).expect("Failed to link")
    }

    fn render(options: &GenerationOptions, field: &SchemaField, set: &SchemaSet) -> String {
        let files: Vec<&SchemaFile> = set.files().iter().collect();
        let resolver = NameResolver::new(set, options, &files);
        let names = resolver
            .for_unit("ext.js", Some(&set.files()[0]), &BTreeSet::new())
            .expect("Failed to build names");
        let ctx = EmitContext {
            set,
            options,
            names: &names,
            file: &set.files()[0],
        };
        let mut w = CodeWriter::new(false);
        emit_extension(&ctx, field, &[7, 0], &mut w).expect("Failed to emit");
        w.finish()
    }

    #[test]
    fn test_scoped_extension_paths() {
        let set = fixture();
        let holder = set.message("pkg.Holder").expect("missing Holder");
        let found = scoped_extensions(holder, vec![4, 1]);
        let paths: Vec<&[i32]> = found.iter().map(|(_, p)| p.as_slice()).collect();
        assert_eq!(paths, vec![&[4, 1, 6, 0][..], &[4, 1, 3, 0, 6, 0][..]]);
        assert_eq!(found[1].0.name, "deep");
    }

    #[test]
    fn test_file_level_extension_closure() {
        let set = fixture();
        let options = GenerationOptions::default().with_binary(true);
        let text = render(&options, &set.files()[0].extensions[0], &set);
        assert!(text.contains("proto.pkg.tags = new jspb.ExtensionFieldInfo(\n    100,\n    {tagsList: 0},\n    null,"));
        assert!(text.contains("    1);"));
        assert!(text.contains(
            "proto.pkg.Target.extensionsBinary[100] = new jspb.ExtensionFieldBinaryInfo(\n    proto.pkg.tags,"
        ));
        assert!(text.contains("jspb.BinaryWriter.prototype.writeRepeatedString,"));
        assert!(text.contains("proto.pkg.Target.extensions[100] = proto.pkg.tags;"));
    }

    #[test]
    fn test_message_scoped_extension() {
        let set = fixture();
        let options = GenerationOptions::default();
        let holder = set.message("pkg.Holder").expect("missing Holder");
        let text = render(&options, &holder.extensions[0], &set);
        assert!(text.contains("proto.pkg.Holder.holder = new jspb.ExtensionFieldInfo("));
        assert!(text.contains("    proto.pkg.Holder,\n"));
        assert!(text.contains("proto.pkg.Holder.toObject),"));
        assert!(!text.contains("extensionsBinary"));
    }

    #[test]
    fn test_es6_file_level_extension_is_exported() {
        let set = fixture();
        let options = GenerationOptions::default()
            .with_import_style(ImportStyle::Es6)
            .with_binary(true);
        let text = render(&options, &set.files()[0].extensions[0], &set);
        assert!(text.contains("export const tags = new jspb.ExtensionFieldInfo("));
        assert!(text.contains("Target.extensions[100] = tags;"));
    }
}
