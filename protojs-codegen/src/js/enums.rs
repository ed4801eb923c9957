//! Enum emission.

use super::{EmitContext, write_doc};
use crate::error::CodegenError;
use crate::writer::CodeWriter;
use protojs_schema::SchemaEnum;

/// Renders an object literal of `NAME: number` constants.
#[must_use]
pub fn constant_table(entries: &[(String, i64)]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = entries
        .iter()
        .map(|(name, number)| format!("  {name}: {number}"))
        .collect();
    format!("{{\n{}\n}}", body.join(",\n"))
}

/// Emits an enum as a constant table.
///
/// Duplicate value names keep their first declaration. Top-level enums are
/// module exports in ES6 output.
///
/// # Errors
/// Returns `CodegenError::UnresolvedType` if the enum has no expression in
/// the unit.
pub fn emit_enum(
    ctx: &EmitContext<'_>,
    enumeration: &SchemaEnum,
    path: &[i32],
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    let expr = ctx.resolve(&enumeration.full_name)?;
    let entries: Vec<(String, i64)> = enumeration
        .unique_values()
        .into_iter()
        .map(|v| (v.name.clone(), i64::from(v.number)))
        .collect();

    write_doc(w, "", &["@enum {number}".to_string()]);
    if ctx.es6() && enumeration.containing.is_none() {
        w.push_str("export const ");
    }
    ctx.write_name(w, &expr, Some(path));
    w.push_str(&format!(" = {};\n\n", constant_table(&entries)));
    tracing::debug!("emitted enum {}", enumeration.full_name);
    Ok(())
}
