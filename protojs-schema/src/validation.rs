//! Reference checks over a linked schema set.
//!
//! Only the references code generation depends on are checked: imported
//! files must be loaded, and every named field type or extendee must resolve
//! to a definition of the right kind. Schema semantics (field number ranges,
//! reserved names, enum aliasing) are assumed to be validated upstream.

use crate::error::SchemaError;
use crate::messages::{SchemaField, SchemaMessage};
use crate::set::SchemaSet;
use crate::types::FieldType;

/// Validates the references of every file in the set.
///
/// # Errors
/// Returns `SchemaError` describing the first broken reference.
pub fn validate_set(set: &SchemaSet) -> Result<(), SchemaError> {
    for file in set.files() {
        for dep in &file.dependencies {
            if set.file(dep).is_none() {
                return Err(SchemaError::MissingDependency {
                    file: file.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        for message in &file.messages {
            validate_message(set, message)?;
        }
        for ext in &file.extensions {
            validate_extension(set, ext)?;
        }
    }
    Ok(())
}

fn validate_message(set: &SchemaSet, message: &SchemaMessage) -> Result<(), SchemaError> {
    for field in &message.fields {
        validate_field_type(set, field)?;
        if field
            .oneof_index
            .is_some_and(|index| index >= message.oneofs.len())
        {
            return Err(SchemaError::validation(format!(
                "field '{}' references a oneof that '{}' does not declare",
                field.full_name(),
                message.full_name
            )));
        }
    }
    for ext in &message.extensions {
        validate_extension(set, ext)?;
    }
    for nested in &message.nested {
        validate_message(set, nested)?;
    }
    Ok(())
}

fn validate_extension(set: &SchemaSet, field: &SchemaField) -> Result<(), SchemaError> {
    validate_field_type(set, field)?;
    let Some(extendee) = &field.extendee else {
        return Err(SchemaError::validation(format!(
            "extension '{}' has no extendee",
            field.full_name()
        )));
    };
    if set.message(extendee).is_none() {
        return Err(SchemaError::unknown_type(extendee, field.full_name()));
    }
    Ok(())
}

fn validate_field_type(set: &SchemaSet, field: &SchemaField) -> Result<(), SchemaError> {
    let (name, expected) = match &field.field_type {
        FieldType::Message(name) | FieldType::Group(name) => (name, "message"),
        FieldType::Enum(name) => (name, "enum"),
        _ => return Ok(()),
    };
    if !set.contains_type(name) {
        return Err(SchemaError::unknown_type(name, field.full_name()));
    }
    let matches = match expected {
        "message" => set.message(name).is_some(),
        _ => set.enumeration(name).is_some(),
    };
    if !matches {
        return Err(SchemaError::KindMismatch {
            type_name: name.clone(),
            field: field.full_name(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::SchemaError;
    use crate::file::SchemaFile;
    use crate::messages::{SchemaEnum, SchemaField, SchemaMessage};
    use crate::set::SchemaSet;
    use crate::types::FieldType;

    #[test]
    fn test_unknown_type_rejected() {
        let file = SchemaFile::new("a.proto", "pkg").with_message(
            SchemaMessage::new("Foo").with_field(SchemaField::new(
                "bar",
                1,
                FieldType::Message("pkg.Missing".to_string()),
            )),
        );
        let err = SchemaSet::new(vec![file]).expect_err("unknown type accepted");
        assert!(matches!(err, SchemaError::UnknownType { type_name, .. } if type_name == "pkg.Missing"));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let file = SchemaFile::new("a.proto", "pkg")
            .with_enum(SchemaEnum::new("Color").with_value("RED", 0))
            .with_message(SchemaMessage::new("Foo").with_field(SchemaField::new(
                "color",
                1,
                FieldType::Message("pkg.Color".to_string()),
            )));
        let err = SchemaSet::new(vec![file]).expect_err("kind mismatch accepted");
        assert!(matches!(err, SchemaError::KindMismatch { .. }));
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let file = SchemaFile::new("a.proto", "pkg").with_dependency("b.proto");
        let err = SchemaSet::new(vec![file]).expect_err("missing dependency accepted");
        assert!(matches!(err, SchemaError::MissingDependency { dependency, .. } if dependency == "b.proto"));
    }

    #[test]
    fn test_extension_requires_known_extendee() {
        let file = SchemaFile::new("a.proto", "pkg").with_extension(
            SchemaField::new("ext", 100, FieldType::Int32).extending("pkg.Nope"),
        );
        assert!(SchemaSet::new(vec![file]).is_err());
    }

    #[test]
    fn test_oneof_index_out_of_range() {
        let file = SchemaFile::new("a.proto", "pkg").with_message(
            SchemaMessage::new("Foo").with_field(SchemaField::new("a", 1, FieldType::Int32).in_oneof(0)),
        );
        let err = SchemaSet::new(vec![file]).expect_err("bad oneof accepted");
        assert!(matches!(err, SchemaError::Validation { .. }));
    }
}
