//! Linked set of schema files with fully-qualified name lookup.

use crate::error::SchemaError;
use crate::file::SchemaFile;
use crate::messages::{SchemaEnum, SchemaField, SchemaMessage};
use crate::types::{FieldType, Syntax, normalize_type_name};
use crate::validation::validate_set;
use std::collections::{HashMap, HashSet};

/// Location of a named type inside the file list.
#[derive(Debug, Clone)]
enum TypeEntry {
    Message { file: usize, path: Vec<usize> },
    Enum { file: usize, parent: Vec<usize>, index: usize },
}

/// A closed set of schema files, linked and indexed by full name.
///
/// The set owns every descriptor for the whole generation run; code
/// generation only borrows from it.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    files: Vec<SchemaFile>,
    file_index: HashMap<String, usize>,
    types: HashMap<String, TypeEntry>,
}

impl SchemaSet {
    /// Links and indexes the files, then checks that every reference resolves.
    ///
    /// # Errors
    /// Returns `SchemaError` on duplicate files or types, unknown type
    /// references, or missing dependency files.
    pub fn new(mut files: Vec<SchemaFile>) -> Result<Self, SchemaError> {
        let mut file_index = HashMap::new();
        let mut types = HashMap::new();

        for (file_idx, file) in files.iter_mut().enumerate() {
            if file_index.insert(file.name.clone(), file_idx).is_some() {
                return Err(SchemaError::duplicate("file", &file.name));
            }
            link_file(file);
            index_file(file_idx, file, &mut types)?;
        }

        let set = Self {
            files,
            file_index,
            types,
        };
        validate_set(&set)?;
        tracing::debug!(
            "linked {} schema files with {} named types",
            set.files.len(),
            set.types.len()
        );
        Ok(set)
    }

    /// Returns all files in load order.
    #[must_use]
    pub fn files(&self) -> &[SchemaFile] {
        &self.files
    }

    /// Looks up a file by name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&SchemaFile> {
        self.file_index.get(name).map(|idx| &self.files[*idx])
    }

    /// Returns true if a message or enum with this full name exists.
    #[must_use]
    pub fn contains_type(&self, full_name: &str) -> bool {
        self.types.contains_key(full_name)
    }

    /// Looks up a message by full name.
    #[must_use]
    pub fn message(&self, full_name: &str) -> Option<&SchemaMessage> {
        match self.types.get(full_name)? {
            TypeEntry::Message { file, path } => self.message_at(*file, path),
            TypeEntry::Enum { .. } => None,
        }
    }

    /// Looks up an enum by full name.
    #[must_use]
    pub fn enumeration(&self, full_name: &str) -> Option<&SchemaEnum> {
        match self.types.get(full_name)? {
            TypeEntry::Enum {
                file,
                parent,
                index,
            } => {
                if parent.is_empty() {
                    self.files[*file].enums.get(*index)
                } else {
                    self.message_at(*file, parent)?.enums.get(*index)
                }
            }
            TypeEntry::Message { .. } => None,
        }
    }

    /// Returns the file defining a message or enum.
    #[must_use]
    pub fn defining_file(&self, full_name: &str) -> Option<&SchemaFile> {
        let file = match self.types.get(full_name)? {
            TypeEntry::Message { file, .. } | TypeEntry::Enum { file, .. } => *file,
        };
        self.files.get(file)
    }

    /// Returns the full name of the top-level definition enclosing a type
    /// (the type itself when it is top-level).
    #[must_use]
    pub fn top_level_name(&self, full_name: &str) -> Option<String> {
        let entry = self.types.get(full_name)?;
        let (file, first) = match entry {
            TypeEntry::Message { file, path } => (*file, path.first().copied()),
            TypeEntry::Enum { file, parent, .. } => (*file, parent.first().copied()),
        };
        let file = &self.files[file];
        match first {
            Some(idx) => Some(file.qualify(&file.messages[idx].name)),
            None => Some(full_name.to_string()),
        }
    }

    /// Returns the map entry message when the field is a map field.
    #[must_use]
    pub fn map_entry(&self, field: &SchemaField) -> Option<&SchemaMessage> {
        match &field.field_type {
            FieldType::Message(name) => self.message(name).filter(|m| m.map_entry),
            _ => None,
        }
    }

    /// Returns the requested files and everything they transitively import,
    /// dependencies before dependents. Unknown names are skipped.
    #[must_use]
    pub fn transitive_closure(&self, names: &[&str]) -> Vec<&SchemaFile> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            self.visit_dependencies(name, &mut seen, &mut out);
        }
        out
    }

    fn visit_dependencies<'a>(
        &'a self,
        name: &str,
        seen: &mut HashSet<String>,
        out: &mut Vec<&'a SchemaFile>,
    ) {
        if !seen.insert(name.to_string()) {
            return;
        }
        let Some(file) = self.file(name) else {
            return;
        };
        for dep in &file.dependencies {
            self.visit_dependencies(dep, seen, out);
        }
        out.push(file);
    }

    fn message_at(&self, file: usize, path: &[usize]) -> Option<&SchemaMessage> {
        let (first, rest) = path.split_first()?;
        let mut current = self.files.get(file)?.messages.get(*first)?;
        for idx in rest {
            current = current.nested.get(*idx)?;
        }
        Some(current)
    }
}

/// Fills in full names, scopes and back-references.
fn link_file(file: &mut SchemaFile) {
    let package = file.package.clone();
    let syntax = file.syntax;
    for message in &mut file.messages {
        link_message(message, &package, None, syntax);
    }
    for enumeration in &mut file.enums {
        enumeration.full_name = join(&package, &enumeration.name);
        enumeration.containing = None;
    }
    for ext in &mut file.extensions {
        link_field(ext, &package, syntax);
    }
}

fn link_message(message: &mut SchemaMessage, scope: &str, parent: Option<&str>, syntax: Syntax) {
    message.full_name = join(scope, &message.name);
    message.containing = parent.map(str::to_string);
    let full = message.full_name.clone();
    for field in &mut message.fields {
        link_field(field, &full, syntax);
    }
    for ext in &mut message.extensions {
        link_field(ext, &full, syntax);
    }
    for enumeration in &mut message.enums {
        enumeration.full_name = join(&full, &enumeration.name);
        enumeration.containing = Some(full.clone());
    }
    for nested in &mut message.nested {
        link_message(nested, &full, Some(&full), syntax);
    }
}

fn link_field(field: &mut SchemaField, scope: &str, syntax: Syntax) {
    field.scope = scope.to_string();
    field.syntax = syntax;
    field.field_type = match &field.field_type {
        FieldType::Message(name) => FieldType::Message(normalize_type_name(name).to_string()),
        FieldType::Group(name) => FieldType::Group(normalize_type_name(name).to_string()),
        FieldType::Enum(name) => FieldType::Enum(normalize_type_name(name).to_string()),
        other => other.clone(),
    };
    if let Some(extendee) = &field.extendee {
        field.extendee = Some(normalize_type_name(extendee).to_string());
    }
}

fn index_file(
    file_idx: usize,
    file: &SchemaFile,
    types: &mut HashMap<String, TypeEntry>,
) -> Result<(), SchemaError> {
    for (idx, message) in file.messages.iter().enumerate() {
        index_message(file_idx, message, vec![idx], types)?;
    }
    for (index, enumeration) in file.enums.iter().enumerate() {
        insert_type(
            types,
            &enumeration.full_name,
            "enum",
            TypeEntry::Enum {
                file: file_idx,
                parent: Vec::new(),
                index,
            },
        )?;
    }
    Ok(())
}

fn index_message(
    file_idx: usize,
    message: &SchemaMessage,
    path: Vec<usize>,
    types: &mut HashMap<String, TypeEntry>,
) -> Result<(), SchemaError> {
    for (index, enumeration) in message.enums.iter().enumerate() {
        insert_type(
            types,
            &enumeration.full_name,
            "enum",
            TypeEntry::Enum {
                file: file_idx,
                parent: path.clone(),
                index,
            },
        )?;
    }
    for (idx, nested) in message.nested.iter().enumerate() {
        let mut nested_path = path.clone();
        nested_path.push(idx);
        index_message(file_idx, nested, nested_path, types)?;
    }
    insert_type(
        types,
        &message.full_name,
        "message",
        TypeEntry::Message {
            file: file_idx,
            path,
        },
    )
}

fn insert_type(
    types: &mut HashMap<String, TypeEntry>,
    name: &str,
    kind: &str,
    entry: TypeEntry,
) -> Result<(), SchemaError> {
    if types.insert(name.to_string(), entry).is_some() {
        return Err(SchemaError::duplicate(kind, name));
    }
    Ok(())
}

fn join(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}
