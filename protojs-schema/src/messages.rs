//! Message, field, oneof and enum definitions.

use crate::types::{FieldType, JsType, Label, Syntax};
use serde::{Deserialize, Serialize};

/// Field definition within a message, or an extension field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name as declared.
    pub name: String,
    /// Field number (tag).
    pub number: u32,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Field label.
    #[serde(default)]
    pub label: Label,
    /// Index into the owning message's oneof list.
    #[serde(default)]
    pub oneof_index: Option<usize>,
    /// proto3 `optional` (member of a synthetic oneof).
    #[serde(default)]
    pub proto3_optional: bool,
    /// Explicit `packed` option.
    #[serde(default)]
    pub packed: Option<bool>,
    /// Explicit default value literal, as written in the schema.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Requested JavaScript representation for 64-bit integers.
    #[serde(default)]
    pub jstype: JsType,
    /// Extended message, for extension fields.
    #[serde(default)]
    pub extendee: Option<String>,
    /// Full name of the enclosing message, or the package for file-level
    /// extensions. Filled in when the set is linked.
    #[serde(skip)]
    pub scope: String,
    /// Syntax of the defining file. Filled in when the set is linked.
    #[serde(skip)]
    pub syntax: Syntax,
}

impl SchemaField {
    /// Creates a new optional field.
    #[must_use]
    pub fn new(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            field_type,
            label: Label::Optional,
            oneof_index: None,
            proto3_optional: false,
            packed: None,
            default_value: None,
            jstype: JsType::Normal,
            extendee: None,
            scope: String::new(),
            syntax: Syntax::Proto2,
        }
    }

    /// Marks the field as repeated.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    /// Marks the field as proto2 required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.label = Label::Required;
        self
    }

    /// Places the field in the oneof at `index`.
    #[must_use]
    pub fn in_oneof(mut self, index: usize) -> Self {
        self.oneof_index = Some(index);
        self
    }

    /// Marks the field as a proto3 `optional` field backed by the synthetic
    /// oneof at `index`.
    #[must_use]
    pub fn proto3_optional(mut self, index: usize) -> Self {
        self.oneof_index = Some(index);
        self.proto3_optional = true;
        self
    }

    /// Sets the explicit default value literal.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the explicit `packed` option.
    #[must_use]
    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = Some(packed);
        self
    }

    /// Sets the JavaScript representation for 64-bit integers.
    #[must_use]
    pub fn with_jstype(mut self, jstype: JsType) -> Self {
        self.jstype = jstype;
        self
    }

    /// Turns the field into an extension of `extendee`.
    #[must_use]
    pub fn extending(mut self, extendee: impl Into<String>) -> Self {
        self.extendee = Some(extendee.into());
        self
    }

    /// Returns the fully-qualified name of the field.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.scope.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.scope, self.name)
        }
    }

    /// Returns true if the field is repeated.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    /// Returns true if the field is an extension.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        self.extendee.is_some()
    }

    /// Returns the oneof index unless the oneof is the synthetic one backing a
    /// proto3 `optional` field.
    #[must_use]
    pub fn real_oneof_index(&self) -> Option<usize> {
        if self.proto3_optional {
            None
        } else {
            self.oneof_index
        }
    }

    /// Returns true if "unset" is distinguishable from the default value.
    #[must_use]
    pub fn has_presence(&self) -> bool {
        if self.is_repeated() {
            return false;
        }
        self.field_type.is_message()
            || self.oneof_index.is_some()
            || self.is_extension()
            || self.syntax == Syntax::Proto2
    }

    /// Returns true if repeated values use packed encoding on the wire.
    #[must_use]
    pub fn is_packed(&self) -> bool {
        self.is_repeated()
            && self.field_type.is_packable()
            && self.packed.unwrap_or(self.syntax == Syntax::Proto3)
    }
}

/// Oneof group declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOneof {
    /// Oneof name.
    pub name: String,
}

/// Extension number range (`start` inclusive, `end` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRange {
    /// First extension number.
    pub start: u32,
    /// One past the last extension number.
    pub end: u32,
}

/// Message definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaMessage {
    /// Simple name.
    pub name: String,
    /// Fully-qualified name. Filled in when the set is linked.
    #[serde(skip)]
    pub full_name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<SchemaField>,
    /// Nested message types.
    #[serde(default)]
    pub nested: Vec<SchemaMessage>,
    /// Nested enum types.
    #[serde(default)]
    pub enums: Vec<SchemaEnum>,
    /// Oneof declarations, indexed by `SchemaField::oneof_index`.
    #[serde(default)]
    pub oneofs: Vec<SchemaOneof>,
    /// Extensions declared in the scope of this message.
    #[serde(default)]
    pub extensions: Vec<SchemaField>,
    /// Extension ranges; a message with ranges is extendable.
    #[serde(default)]
    pub extension_ranges: Vec<ExtensionRange>,
    /// Synthetic map entry type.
    #[serde(default)]
    pub map_entry: bool,
    /// Full name of the enclosing message. Filled in when the set is linked.
    #[serde(skip)]
    pub containing: Option<String>,
}

impl SchemaMessage {
    /// Creates an empty message.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates the synthetic entry message backing a map field.
    #[must_use]
    pub fn map_entry(name: impl Into<String>, key: FieldType, value: FieldType) -> Self {
        let mut entry = Self::new(name)
            .with_field(SchemaField::new("key", 1, key))
            .with_field(SchemaField::new("value", 2, value));
        entry.map_entry = true;
        entry
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a nested message.
    #[must_use]
    pub fn with_nested(mut self, message: SchemaMessage) -> Self {
        self.nested.push(message);
        self
    }

    /// Adds a nested enum.
    #[must_use]
    pub fn with_enum(mut self, enumeration: SchemaEnum) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// Adds a oneof declaration.
    #[must_use]
    pub fn with_oneof(mut self, name: impl Into<String>) -> Self {
        self.oneofs.push(SchemaOneof { name: name.into() });
        self
    }

    /// Adds an extension declared in this message's scope.
    #[must_use]
    pub fn with_extension(mut self, field: SchemaField) -> Self {
        self.extensions.push(field);
        self
    }

    /// Adds an extension range.
    #[must_use]
    pub fn with_extension_range(mut self, start: u32, end: u32) -> Self {
        self.extension_ranges.push(ExtensionRange { start, end });
        self
    }

    /// Returns true if other files may extend this message.
    #[must_use]
    pub fn is_extendable(&self) -> bool {
        !self.extension_ranges.is_empty()
    }

    /// Returns the declared indices of oneofs that are not synthetic proto3
    /// `optional` wrappers, in declaration order.
    #[must_use]
    pub fn real_oneofs(&self) -> Vec<usize> {
        (0..self.oneofs.len())
            .filter(|idx| {
                self.fields
                    .iter()
                    .any(|f| f.real_oneof_index() == Some(*idx))
            })
            .collect()
    }

    /// Returns the position of the field's oneof among the real oneofs.
    #[must_use]
    pub fn oneof_group(&self, field: &SchemaField) -> Option<usize> {
        let index = field.real_oneof_index()?;
        self.real_oneofs().iter().position(|i| *i == index)
    }

    /// Returns the members of the oneof at the declared `index`.
    #[must_use]
    pub fn oneof_members(&self, index: usize) -> Vec<&SchemaField> {
        self.fields
            .iter()
            .filter(|f| f.real_oneof_index() == Some(index))
            .collect()
    }

    /// Returns the key field of a map entry.
    #[must_use]
    pub fn map_key(&self) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.number == 1)
    }

    /// Returns the value field of a map entry.
    #[must_use]
    pub fn map_value(&self) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.number == 2)
    }
}

/// Enum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Value name.
    pub name: String,
    /// Numeric value.
    pub number: i32,
}

/// Enum definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaEnum {
    /// Simple name.
    pub name: String,
    /// Fully-qualified name. Filled in when the set is linked.
    #[serde(skip)]
    pub full_name: String,
    /// Values in declaration order.
    #[serde(default)]
    pub values: Vec<EnumValue>,
    /// Full name of the enclosing message. Filled in when the set is linked.
    #[serde(skip)]
    pub containing: Option<String>,
}

impl SchemaEnum {
    /// Creates an empty enum.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a value.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValue {
            name: name.into(),
            number,
        });
        self
    }

    /// Returns values with duplicate names removed, keeping the first
    /// declaration.
    #[must_use]
    pub fn unique_values(&self) -> Vec<&EnumValue> {
        let mut seen = std::collections::HashSet::new();
        self.values
            .iter()
            .filter(|v| seen.insert(v.name.as_str()))
            .collect()
    }

    /// Looks up a value by name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }
}
