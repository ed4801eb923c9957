//! Field type definitions for protocol buffer descriptors.

use serde::{Deserialize, Serialize};

/// Declared type of a field.
///
/// Scalar types serialize as plain strings (`"int32"`); named types carry the
/// fully-qualified name of the referenced message or enum
/// (`{"message": "pkg.Foo"}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 64-bit IEEE float.
    Double,
    /// 32-bit IEEE float.
    Float,
    /// Signed 64-bit varint.
    Int64,
    /// Unsigned 64-bit varint.
    Uint64,
    /// Signed 32-bit varint.
    Int32,
    /// Fixed 64-bit unsigned.
    Fixed64,
    /// Fixed 32-bit unsigned.
    Fixed32,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Raw bytes.
    Bytes,
    /// Unsigned 32-bit varint.
    Uint32,
    /// Fixed 32-bit signed.
    Sfixed32,
    /// Fixed 64-bit signed.
    Sfixed64,
    /// Zigzag-encoded 32-bit.
    Sint32,
    /// Zigzag-encoded 64-bit.
    Sint64,
    /// Embedded message.
    Message(String),
    /// Proto2 group (delimited by start/end tags).
    Group(String),
    /// Enumeration.
    Enum(String),
}

impl FieldType {
    /// Returns the referenced type name for message, group and enum fields.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Message(name) | Self::Group(name) | Self::Enum(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true for message and group fields.
    #[must_use]
    pub const fn is_message(&self) -> bool {
        matches!(self, Self::Message(_) | Self::Group(_))
    }

    /// Returns true for the 64-bit integer types.
    #[must_use]
    pub const fn is_64_bit_integer(&self) -> bool {
        matches!(
            self,
            Self::Int64 | Self::Uint64 | Self::Fixed64 | Self::Sfixed64 | Self::Sint64
        )
    }

    /// Returns true for unsigned integer types.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint32 | Self::Uint64 | Self::Fixed32 | Self::Fixed64
        )
    }

    /// Returns true when repeated values of this type may use packed encoding.
    #[must_use]
    pub const fn is_packable(&self) -> bool {
        !matches!(
            self,
            Self::String | Self::Bytes | Self::Message(_) | Self::Group(_)
        )
    }
}

/// Field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Optional (the default).
    #[default]
    Optional,
    /// Proto2 required.
    Required,
    /// Repeated.
    Repeated,
}

/// Source syntax of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    /// proto2: every singular field tracks presence.
    #[default]
    Proto2,
    /// proto3: singular scalars use implicit presence.
    Proto3,
}

/// JavaScript representation requested for 64-bit integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsType {
    /// Use the default representation (number).
    #[default]
    Normal,
    /// Represent values as decimal strings.
    String,
    /// Represent values as numbers.
    Number,
}

/// Strips a leading `.` from a fully-qualified descriptor name.
#[must_use]
pub fn normalize_type_name(name: &str) -> &str {
    name.strip_prefix('.').unwrap_or(name)
}
