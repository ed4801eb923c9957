//! Per-field code generation.
//!
//! Every decision is a `match` over [`FieldKind`] x [`Cardinality`] (and
//! [`BytesMode`] for getters), so adding a kind fails to compile until every
//! table below handles it. Shapes a valid schema cannot produce, such as a
//! map inside a oneof, are reported as internal consistency errors.

use super::{EmitContext, Method};
use crate::error::CodegenError;
use crate::names::{is_reserved, to_lower_camel, to_upper_camel};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use protojs_schema::{FieldType, JsType, SchemaEnum, SchemaField, SchemaMessage, SchemaSet};

/// Largest integer a JavaScript number represents exactly.
const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

/// What a field holds, as far as generated code is concerned.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind<'a> {
    /// Integer rendered as a JavaScript number.
    Int,
    /// 64-bit integer rendered as a decimal string (`jstype = JS_STRING`).
    IntString,
    /// `float` or `double`.
    Float,
    /// `bool`.
    Bool,
    /// `string`.
    String,
    /// `bytes`.
    Bytes,
    /// Enum value.
    Enum(&'a SchemaEnum),
    /// Embedded message.
    Message(&'a SchemaMessage),
    /// Proto2 group.
    Group(&'a SchemaMessage),
    /// Map field, described by its entry's key and value fields.
    Map {
        /// Key field of the entry.
        key: &'a SchemaField,
        /// Value field of the entry.
        value: &'a SchemaField,
    },
}

/// How many values a field holds and how presence is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one value; `presence` is false for proto3 implicit fields.
    Singular {
        /// Whether unset is distinguishable from the default.
        presence: bool,
    },
    /// A list of values.
    Repeated {
        /// Whether the list is written as one length-delimited run.
        packed: bool,
    },
    /// Member of a real oneof; `group` indexes `oneofGroups_`.
    OneofMember {
        /// Position among the message's real oneofs.
        group: usize,
    },
}

/// Representation requested from a bytes getter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesMode {
    /// Whatever is stored (base64 string or `Uint8Array`).
    Default,
    /// Coerced to base64 text.
    B64,
    /// Coerced to a `Uint8Array`.
    U8,
}

impl BytesMode {
    fn suffix(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::B64 => "AsB64",
            Self::U8 => "AsU8",
        }
    }
}

/// A field with its dispatch key resolved.
#[derive(Debug, Clone, Copy)]
pub struct FieldPlan<'a> {
    /// The field.
    pub field: &'a SchemaField,
    /// Kind of value.
    pub kind: FieldKind<'a>,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Name of the owning real oneof.
    pub oneof: Option<&'a str>,
}

impl<'a> FieldPlan<'a> {
    /// Resolves the dispatch key of a field. `owner` is the declaring message,
    /// or `None` for extensions.
    ///
    /// # Errors
    /// Returns `CodegenError::Internal` when a referenced type is missing or
    /// a map field is not repeated or sits in a oneof.
    pub fn new(
        set: &'a SchemaSet,
        owner: Option<&'a SchemaMessage>,
        field: &'a SchemaField,
    ) -> Result<Self, CodegenError> {
        let kind = field_kind(set, field)?;
        let group = owner.and_then(|m| m.oneof_group(field));
        let cardinality = if field.is_repeated() {
            Cardinality::Repeated {
                packed: field.is_packed(),
            }
        } else if let Some(group) = group {
            Cardinality::OneofMember { group }
        } else {
            Cardinality::Singular {
                presence: field.has_presence(),
            }
        };
        if let (FieldKind::Map { .. }, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) =
            (kind, cardinality)
        {
            return Err(CodegenError::internal(format!(
                "map field '{}' must be repeated and outside any oneof",
                field.full_name()
            )));
        }
        let oneof = match (owner, field.real_oneof_index()) {
            (Some(message), Some(index)) => message.oneofs.get(index).map(|o| o.name.as_str()),
            _ => None,
        };
        Ok(Self {
            field,
            kind,
            cardinality,
            oneof,
        })
    }

    /// UpperCamel identifier used in accessor names.
    #[must_use]
    pub fn ident(&self) -> String {
        let ident = to_upper_camel(&self.field.name);
        // Would shadow jspb.Message methods.
        if ident == "Extension" || ident == "JsPbMessageId" {
            format!("{ident}$")
        } else {
            ident
        }
    }

    /// Accessor stem with the `List` / `Map` suffix.
    #[must_use]
    pub fn accessor_stem(&self) -> String {
        format!("{}{}", self.ident(), self.list_suffix())
    }

    /// Key of the field in plain-object form.
    #[must_use]
    pub fn object_key(&self) -> String {
        let key = format!("{}{}", to_lower_camel(&self.field.name), self.list_suffix());
        if is_reserved(&key) {
            format!("pb_{key}")
        } else {
            key
        }
    }

    /// Name of the getter for a bytes mode.
    #[must_use]
    pub fn getter_name(&self, mode: BytesMode) -> String {
        format!("get{}{}", self.accessor_stem(), mode.suffix())
    }

    /// Name of the setter.
    #[must_use]
    pub fn setter_name(&self) -> String {
        format!("set{}", self.accessor_stem())
    }

    fn list_suffix(&self) -> &'static str {
        match (self.kind, self.cardinality) {
            (FieldKind::Map { .. }, _) => "Map",
            (_, Cardinality::Repeated { .. }) => "List",
            (_, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) => "",
        }
    }

    fn number(&self) -> u32 {
        self.field.number
    }
}

fn field_kind<'a>(set: &'a SchemaSet, field: &'a SchemaField) -> Result<FieldKind<'a>, CodegenError> {
    let missing = |name: &str| {
        CodegenError::internal(format!(
            "field '{}' references unknown type '{name}'",
            field.full_name()
        ))
    };
    Ok(match &field.field_type {
        FieldType::Int32
        | FieldType::Uint32
        | FieldType::Sint32
        | FieldType::Fixed32
        | FieldType::Sfixed32 => FieldKind::Int,
        FieldType::Int64
        | FieldType::Uint64
        | FieldType::Sint64
        | FieldType::Fixed64
        | FieldType::Sfixed64 => {
            if field.jstype == JsType::String {
                FieldKind::IntString
            } else {
                FieldKind::Int
            }
        }
        FieldType::Double | FieldType::Float => FieldKind::Float,
        FieldType::Bool => FieldKind::Bool,
        FieldType::String => FieldKind::String,
        FieldType::Bytes => FieldKind::Bytes,
        FieldType::Enum(name) => FieldKind::Enum(set.enumeration(name).ok_or_else(|| missing(name))?),
        FieldType::Group(name) => FieldKind::Group(set.message(name).ok_or_else(|| missing(name))?),
        FieldType::Message(name) => {
            let message = set.message(name).ok_or_else(|| missing(name))?;
            if message.map_entry {
                match (message.map_key(), message.map_value()) {
                    (Some(key), Some(value)) => FieldKind::Map { key, value },
                    _ => {
                        return Err(CodegenError::internal(format!(
                            "map entry '{name}' lacks a key or value field"
                        )));
                    }
                }
            } else {
                FieldKind::Message(message)
            }
        }
    })
}

/// Reader/writer method suffix (`readSint64`, `writePackedSint64String`).
#[must_use]
pub fn wire_suffix(field: &SchemaField) -> &'static str {
    let as_string = field.jstype == JsType::String;
    match &field.field_type {
        FieldType::Double => "Double",
        FieldType::Float => "Float",
        FieldType::Int64 if as_string => "Int64String",
        FieldType::Int64 => "Int64",
        FieldType::Uint64 if as_string => "Uint64String",
        FieldType::Uint64 => "Uint64",
        FieldType::Int32 => "Int32",
        FieldType::Fixed64 if as_string => "Fixed64String",
        FieldType::Fixed64 => "Fixed64",
        FieldType::Fixed32 => "Fixed32",
        FieldType::Bool => "Bool",
        FieldType::String => "String",
        FieldType::Bytes => "Bytes",
        FieldType::Uint32 => "Uint32",
        FieldType::Sfixed32 => "Sfixed32",
        FieldType::Sfixed64 if as_string => "Sfixed64String",
        FieldType::Sfixed64 => "Sfixed64",
        FieldType::Sint32 => "Sint32",
        FieldType::Sint64 if as_string => "Sint64String",
        FieldType::Sint64 => "Sint64",
        FieldType::Enum(_) => "Enum",
        FieldType::Message(_) => "Message",
        FieldType::Group(_) => "Group",
    }
}

/// JavaScript literal for the value an unset field reads as.
///
/// # Errors
/// Returns `CodegenError::InvalidDefault` for unparseable explicit defaults.
pub fn default_value(plan: &FieldPlan<'_>) -> Result<String, CodegenError> {
    let explicit = plan.field.default_value.as_deref();
    let invalid = |value: &str| CodegenError::InvalidDefault {
        field: plan.field.full_name(),
        value: value.to_string(),
    };
    match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) => {
            Err(CodegenError::internal(format!(
                "map field '{}' has no singular default",
                plan.field.full_name()
            )))
        }
        (_, Cardinality::Repeated { .. }) => Ok("[]".to_string()),
        (FieldKind::Message(_) | FieldKind::Group(_), _) => Ok("undefined".to_string()),
        (FieldKind::Int, _) => match explicit {
            None => Ok("0".to_string()),
            Some(value) => {
                let number = parse_integer(plan.field, value).ok_or_else(|| invalid(value))?;
                if number.abs() > MAX_SAFE_INTEGER {
                    tracing::warn!(
                        "default {} of field '{}' loses precision as a JavaScript number",
                        value,
                        plan.field.full_name()
                    );
                }
                Ok(number.to_string())
            }
        },
        (FieldKind::IntString, _) => match explicit {
            None => Ok("\"0\"".to_string()),
            Some(value) => {
                let number = parse_integer(plan.field, value).ok_or_else(|| invalid(value))?;
                Ok(format!("\"{number}\""))
            }
        },
        (FieldKind::Float, _) => match explicit {
            None => Ok("0.0".to_string()),
            Some(value) => float_literal(value).ok_or_else(|| invalid(value)),
        },
        (FieldKind::Bool, _) => match explicit {
            None | Some("false") => Ok("false".to_string()),
            Some("true") => Ok("true".to_string()),
            Some(value) => Err(invalid(value)),
        },
        (FieldKind::String, _) => Ok(js_string_literal(explicit.unwrap_or_default())),
        (FieldKind::Bytes, _) => match explicit {
            None => Ok("\"\"".to_string()),
            Some(value) => {
                let bytes = unescape_c(value).ok_or_else(|| invalid(value))?;
                Ok(format!("\"{}\"", STANDARD.encode(bytes)))
            }
        },
        (FieldKind::Enum(enumeration), _) => match explicit {
            None => Ok(enumeration
                .values
                .first()
                .map_or(0, |v| v.number)
                .to_string()),
            Some(name) => enumeration
                .value(name)
                .map(|v| v.number.to_string())
                .ok_or_else(|| invalid(name)),
        },
    }
}

/// JSDoc type of the value a getter returns.
#[must_use]
pub fn js_type(ctx: &EmitContext<'_>, plan: &FieldPlan<'_>) -> String {
    let element = |kind: FieldKind<'_>| -> String {
        match kind {
            FieldKind::Int | FieldKind::Float => "number".to_string(),
            FieldKind::IntString | FieldKind::String => "string".to_string(),
            FieldKind::Bool => "boolean".to_string(),
            FieldKind::Bytes => "!(string|Uint8Array)".to_string(),
            FieldKind::Enum(e) => ctx
                .names
                .resolve(&e.full_name)
                .map_or_else(|_| "number".to_string(), |n| format!("!{n}")),
            FieldKind::Message(m) | FieldKind::Group(m) => ctx
                .names
                .resolve(&m.full_name)
                .map_or_else(|_| "!jspb.Message".to_string(), |n| format!("!{n}")),
            FieldKind::Map { .. } => "!jspb.Map".to_string(),
        }
    };
    match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => "!jspb.Map".to_string(),
        (kind, Cardinality::Repeated { .. }) => format!("!Array<{}>", element(kind)),
        (FieldKind::Message(_) | FieldKind::Group(_), _) => {
            format!("?{}", element(plan.kind).trim_start_matches('!'))
        }
        (kind, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) => element(kind),
    }
}

/// Accessor methods of a field: getters, setter, add/clear/has helpers.
///
/// # Errors
/// Propagates resolution and default-value errors.
pub fn accessors(
    ctx: &EmitContext<'_>,
    plan: &FieldPlan<'_>,
    class: &str,
) -> Result<Vec<Method>, CodegenError> {
    let mut methods = vec![getter(ctx, plan, class, BytesMode::Default)?];
    if let FieldKind::Bytes = plan.kind {
        methods.push(getter(ctx, plan, class, BytesMode::B64)?);
        methods.push(getter(ctx, plan, class, BytesMode::U8)?);
    }
    methods.extend(setter(ctx, plan, class)?);
    methods.extend(adder(ctx, plan, class)?);
    methods.extend(clearer(plan, class));
    methods.extend(haser(plan));
    Ok(methods)
}

fn getter(
    ctx: &EmitContext<'_>,
    plan: &FieldPlan<'_>,
    class: &str,
    mode: BytesMode,
) -> Result<Method, CodegenError> {
    let n = plan.number();
    let name = plan.getter_name(mode);
    let repeated = matches!(plan.cardinality, Cardinality::Repeated { .. });
    let base = plan.getter_name(BytesMode::Default);

    let (params, return_type, statement) = match (plan.kind, mode) {
        (FieldKind::Bytes, BytesMode::B64) => {
            let (ty, helper) = if repeated {
                ("!Array<string>", "bytesListAsB64")
            } else {
                ("string", "bytesAsB64")
            };
            (
                "",
                ty.to_string(),
                format!("return /** @type {{{ty}}} */ (jspb.Message.{helper}(\n      this.{base}()));"),
            )
        }
        (FieldKind::Bytes, BytesMode::U8) => {
            let (ty, helper) = if repeated {
                ("!Array<!Uint8Array>", "bytesListAsU8")
            } else {
                ("!Uint8Array", "bytesAsU8")
            };
            (
                "",
                ty.to_string(),
                format!("return /** @type {{{ty}}} */ (jspb.Message.{helper}(\n      this.{base}()));"),
            )
        }
        (_, BytesMode::B64 | BytesMode::U8) => {
            return Err(CodegenError::internal(format!(
                "bytes coercion requested for non-bytes field '{}'",
                plan.field.full_name()
            )));
        }
        (FieldKind::Map { value, .. }, BytesMode::Default) => {
            let value_ctor = match &value.field_type {
                FieldType::Message(name) => ctx.resolve(name)?,
                _ => "null".to_string(),
            };
            (
                "opt_noLazyCreate",
                "!jspb.Map".to_string(),
                format!(
                    "return /** @type {{!jspb.Map}} */ (\n      jspb.Message.getMapField(this, {n}, opt_noLazyCreate,\n      {value_ctor}));"
                ),
            )
        }
        (FieldKind::Message(m) | FieldKind::Group(m), BytesMode::Default) => {
            let ctor = ctx.resolve(&m.full_name)?;
            let ty = js_type(ctx, plan);
            let call = if repeated {
                "getRepeatedWrapperField"
            } else {
                "getWrapperField"
            };
            (
                "",
                ty.clone(),
                format!("return /** @type{{{ty}}} */ (\n    jspb.Message.{call}(this, {ctor}, {n}));"),
            )
        }
        (
            FieldKind::Int
            | FieldKind::IntString
            | FieldKind::Float
            | FieldKind::Bool
            | FieldKind::String
            | FieldKind::Bytes
            | FieldKind::Enum(_),
            BytesMode::Default,
        ) => {
            let ty = js_type(ctx, plan);
            let (with_default, _, repeated_call) = scalar_calls(plan.kind);
            let expr = if repeated {
                format!("jspb.Message.{repeated_call}(this, {n})")
            } else {
                format!(
                    "jspb.Message.{with_default}(this, {n}, {})",
                    default_value(plan)?
                )
            };
            ("", ty.clone(), format!("return /** @type {{{ty}}} */ ({expr});"))
        }
    };

    let mut body = Vec::new();
    if let (Cardinality::OneofMember { .. }, Some(oneof), BytesMode::Default) =
        (plan.cardinality, plan.oneof, mode)
    {
        let case = to_upper_camel(oneof);
        body.push(format!(
            "if (this.get{case}Case() !== {class}.{case}Case.{}) {{",
            plan.field.name.to_ascii_uppercase()
        ));
        body.push(format!("  return {};", default_value(plan)?));
        body.push("}".to_string());
    }
    body.extend(statement.lines().map(str::to_string));

    Ok(Method::new(name, params)
        .with_doc(format!("@return {{{return_type}}}"))
        .with_body(body))
}

fn setter(
    ctx: &EmitContext<'_>,
    plan: &FieldPlan<'_>,
    class: &str,
) -> Result<Option<Method>, CodegenError> {
    let n = plan.number();
    let statement = match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => return Ok(None),
        (FieldKind::Message(_) | FieldKind::Group(_), Cardinality::Repeated { .. }) => {
            format!("return jspb.Message.setRepeatedWrapperField(this, {n}, value);")
        }
        (FieldKind::Message(_) | FieldKind::Group(_), Cardinality::OneofMember { group }) => {
            format!("return jspb.Message.setOneofWrapperField(this, {n}, {class}.oneofGroups_[{group}], value);")
        }
        (FieldKind::Message(_) | FieldKind::Group(_), Cardinality::Singular { .. }) => {
            format!("return jspb.Message.setWrapperField(this, {n}, value);")
        }
        (_, Cardinality::Repeated { .. }) => {
            format!("return jspb.Message.setField(this, {n}, value || []);")
        }
        (_, Cardinality::OneofMember { group }) => {
            format!("return jspb.Message.setOneofField(this, {n}, {class}.oneofGroups_[{group}], value);")
        }
        (_, Cardinality::Singular { presence: true }) => {
            format!("return jspb.Message.setField(this, {n}, value);")
        }
        (kind, Cardinality::Singular { presence: false }) => {
            let call = match kind {
                FieldKind::Int => "setProto3IntField",
                FieldKind::IntString => "setProto3StringIntField",
                FieldKind::Float => "setProto3FloatField",
                FieldKind::Bool => "setProto3BooleanField",
                FieldKind::String => "setProto3StringField",
                FieldKind::Bytes => "setProto3BytesField",
                FieldKind::Enum(_) => "setProto3EnumField",
                FieldKind::Message(_) | FieldKind::Group(_) | FieldKind::Map { .. } => {
                    return Err(CodegenError::internal(format!(
                        "field '{}' cannot use implicit presence",
                        plan.field.full_name()
                    )));
                }
            };
            format!("return jspb.Message.{call}(this, {n}, value);")
        }
    };
    let value_type = match plan.kind {
        FieldKind::Message(_) | FieldKind::Group(_) => {
            format!("{}|undefined", js_type(ctx, plan))
        }
        _ => js_type(ctx, plan),
    };
    Ok(Some(
        Method::new(plan.setter_name(), "value")
            .with_doc(format!("@param {{{value_type}}} value"))
            .with_doc(format!("@return {{!{class}}} returns this"))
            .with_body(vec![statement]),
    ))
}

fn adder(
    ctx: &EmitContext<'_>,
    plan: &FieldPlan<'_>,
    class: &str,
) -> Result<Option<Method>, CodegenError> {
    let n = plan.number();
    let name = format!("add{}", plan.ident());
    match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => Ok(None),
        (FieldKind::Message(m) | FieldKind::Group(m), Cardinality::Repeated { .. }) => {
            let ctor = ctx.resolve(&m.full_name)?;
            Ok(Some(
                Method::new(name, "opt_value, opt_index")
                    .with_doc(format!("@param {{!{ctor}=}} opt_value"))
                    .with_doc("@param {number=} opt_index")
                    .with_doc(format!("@return {{!{ctor}}}"))
                    .with_body(vec![format!(
                        "return jspb.Message.addToRepeatedWrapperField(this, {n}, opt_value, {ctor}, opt_index);"
                    )]),
            ))
        }
        (_, Cardinality::Repeated { .. }) => {
            let array_type = js_type(ctx, plan);
            let element = element_type(&array_type);
            Ok(Some(
                Method::new(name, "value, opt_index")
                    .with_doc(format!("@param {{{element}}} value"))
                    .with_doc("@param {number=} opt_index")
                    .with_doc(format!("@return {{!{class}}} returns this"))
                    .with_body(vec![format!(
                        "return jspb.Message.addToRepeatedField(this, {n}, value, opt_index);"
                    )]),
            ))
        }
        (_, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) => Ok(None),
    }
}

fn clearer(plan: &FieldPlan<'_>, class: &str) -> Option<Method> {
    let n = plan.number();
    let name = format!("clear{}", plan.accessor_stem());
    let body = match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => vec![
            format!("this.{}().clear();", plan.getter_name(BytesMode::Default)),
            "return this;".to_string(),
        ],
        (_, Cardinality::Repeated { .. }) => {
            vec![format!("return this.{}([]);", plan.setter_name())]
        }
        (FieldKind::Message(_) | FieldKind::Group(_), _) => {
            vec![format!("return this.{}(undefined);", plan.setter_name())]
        }
        (_, Cardinality::OneofMember { group }) => vec![format!(
            "return jspb.Message.setOneofField(this, {n}, {class}.oneofGroups_[{group}], undefined);"
        )],
        (_, Cardinality::Singular { presence: true }) => {
            vec![format!("return jspb.Message.setField(this, {n}, undefined);")]
        }
        (_, Cardinality::Singular { presence: false }) => return None,
    };
    Some(
        Method::new(name, "")
            .with_doc(format!("@return {{!{class}}} returns this"))
            .with_body(body),
    )
}

fn haser(plan: &FieldPlan<'_>) -> Option<Method> {
    let present = match (plan.kind, plan.cardinality) {
        (_, Cardinality::Repeated { .. }) => false,
        (FieldKind::Message(_) | FieldKind::Group(_), _) => true,
        (_, Cardinality::OneofMember { .. }) => true,
        (_, Cardinality::Singular { presence }) => presence,
    };
    present.then(|| {
        Method::new(format!("has{}", plan.ident()), "")
            .with_doc("@return {boolean}")
            .with_body(vec![format!(
                "return jspb.Message.getField(this, {}) != null;",
                plan.number()
            )])
    })
}

/// `(with default, optional, repeated)` read calls for scalar kinds.
fn scalar_calls(kind: FieldKind<'_>) -> (&'static str, &'static str, &'static str) {
    match kind {
        FieldKind::Float => (
            "getFloatingPointFieldWithDefault",
            "getOptionalFloatingPointField",
            "getRepeatedFloatingPointField",
        ),
        FieldKind::Bool => (
            "getBooleanFieldWithDefault",
            "getBooleanField",
            "getRepeatedBooleanField",
        ),
        FieldKind::Int
        | FieldKind::IntString
        | FieldKind::String
        | FieldKind::Bytes
        | FieldKind::Enum(_)
        | FieldKind::Message(_)
        | FieldKind::Group(_)
        | FieldKind::Map { .. } => ("getFieldWithDefault", "getField", "getRepeatedField"),
    }
}

/// `key: expression` entry of the field in `toObject`.
///
/// # Errors
/// Propagates resolution and default-value errors.
pub fn to_object_entry(ctx: &EmitContext<'_>, plan: &FieldPlan<'_>) -> Result<String, CodegenError> {
    let n = plan.number();
    let getter = plan.getter_name(BytesMode::Default);
    let expr = match (plan.kind, plan.cardinality) {
        (FieldKind::Map { value, .. }, Cardinality::Repeated { .. }) => {
            let value_to_object = match &value.field_type {
                FieldType::Message(name) => format!("{}.toObject", ctx.resolve(name)?),
                _ => "undefined".to_string(),
            };
            format!("(f = msg.{getter}()) ? f.toObject(includeInstance, {value_to_object}) : []")
        }
        (FieldKind::Map { .. }, _) => {
            return Err(CodegenError::internal(format!(
                "map field '{}' is not repeated",
                plan.field.full_name()
            )));
        }
        (FieldKind::Message(m) | FieldKind::Group(m), Cardinality::Repeated { .. }) => format!(
            "jspb.Message.toObjectList(msg.{getter}(),\n    {}.toObject, includeInstance)",
            ctx.resolve(&m.full_name)?
        ),
        (FieldKind::Message(m) | FieldKind::Group(m), _) => format!(
            "(f = msg.{getter}()) && {}.toObject(includeInstance, f)",
            ctx.resolve(&m.full_name)?
        ),
        (FieldKind::Bytes, Cardinality::Singular { presence: true } | Cardinality::OneofMember { .. }) => {
            format!(
                "(f = jspb.Message.getField(msg, {n})) == null ? undefined : msg.{}()",
                plan.getter_name(BytesMode::B64)
            )
        }
        (FieldKind::Bytes, _) => format!("msg.{}()", plan.getter_name(BytesMode::B64)),
        (kind, Cardinality::Repeated { .. }) => {
            let (_, _, repeated_call) = scalar_calls(kind);
            format!("(f = jspb.Message.{repeated_call}(msg, {n})) == null ? undefined : f")
        }
        (kind, Cardinality::Singular { presence: false }) => {
            let (with_default, _, _) = scalar_calls(kind);
            format!("jspb.Message.{with_default}(msg, {n}, {})", default_value(plan)?)
        }
        // Unset fields with presence stay absent, explicit defaults included.
        (kind, Cardinality::Singular { presence: true } | Cardinality::OneofMember { .. }) => {
            let (_, optional, _) = scalar_calls(kind);
            format!("(f = jspb.Message.{optional}(msg, {n})) == null ? undefined : f")
        }
    };
    Ok(format!("{}: {expr}", plan.object_key()))
}

/// Statement copying the field out of a plain object in `fromObject`.
///
/// # Errors
/// Propagates resolution errors.
pub fn from_object_statement(
    ctx: &EmitContext<'_>,
    plan: &FieldPlan<'_>,
) -> Result<String, CodegenError> {
    let n = plan.number();
    let key = plan.object_key();
    Ok(match (plan.kind, plan.cardinality) {
        (FieldKind::Map { value, .. }, Cardinality::Repeated { .. }) => {
            let (ctor, from_object) = match &value.field_type {
                FieldType::Message(name) => {
                    let ctor = ctx.resolve(name)?;
                    let from_object = format!("{ctor}.fromObject");
                    (ctor, from_object)
                }
                _ => ("null".to_string(), "undefined".to_string()),
            };
            format!(
                "obj.{key} && jspb.Message.setWrapperField(\n    msg, {n}, jspb.Map.fromObject(obj.{key}, {ctor}, {from_object}));"
            )
        }
        (FieldKind::Map { .. }, _) => {
            return Err(CodegenError::internal(format!(
                "map field '{}' is not repeated",
                plan.field.full_name()
            )));
        }
        (FieldKind::Message(m) | FieldKind::Group(m), Cardinality::Repeated { .. }) => format!(
            "obj.{key} && jspb.Message.setRepeatedWrapperField(\n    msg, {n}, obj.{key}.map(\n        {}.fromObject));",
            ctx.resolve(&m.full_name)?
        ),
        (FieldKind::Message(m) | FieldKind::Group(m), _) => format!(
            "obj.{key} && jspb.Message.setWrapperField(\n    msg, {n}, {}.fromObject(obj.{key}));",
            ctx.resolve(&m.full_name)?
        ),
        (_, _) => format!("obj.{key} != null && jspb.Message.setField(msg, {n}, obj.{key});"),
    })
}

/// Body of the field's `case` in `deserializeBinaryFromReader`, without the
/// trailing `break`.
///
/// # Errors
/// Propagates resolution and default-value errors.
pub fn read_case(ctx: &EmitContext<'_>, plan: &FieldPlan<'_>) -> Result<Vec<String>, CodegenError> {
    let n = plan.number();
    let setter = plan.setter_name();
    let adder = format!("add{}", plan.ident());
    let suffix = wire_suffix(plan.field);
    let ty = js_type(ctx, plan);

    Ok(match (plan.kind, plan.cardinality) {
        (FieldKind::Map { key, value }, Cardinality::Repeated { .. }) => {
            let key_plan = FieldPlan::new(ctx.set, None, key)?;
            let value_plan = FieldPlan::new(ctx.set, None, value)?;
            let (value_callback, value_default) = match value_plan.kind {
                FieldKind::Message(m) => {
                    let ctor = ctx.resolve(&m.full_name)?;
                    (format!("{ctor}.deserializeBinaryFromReader"), format!("new {ctor}()"))
                }
                _ => ("null".to_string(), default_value(&value_plan)?),
            };
            vec![
                format!("var value = msg.{}();", plan.getter_name(BytesMode::Default)),
                "reader.readMessage(value, function(message, reader) {".to_string(),
                format!(
                    "  jspb.Map.deserializeBinary(message, reader, jspb.BinaryReader.prototype.read{}, jspb.BinaryReader.prototype.read{}, {value_callback}, {}, {value_default});",
                    wire_suffix(key),
                    wire_suffix(value),
                    default_value(&key_plan)?
                ),
                "});".to_string(),
            ]
        }
        (FieldKind::Map { .. }, _) => {
            return Err(CodegenError::internal(format!(
                "map field '{}' is not repeated",
                plan.field.full_name()
            )));
        }
        (FieldKind::Message(m), cardinality) => {
            let ctor = ctx.resolve(&m.full_name)?;
            vec![
                format!("var value = new {ctor};"),
                format!("reader.readMessage(value,{ctor}.deserializeBinaryFromReader);"),
                store(cardinality, &setter, &adder),
            ]
        }
        (FieldKind::Group(m), cardinality) => {
            let ctor = ctx.resolve(&m.full_name)?;
            vec![
                format!("var value = new {ctor};"),
                format!("reader.readGroup({n}, value,{ctor}.deserializeBinaryFromReader);"),
                store(cardinality, &setter, &adder),
            ]
        }
        (FieldKind::String | FieldKind::Bytes, Cardinality::Repeated { .. }) => vec![
            format!("var value = /** @type {{{}}} */ (reader.read{suffix}());", element_type(&ty)),
            format!("msg.{adder}(value);"),
        ],
        (
            FieldKind::Int | FieldKind::IntString | FieldKind::Float | FieldKind::Bool | FieldKind::Enum(_),
            Cardinality::Repeated { .. },
        ) => vec![
            format!(
                "var values = /** @type {{{ty}}} */ (reader.isDelimited() ? reader.readPacked{suffix}() : [reader.read{suffix}()]);"
            ),
            "for (var i = 0; i < values.length; i++) {".to_string(),
            format!("  msg.{adder}(values[i]);"),
            "}".to_string(),
        ],
        (
            FieldKind::Int
            | FieldKind::IntString
            | FieldKind::Float
            | FieldKind::Bool
            | FieldKind::String
            | FieldKind::Bytes
            | FieldKind::Enum(_),
            Cardinality::Singular { .. } | Cardinality::OneofMember { .. },
        ) => vec![
            format!("var value = /** @type {{{ty}}} */ (reader.read{suffix}());"),
            format!("msg.{setter}(value);"),
        ],
    })
}

fn store(cardinality: Cardinality, setter: &str, adder: &str) -> String {
    match cardinality {
        Cardinality::Repeated { .. } => format!("msg.{adder}(value);"),
        Cardinality::Singular { .. } | Cardinality::OneofMember { .. } => {
            format!("msg.{setter}(value);")
        }
    }
}

fn element_type(array_type: &str) -> &str {
    array_type
        .strip_prefix("!Array<")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(array_type)
}

/// Lines writing the field in `serializeBinaryToWriter`.
///
/// Implicit-presence fields are skipped at their default value;
/// explicit-presence fields are written whenever set.
///
/// # Errors
/// Propagates resolution errors.
pub fn write_block(ctx: &EmitContext<'_>, plan: &FieldPlan<'_>) -> Result<Vec<String>, CodegenError> {
    let n = plan.number();
    let getter = plan.getter_name(BytesMode::Default);
    let suffix = wire_suffix(plan.field);

    let value = match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => format!("message.{getter}(true)"),
        (FieldKind::Message(_) | FieldKind::Group(_), _) => format!("message.{getter}()"),
        (FieldKind::Bytes, Cardinality::Repeated { .. }) => {
            format!("message.{}()", plan.getter_name(BytesMode::U8))
        }
        (_, Cardinality::Repeated { .. }) => format!("message.{getter}()"),
        (_, Cardinality::OneofMember { .. } | Cardinality::Singular { presence: true }) => {
            format!(
                "/** @type {{{}}} */ (jspb.Message.getField(message, {n}))",
                js_type(ctx, plan).trim_start_matches('!')
            )
        }
        (FieldKind::Bytes, Cardinality::Singular { presence: false }) => {
            format!("message.{}()", plan.getter_name(BytesMode::U8))
        }
        (_, Cardinality::Singular { presence: false }) => format!("message.{getter}()"),
    };

    let guard = match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => "f && f.getLength() > 0",
        (_, Cardinality::Repeated { .. }) => "f.length > 0",
        (FieldKind::Message(_) | FieldKind::Group(_), _) => "f != null",
        (_, Cardinality::OneofMember { .. } | Cardinality::Singular { presence: true }) => "f != null",
        (FieldKind::Int, Cardinality::Singular { presence: false }) => "f !== 0",
        (FieldKind::IntString, Cardinality::Singular { presence: false }) => "parseInt(f, 10) !== 0",
        (FieldKind::Float | FieldKind::Enum(_), Cardinality::Singular { presence: false }) => {
            "f !== 0.0"
        }
        (FieldKind::Bool, Cardinality::Singular { presence: false }) => "f",
        (FieldKind::String | FieldKind::Bytes, Cardinality::Singular { presence: false }) => {
            "f.length > 0"
        }
    };

    let write = match (plan.kind, plan.cardinality) {
        (FieldKind::Map { key, value }, _) => {
            let value_writer = match &value.field_type {
                FieldType::Message(name) => format!(", {}.serializeBinaryToWriter", ctx.resolve(name)?),
                _ => String::new(),
            };
            format!(
                "f.serializeBinary({n}, writer, jspb.BinaryWriter.prototype.write{}, jspb.BinaryWriter.prototype.write{}{value_writer});",
                wire_suffix(key),
                wire_suffix(value)
            )
        }
        (FieldKind::Message(m) | FieldKind::Group(m), cardinality) => {
            let repeated = if let Cardinality::Repeated { .. } = cardinality {
                "Repeated"
            } else {
                ""
            };
            format!(
                "writer.write{repeated}{suffix}(\n  {n},\n  f,\n  {}.serializeBinaryToWriter\n);",
                ctx.resolve(&m.full_name)?
            )
        }
        (_, Cardinality::Repeated { packed: true }) => format!("writer.writePacked{suffix}(\n  {n},\n  f\n);"),
        (_, Cardinality::Repeated { packed: false }) => {
            format!("writer.writeRepeated{suffix}(\n  {n},\n  f\n);")
        }
        (_, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) => {
            format!("writer.write{suffix}(\n  {n},\n  f\n);")
        }
    };

    let mut lines = vec![format!("f = {value};"), format!("if ({guard}) {{")];
    lines.extend(write.lines().map(|l| format!("  {l}")));
    lines.push("}".to_string());
    Ok(lines)
}

fn parse_integer(field: &SchemaField, value: &str) -> Option<i128> {
    let parsed: i128 = value.trim().parse().ok()?;
    let in_range = match &field.field_type {
        FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => {
            i32::try_from(parsed).is_ok()
        }
        FieldType::Uint32 | FieldType::Fixed32 => u32::try_from(parsed).is_ok(),
        FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => {
            i64::try_from(parsed).is_ok()
        }
        FieldType::Uint64 | FieldType::Fixed64 => u64::try_from(parsed).is_ok(),
        _ => false,
    };
    if !in_range {
        return None;
    }
    // Unsigned 64-bit defaults above i64::MAX wrap like the runtime's
    // two's-complement view.
    if field.field_type.is_64_bit_integer() && field.field_type.is_unsigned() {
        let unsigned = u64::try_from(parsed).ok()?;
        return Some(i128::from(unsigned as i64));
    }
    Some(parsed)
}

fn float_literal(value: &str) -> Option<String> {
    match value.trim() {
        "inf" | "+inf" | "infinity" => Some("Infinity".to_string()),
        "-inf" | "-infinity" => Some("-Infinity".to_string()),
        "nan" | "-nan" => Some("NaN".to_string()),
        other => {
            let parsed: f64 = other.parse().ok()?;
            if !parsed.is_finite() {
                return None;
            }
            let magnitude = parsed.abs();
            if magnitude >= 1e21 || (magnitude != 0.0 && magnitude < 1e-6) {
                Some(format!("{parsed:e}"))
            } else {
                Some(format!("{parsed}"))
            }
        }
    }
}

/// Renders a double-quoted JavaScript string literal.
#[must_use]
pub fn js_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out.push('"');
    out
}

/// Decodes a C-escaped bytes default (`\n`, `\\`, `\"`, `\'`, `\x41`, `\101`).
fn unescape_c(value: &str) -> Option<Vec<u8>> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let escape = *bytes.get(i + 1)?;
        i += 2;
        match escape {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'\\' | b'"' | b'\'' | b'?' => out.push(escape),
            b'x' => {
                let start = i;
                while i < bytes.len() && i - start < 2 && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                let digits = std::str::from_utf8(&bytes[start..i]).ok()?;
                out.push(u8::from_str_radix(digits, 16).ok()?);
            }
            b'0'..=b'7' => {
                let start = i - 1;
                while i < bytes.len() && i - start < 3 && (b'0'..=b'7').contains(&bytes[i]) {
                    i += 1;
                }
                let digits = std::str::from_utf8(&bytes[start..i]).ok()?;
                out.push(u8::try_from(u16::from_str_radix(digits, 8).ok()?).ok()?);
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameResolver;
    use crate::options::GenerationOptions;
    use protojs_schema::{SchemaFile, Syntax};
    use std::collections::BTreeSet;

    fn fixture() -> SchemaSet {
        let file = SchemaFile::new("a.proto", "pkg")
            .with_syntax(Syntax::Proto3)
            .with_enum(SchemaEnum::new("Color").with_value("RED", 0).with_value("BLUE", 3))
            .with_message(SchemaMessage::new("Leaf"))
            .with_message(
                SchemaMessage::new("Msg")
                    .with_oneof("kind")
                    .with_field(SchemaField::new("count", 1, FieldType::Int32))
                    .with_field(SchemaField::new("data", 2, FieldType::Bytes))
                    .with_field(SchemaField::new("ids", 3, FieldType::Sint64).repeated())
                    .with_field(
                        SchemaField::new("big", 4, FieldType::Uint64).with_jstype(JsType::String),
                    )
                    .with_field(SchemaField::new("name", 5, FieldType::String).in_oneof(0))
                    .with_field(
                        SchemaField::new("leaf", 6, FieldType::Message("pkg.Leaf".to_string()))
                            .in_oneof(0),
                    )
                    .with_field(
                        SchemaField::new("tags", 7, FieldType::Message("pkg.Msg.TagsEntry".to_string()))
                            .repeated(),
                    )
                    .with_field(SchemaField::new("color", 8, FieldType::Enum("pkg.Color".to_string())))
                    .with_field(SchemaField::new("names", 9, FieldType::String).repeated())
                    .with_field(SchemaField::new("opt", 10, FieldType::Double).proto3_optional(1))
                    .with_oneof("_opt")
                    .with_nested(SchemaMessage::map_entry(
                        "TagsEntry",
                        FieldType::String,
                        FieldType::Message("pkg.Leaf".to_string()),
                    )),
            );
        SchemaSet::new(vec![file]).expect("Failed to link")
    }

    fn with_ctx<F: for<'c> FnOnce(&EmitContext<'c>, &'c SchemaMessage)>(f: F) {
        let set = fixture();
        let options = GenerationOptions::default().with_binary(true);
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
        let msg = set.message("pkg.Msg").expect("missing Msg");
        f(&ctx, msg);
    }

    fn plan<'a>(ctx: &EmitContext<'a>, msg: &'a SchemaMessage, number: u32) -> FieldPlan<'a> {
        let field = msg
            .fields
            .iter()
            .find(|f| f.number == number)
            .expect("missing field");
        FieldPlan::new(ctx.set, Some(msg), field).expect("Failed to plan")
    }

    fn render(methods: &[Method]) -> String {
        methods
            .iter()
            .map(|m| format!("{}({}) {{ {} }}", m.name, m.params, m.body.join(" ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_cardinality_dispatch() {
        with_ctx(|ctx, msg| {
            assert_eq!(
                plan(ctx, msg, 1).cardinality,
                Cardinality::Singular { presence: false }
            );
            assert_eq!(
                plan(ctx, msg, 3).cardinality,
                Cardinality::Repeated { packed: true }
            );
            assert_eq!(plan(ctx, msg, 5).cardinality, Cardinality::OneofMember { group: 0 });
            assert_eq!(
                plan(ctx, msg, 10).cardinality,
                Cardinality::Singular { presence: true }
            );
            assert!(matches!(plan(ctx, msg, 7).kind, FieldKind::Map { .. }));
            assert!(matches!(plan(ctx, msg, 4).kind, FieldKind::IntString));
        });
    }

    #[test]
    fn test_default_values() {
        with_ctx(|ctx, msg| {
            assert_eq!(default_value(&plan(ctx, msg, 1)).expect("default"), "0");
            assert_eq!(default_value(&plan(ctx, msg, 2)).expect("default"), "\"\"");
            assert_eq!(default_value(&plan(ctx, msg, 3)).expect("default"), "[]");
            assert_eq!(default_value(&plan(ctx, msg, 4)).expect("default"), "\"0\"");
            assert_eq!(default_value(&plan(ctx, msg, 6)).expect("default"), "undefined");
            assert_eq!(default_value(&plan(ctx, msg, 8)).expect("default"), "0");
            assert_eq!(default_value(&plan(ctx, msg, 10)).expect("default"), "0.0");
        });
    }

    #[test]
    fn test_explicit_defaults() {
        let color = SchemaEnum::new("Color").with_value("RED", 0).with_value("BLUE", 3);
        let check = |field: SchemaField| -> Result<String, CodegenError> {
            let kind = match &field.field_type {
                FieldType::Enum(_) => FieldKind::Enum(&color),
                FieldType::Int32 | FieldType::Uint64 => FieldKind::Int,
                FieldType::Double => FieldKind::Float,
                FieldType::Bool => FieldKind::Bool,
                FieldType::Bytes => FieldKind::Bytes,
                _ => FieldKind::String,
            };
            default_value(&FieldPlan {
                field: &field,
                kind,
                cardinality: Cardinality::Singular { presence: true },
                oneof: None,
            })
        };

        let enum_field = SchemaField::new("c", 1, FieldType::Enum("pkg.Color".to_string()));
        assert_eq!(check(enum_field.clone().with_default("BLUE")).expect("default"), "3");
        assert!(matches!(
            check(enum_field.with_default("GREEN")),
            Err(CodegenError::InvalidDefault { .. })
        ));
        assert_eq!(
            check(SchemaField::new("u", 1, FieldType::Uint64).with_default("18446744073709551615"))
                .expect("default"),
            "-1"
        );
        assert!(check(SchemaField::new("i", 1, FieldType::Int32).with_default("3000000000")).is_err());
        assert_eq!(
            check(SchemaField::new("d", 1, FieldType::Double).with_default("-inf")).expect("default"),
            "-Infinity"
        );
        assert_eq!(
            check(SchemaField::new("d", 1, FieldType::Double).with_default("1.5")).expect("default"),
            "1.5"
        );
        assert!(check(SchemaField::new("b", 1, FieldType::Bool).with_default("yes")).is_err());
        assert_eq!(
            check(SchemaField::new("s", 1, FieldType::String).with_default("a\"é\n")).expect("default"),
            "\"a\\\"\\u00e9\\n\""
        );
        assert_eq!(
            check(SchemaField::new("y", 1, FieldType::Bytes).with_default("ab\\x01\\101")).expect("default"),
            format!("\"{}\"", STANDARD.encode([b'a', b'b', 1, b'A']))
        );
    }

    #[test]
    fn test_bytes_accessors() {
        with_ctx(|ctx, msg| {
            let methods = accessors(ctx, &plan(ctx, msg, 2), "proto.pkg.Msg").expect("accessors");
            let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(
                names,
                vec!["getData", "getDataAsB64", "getDataAsU8", "setData"]
            );
            let text = render(&methods);
            assert!(text.contains("jspb.Message.bytesAsB64("));
            assert!(text.contains("this.getData()"));
            assert!(text.contains("jspb.Message.setProto3BytesField(this, 2, value);"));
        });
    }

    #[test]
    fn test_oneof_accessors_check_case() {
        with_ctx(|ctx, msg| {
            let text = render(&accessors(ctx, &plan(ctx, msg, 5), "proto.pkg.Msg").expect("accessors"));
            assert!(text.contains("if (this.getKindCase() !== proto.pkg.Msg.KindCase.NAME) {"));
            assert!(text.contains("setOneofField(this, 5, proto.pkg.Msg.oneofGroups_[0], value)"));
            assert!(text.contains("clearName()"));
            assert!(text.contains("hasName()"));

            let text = render(&accessors(ctx, &plan(ctx, msg, 6), "proto.pkg.Msg").expect("accessors"));
            assert!(text.contains("setOneofWrapperField(this, 6, proto.pkg.Msg.oneofGroups_[0], value)"));
            assert!(text.contains("jspb.Message.getWrapperField(this, proto.pkg.Leaf, 6)"));
        });
    }

    #[test]
    fn test_repeated_and_map_accessors() {
        with_ctx(|ctx, msg| {
            let text = render(&accessors(ctx, &plan(ctx, msg, 3), "proto.pkg.Msg").expect("accessors"));
            assert!(text.contains("getIdsList()"));
            assert!(text.contains("addIds(value, opt_index)"));
            assert!(text.contains("clearIdsList() { return this.setIdsList([]); }"));

            let methods = accessors(ctx, &plan(ctx, msg, 7), "proto.pkg.Msg").expect("accessors");
            let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["getTagsMap", "clearTagsMap"]);
            assert!(render(&methods).contains("getMapField(this, 7, opt_noLazyCreate,"));
        });
    }

    #[test]
    fn test_scalar_adder_documents_parameters() {
        with_ctx(|ctx, msg| {
            let methods = accessors(ctx, &plan(ctx, msg, 9), "proto.pkg.Msg").expect("accessors");
            let adder = methods
                .iter()
                .find(|m| m.name == "addNames")
                .expect("Failed to find addNames");
            assert_eq!(
                adder.doc,
                vec![
                    "@param {string} value".to_string(),
                    "@param {number=} opt_index".to_string(),
                    "@return {!proto.pkg.Msg} returns this".to_string(),
                ]
            );
        });
    }

    #[test]
    fn test_proto3_scalar_has_no_presence_helpers() {
        with_ctx(|ctx, msg| {
            let methods = accessors(ctx, &plan(ctx, msg, 1), "proto.pkg.Msg").expect("accessors");
            let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["getCount", "setCount"]);

            let methods = accessors(ctx, &plan(ctx, msg, 10), "proto.pkg.Msg").expect("accessors");
            let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["getOpt", "setOpt", "clearOpt", "hasOpt"]);
        });
    }

    #[test]
    fn test_to_object_entries() {
        with_ctx(|ctx, msg| {
            assert_eq!(
                to_object_entry(ctx, &plan(ctx, msg, 1)).expect("entry"),
                "count: jspb.Message.getFieldWithDefault(msg, 1, 0)"
            );
            assert_eq!(
                to_object_entry(ctx, &plan(ctx, msg, 2)).expect("entry"),
                "data: msg.getDataAsB64()"
            );
            assert_eq!(
                to_object_entry(ctx, &plan(ctx, msg, 10)).expect("entry"),
                "opt: (f = jspb.Message.getOptionalFloatingPointField(msg, 10)) == null ? undefined : f"
            );
            assert_eq!(
                to_object_entry(ctx, &plan(ctx, msg, 7)).expect("entry"),
                "tagsMap: (f = msg.getTagsMap()) ? f.toObject(includeInstance, proto.pkg.Leaf.toObject) : []"
            );
        });
    }

    #[test]
    fn test_from_object_statements() {
        with_ctx(|ctx, msg| {
            assert_eq!(
                from_object_statement(ctx, &plan(ctx, msg, 9)).expect("statement"),
                "obj.namesList != null && jspb.Message.setField(msg, 9, obj.namesList);"
            );
            assert!(
                from_object_statement(ctx, &plan(ctx, msg, 6))
                    .expect("statement")
                    .contains("proto.pkg.Leaf.fromObject(obj.leaf)")
            );
        });
    }

    #[test]
    fn test_read_cases() {
        with_ctx(|ctx, msg| {
            let packed = read_case(ctx, &plan(ctx, msg, 3)).expect("read").join("\n");
            assert!(packed.contains("reader.isDelimited() ? reader.readPackedSint64() : [reader.readSint64()]"));
            assert!(packed.contains("msg.addIds(values[i]);"));

            let strings = read_case(ctx, &plan(ctx, msg, 9)).expect("read").join("\n");
            assert!(strings.contains("reader.readString()"));
            assert!(!strings.contains("readPacked"));

            let big = read_case(ctx, &plan(ctx, msg, 4)).expect("read").join("\n");
            assert!(big.contains("reader.readUint64String()"));

            let map = read_case(ctx, &plan(ctx, msg, 7)).expect("read").join("\n");
            assert!(map.contains(
                "jspb.Map.deserializeBinary(message, reader, jspb.BinaryReader.prototype.readString, jspb.BinaryReader.prototype.readMessage, proto.pkg.Leaf.deserializeBinaryFromReader, \"\", new proto.pkg.Leaf());"
            ));
        });
    }

    #[test]
    fn test_write_blocks() {
        with_ctx(|ctx, msg| {
            let count = write_block(ctx, &plan(ctx, msg, 1)).expect("write").join("\n");
            assert!(count.starts_with("f = message.getCount();\nif (f !== 0) {"));
            assert!(count.contains("writer.writeInt32("));

            let big = write_block(ctx, &plan(ctx, msg, 4)).expect("write").join("\n");
            assert!(big.contains("if (parseInt(f, 10) !== 0) {"));

            let data = write_block(ctx, &plan(ctx, msg, 2)).expect("write").join("\n");
            assert!(data.contains("f = message.getDataAsU8();"));

            let ids = write_block(ctx, &plan(ctx, msg, 3)).expect("write").join("\n");
            assert!(ids.contains("writer.writePackedSint64("));

            let name = write_block(ctx, &plan(ctx, msg, 5)).expect("write").join("\n");
            assert!(name.contains("jspb.Message.getField(message, 5)"));
            assert!(name.contains("if (f != null) {"));

            let tags = write_block(ctx, &plan(ctx, msg, 7)).expect("write").join("\n");
            assert!(tags.contains("f = message.getTagsMap(true);"));
            assert!(tags.contains(", proto.pkg.Leaf.serializeBinaryToWriter);"));
        });
    }

    #[test]
    fn test_proto3_optional_written_when_set() {
        with_ctx(|ctx, msg| {
            let opt = write_block(ctx, &plan(ctx, msg, 10)).expect("write").join("\n");
            assert_eq!(
                opt,
                "f = /** @type {number} */ (jspb.Message.getField(message, 10));\n\
                 if (f != null) {\n  writer.writeDouble(\n    10,\n    f\n  );\n}"
            );
            assert!(!opt.contains("f !== 0.0"));
        });
    }

    fn proto2_fixture() -> SchemaSet {
        let file = SchemaFile::new("r.proto", "pkg").with_message(
            SchemaMessage::new("R")
                .with_field(SchemaField::new("data", 1, FieldType::Bytes))
                .with_field(SchemaField::new("n", 2, FieldType::Int32).with_default("7"))
                .with_field(SchemaField::new("item", 3, FieldType::Group("pkg.R.Item".to_string())))
                .with_field(
                    SchemaField::new("entry", 4, FieldType::Group("pkg.R.Item".to_string())).repeated(),
                )
                .with_nested(
                    SchemaMessage::new("Item").with_field(SchemaField::new("id", 1, FieldType::Int32)),
                ),
        );
        SchemaSet::new(vec![file]).expect("Failed to link")
    }

    fn with_proto2_ctx<F: for<'c> FnOnce(&EmitContext<'c>, &'c SchemaMessage)>(f: F) {
        let set = proto2_fixture();
        let options = GenerationOptions::default().with_binary(true);
        let files: Vec<&SchemaFile> = set.files().iter().collect();
        let resolver = NameResolver::new(&set, &options, &files);
        let names = resolver
            .for_unit("r.js", Some(&set.files()[0]), &BTreeSet::new())
            .expect("Failed to build names");
        let ctx = EmitContext {
            set: &set,
            options: &options,
            names: &names,
            file: &set.files()[0],
        };
        let msg = set.message("pkg.R").expect("missing R");
        f(&ctx, msg);
    }

    #[test]
    fn test_to_object_keeps_unset_presence_fields_absent() {
        with_proto2_ctx(|ctx, msg| {
            let data = plan(ctx, msg, 1);
            assert_eq!(data.cardinality, Cardinality::Singular { presence: true });
            assert_eq!(
                to_object_entry(ctx, &data).expect("entry"),
                "data: (f = jspb.Message.getField(msg, 1)) == null ? undefined : msg.getDataAsB64()"
            );
            assert_eq!(
                from_object_statement(ctx, &data).expect("statement"),
                "obj.data != null && jspb.Message.setField(msg, 1, obj.data);"
            );

            let n = plan(ctx, msg, 2);
            assert_eq!(
                to_object_entry(ctx, &n).expect("entry"),
                "n: (f = jspb.Message.getField(msg, 2)) == null ? undefined : f"
            );
            let getter = render(&accessors(ctx, &n, "proto.pkg.R").expect("accessors"));
            assert!(getter.contains("jspb.Message.getFieldWithDefault(this, 2, 7)"));
            assert!(getter.contains("hasN()"));
        });
    }

    #[test]
    fn test_group_read_and_write() {
        with_proto2_ctx(|ctx, msg| {
            let item = plan(ctx, msg, 3);
            assert!(matches!(item.kind, FieldKind::Group(m) if m.full_name == "pkg.R.Item"));

            let read = read_case(ctx, &item).expect("read").join("\n");
            assert!(read.contains("var value = new proto.pkg.R.Item;"));
            assert!(read.contains("reader.readGroup(3, value,proto.pkg.R.Item.deserializeBinaryFromReader);"));
            assert!(read.contains("msg.setItem(value);"));

            let write = write_block(ctx, &item).expect("write").join("\n");
            assert!(write.contains("f = message.getItem();"));
            assert!(write.contains("if (f != null) {"));
            assert!(write.contains("writer.writeGroup(\n    3,\n    f,\n    proto.pkg.R.Item.serializeBinaryToWriter\n  );"));

            let entries = plan(ctx, msg, 4);
            let read = read_case(ctx, &entries).expect("read").join("\n");
            assert!(read.contains("reader.readGroup(4, value,"));
            assert!(read.contains("msg.addEntry(value);"));
            let write = write_block(ctx, &entries).expect("write").join("\n");
            assert!(write.contains("f = message.getEntryList();"));
            assert!(write.contains("writer.writeRepeatedGroup("));
        });
    }

    #[test]
    fn test_map_in_oneof_is_internal_error() {
        let file = SchemaFile::new("m.proto", "pkg").with_message(
            SchemaMessage::new("Bad")
                .with_oneof("choice")
                .with_field(
                    SchemaField::new("m", 1, FieldType::Message("pkg.Bad.MEntry".to_string()))
                        .in_oneof(0),
                )
                .with_nested(SchemaMessage::map_entry("MEntry", FieldType::Int32, FieldType::Int32)),
        );
        let set = SchemaSet::new(vec![file]).expect("Failed to link");
        let msg = set.message("pkg.Bad").expect("missing Bad");
        let err = FieldPlan::new(&set, Some(msg), &msg.fields[0]).expect_err("accepted");
        assert!(matches!(err, CodegenError::Internal { .. }));
    }

    #[test]
    fn test_wire_suffixes() {
        assert_eq!(wire_suffix(&SchemaField::new("a", 1, FieldType::Sfixed64)), "Sfixed64");
        assert_eq!(
            wire_suffix(&SchemaField::new("a", 1, FieldType::Sfixed64).with_jstype(JsType::String)),
            "Sfixed64String"
        );
        assert_eq!(
            wire_suffix(&SchemaField::new("a", 1, FieldType::Int32).with_jstype(JsType::String)),
            "Int32"
        );
        assert_eq!(wire_suffix(&SchemaField::new("g", 1, FieldType::Group("p.G".to_string()))), "Group");
    }
}
