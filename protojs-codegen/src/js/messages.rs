//! Message emission.
//!
//! A message renders in a fixed sequence: constructor and metadata, field
//! accessors, `toObject`, `fromObject`, then the binary codec when enabled.
//! Nested enums and messages follow their parent.

use super::enums::{constant_table, emit_enum};
use super::fields::{self, Cardinality, FieldKind, FieldPlan};
use super::{EmitContext, Method, Section, write_assigned_method, write_class_method, write_doc};
use crate::error::CodegenError;
use crate::names::to_upper_camel;
use crate::writer::CodeWriter;
use protojs_schema::SchemaMessage;

/// Field number at or above which field data lives in an extension object.
const DEFAULT_PIVOT: u32 = 500;

/// A static member assigned on the constructor.
struct StaticMember {
    name: String,
    doc: Vec<String>,
    value: String,
}

/// Emits a message class and its nested definitions. Map-entry messages
/// produce nothing.
///
/// # Errors
/// Propagates field dispatch and resolution errors.
pub fn emit_message(
    ctx: &EmitContext<'_>,
    message: &SchemaMessage,
    path: &[i32],
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    if message.map_entry {
        return Ok(());
    }
    let class = ctx.resolve(&message.full_name)?;
    let plans = message
        .fields
        .iter()
        .map(|f| FieldPlan::new(ctx.set, Some(message), f))
        .collect::<Result<Vec<_>, _>>()?;

    let statics = static_members(message, &plans);
    let sections = method_sections(ctx, message, &class, &plans, path)?;
    let init = initialize_call(message, &class, &plans);

    if ctx.es6() {
        write_es6_class(ctx, message, &class, path, &init, &statics, &sections, w);
    } else {
        write_closure_class(ctx, &class, path, &init, &statics, &sections, w);
    }
    tracing::debug!(
        "emitted message {} ({} fields)",
        message.full_name,
        message.fields.len()
    );

    for (index, enumeration) in (0i32..).zip(&message.enums) {
        let mut enum_path = path.to_vec();
        enum_path.extend([4, index]);
        emit_enum(ctx, enumeration, &enum_path, w)?;
    }
    for (index, nested) in (0i32..).zip(&message.nested) {
        let mut nested_path = path.to_vec();
        nested_path.extend([3, index]);
        emit_message(ctx, nested, &nested_path, w)?;
    }
    Ok(())
}

/// Index past which fields are stored in the extension object, or -1.
fn pivot(message: &SchemaMessage) -> i64 {
    let max = message.fields.iter().map(|f| f.number).max().unwrap_or(0);
    if message.is_extendable() || max >= DEFAULT_PIVOT {
        i64::from((max + 1).min(DEFAULT_PIVOT))
    } else {
        -1
    }
}

/// Repeated fields tracked in `repeatedFields_`; maps are excluded.
fn is_list(plan: &FieldPlan<'_>) -> bool {
    match (plan.kind, plan.cardinality) {
        (FieldKind::Map { .. }, _) => false,
        (_, Cardinality::Repeated { .. }) => true,
        (_, Cardinality::Singular { .. } | Cardinality::OneofMember { .. }) => false,
    }
}

fn initialize_call(message: &SchemaMessage, class: &str, plans: &[FieldPlan<'_>]) -> String {
    let repeated = if plans.iter().any(is_list) {
        format!("{class}.repeatedFields_")
    } else {
        "null".to_string()
    };
    let oneofs = if message.real_oneofs().is_empty() {
        "null".to_string()
    } else {
        format!("{class}.oneofGroups_")
    };
    format!(
        "jspb.Message.initialize(this, opt_data, 0, {}, {repeated}, {oneofs});",
        pivot(message)
    )
}

fn static_members(message: &SchemaMessage, plans: &[FieldPlan<'_>]) -> Vec<StaticMember> {
    let mut out = Vec::new();

    let repeated: Vec<String> = plans
        .iter()
        .filter(|p| is_list(p))
        .map(|p| p.field.number.to_string())
        .collect();
    if !repeated.is_empty() {
        out.push(StaticMember {
            name: "repeatedFields_".to_string(),
            doc: vec![
                "List of repeated fields within this message type.".to_string(),
                "@private {!Array<number>}".to_string(),
                "@const".to_string(),
            ],
            value: format!("[{}]", repeated.join(",")),
        });
    }

    let real_oneofs = message.real_oneofs();
    if !real_oneofs.is_empty() {
        let groups: Vec<String> = real_oneofs
            .iter()
            .map(|&index| {
                let numbers: Vec<String> = message
                    .oneof_members(index)
                    .iter()
                    .map(|f| f.number.to_string())
                    .collect();
                format!("[{}]", numbers.join(","))
            })
            .collect();
        out.push(StaticMember {
            name: "oneofGroups_".to_string(),
            doc: vec![
                "Oneof group definitions for this message. Each group defines the field".to_string(),
                "numbers belonging to that group. When one of these fields' value is set, all".to_string(),
                "other fields in the group are cleared. During deserialization, if multiple".to_string(),
                "fields are encountered for a group, only the last value seen will be kept.".to_string(),
                "@private {!Array<!Array<number>>}".to_string(),
                "@const".to_string(),
            ],
            value: format!("[{}]", groups.join(",")),
        });

        for &index in &real_oneofs {
            let Some(oneof) = message.oneofs.get(index) else {
                continue;
            };
            let upper = oneof.name.to_ascii_uppercase();
            let mut entries = vec![(format!("{upper}_NOT_SET"), 0)];
            entries.extend(
                message
                    .oneof_members(index)
                    .iter()
                    .map(|f| (f.name.to_ascii_uppercase(), i64::from(f.number))),
            );
            out.push(StaticMember {
                name: format!("{}Case", to_upper_camel(&oneof.name)),
                doc: vec!["@enum {number}".to_string()],
                value: constant_table(&entries),
            });
        }
    }

    if message.is_extendable() {
        out.push(StaticMember {
            name: "extensions".to_string(),
            doc: vec![
                "The extensions registered with this message class. This is a map of".to_string(),
                "extension field number to fieldInfo object.".to_string(),
                String::new(),
                "For example:".to_string(),
                "    { 123: {fieldIndex: 123, fieldName: {my_field_name: 0}, ctor: proto.example.MyMessage} }".to_string(),
                String::new(),
                "fieldName contains the JsCompiler renamed field name property so that it".to_string(),
                "works in OPTIMIZED mode.".to_string(),
                String::new(),
                "@type {!Object<number, jspb.ExtensionFieldInfo>}".to_string(),
            ],
            value: "{}".to_string(),
        });
        out.push(StaticMember {
            name: "extensionsBinary".to_string(),
            doc: vec![
                "The extensions registered with this message class. This is a map of".to_string(),
                "extension field number to fieldInfo object.".to_string(),
                String::new(),
                "@type {!Object<number, jspb.ExtensionFieldBinaryInfo>}".to_string(),
            ],
            value: "{}".to_string(),
        });
    }
    out
}

fn method_sections(
    ctx: &EmitContext<'_>,
    message: &SchemaMessage,
    class: &str,
    plans: &[FieldPlan<'_>],
    path: &[i32],
) -> Result<Vec<Section>, CodegenError> {
    let mut sections = Vec::new();

    let mut accessors = Vec::new();
    for (group, index) in message.real_oneofs().into_iter().enumerate() {
        let Some(oneof) = message.oneofs.get(index) else {
            continue;
        };
        let case = format!("{}Case", to_upper_camel(&oneof.name));
        accessors.push(
            Method::new(format!("get{case}"), "")
                .with_doc(format!("@return {{{class}.{case}}}"))
                .with_body(vec![format!(
                    "return /** @type {{{class}.{case}}} */(jspb.Message.computeOneofCase(this, {class}.oneofGroups_[{group}]));"
                )]),
        );
    }
    for (index, plan) in (0i32..).zip(plans) {
        let mut field_path = path.to_vec();
        field_path.extend([2, index]);
        for method in fields::accessors(ctx, plan, class)? {
            accessors.push(method.with_path(field_path.clone()));
        }
    }
    sections.push(Section {
        guard: None,
        methods: accessors,
    });

    sections.push(Section {
        guard: Some("jspb.Message.GENERATE_TO_OBJECT"),
        methods: to_object_methods(ctx, message, class, plans)?,
    });
    sections.push(Section {
        guard: Some("jspb.Message.GENERATE_FROM_OBJECT"),
        methods: vec![from_object_method(ctx, class, plans)?],
    });
    if ctx.options.binary {
        sections.push(Section {
            guard: None,
            methods: binary_methods(ctx, message, class, plans)?,
        });
    }
    Ok(sections)
}

fn to_object_methods(
    ctx: &EmitContext<'_>,
    message: &SchemaMessage,
    class: &str,
    plans: &[FieldPlan<'_>],
) -> Result<Vec<Method>, CodegenError> {
    let instance = Method::new("toObject", "opt_includeInstance")
        .with_doc("Creates an object representation of this proto.")
        .with_doc("Field names that are reserved in JavaScript and will be renamed to pb_name.")
        .with_doc("@param {boolean=} opt_includeInstance Whether to include the JSPB")
        .with_doc("    instance under the $jspbMessageInstance key.")
        .with_doc("@return {!Object}")
        .with_body(vec![format!(
            "return {class}.toObject(opt_includeInstance, this);"
        )]);

    let entries = plans
        .iter()
        .map(|plan| fields::to_object_entry(ctx, plan))
        .collect::<Result<Vec<_>, _>>()?;
    let mut body = Vec::new();
    if entries.is_empty() {
        body.push("var f, obj = {};".to_string());
    } else {
        body.push("var f, obj = {".to_string());
        let last = entries.len() - 1;
        for (i, entry) in entries.iter().enumerate() {
            let separator = if i == last { "" } else { "," };
            let mut lines = entry.lines().peekable();
            while let Some(line) = lines.next() {
                if lines.peek().is_none() {
                    body.push(format!("  {line}{separator}"));
                } else {
                    body.push(format!("  {line}"));
                }
            }
        }
        body.push("};".to_string());
    }
    body.push(String::new());
    if message.is_extendable() {
        body.push(format!(
            "jspb.Message.toObjectExtension(/** @type {{!jspb.Message}} */ (msg), obj,\n    {class}.extensions, {class}.prototype.getExtension,\n    includeInstance);"
        ));
    }
    body.push("if (includeInstance) {".to_string());
    body.push("  obj.$jspbMessageInstance = msg;".to_string());
    body.push("}".to_string());
    body.push("return obj;".to_string());

    let static_method = Method::new_static("toObject", "includeInstance, msg")
        .with_doc("Static version of the {@see toObject} method.")
        .with_doc("@param {boolean|undefined} includeInstance Whether to include the JSPB")
        .with_doc("    instance under the $jspbMessageInstance key.")
        .with_doc(format!("@param {{!{class}}} msg The msg instance to transform."))
        .with_doc("@return {!Object}")
        .with_doc("@suppress {unusedLocalVariables} f is only used for nested messages")
        .with_body(split_lines(body));
    Ok(vec![instance, static_method])
}

fn from_object_method(
    ctx: &EmitContext<'_>,
    class: &str,
    plans: &[FieldPlan<'_>],
) -> Result<Method, CodegenError> {
    let mut body = vec![format!("var msg = new {class}();")];
    for plan in plans {
        body.push(fields::from_object_statement(ctx, plan)?);
    }
    body.push("return msg;".to_string());
    Ok(Method::new_static("fromObject", "obj")
        .with_doc("Loads data from an object into a new instance of this proto.")
        .with_doc("@param {!Object} obj The object representation of this proto to")
        .with_doc("    load the data from.")
        .with_doc(format!("@return {{!{class}}}"))
        .with_body(split_lines(body)))
}

fn binary_methods(
    ctx: &EmitContext<'_>,
    message: &SchemaMessage,
    class: &str,
    plans: &[FieldPlan<'_>],
) -> Result<Vec<Method>, CodegenError> {
    let mut by_number: Vec<&FieldPlan<'_>> = plans.iter().collect();
    by_number.sort_by_key(|p| p.field.number);

    let deserialize = Method::new_static("deserializeBinary", "bytes")
        .with_doc("Deserializes binary data (in protobuf wire format).")
        .with_doc("@param {jspb.ByteSource} bytes The bytes to deserialize.")
        .with_doc(format!("@return {{!{class}}}"))
        .with_body(vec![
            "var reader = new jspb.BinaryReader(bytes);".to_string(),
            format!("var msg = new {class};"),
            format!("return {class}.deserializeBinaryFromReader(msg, reader);"),
        ]);

    let mut read = vec![
        "while (reader.nextField()) {".to_string(),
        "  if (reader.isEndGroup()) {".to_string(),
        "    break;".to_string(),
        "  }".to_string(),
        "  var field = reader.getFieldNumber();".to_string(),
        "  switch (field) {".to_string(),
    ];
    for plan in &by_number {
        read.push(format!("  case {}:", plan.field.number));
        for line in fields::read_case(ctx, plan)? {
            read.push(format!("    {line}"));
        }
        read.push("    break;".to_string());
    }
    read.push("  default:".to_string());
    if message.is_extendable() {
        read.push(format!(
            "    jspb.Message.readBinaryExtension(msg, reader,\n      {class}.extensionsBinary,\n      {class}.prototype.getExtension,\n      {class}.prototype.setExtension);"
        ));
    } else {
        read.push("    reader.skipField();".to_string());
    }
    read.push("    break;".to_string());
    read.push("  }".to_string());
    read.push("}".to_string());
    read.push("return msg;".to_string());
    let deserialize_from_reader = Method::new_static("deserializeBinaryFromReader", "msg, reader")
        .with_doc("Deserializes binary data (in protobuf wire format) from the")
        .with_doc("given reader into the given message object.")
        .with_doc(format!("@param {{!{class}}} msg The message object to deserialize into."))
        .with_doc("@param {!jspb.BinaryReader} reader The BinaryReader to use.")
        .with_doc(format!("@return {{!{class}}}"))
        .with_body(split_lines(read));

    let serialize = Method::new("serializeBinary", "")
        .with_doc("Serializes the message to binary data (in protobuf wire format).")
        .with_doc("@return {!Uint8Array}")
        .with_body(vec![
            "var writer = new jspb.BinaryWriter();".to_string(),
            format!("{class}.serializeBinaryToWriter(this, writer);"),
            "return writer.getResultBuffer();".to_string(),
        ]);

    let mut write = vec!["var f = undefined;".to_string()];
    for plan in &by_number {
        write.extend(fields::write_block(ctx, plan)?);
    }
    if message.is_extendable() {
        write.push(format!(
            "jspb.Message.serializeBinaryExtensions(message, writer,\n    {class}.extensionsBinary, {class}.prototype.getExtension);"
        ));
    }
    let serialize_to_writer = Method::new_static("serializeBinaryToWriter", "message, writer")
        .with_doc("Serializes the given message to binary data (in protobuf wire")
        .with_doc("format), writing to the given BinaryWriter.")
        .with_doc(format!("@param {{!{class}}} message"))
        .with_doc("@param {!jspb.BinaryWriter} writer")
        .with_doc("@suppress {unusedLocalVariables} f is only used for nested messages")
        .with_body(split_lines(write));

    Ok(vec![deserialize, deserialize_from_reader, serialize, serialize_to_writer])
}

/// Splits embedded newlines so every body entry is one output line.
fn split_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                line.lines().map(str::to_string).collect()
            }
        })
        .collect()
}

fn constructor_doc() -> Vec<String> {
    vec![
        "Generated by protojs.".to_string(),
        "@param {Array=} opt_data Optional initial data array, typically from a".to_string(),
        "server response, or constructed directly in Javascript. The array is used".to_string(),
        "in place and becomes part of the constructed object. It is not cloned.".to_string(),
        "If no data is provided, the constructed object will be empty, but still".to_string(),
        "valid.".to_string(),
        "@extends {jspb.Message}".to_string(),
        "@constructor".to_string(),
    ]
}

fn write_closure_class(
    ctx: &EmitContext<'_>,
    class: &str,
    path: &[i32],
    init: &str,
    statics: &[StaticMember],
    sections: &[Section],
    w: &mut CodeWriter,
) {
    write_doc(w, "", &constructor_doc());
    ctx.write_name(w, class, Some(path));
    w.push_str(&format!(" = function(opt_data) {{\n  {init}\n}};\n"));
    w.push_str(&format!("goog.inherits({class}, jspb.Message);\n"));
    w.push_str("if (goog.DEBUG && !COMPILED) {\n");
    write_doc(w, "  ", &["@public".to_string(), "@override".to_string()]);
    w.push_str(&format!("  {class}.displayName = '{class}';\n}}\n\n"));

    for member in statics {
        write_doc(w, "", &member.doc);
        w.push_str(&format!("{class}.{} = {};\n\n", member.name, member.value));
    }

    for section in sections {
        if section.methods.is_empty() {
            continue;
        }
        match section.guard {
            Some(guard) => {
                w.push_str(&format!("if ({guard}) {{\n"));
                for method in &section.methods {
                    write_assigned_method(ctx, w, "", class, method);
                }
                w.push_str("}\n\n");
            }
            None => {
                for method in &section.methods {
                    write_assigned_method(ctx, w, "", class, method);
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn write_es6_class(
    ctx: &EmitContext<'_>,
    message: &SchemaMessage,
    class: &str,
    path: &[i32],
    init: &str,
    statics: &[StaticMember],
    sections: &[Section],
    w: &mut CodeWriter,
) {
    let top_level = message.containing.is_none();
    if top_level {
        w.push_str("export class ");
        ctx.write_name(w, class, Some(path));
        w.push_str(" extends jspb.Message {\n");
    } else {
        ctx.write_name(w, class, Some(path));
        w.push_str(" = class extends jspb.Message {\n");
    }
    write_doc(w, "  ", &["@param {Array=} opt_data Optional initial data array.".to_string()]);
    w.push_str(&format!(
        "  constructor(opt_data) {{\n    super();\n    {init}\n  }}\n\n"
    ));
    // Class bodies cannot hold statements; feature guards do not apply.
    for section in sections {
        for method in &section.methods {
            write_class_method(ctx, w, method);
        }
    }
    w.push_str(if top_level { "}\n\n" } else { "};\n\n" });

    for member in statics {
        write_doc(w, "", &member.doc);
        w.push_str(&format!("{class}.{} = {};\n\n", member.name, member.value));
    }
}
