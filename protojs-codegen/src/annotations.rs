//! Source annotations.
//!
//! Annotations map byte ranges of generated text back to descriptor paths.
//! They are serialized as a `google.protobuf.GeneratedCodeInfo` message and
//! appended to the unit as a base64 comment block.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{BufMut, BytesMut};

/// Comment line introducing the encoded annotation block.
pub const TRAILER_HEADER: &str = "// Below is base64 encoded GeneratedCodeInfo proto";

/// One annotated span of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Descriptor path of the annotated element (`[4, 0, 2, 1]` is the
    /// second field of the first message).
    pub path: Vec<i32>,
    /// Schema file defining the element.
    pub source_file: String,
    /// Byte offset of the first annotated byte.
    pub begin: usize,
    /// Byte offset one past the last annotated byte.
    pub end: usize,
}

/// Encodes annotations as a serialized `GeneratedCodeInfo` message.
#[must_use]
pub fn encode_generated_code_info(annotations: &[Annotation]) -> Vec<u8> {
    let mut out = BytesMut::new();
    for annotation in annotations {
        let body = encode_annotation(annotation);
        out.put_u8(0x0a);
        put_varint(&mut out, body.len() as u64);
        out.put_slice(&body);
    }
    out.to_vec()
}

/// Renders the trailing comment block for a unit.
#[must_use]
pub fn render_trailer(annotations: &[Annotation]) -> String {
    let encoded = STANDARD.encode(encode_generated_code_info(annotations));
    format!("{TRAILER_HEADER}\n// {encoded}\n")
}

fn encode_annotation(annotation: &Annotation) -> BytesMut {
    let mut body = BytesMut::new();

    if !annotation.path.is_empty() {
        let mut packed = BytesMut::new();
        for segment in &annotation.path {
            // int32 is sign-extended to 64 bits on the wire.
            put_varint(&mut packed, i64::from(*segment) as u64);
        }
        body.put_u8(0x0a);
        put_varint(&mut body, packed.len() as u64);
        body.put_slice(&packed);
    }

    body.put_u8(0x12);
    put_varint(&mut body, annotation.source_file.len() as u64);
    body.put_slice(annotation.source_file.as_bytes());

    body.put_u8(0x18);
    put_varint(&mut body, annotation.begin as u64);
    body.put_u8(0x20);
    put_varint(&mut body, annotation.end as u64);
    body
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}
