//! Text sink for generated units.

use crate::annotations::{Annotation, render_trailer};

/// Append-only buffer for one generated unit.
///
/// Besides plain text, the writer can record annotated spans; they are
/// encoded into the trailing comment block by [`CodeWriter::finish`].
#[derive(Debug, Default)]
pub struct CodeWriter {
    output: String,
    annotate: bool,
    annotations: Vec<Annotation>,
}

impl CodeWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new(annotate: bool) -> Self {
        Self {
            output: String::new(),
            annotate,
            annotations: Vec::new(),
        }
    }

    /// Appends text.
    pub fn push_str(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Appends text and, when annotating, records it as the generated code
    /// for the descriptor element at `path` of `source_file`.
    pub fn push_annotated(&mut self, text: &str, source_file: &str, path: &[i32]) {
        let begin = self.output.len();
        self.output.push_str(text);
        if self.annotate {
            self.annotations.push(Annotation {
                path: path.to_vec(),
                source_file: source_file.to_string(),
                begin,
                end: self.output.len(),
            });
        }
    }

    /// Returns the text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.output
    }

    /// Returns the recorded annotations.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Consumes the writer, appending the annotation trailer when enabled.
    #[must_use]
    pub fn finish(mut self) -> String {
        if self.annotate {
            let trailer = render_trailer(&self.annotations);
            self.output.push_str(&trailer);
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::TRAILER_HEADER;

    #[test]
    fn test_annotated_spans() {
        let mut writer = CodeWriter::new(true);
        writer.push_str("proto.a.");
        writer.push_annotated("Foo", "a.proto", &[4, 0]);
        writer.push_str(" = function() {};\n");

        let spans = writer.annotations();
        assert_eq!(spans.len(), 1);
        assert_eq!(&writer.as_str()[spans[0].begin..spans[0].end], "Foo");

        let text = writer.finish();
        assert!(text.contains(TRAILER_HEADER));
    }

    #[test]
    fn test_no_trailer_without_annotation() {
        let mut writer = CodeWriter::new(false);
        writer.push_annotated("Foo", "a.proto", &[4, 0]);
        assert!(writer.annotations().is_empty());
        assert_eq!(writer.finish(), "Foo");
    }
}
