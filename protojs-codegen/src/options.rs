//! Generation options.
//!
//! Options arrive either through the builder methods or as a protoc-style
//! parameter string (`import_style=commonjs,binary`). Both paths end in
//! [`GenerationOptions::validate`], which runs before any unit is planned.

use crate::error::CodegenError;
use std::fmt;
use std::path::PathBuf;

/// Module system of the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImportStyle {
    /// Closure Library namespaces (`goog.provide` / `goog.require`).
    #[default]
    Closure,
    /// CommonJS `require()` with globally exported namespaces.
    CommonJs,
    /// CommonJS without touching the global object.
    CommonJsStrict,
    /// Browser globals, no module loader.
    Browser,
    /// ES6 modules with `import` / `export`.
    Es6,
}

impl ImportStyle {
    /// Parses the `import_style` parameter value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "closure" => Some(Self::Closure),
            "commonjs" => Some(Self::CommonJs),
            "commonjs_strict" => Some(Self::CommonJsStrict),
            "browser" => Some(Self::Browser),
            "es6" => Some(Self::Es6),
            _ => None,
        }
    }

    /// Returns the parameter name of the style.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Closure => "closure",
            Self::CommonJs => "commonjs",
            Self::CommonJsStrict => "commonjs_strict",
            Self::Browser => "browser",
            Self::Es6 => "es6",
        }
    }
}

impl fmt::Display for ImportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// One unit per input file.
    OneOutputFilePerInputFile,
    /// One unit per strongly-connected group of message types, plus one per
    /// enum and one per file's top-level extensions.
    OneOutputFilePerScc,
    /// All requested files in one unit named after the library.
    EverythingInOneFile,
}

/// Resolved generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Directory generated units are written under.
    pub output_dir: PathBuf,
    /// Root namespace for dotted type paths.
    pub namespace_prefix: String,
    /// Emit binary wire (de)serialization.
    pub binary: bool,
    /// Module system.
    pub import_style: ImportStyle,
    /// Import enums instead of forward-declaring them (closure only).
    pub add_require_for_enums: bool,
    /// Mark generated units as test-only (closure only).
    pub testonly: bool,
    /// Combine all files into one unit with this name (closure only).
    pub library: String,
    /// File extension for closure output.
    pub extension: String,
    /// Force one unit per input file (closure only).
    pub one_output_file_per_input_file: bool,
    /// Append a base64 `GeneratedCodeInfo` trailer.
    pub annotate_code: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            namespace_prefix: "proto".to_string(),
            binary: false,
            import_style: ImportStyle::Closure,
            add_require_for_enums: false,
            testonly: false,
            library: String::new(),
            extension: ".js".to_string(),
            one_output_file_per_input_file: false,
            annotate_code: false,
        }
    }
}

impl GenerationOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a protoc-style parameter string and validates the result.
    ///
    /// # Arguments
    /// * `parameter` - Comma-separated `key=value` pairs and bare flags
    ///
    /// # Errors
    /// Returns `CodegenError::Config` for unknown keys, malformed values and
    /// incompatible combinations.
    pub fn from_parameter(parameter: &str) -> Result<Self, CodegenError> {
        let mut options = Self::default();
        for item in parameter.split(',').filter(|s| !s.trim().is_empty()) {
            let (key, value) = match item.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (item.trim(), None),
            };
            options.apply(key, value)?;
        }
        options.validate()?;
        Ok(options)
    }

    fn apply(&mut self, key: &str, value: Option<&str>) -> Result<(), CodegenError> {
        match key {
            "add_require_for_enums" => self.add_require_for_enums = flag(key, value)?,
            "binary" => self.binary = flag(key, value)?,
            "testonly" => self.testonly = flag(key, value)?,
            "annotate_code" => self.annotate_code = flag(key, value)?,
            "one_output_file_per_input_file" => {
                self.one_output_file_per_input_file = flag(key, value)?;
            }
            "error_on_name_conflict" => {
                flag(key, value)?;
                tracing::warn!("ignoring deprecated option 'error_on_name_conflict'");
            }
            "output_dir" => self.output_dir = PathBuf::from(required(key, value)?),
            "namespace_prefix" => self.namespace_prefix = required(key, value)?.to_string(),
            "library" => self.library = required(key, value)?.to_string(),
            "extension" => self.extension = required(key, value)?.to_string(),
            "import_style" => {
                let name = required(key, value)?;
                self.import_style = ImportStyle::from_name(name).ok_or_else(|| {
                    CodegenError::config(format!("unknown import_style '{name}'"))
                })?;
            }
            _ => {
                return Err(CodegenError::config(format!("unknown option '{key}'")));
            }
        }
        Ok(())
    }

    /// Checks option combinations.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` describing the first incompatibility.
    pub fn validate(&self) -> Result<(), CodegenError> {
        if self.import_style == ImportStyle::Es6 && !self.library.is_empty() {
            return Err(CodegenError::config(
                "es6 modules are generated one per input file and cannot be combined into a library",
            ));
        }
        if self.import_style != ImportStyle::Closure
            && (self.add_require_for_enums
                || self.testonly
                || !self.library.is_empty()
                || self.extension != ".js"
                || self.one_output_file_per_input_file)
        {
            return Err(CodegenError::config(format!(
                "add_require_for_enums, testonly, library, extension and \
                 one_output_file_per_input_file are only supported with \
                 import_style=closure, not {}",
                self.import_style
            )));
        }
        if !self.library.is_empty() && self.one_output_file_per_input_file {
            return Err(CodegenError::config(
                "library and one_output_file_per_input_file are mutually exclusive",
            ));
        }
        if self.namespace_prefix.is_empty()
            || self
                .namespace_prefix
                .split('.')
                .any(|segment| segment.is_empty())
        {
            return Err(CodegenError::config(format!(
                "invalid namespace_prefix '{}'",
                self.namespace_prefix
            )));
        }
        Ok(())
    }

    /// Returns the output granularity implied by the options.
    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        if self.import_style != ImportStyle::Closure {
            return OutputMode::OneOutputFilePerInputFile;
        }
        if !self.library.is_empty() {
            OutputMode::EverythingInOneFile
        } else if self.one_output_file_per_input_file {
            OutputMode::OneOutputFilePerInputFile
        } else {
            OutputMode::OneOutputFilePerScc
        }
    }

    /// Returns true when types are emitted as ES6 classes and modules.
    #[must_use]
    pub fn want_es6(&self) -> bool {
        self.import_style == ImportStyle::Es6
    }

    /// Returns the suffix appended to generated file names.
    #[must_use]
    pub fn file_name_extension(&self) -> &str {
        if self.import_style == ImportStyle::Closure {
            &self.extension
        } else {
            "_pb.js"
        }
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the namespace prefix.
    #[must_use]
    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = prefix.into();
        self
    }

    /// Enables or disables binary (de)serialization.
    #[must_use]
    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Sets the module system.
    #[must_use]
    pub fn with_import_style(mut self, style: ImportStyle) -> Self {
        self.import_style = style;
        self
    }

    /// Imports enums instead of forward-declaring them.
    #[must_use]
    pub fn with_add_require_for_enums(mut self, enabled: bool) -> Self {
        self.add_require_for_enums = enabled;
        self
    }

    /// Marks generated units as test-only.
    #[must_use]
    pub fn with_testonly(mut self, enabled: bool) -> Self {
        self.testonly = enabled;
        self
    }

    /// Combines every requested file into one library unit.
    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    /// Sets the closure file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Forces one unit per input file.
    #[must_use]
    pub fn with_one_output_file_per_input_file(mut self, enabled: bool) -> Self {
        self.one_output_file_per_input_file = enabled;
        self
    }

    /// Appends source annotations to generated units.
    #[must_use]
    pub fn with_annotate_code(mut self, enabled: bool) -> Self {
        self.annotate_code = enabled;
        self
    }
}

fn flag(key: &str, value: Option<&str>) -> Result<bool, CodegenError> {
    match value {
        None => Ok(true),
        Some(v) => Err(CodegenError::config(format!(
            "option '{key}' is a flag and takes no value, got '{v}'"
        ))),
    }
}

fn required<'v>(key: &str, value: Option<&'v str>) -> Result<&'v str, CodegenError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CodegenError::config(format!("option '{key}' requires a value"))),
    }
}
