//! Name resolution for generated JavaScript.
//!
//! Two strategies exist. Non-ES6 output refers to every type through a dotted
//! path rooted at the namespace prefix (`proto.shop.Order`). ES6 output
//! refers to top-level types through module bindings: the exported name for
//! types of the unit's own file, the imported binding for everything else.

use crate::error::CodegenError;
use crate::options::GenerationOptions;
use protojs_schema::{SchemaField, SchemaFile, SchemaSet};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// JavaScript reserved words that cannot be used as bare identifiers.
const RESERVED_WORDS: &[&str] = &[
    "abstract",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "double",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "function",
    "goto",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "try",
    "typeof",
    "var",
    "void",
    "volatile",
    "while",
    "with",
];

/// Bindings every generated module uses for the runtime.
const RUNTIME_BINDINGS: &[&str] = &["jspb", "goog"];

/// Returns true if `word` is a JavaScript reserved word.
#[must_use]
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// Splits a `lower_underscore` name into lower-cased words.
#[must_use]
pub fn split_words(name: &str) -> Vec<String> {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Converts a field name to UpperCamelCase (`order_id` -> `OrderId`).
#[must_use]
pub fn to_upper_camel(name: &str) -> String {
    split_words(name).iter().map(|w| capitalize(w)).collect()
}

/// Converts a field name to lowerCamelCase (`order_id` -> `orderId`).
#[must_use]
pub fn to_lower_camel(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for (i, word) in split_words(name).iter().enumerate() {
        if i == 0 {
            result.push_str(word);
        } else {
            result.push_str(&capitalize(word));
        }
    }
    result
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Returns the identifier of an extension's field info (`lowerCamel`, with
/// reserved words prefixed).
#[must_use]
pub fn extension_ident(name: &str) -> String {
    let ident = to_lower_camel(name);
    if is_reserved(&ident) || RUNTIME_BINDINGS.contains(&ident.as_str()) {
        format!("pb_{ident}")
    } else {
        ident
    }
}

/// Strips the `.proto` / `.protodevel` suffix from a file name.
#[must_use]
pub fn strip_proto(file_name: &str) -> &str {
    file_name
        .strip_suffix(".protodevel")
        .or_else(|| file_name.strip_suffix(".proto"))
        .unwrap_or(file_name)
}

/// Returns the identifier a dependency module is bound to in CommonJS output
/// (`shop/line-item.proto` -> `shop_line$item_pb`).
#[must_use]
pub fn module_alias(file_name: &str) -> String {
    let mut alias: String = strip_proto(file_name)
        .chars()
        .map(|c| match c {
            '-' => '$',
            '/' | '.' => '_',
            other => other,
        })
        .collect();
    alias.push_str("_pb");
    alias
}

/// Returns the module path `from` uses to load the generated code of `to`.
#[must_use]
pub fn import_path(from: &str, to: &str) -> String {
    let root = if to.starts_with("google/protobuf") {
        "google-protobuf/".to_string()
    } else {
        let depth = from.matches('/').count();
        if depth == 0 {
            "./".to_string()
        } else {
            "../".repeat(depth)
        }
    };
    format!("{root}{}_pb.js", strip_proto(to))
}

/// Run-wide name table, built once over the compiled file closure and only
/// read afterwards.
#[derive(Debug)]
pub struct NameResolver<'a> {
    set: &'a SchemaSet,
    prefix: String,
    es6: bool,
    compiled: BTreeSet<&'a str>,
    exported: HashMap<String, String>,
}

impl<'a> NameResolver<'a> {
    /// Builds the resolver over `files`, which must contain the transitive
    /// dependency closure of everything that will be generated.
    #[must_use]
    pub fn new(set: &'a SchemaSet, options: &GenerationOptions, files: &[&'a SchemaFile]) -> Self {
        let mut exported = HashMap::new();
        for file in files {
            let mut used = BTreeSet::new();
            let names = file
                .messages
                .iter()
                .map(|m| m.name.as_str())
                .chain(file.enums.iter().map(|e| e.name.as_str()));
            for name in names {
                let mut binding = if is_reserved(name) || RUNTIME_BINDINGS.contains(&name) {
                    format!("pb_{name}")
                } else {
                    name.to_string()
                };
                while used.contains(&binding) {
                    binding.push('_');
                }
                used.insert(binding.clone());
                exported.insert(file.qualify(name), binding);
            }
        }
        Self {
            set,
            prefix: options.namespace_prefix.clone(),
            es6: options.want_es6(),
            compiled: files.iter().map(|f| f.name.as_str()).collect(),
            exported,
        }
    }

    /// Returns the symbol a file's module exports for a top-level type, or
    /// `None` for nested types, which are reached through their parent.
    #[must_use]
    pub fn exported_name(&self, full_name: &str) -> Option<&str> {
        self.exported.get(full_name).map(String::as_str)
    }

    /// Returns true if the file is part of the compiled closure.
    #[must_use]
    pub fn is_compiled(&self, file_name: &str) -> bool {
        self.compiled.contains(file_name)
    }

    /// Returns the dotted namespace of a file (`proto.shop`).
    #[must_use]
    pub fn namespace(&self, file: &SchemaFile) -> String {
        if file.package.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}.{}", self.prefix, file.package)
        }
    }

    /// Returns the dotted path of a type (`proto.shop.Order`).
    #[must_use]
    pub fn dotted(&self, full_name: &str) -> String {
        format!("{}.{}", self.prefix, full_name)
    }

    /// Returns the namespace prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds the per-unit view used while rendering one unit.
    ///
    /// For ES6 output, every type in `required` that is defined outside the
    /// unit's file receives an import binding: its exported name, or an alias
    /// qualified by the defining module when that name is already taken.
    ///
    /// # Errors
    /// Returns `CodegenError::UnresolvedType` when a required type's defining
    /// file is outside the compiled closure.
    pub fn for_unit(
        &'a self,
        unit: &str,
        file: Option<&'a SchemaFile>,
        required: &BTreeSet<String>,
    ) -> Result<TypeNames<'a>, CodegenError> {
        let mut names = TypeNames {
            resolver: self,
            unit: unit.to_string(),
            file,
            bindings: BTreeMap::new(),
        };
        if !self.es6 {
            return Ok(names);
        }
        let Some(file) = file else {
            return Err(CodegenError::internal(format!(
                "es6 unit '{unit}' has no source file"
            )));
        };

        let mut taken: BTreeSet<String> = RUNTIME_BINDINGS.iter().map(|s| s.to_string()).collect();
        for top in file.messages.iter().map(|m| &m.name).chain(file.enums.iter().map(|e| &e.name)) {
            if let Some(binding) = self.exported_name(&file.qualify(top)) {
                taken.insert(binding.to_string());
            }
        }

        for full_name in required {
            let defining = self
                .set
                .defining_file(full_name)
                .ok_or_else(|| CodegenError::unresolved(full_name, unit))?;
            if defining.name == file.name {
                continue;
            }
            if !self.is_compiled(&defining.name) {
                return Err(CodegenError::unresolved(full_name, unit));
            }
            let top = self
                .set
                .top_level_name(full_name)
                .ok_or_else(|| CodegenError::unresolved(full_name, unit))?;
            if names.bindings.contains_key(&top) {
                continue;
            }
            let exported = self
                .exported_name(&top)
                .ok_or_else(|| CodegenError::unresolved(full_name, unit))?;
            let mut binding = exported.to_string();
            if taken.contains(&binding) {
                let base = format!("{}_{}", module_alias(&defining.name), exported);
                binding = base.clone();
                let mut n = 1;
                while taken.contains(&binding) {
                    binding = format!("{base}_{n}");
                    n += 1;
                }
            }
            taken.insert(binding.clone());
            names.bindings.insert(top, binding);
        }
        Ok(names)
    }
}

/// One ES6 import statement: the bindings taken from one dependency module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Es6Import {
    /// Name of the defining schema file.
    pub file: String,
    /// `(exported, local)` binding pairs, sorted by local name.
    pub bindings: Vec<(String, String)>,
}

/// Per-unit view of the name table.
#[derive(Debug)]
pub struct TypeNames<'a> {
    resolver: &'a NameResolver<'a>,
    unit: String,
    file: Option<&'a SchemaFile>,
    bindings: BTreeMap<String, String>,
}

impl<'a> TypeNames<'a> {
    /// Resolves a fully-qualified type name to the expression that refers to
    /// it from this unit.
    ///
    /// # Errors
    /// Returns `CodegenError::UnresolvedType` when the type is unknown or, for
    /// ES6 output, neither local nor imported.
    pub fn resolve(&self, full_name: &str) -> Result<String, CodegenError> {
        let set = self.resolver.set;
        if !set.contains_type(full_name) {
            return Err(CodegenError::unresolved(full_name, &self.unit));
        }
        if !self.resolver.es6 {
            return Ok(self.resolver.dotted(full_name));
        }

        let top = set
            .top_level_name(full_name)
            .ok_or_else(|| CodegenError::unresolved(full_name, &self.unit))?;
        let nested = full_name.strip_prefix(top.as_str()).unwrap_or_default();
        let local = self.file.is_some_and(|file| {
            set.defining_file(full_name)
                .is_some_and(|defining| defining.name == file.name)
        });
        let binding = if local {
            self.resolver.exported_name(&top)
        } else {
            self.bindings.get(&top).map(String::as_str)
        };
        binding
            .map(|b| format!("{b}{nested}"))
            .ok_or_else(|| CodegenError::unresolved(full_name, &self.unit))
    }

    /// Resolves the expression holding an extension's field info.
    ///
    /// Message-scoped extensions hang off their scope message; file-level
    /// extensions live in the file namespace, or are module bindings in ES6
    /// output.
    ///
    /// # Errors
    /// Returns `CodegenError::UnresolvedType` when the scope message cannot
    /// be resolved.
    pub fn extension(&self, field: &SchemaField) -> Result<String, CodegenError> {
        let ident = extension_ident(&field.name);
        if self.resolver.set.message(&field.scope).is_some() {
            return Ok(format!("{}.{ident}", self.resolve(&field.scope)?));
        }
        if self.resolver.es6 {
            Ok(ident)
        } else if field.scope.is_empty() {
            Ok(format!("{}.{ident}", self.resolver.prefix))
        } else {
            Ok(format!("{}.{}.{ident}", self.resolver.prefix, field.scope))
        }
    }

    /// Returns the resolver this view was built from.
    #[must_use]
    pub fn resolver(&self) -> &'a NameResolver<'a> {
        self.resolver
    }

    /// Returns the ES6 imports this unit needs, one per dependency file.
    ///
    /// Bindings are ordered by local name, the expression the unit's code
    /// uses, and statements by their first binding.
    #[must_use]
    pub fn imports(&self) -> Vec<Es6Import> {
        let set = self.resolver.set;
        let mut by_file: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for (top, binding) in &self.bindings {
            let (Some(defining), Some(exported)) =
                (set.defining_file(top), self.resolver.exported_name(top))
            else {
                continue;
            };
            by_file
                .entry(defining.name.clone())
                .or_default()
                .push((exported.to_string(), binding.clone()));
        }
        let mut imports: Vec<Es6Import> = by_file
            .into_iter()
            .map(|(file, mut bindings)| {
                bindings.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Es6Import { file, bindings }
            })
            .collect();
        imports.sort_by(|a, b| {
            a.bindings
                .first()
                .map(|(_, local)| local)
                .cmp(&b.bindings.first().map(|(_, local)| local))
                .then_with(|| a.file.cmp(&b.file))
        });
        imports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ImportStyle;
    use protojs_schema::{FieldType, SchemaMessage};

    fn two_files() -> SchemaSet {
        let a = SchemaFile::new("a.proto", "pkg")
            .with_message(SchemaMessage::new("Foo").with_nested(SchemaMessage::new("Inner")))
            .with_message(SchemaMessage::new("default"));
        let b = SchemaFile::new("sub/b.proto", "other")
            .with_dependency("a.proto")
            .with_message(SchemaMessage::new("Foo"))
            .with_message(SchemaMessage::new("Bar").with_field(SchemaField::new(
                "foo",
                1,
                FieldType::Message("pkg.Foo".to_string()),
            )));
        SchemaSet::new(vec![a, b]).expect("Failed to link")
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_upper_camel("order_id"), "OrderId");
        assert_eq!(to_upper_camel("fooBar"), "Foobar");
        assert_eq!(to_lower_camel("order_id"), "orderId");
        assert_eq!(to_lower_camel("_x__y_"), "xY");
    }

    #[test]
    fn test_module_alias_and_paths() {
        assert_eq!(module_alias("shop/line-item.proto"), "shop_line$item_pb");
        assert_eq!(import_path("a.proto", "b.proto"), "./b_pb.js");
        assert_eq!(import_path("x/y/a.proto", "b.proto"), "../../b_pb.js");
        assert_eq!(
            import_path("a.proto", "google/protobuf/timestamp.proto"),
            "google-protobuf/google/protobuf/timestamp_pb.js"
        );
    }

    #[test]
    fn test_dotted_resolution() {
        let set = two_files();
        let options = GenerationOptions::default();
        let files: Vec<&SchemaFile> = set.files().iter().collect();
        let resolver = NameResolver::new(&set, &options, &files);
        let names = resolver
            .for_unit("b.js", Some(&set.files()[1]), &BTreeSet::new())
            .expect("Failed to build names");
        assert_eq!(names.resolve("pkg.Foo.Inner").expect("resolve"), "proto.pkg.Foo.Inner");
        assert!(matches!(
            names.resolve("pkg.Missing"),
            Err(CodegenError::UnresolvedType { .. })
        ));
    }

    #[test]
    fn test_es6_exports_and_aliases() {
        let set = two_files();
        let options = GenerationOptions::new().with_import_style(ImportStyle::Es6);
        let files: Vec<&SchemaFile> = set.files().iter().collect();
        let resolver = NameResolver::new(&set, &options, &files);
        assert_eq!(resolver.exported_name("pkg.default"), Some("pb_default"));
        assert_eq!(resolver.exported_name("pkg.Foo.Inner"), None);

        let required: BTreeSet<String> =
            ["pkg.Foo.Inner".to_string(), "pkg.default".to_string()].into();
        let names = resolver
            .for_unit("sub/b_pb.js", Some(&set.files()[1]), &required)
            .expect("Failed to build names");
        // `Foo` is taken by the local export, so the import is aliased.
        assert_eq!(names.resolve("pkg.Foo.Inner").expect("resolve"), "a_pb_Foo.Inner");
        assert_eq!(names.resolve("other.Foo").expect("resolve"), "Foo");
        assert_eq!(names.resolve("pkg.default").expect("resolve"), "pb_default");

        let imports = names.imports();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].file, "a.proto");
        assert_eq!(
            imports[0].bindings,
            vec![
                ("Foo".to_string(), "a_pb_Foo".to_string()),
                ("pb_default".to_string(), "pb_default".to_string()),
            ]
        );
    }

    #[test]
    fn test_es6_imports_ordered_by_binding() {
        let a = SchemaFile::new("a.proto", "pkg").with_message(SchemaMessage::new("Zeta"));
        let b = SchemaFile::new("b.proto", "pkg")
            .with_message(SchemaMessage::new("Alpha"))
            .with_message(SchemaMessage::new("Omega"));
        let c = SchemaFile::new("c.proto", "pkg")
            .with_dependency("a.proto")
            .with_dependency("b.proto")
            .with_message(SchemaMessage::new("User"));
        let set = SchemaSet::new(vec![a, b, c]).expect("Failed to link");
        let options = GenerationOptions::new().with_import_style(ImportStyle::Es6);
        let files: Vec<&SchemaFile> = set.files().iter().collect();
        let resolver = NameResolver::new(&set, &options, &files);
        let required: BTreeSet<String> = ["pkg.Zeta", "pkg.Omega", "pkg.Alpha"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let names = resolver
            .for_unit("c_pb.js", Some(&set.files()[2]), &required)
            .expect("Failed to build names");

        let imports = names.imports();
        let files: Vec<&str> = imports.iter().map(|i| i.file.as_str()).collect();
        assert_eq!(files, vec!["b.proto", "a.proto"]);
        assert_eq!(
            imports[0].bindings,
            vec![
                ("Alpha".to_string(), "Alpha".to_string()),
                ("Omega".to_string(), "Omega".to_string()),
            ]
        );
    }

    #[test]
    fn test_es6_unresolved_outside_closure() {
        let set = two_files();
        let options = GenerationOptions::new().with_import_style(ImportStyle::Es6);
        let files = vec![&set.files()[1]];
        let resolver = NameResolver::new(&set, &options, &files);
        let required: BTreeSet<String> = ["pkg.Foo".to_string()].into();
        let err = resolver
            .for_unit("sub/b_pb.js", Some(&set.files()[1]), &required)
            .expect_err("resolved outside closure");
        assert!(matches!(err, CodegenError::UnresolvedType { type_name, .. } if type_name == "pkg.Foo"));
    }
}
