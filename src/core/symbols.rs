// src/core/symbols.rs
use std::collections::HashMap;

use tracing::debug;

use super::call_graph::MethodSignature;
use super::parser::{ParsedFile, ParsedMethod, ParsedType};

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Implicitly imported `java.lang` types that show up in signatures and receivers
const JAVA_LANG: &[&str] = &[
    "AutoCloseable", "Boolean", "Byte", "Character", "CharSequence", "Class",
    "ClassCastException", "Cloneable", "Comparable", "Double", "Enum", "Error",
    "Exception", "Float", "IllegalArgumentException", "IllegalStateException",
    "IndexOutOfBoundsException", "Integer", "InterruptedException", "Iterable", "Long",
    "Math", "NullPointerException", "Number", "Object", "Runnable", "RuntimeException",
    "Short", "String", "StringBuffer", "StringBuilder", "System", "Thread", "Throwable",
    "UnsupportedOperationException", "Void",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Drop type arguments and whitespace: `Map<K, List<V>>[]` -> `Map[]`
pub fn erase_generics(raw: &str) -> String {
    let mut erased = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => erased.push(c),
            _ => {}
        }
    }
    erased
}

/// Split `Foo[]` / `Foo...` into the element type and its suffix
fn split_suffix(name: &str) -> (&str, &str) {
    let end = [name.find('['), name.find("...")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(name.len());
    name.split_at(end)
}

/// Index of every declared type by fully-qualified name
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    types: HashMap<String, (usize, usize)>,
}

impl SymbolTable {
    pub fn build(files: &[ParsedFile]) -> Self {
        let mut types = HashMap::new();

        for (file_index, file) in files.iter().enumerate() {
            for (type_index, ty) in file.types.iter().enumerate() {
                let qualified = file.qualified_name(ty);
                if types.contains_key(&qualified) {
                    debug!(
                        "Duplicate declaration of {} in {}, keeping the first",
                        qualified,
                        file.path.display()
                    );
                    continue;
                }
                types.insert(qualified, (file_index, type_index));
            }
        }

        Self { types }
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.types.contains_key(qualified)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    fn location(&self, qualified: &str) -> Option<(usize, usize)> {
        self.types.get(qualified).copied()
    }
}

/// Qualifies type names as seen from a particular declaration
#[derive(Clone, Copy)]
pub struct TypeResolver<'a> {
    files: &'a [ParsedFile],
    symbols: &'a SymbolTable,
}

impl<'a> TypeResolver<'a> {
    pub fn new(files: &'a [ParsedFile], symbols: &'a SymbolTable) -> Self {
        Self { files, symbols }
    }

    /// Find a declared type by fully-qualified name
    pub fn lookup(&self, qualified: &str) -> Option<(&'a ParsedFile, &'a ParsedType)> {
        let (file_index, type_index) = self.symbols.location(qualified)?;
        let file = self.files.get(file_index)?;
        Some((file, file.types.get(type_index)?))
    }

    pub fn is_declared(&self, qualified: &str) -> bool {
        self.symbols.contains(qualified)
    }

    /// Qualify a type name written inside `enclosing`, a type declared in `file`.
    ///
    /// Names that cannot be qualified come back erased but otherwise as written.
    pub fn qualify(&self, raw: &str, file: &ParsedFile, enclosing: &str) -> String {
        let erased = erase_generics(raw);
        let (base, suffix) = split_suffix(&erased);
        if base.is_empty() {
            return erased;
        }

        match self.qualify_base(base, file, enclosing) {
            Some(qualified) => format!("{}{}", qualified, suffix),
            None => erased,
        }
    }

    fn qualify_base(&self, base: &str, file: &ParsedFile, enclosing: &str) -> Option<String> {
        if is_primitive(base) {
            return Some(base.to_string());
        }

        let (head, rest) = match base.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (base, None),
        };

        if let Some(head) = self.qualify_simple(head, file, enclosing) {
            return Some(match rest {
                Some(rest) => format!("{}.{}", head, rest),
                None => head,
            });
        }

        if self.symbols.contains(base) {
            return Some(base.to_string());
        }

        None
    }

    fn qualify_simple(&self, name: &str, file: &ParsedFile, enclosing: &str) -> Option<String> {
        let in_package = |relative: &str| match file.package_name() {
            "" => relative.to_string(),
            pkg => format!("{}.{}", pkg, relative),
        };

        // Member types of the enclosing declarations, innermost first
        let mut scope = (!enclosing.is_empty()).then_some(enclosing);
        while let Some(current) = scope {
            let candidate = in_package(&format!("{}.{}", current, name));
            if self.symbols.contains(&candidate) {
                return Some(candidate);
            }
            if current.rsplit('.').next() == Some(name) {
                return Some(in_package(current));
            }
            scope = current.rsplit_once('.').map(|(outer, _)| outer);
        }

        let candidate = in_package(name);
        if self.symbols.contains(&candidate) {
            return Some(candidate);
        }

        let single = file
            .imports
            .iter()
            .filter(|i| !i.is_static && !i.on_demand)
            .find(|i| i.path.rsplit('.').next() == Some(name));
        if let Some(import) = single {
            return Some(import.path.clone());
        }

        let on_demand = file
            .imports
            .iter()
            .filter(|i| !i.is_static && i.on_demand)
            .map(|i| format!("{}.{}", i.path, name))
            .find(|candidate| self.symbols.contains(candidate));
        if on_demand.is_some() {
            return on_demand;
        }

        JAVA_LANG
            .contains(&name)
            .then(|| format!("java.lang.{}", name))
    }

    /// Canonical signature of a declared method, None when a parameter type is missing
    pub fn signature_of(
        &self,
        file: &ParsedFile,
        ty: &ParsedType,
        method: &ParsedMethod,
    ) -> Option<MethodSignature> {
        let mut parameter_types = Vec::with_capacity(method.parameters.len());
        for param in &method.parameters {
            if param.type_name.is_empty() {
                return None;
            }
            let mut qualified = self.qualify(&param.type_name, file, &ty.name);
            if param.varargs {
                qualified.push_str("...");
            }
            parameter_types.push(qualified);
        }

        Some(MethodSignature::new(
            file.package_name(),
            ty.name.clone(),
            method.name.clone(),
            parameter_types,
        ))
    }
}
