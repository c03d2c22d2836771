use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ParsingConfig;
use crate::error::{CallerTraceError, Result};
use super::languages::{JavaParser, LanguageParser};

/// Represents a parsed source file with extracted declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    /// File path as discovered under the source root
    pub path: PathBuf,

    /// Programming language detected
    pub language: String,

    /// Declared package, if any
    pub package: Option<String>,

    /// Import declarations in source order
    pub imports: Vec<ImportDecl>,

    /// All type declarations, nested ones flattened with dotted names
    pub types: Vec<ParsedType>,

    /// Raw source content
    pub source_content: String,
}

impl ParsedFile {
    /// Fully-qualified name of a type declared in this file
    pub fn qualified_name(&self, ty: &ParsedType) -> String {
        match &self.package {
            Some(pkg) if !pkg.is_empty() => format!("{}.{}", pkg, ty.name),
            _ => ty.name.clone(),
        }
    }

    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

/// Language-level output of a single file, before it is tied to a path
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<ParsedType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Imported name without the trailing `.*`
    pub path: String,
    pub is_static: bool,
    /// `import a.b.*;`
    pub on_demand: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

/// A class, interface or enum declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedType {
    /// Name relative to the package; nested types are `Outer.Inner`
    pub name: String,
    pub kind: TypeKind,
    /// Superclass as written (classes only)
    pub superclass: Option<String>,
    /// `implements` list for classes and enums, `extends` list for interfaces
    pub interfaces: Vec<String>,
    pub fields: Vec<ParsedVariable>,
    pub methods: Vec<ParsedMethod>,
    pub line_range: (usize, usize),
}

impl ParsedType {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Name of the directly enclosing type for nested declarations
    pub fn outer_name(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(outer, _)| outer)
    }

    pub fn field_type(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.type_name.as_str())
    }
}

/// A named, typed variable: field, parameter or local
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedVariable {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedParameter {
    pub name: String,
    /// Declared type as written; empty when the declaration is damaged
    pub type_name: String,
    pub varargs: bool,
}

/// A method declaration with everything the analyzer needs from its body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMethod {
    pub name: String,
    pub parameters: Vec<ParsedParameter>,
    /// 1-based inclusive line range of the whole declaration
    pub line_range: (usize, usize),
    /// Declaration text, whole lines, original formatting
    pub source: String,
    /// Body block text; None for abstract and interface methods
    pub body: Option<String>,
    /// Javadoc and comments immediately preceding the declaration
    pub comments: Option<String>,
    pub locals: Vec<ParsedVariable>,
    pub calls: Vec<ParsedCall>,
}

impl ParsedMethod {
    pub fn contains_line(&self, line: usize) -> bool {
        self.line_range.0 <= line && line <= self.line_range.1
    }

    pub fn is_varargs(&self) -> bool {
        self.parameters.last().map_or(false, |p| p.varargs)
    }

    pub fn local_type(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.type_name.as_str())
            .or_else(|| {
                self.parameters
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.type_name.as_str())
            })
    }
}

/// A method invocation found inside a method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub receiver: Receiver,
    pub name: String,
    pub arguments: Vec<ArgumentHint>,
    pub line: usize,
}

/// Syntactic shape of the expression a method is invoked on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    /// `foo()`
    Implicit,
    /// `this.foo()`
    This,
    /// `super.foo()`
    Super,
    /// `a.foo()`, `a.b.foo()`, `com.acme.Util.foo()`: variable, field path or type name
    Path(Vec<String>),
    /// `this.field.foo()`
    ThisField(String),
    /// `new Foo().foo()` or `((Foo) x).foo()`: static type as written
    Typed(String),
    /// Anything whose type needs expression typing
    Unresolvable,
}

/// What the analyzer can tell about an argument's static type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgumentHint {
    /// Literal with a known qualified type
    Literal(String),
    /// Reference to a named variable
    Variable(String),
    /// Object creation or cast to a type as written
    Typed(String),
    Unknown,
}

/// Result of walking a source root
#[derive(Debug, Clone, Default)]
pub struct DirectoryScan {
    pub files: Vec<ParsedFile>,
    /// Files matching a configured extension
    pub discovered: usize,
    /// Files discovered but not parsed
    pub skipped: usize,
}

/// Multi-language code parser that delegates to language-specific parsers
pub struct CodeParser {
    config: ParsingConfig,
    language_parsers: HashMap<String, Box<dyn LanguageParser>>,
}

impl CodeParser {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let mut language_parsers: HashMap<String, Box<dyn LanguageParser>> = HashMap::new();

        let java_parser = JavaParser::new()?;
        language_parsers.insert(java_parser.language_name().to_string(), Box::new(java_parser));

        Ok(Self {
            config: config.clone(),
            language_parsers,
        })
    }

    /// Parse all files in a directory; unreadable or unparsable files are logged and skipped
    pub fn parse_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<DirectoryScan> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(CallerTraceError::FileSystem(format!(
                "source root {} does not exist",
                dir.display()
            )));
        }

        let mut scan = DirectoryScan::default();

        // Use ignore crate to respect .gitignore and custom patterns
        let walker = WalkBuilder::new(dir)
            .hidden(false)
            .git_ignore(self.config.respect_gitignore)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();

            if !path.is_file() || !self.should_parse_file(path) {
                continue;
            }

            scan.discovered += 1;
            match self.parse_file(path) {
                Ok(parsed) => scan.files.push(parsed),
                Err(e) => {
                    scan.skipped += 1;
                    warn!("Failed to parse {}: {}", path.display(), e);
                }
            }
        }

        debug!(
            "Parsed {} of {} source files under {}",
            scan.files.len(),
            scan.discovered,
            dir.display()
        );

        Ok(scan)
    }

    /// Parse a single source file
    pub fn parse_file<P: AsRef<Path>>(&mut self, file_path: P) -> Result<ParsedFile> {
        let path = file_path.as_ref();
        let language = self.detect_language(path)?;

        // Check file size before reading it
        let metadata = std::fs::metadata(path)?;
        if metadata.len() as usize > self.config.max_file_size {
            return Err(CallerTraceError::Parser(format!(
                "File {} exceeds maximum size limit",
                path.display()
            )));
        }

        let source_content = std::fs::read_to_string(path)?;

        let parser = self.language_parsers.get_mut(&language).ok_or_else(|| {
            CallerTraceError::Parser(format!("No parser registered for {}", language))
        })?;
        let parsed = parser.parse(&source_content, path)?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            language,
            package: parsed.package,
            imports: parsed.imports,
            types: parsed.types,
            source_content,
        })
    }

    /// Determine if a file should be parsed based on configuration
    fn should_parse_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                self.config.file_extensions.iter().any(|e| e == ext)
                    && self
                        .language_parsers
                        .values()
                        .any(|parser| parser.file_extensions().contains(&ext))
            })
    }

    /// Detect programming language from file path
    fn detect_language(&self, path: &Path) -> Result<String> {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            for (lang, parser) in &self.language_parsers {
                if parser.file_extensions().contains(&extension) {
                    return Ok(lang.clone());
                }
            }
        }

        Err(CallerTraceError::Parser(format!(
            "Could not detect language for file: {}",
            path.display()
        )))
    }
}
