// src/core/analyzer.rs
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::ParsingConfig;
use crate::error::{CallerTraceError, Result};
use super::call_graph::{CallEdge, MethodSignature, Scope};
use super::parser::{
    ArgumentHint, CodeParser, ParsedCall, ParsedFile, ParsedMethod, ParsedType, Receiver, TypeKind,
};
use super::symbols::{is_primitive, SymbolTable, TypeResolver};

/// Declaration metadata for one method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRecord {
    pub signature: MethodSignature,
    pub file: PathBuf,
    /// 1-based inclusive line range
    pub line_range: (usize, usize),
    pub source: String,
    /// None for abstract and interface methods
    pub body: Option<String>,
    pub comments: Option<String>,
}

/// A declared type with its relationships resolved to qualified names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub qualified_name: String,
    pub kind: TypeKind,
    pub interfaces: Vec<String>,
    pub superclass: Option<String>,
    pub methods: Vec<MethodSignature>,
}

impl TypeDecl {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub files_discovered: usize,
    pub files_parsed: usize,
    pub files_skipped: usize,
    pub types: usize,
    pub methods: usize,
    pub calls_seen: usize,
    pub calls_resolved: usize,
}

/// Everything later stages need from the source tree, read-only once built
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    pub records: BTreeMap<MethodSignature, MethodRecord>,
    pub edges: Vec<CallEdge>,
    pub types: BTreeMap<String, TypeDecl>,
    pub files: Vec<ParsedFile>,
    pub symbols: SymbolTable,
    pub stats: AnalysisStats,
}

impl AnalysisSnapshot {
    /// Resolve names and calls against a set of parsed files.
    ///
    /// Records and types cover every file; only callers inside `scope` emit edges.
    pub fn build(files: Vec<ParsedFile>, scope: &Scope) -> Self {
        let symbols = SymbolTable::build(&files);
        debug!("Indexed {} type declarations", symbols.len());
        let mut records = BTreeMap::new();
        let mut edges = Vec::new();
        let mut types = BTreeMap::new();
        let mut stats = AnalysisStats {
            files_parsed: files.len(),
            files_discovered: files.len(),
            ..Default::default()
        };

        let resolver = TypeResolver::new(&files, &symbols);
        let calls = CallResolver { types: resolver };

        for file in &files {
            for ty in &file.types {
                let qualified = file.qualified_name(ty);
                let in_scope = scope.contains_type(&qualified);
                let mut methods = Vec::with_capacity(ty.methods.len());

                for method in &ty.methods {
                    let Some(signature) = resolver.signature_of(file, ty, method) else {
                        debug!("Skipping {}.{}: incomplete parameter list", qualified, method.name);
                        continue;
                    };
                    methods.push(signature.clone());

                    if in_scope {
                        let site = CallSite { file, ty, method };
                        for call in &method.calls {
                            stats.calls_seen += 1;
                            match calls.resolve(&site, call) {
                                Some(callee) => {
                                    stats.calls_resolved += 1;
                                    edges.push(CallEdge::new(signature.clone(), callee));
                                }
                                None => trace!(
                                    "Unresolved call {}(..) at {}:{}",
                                    call.name,
                                    file.path.display(),
                                    call.line
                                ),
                            }
                        }
                    }

                    if records.contains_key(&signature) {
                        debug!("Duplicate method {} in {}", signature, file.path.display());
                        continue;
                    }
                    records.insert(
                        signature.clone(),
                        MethodRecord {
                            signature,
                            file: file.path.clone(),
                            line_range: method.line_range,
                            source: method.source.clone(),
                            body: method.body.clone(),
                            comments: method.comments.clone(),
                        },
                    );
                }

                let decl = TypeDecl {
                    interfaces: ty
                        .interfaces
                        .iter()
                        .map(|i| resolver.qualify(i, file, &ty.name))
                        .collect(),
                    superclass: ty
                        .superclass
                        .as_ref()
                        .map(|s| resolver.qualify(s, file, &ty.name)),
                    qualified_name: qualified.clone(),
                    kind: ty.kind,
                    methods,
                };
                types.entry(qualified).or_insert(decl);
            }
        }

        stats.types = types.len();
        stats.methods = records.len();

        Self {
            records,
            edges,
            types,
            files,
            symbols,
            stats,
        }
    }

    pub fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(&self.files, &self.symbols)
    }

    pub fn record(&self, signature: &MethodSignature) -> Option<&MethodRecord> {
        self.records.get(signature)
    }
}

/// Parses a source root and produces an [`AnalysisSnapshot`]
pub struct SourceAnalyzer {
    parser: CodeParser,
}

impl SourceAnalyzer {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            parser: CodeParser::new(config)?,
        })
    }

    pub fn analyze(&mut self, root: &Path, scope: &Scope) -> Result<AnalysisSnapshot> {
        if !root.is_dir() {
            return Err(CallerTraceError::NoSourceFiles {
                root: root.to_path_buf(),
                discovered: 0,
                skipped: 0,
            });
        }

        info!("Scanning source files under {}", root.display());
        let scan = self.parser.parse_directory(root)?;
        if scan.files.is_empty() {
            return Err(CallerTraceError::NoSourceFiles {
                root: root.to_path_buf(),
                discovered: scan.discovered,
                skipped: scan.skipped,
            });
        }

        let mut snapshot = AnalysisSnapshot::build(scan.files, scope);
        snapshot.stats.files_discovered = scan.discovered;
        snapshot.stats.files_skipped = scan.skipped;

        let stats = &snapshot.stats;
        info!(
            "Analyzed {} files ({} skipped): {} types, {} methods, {}/{} calls resolved",
            stats.files_parsed,
            stats.files_skipped,
            stats.types,
            stats.methods,
            stats.calls_resolved,
            stats.calls_seen
        );

        Ok(snapshot)
    }
}

/// The method a call expression appears in
struct CallSite<'a> {
    file: &'a ParsedFile,
    ty: &'a ParsedType,
    method: &'a ParsedMethod,
}

impl CallSite<'_> {
    fn qualified_type(&self) -> String {
        self.file.qualified_name(self.ty)
    }
}

struct CallResolver<'a> {
    types: TypeResolver<'a>,
}

impl<'a> CallResolver<'a> {
    fn resolve(&self, site: &CallSite, call: &ParsedCall) -> Option<MethodSignature> {
        let hints: Vec<Option<String>> = call
            .arguments
            .iter()
            .map(|hint| self.hint_type(site, hint))
            .collect();

        for owner in self.receiver_owners(site, &call.receiver) {
            if let Some(found) = self.find_method(&owner, &call.name, &hints) {
                return Some(found);
            }
        }
        None
    }

    /// Candidate owner types, tried in order
    fn receiver_owners(&self, site: &CallSite, receiver: &Receiver) -> Vec<String> {
        match receiver {
            Receiver::Implicit => {
                // Unqualified calls may target any enclosing type
                let mut owners = vec![site.qualified_type()];
                let mut outer = site.ty.outer_name();
                while let Some(name) = outer {
                    owners.push(match site.file.package_name() {
                        "" => name.to_string(),
                        pkg => format!("{}.{}", pkg, name),
                    });
                    outer = name.rsplit_once('.').map(|(o, _)| o);
                }
                owners
            }
            Receiver::This => vec![site.qualified_type()],
            Receiver::Super => site
                .ty
                .superclass
                .as_ref()
                .map(|s| self.types.qualify(s, site.file, &site.ty.name))
                .into_iter()
                .collect(),
            Receiver::ThisField(field) => self
                .field_type(&site.qualified_type(), field)
                .into_iter()
                .collect(),
            Receiver::Path(segments) => self.path_type(site, segments).into_iter().collect(),
            Receiver::Typed(raw) => vec![self.types.qualify(raw, site.file, &site.ty.name)],
            Receiver::Unresolvable => Vec::new(),
        }
    }

    /// Static type of `a.b.c`: a variable followed by fields, or a type name followed by fields
    fn path_type(&self, site: &CallSite, segments: &[String]) -> Option<String> {
        let (first, rest) = segments.split_first()?;

        if let Some(start) = self.variable_type(site, first) {
            return self.follow_fields(start, rest);
        }

        for split in (1..=segments.len()).rev() {
            let candidate = self
                .types
                .qualify(&segments[..split].join("."), site.file, &site.ty.name);
            if self.types.is_declared(&candidate) {
                return self.follow_fields(candidate, &segments[split..]);
            }
        }
        None
    }

    fn follow_fields(&self, start: String, fields: &[String]) -> Option<String> {
        fields
            .iter()
            .try_fold(start, |owner, field| self.field_type(&owner, field))
    }

    /// Locals, then parameters, then fields of the enclosing type and its outer types
    fn variable_type(&self, site: &CallSite, name: &str) -> Option<String> {
        if let Some(declared) = site.method.local_type(name) {
            return Some(self.types.qualify(declared, site.file, &site.ty.name));
        }

        let mut current = Some(site.qualified_type());
        while let Some(owner) = current {
            if let Some(found) = self.field_type(&owner, name) {
                return Some(found);
            }
            current = owner
                .rsplit_once('.')
                .map(|(outer, _)| outer.to_string())
                .filter(|outer| self.types.is_declared(outer));
        }
        None
    }

    /// Declared type of a field on `owner` or one of its superclasses
    fn field_type(&self, owner: &str, field: &str) -> Option<String> {
        let mut visited = HashSet::new();
        let mut current = Some(owner.to_string());

        while let Some(name) = current {
            if !visited.insert(name.clone()) {
                break;
            }
            let (file, ty) = self.types.lookup(&name)?;
            if let Some(declared) = ty.field_type(field) {
                return Some(self.types.qualify(declared, file, &ty.name));
            }
            current = ty
                .superclass
                .as_ref()
                .map(|s| self.types.qualify(s, file, &ty.name));
        }
        None
    }

    fn hint_type(&self, site: &CallSite, hint: &ArgumentHint) -> Option<String> {
        match hint {
            ArgumentHint::Literal(ty) => Some(ty.clone()),
            ArgumentHint::Variable(name) => self.variable_type(site, name),
            ArgumentHint::Typed(raw) => Some(self.types.qualify(raw, site.file, &site.ty.name)),
            ArgumentHint::Unknown => None,
        }
    }

    /// Search `owner`, then its superclasses and super-interfaces breadth-first
    fn find_method(&self, owner: &str, name: &str, hints: &[Option<String>]) -> Option<MethodSignature> {
        let mut queue = VecDeque::from([owner.to_string()]);
        let mut visited = HashSet::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some((file, ty)) = self.types.lookup(&current) else {
                continue;
            };

            let mut best: Option<(usize, &ParsedMethod)> = None;
            for method in ty.methods.iter().filter(|m| m.name == name) {
                let Some(score) = self.match_score(file, ty, method, hints) else {
                    continue;
                };
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, method));
                }
            }
            if let Some((_, method)) = best {
                return self.types.signature_of(file, ty, method);
            }

            if let Some(superclass) = &ty.superclass {
                queue.push_back(self.types.qualify(superclass, file, &ty.name));
            }
            for interface in &ty.interfaces {
                queue.push_back(self.types.qualify(interface, file, &ty.name));
            }
        }
        None
    }

    /// How well argument hints fit a candidate; None when the arity cannot match
    fn match_score(
        &self,
        file: &ParsedFile,
        ty: &ParsedType,
        method: &ParsedMethod,
        hints: &[Option<String>],
    ) -> Option<usize> {
        let declared = method.parameters.len();
        let exact = declared == hints.len();
        let spread = method.is_varargs() && hints.len() + 1 >= declared;
        if !exact && !spread {
            return None;
        }

        let mut score = if exact { 1 } else { 0 };
        for (index, hint) in hints.iter().enumerate() {
            let param = &method.parameters[index.min(declared.saturating_sub(1))];
            let expected = self.types.qualify(&param.type_name, file, &ty.name);
            score += match hint {
                None => 1,
                Some(actual) if *actual == expected => 3,
                Some(actual) if assignable(actual, &expected) => 2,
                Some(_) => 0,
            };
        }
        Some(score)
    }
}

/// Primitive widening and boxing conversions accepted for overload scoring
fn assignable(actual: &str, expected: &str) -> bool {
    const WIDENING: &[(&str, &[&str])] = &[
        ("byte", &["short", "int", "long", "float", "double"]),
        ("short", &["int", "long", "float", "double"]),
        ("char", &["int", "long", "float", "double"]),
        ("int", &["long", "float", "double"]),
        ("long", &["float", "double"]),
        ("float", &["double"]),
    ];
    const BOXING: &[(&str, &str)] = &[
        ("boolean", "java.lang.Boolean"),
        ("byte", "java.lang.Byte"),
        ("char", "java.lang.Character"),
        ("short", "java.lang.Short"),
        ("int", "java.lang.Integer"),
        ("long", "java.lang.Long"),
        ("float", "java.lang.Float"),
        ("double", "java.lang.Double"),
    ];

    if expected == "java.lang.Object" && !is_primitive(actual) {
        return true;
    }
    WIDENING
        .iter()
        .any(|(from, to)| *from == actual && to.contains(&expected))
        || BOXING
            .iter()
            .any(|(p, b)| (*p == actual && *b == expected) || (*b == actual && *p == expected))
}
