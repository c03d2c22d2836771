// src/core/locator.rs
use std::path::PathBuf;

use tracing::debug;

use crate::error::{CallerTraceError, Result};
use super::analyzer::AnalysisSnapshot;
use super::call_graph::MethodSignature;
use super::parser::{ParsedFile, ParsedType};

/// The method declaration a request points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTarget {
    pub signature: MethodSignature,
    pub file: PathBuf,
    pub line_range: (usize, usize),
}

/// Whether `class_name` names `ty`, either as `pkg.Outer.Inner` or as `pkg.Inner`
fn names_type(file: &ParsedFile, ty: &ParsedType, class_name: &str) -> bool {
    if file.qualified_name(ty) == class_name {
        return true;
    }
    if ty.outer_name().is_none() {
        return false;
    }
    let short = match file.package_name() {
        "" => ty.simple_name().to_string(),
        pkg => format!("{}.{}", pkg, ty.simple_name()),
    };
    short == class_name
}

/// Find the method in `class_name` whose declaration spans `line`.
///
/// The first matching method in declaration order wins.
pub fn locate_target(snapshot: &AnalysisSnapshot, class_name: &str, line: usize) -> Result<LocatedTarget> {
    let resolver = snapshot.resolver();

    for file in &snapshot.files {
        for ty in file.types.iter().filter(|t| names_type(file, t, class_name)) {
            let Some(method) = ty.methods.iter().find(|m| m.contains_line(line)) else {
                continue;
            };

            debug!(
                "Line {} of {} falls in {}.{}",
                line,
                class_name,
                ty.name,
                method.name
            );

            let signature = resolver.signature_of(file, ty, method).ok_or_else(|| {
                CallerTraceError::UnresolvedTarget(format!(
                    "{}.{} declared at {}:{}",
                    file.qualified_name(ty),
                    method.name,
                    file.path.display(),
                    method.line_range.0
                ))
            })?;

            return Ok(LocatedTarget {
                signature,
                file: file.path.clone(),
                line_range: method.line_range,
            });
        }
    }

    Err(CallerTraceError::TargetNotFound {
        class: class_name.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::Scope;
    use crate::core::parser::{ParsedMethod, ParsedParameter, TypeKind};
    use crate::core::languages::{JavaParser, LanguageParser};
    use std::path::Path;

    const SOURCE: &str = r#"package com.acme;

public class Outer {
    public void first(int a) {
        int b = a;
    }

    static class Inner {
        void second() {
        }
    }
}
"#;

    fn snapshot() -> AnalysisSnapshot {
        let mut parser = JavaParser::new().unwrap();
        let parsed = parser.parse(SOURCE, Path::new("Outer.java")).unwrap();
        let file = ParsedFile {
            path: PathBuf::from("com/acme/Outer.java"),
            language: "java".to_string(),
            package: parsed.package,
            imports: parsed.imports,
            types: parsed.types,
            source_content: SOURCE.to_string(),
        };
        AnalysisSnapshot::build(vec![file], &Scope::new("com.acme"))
    }

    #[test]
    fn test_locates_method_by_line() {
        let target = locate_target(&snapshot(), "com.acme.Outer", 5).unwrap();
        assert_eq!(target.signature.to_string(), "com.acme.Outer.first(int)");
        assert_eq!(target.line_range, (4, 6));
    }

    #[test]
    fn test_nested_class_by_full_or_short_name() {
        let snap = snapshot();
        let full = locate_target(&snap, "com.acme.Outer.Inner", 9).unwrap();
        let short = locate_target(&snap, "com.acme.Inner", 10).unwrap();
        assert_eq!(full.signature, short.signature);
        assert_eq!(full.signature.to_string(), "com.acme.Outer.Inner.second()");
    }

    #[test]
    fn test_line_outside_any_method() {
        let err = locate_target(&snapshot(), "com.acme.Outer", 2).unwrap_err();
        assert!(matches!(err, CallerTraceError::TargetNotFound { line: 2, .. }));
        assert_eq!(err.exit_code(), 3);

        let err = locate_target(&snapshot(), "com.acme.Missing", 5).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_damaged_parameter_is_unresolved_target() {
        let mut snap = snapshot();
        snap.files[0].types[0].methods.insert(
            0,
            ParsedMethod {
                name: "damaged".to_string(),
                parameters: vec![ParsedParameter {
                    name: "x".to_string(),
                    type_name: String::new(),
                    varargs: false,
                }],
                line_range: (4, 6),
                source: String::new(),
                body: None,
                comments: None,
                locals: Vec::new(),
                calls: Vec::new(),
            },
        );
        assert_eq!(snap.files[0].types[0].kind, TypeKind::Class);

        let err = locate_target(&snap, "com.acme.Outer", 5).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
