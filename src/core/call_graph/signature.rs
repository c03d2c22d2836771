// src/core/call_graph/signature.rs
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CallerTraceError;

/// Canonical identity of a Java method, the only key used by the call graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Package name, empty for the default package
    pub package: String,
    /// Enclosing type; nested types are joined with '.'
    pub type_name: String,
    /// Method name
    pub method_name: String,
    /// Qualified parameter types in declaration order
    pub parameter_types: Vec<String>,
}

impl MethodSignature {
    pub fn new(
        package: impl Into<String>,
        type_name: impl Into<String>,
        method_name: impl Into<String>,
        parameter_types: Vec<String>,
    ) -> Self {
        Self {
            package: package.into(),
            type_name: type_name.into(),
            method_name: method_name.into(),
            parameter_types,
        }
    }

    /// Fully-qualified name of the enclosing type
    pub fn qualified_type(&self) -> String {
        if self.package.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}.{}", self.package, self.type_name)
        }
    }

    /// Get display name for reports
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.type_name, self.method_name)
    }

    /// Same name and pairwise-equal parameter types, ignoring the owner
    pub fn matches_shape(&self, other: &MethodSignature) -> bool {
        self.method_name == other.method_name && self.parameter_types == other.parameter_types
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.qualified_type(),
            self.method_name,
            self.parameter_types.join(", ")
        )
    }
}

fn signature_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<owner>[\w$]+(?:\.[\w$]+)*)\.(?P<name>[\w$]+)\((?P<params>[^()]*)\)$")
            .expect("Invalid signature regex")
    })
}

impl FromStr for MethodSignature {
    type Err = CallerTraceError;

    /// Parse the `pkg.Type.name(T1, T2)` rendering back into a signature.
    ///
    /// The package ends at the first segment starting with an upper-case letter,
    /// following the Java naming convention.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = signature_regex().captures(s.trim()).ok_or_else(|| {
            CallerTraceError::InvalidArgument(format!("malformed method signature: {}", s))
        })?;

        let owner: Vec<&str> = caps["owner"].split('.').collect();
        let split = owner
            .iter()
            .position(|segment| segment.starts_with(|c: char| c.is_ascii_uppercase()))
            .unwrap_or(owner.len() - 1);

        let params = caps["params"].trim();
        let parameter_types = if params.is_empty() {
            Vec::new()
        } else {
            params.split(',').map(|p| p.trim().to_string()).collect()
        };

        Ok(Self::new(
            owner[..split].join("."),
            owner[split..].join("."),
            &caps["name"],
            parameter_types,
        ))
    }
}

/// Package-prefix filter restricting which declarations participate in the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    prefix: String,
}

impl Scope {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim().to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a fully-qualified type name falls inside the scope
    pub fn contains_type(&self, qualified_type: &str) -> bool {
        qualified_type.starts_with(&self.prefix)
    }

    pub fn contains(&self, signature: &MethodSignature) -> bool {
        self.contains_type(&signature.qualified_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_qualified_signature() {
        let sig = MethodSignature::new(
            "com.acme.app",
            "Worker",
            "run",
            vec!["int".to_string(), "java.lang.String".to_string()],
        );
        assert_eq!(sig.to_string(), "com.acme.app.Worker.run(int, java.lang.String)");
        assert_eq!(sig.qualified_type(), "com.acme.app.Worker");
        assert_eq!(sig.display_name(), "Worker.run");
    }

    #[test]
    fn test_parse_round_trips_nested_types() {
        let text = "com.acme.Outer.Inner.handle(com.acme.Event, int[])";
        let sig: MethodSignature = text.parse().unwrap();
        assert_eq!(sig.package, "com.acme");
        assert_eq!(sig.type_name, "Outer.Inner");
        assert_eq!(sig.method_name, "handle");
        assert_eq!(sig.parameter_types, vec!["com.acme.Event", "int[]"]);
        assert_eq!(sig.to_string(), text);
    }

    #[test]
    fn test_parse_no_parameters_and_default_package() {
        let sig: MethodSignature = "Main.main()".parse().unwrap();
        assert_eq!(sig.package, "");
        assert_eq!(sig.type_name, "Main");
        assert!(sig.parameter_types.is_empty());
        assert_eq!(sig.to_string(), "Main.main()");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not a signature".parse::<MethodSignature>().is_err());
        assert!("a.B.c(".parse::<MethodSignature>().is_err());
    }

    #[test]
    fn test_overloads_are_distinct() {
        let one: MethodSignature = "p.T.m(int)".parse().unwrap();
        let two: MethodSignature = "p.T.m(int, int)".parse().unwrap();
        assert_ne!(one, two);
        assert!(!one.matches_shape(&two));
        let other_owner: MethodSignature = "p.U.m(int)".parse().unwrap();
        assert!(one.matches_shape(&other_owner));
    }

    #[test]
    fn test_scope_prefix() {
        let scope = Scope::new("com.acme");
        let inside: MethodSignature = "com.acme.app.A.f()".parse().unwrap();
        let outside: MethodSignature = "org.other.B.g()".parse().unwrap();
        assert!(scope.contains(&inside));
        assert!(!scope.contains(&outside));
        assert!(Scope::new("").contains(&outside));
    }
}
