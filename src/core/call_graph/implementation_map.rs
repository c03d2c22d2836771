// src/core/call_graph/implementation_map.rs
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{MethodSignature, Scope};
use crate::core::analyzer::TypeDecl;

/// Interface method -> concrete methods declared by implementing types
#[derive(Debug, Clone, Default)]
pub struct ImplementationMap {
    implementations: BTreeMap<MethodSignature, BTreeSet<MethodSignature>>,
    /// Reverse direction, concrete method -> interface methods it implements
    interfaces: BTreeMap<MethodSignature, BTreeSet<MethodSignature>>,
}

impl ImplementationMap {
    /// Map interface methods onto their implementations using `implements` clauses only.
    ///
    /// A concrete method matches an interface method when the name and the
    /// parameter types agree exactly, position by position.
    pub fn build(types: &BTreeMap<String, TypeDecl>, scope: &Scope) -> Self {
        let mut map = Self::default();

        let concrete = types
            .values()
            .filter(|t| !t.is_interface() && scope.contains_type(&t.qualified_name));

        for decl in concrete {
            for interface_name in &decl.interfaces {
                let interface = match types.get(interface_name) {
                    Some(found) if found.is_interface() && scope.contains_type(interface_name) => {
                        found
                    }
                    _ => {
                        debug!(
                            "Skipping unresolved interface {} implemented by {}",
                            interface_name, decl.qualified_name
                        );
                        continue;
                    }
                };

                for method in &decl.methods {
                    for declared in interface.methods.iter().filter(|m| m.matches_shape(method)) {
                        map.insert(declared.clone(), method.clone());
                    }
                }
            }
        }

        if map.is_empty() {
            debug!("No interface implementations inside scope");
        } else {
            debug!("Mapped {} interface methods to implementations", map.len());
        }
        map
    }

    pub fn insert(&mut self, interface_method: MethodSignature, implementation: MethodSignature) {
        self.interfaces
            .entry(implementation.clone())
            .or_default()
            .insert(interface_method.clone());
        self.implementations
            .entry(interface_method)
            .or_default()
            .insert(implementation);
    }

    /// Implementations of an interface method, in signature order
    pub fn implementations_of(&self, interface_method: &MethodSignature) -> Option<&BTreeSet<MethodSignature>> {
        self.implementations.get(interface_method)
    }

    pub fn first_implementation(&self, interface_method: &MethodSignature) -> Option<&MethodSignature> {
        self.implementations.get(interface_method)?.iter().next()
    }

    /// Interface methods a concrete method implements
    pub fn interfaces_of(&self, implementation: &MethodSignature) -> Option<&BTreeSet<MethodSignature>> {
        self.interfaces.get(implementation)
    }

    /// Everything related through the map: interface methods plus all their implementations.
    ///
    /// The result includes `signature` itself when it takes part in the map at all.
    pub fn siblings(&self, signature: &MethodSignature) -> BTreeSet<MethodSignature> {
        let mut related = BTreeSet::new();

        let mut roots: Vec<&MethodSignature> = Vec::new();
        if self.implementations.contains_key(signature) {
            roots.push(signature);
        }
        if let Some(interfaces) = self.interfaces_of(signature) {
            roots.extend(interfaces.iter());
        }

        for root in roots {
            related.insert(root.clone());
            if let Some(impls) = self.implementations.get(root) {
                related.extend(impls.iter().cloned());
            }
        }

        related
    }

    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::TypeKind;

    fn sig(text: &str) -> MethodSignature {
        text.parse().unwrap()
    }

    fn decl(name: &str, kind: TypeKind, interfaces: &[&str], methods: &[&str]) -> TypeDecl {
        TypeDecl {
            qualified_name: name.to_string(),
            kind,
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            superclass: None,
            methods: methods.iter().map(|m| sig(m)).collect(),
        }
    }

    fn types(decls: Vec<TypeDecl>) -> BTreeMap<String, TypeDecl> {
        decls.into_iter().map(|d| (d.qualified_name.clone(), d)).collect()
    }

    #[test]
    fn test_maps_exact_shape_matches_only() {
        let types = types(vec![
            decl("p.Helper", TypeKind::Interface, &[], &["p.Helper.help(int)", "p.Helper.help(long)"]),
            decl(
                "p.HelperImpl",
                TypeKind::Class,
                &["p.Helper"],
                &["p.HelperImpl.help(int)", "p.HelperImpl.help(java.lang.Integer)", "p.HelperImpl.other()"],
            ),
        ]);

        let map = ImplementationMap::build(&types, &Scope::new("p"));
        assert_eq!(map.len(), 1);
        let impls: Vec<String> = map
            .implementations_of(&sig("p.Helper.help(int)"))
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(impls, vec!["p.HelperImpl.help(int)"]);
        assert!(map.implementations_of(&sig("p.Helper.help(long)")).is_none());
    }

    #[test]
    fn test_unresolved_interface_is_skipped() {
        let types = types(vec![
            decl("p.Impl", TypeKind::Class, &["Missing", "p.Api"], &["p.Impl.call()"]),
            decl("p.Api", TypeKind::Interface, &[], &["p.Api.call()"]),
        ]);
        let map = ImplementationMap::build(&types, &Scope::new(""));
        assert_eq!(map.first_implementation(&sig("p.Api.call()")), Some(&sig("p.Impl.call()")));
    }

    #[test]
    fn test_out_of_scope_types_do_not_participate() {
        let types = types(vec![
            decl("p.Api", TypeKind::Interface, &[], &["p.Api.call()"]),
            decl("q.Impl", TypeKind::Class, &["p.Api"], &["q.Impl.call()"]),
        ]);
        assert!(ImplementationMap::build(&types, &Scope::new("p")).is_empty());
    }

    #[test]
    fn test_multiple_interfaces_share_an_implementation() {
        let types = types(vec![
            decl("p.A", TypeKind::Interface, &[], &["p.A.run()"]),
            decl("p.B", TypeKind::Interface, &[], &["p.B.run()"]),
            decl("p.Impl", TypeKind::Class, &["p.A", "p.B"], &["p.Impl.run()"]),
            decl("p.Other", TypeKind::Class, &["p.A"], &["p.Other.run()"]),
        ]);
        let map = ImplementationMap::build(&types, &Scope::new("p"));

        let interfaces = map.interfaces_of(&sig("p.Impl.run()")).unwrap();
        assert_eq!(interfaces.len(), 2);

        let siblings: Vec<String> = map
            .siblings(&sig("p.Impl.run()"))
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            siblings,
            vec!["p.A.run()", "p.B.run()", "p.Impl.run()", "p.Other.run()"]
        );
        assert!(map.siblings(&sig("p.Nothing.run()")).is_empty());
    }
}
