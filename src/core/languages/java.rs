// src/core/languages/java.rs
use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::core::parser::{
    ArgumentHint, ImportDecl, ParsedCall, ParsedMethod, ParsedParameter, ParsedSource,
    ParsedType, ParsedVariable, Receiver, TypeKind,
};
use crate::error::{CallerTraceError, Result};
use super::LanguageParser;

/// Maximum gap, in lines, between a comment and the declaration it documents
const COMMENT_WINDOW: usize = 3;

/// Java-specific parser using Tree-sitter
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let java_language = tree_sitter_java::language();
        parser.set_language(&java_language)
            .map_err(|e| CallerTraceError::Parser(format!("Failed to set Java language: {}", e)))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for JavaParser {
    fn parse(&mut self, content: &str, file_path: &Path) -> Result<ParsedSource> {
        let tree = self.parser.parse(content, None)
            .ok_or_else(|| CallerTraceError::Parser("Failed to parse Java code".to_string()))?;

        let root_node = tree.root_node();
        if root_node.has_error() {
            return Err(CallerTraceError::Parser(format!(
                "Syntax errors in {}",
                file_path.display()
            )));
        }

        let extractor = Extractor::new(content);
        let mut parsed = ParsedSource::default();

        let mut cursor = root_node.walk();
        for child in root_node.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => parsed.package = extractor.package_name(child),
                "import_declaration" => {
                    if let Some(import) = extractor.import(child) {
                        parsed.imports.push(import);
                    }
                }
                kind if is_type_declaration(kind) => {
                    extractor.collect_type(child, None, &mut parsed.types)
                }
                _ => {}
            }
        }

        Ok(parsed)
    }

    fn file_extensions(&self) -> &[&str] {
        &["java"]
    }

    fn language_name(&self) -> &str {
        "java"
    }
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration"
    )
}

fn is_comment(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment" | "comment")
}

/// Walks declarations of a single compilation unit
struct Extractor<'a> {
    source: &'a str,
    lines: Vec<&'a str>,
}

impl<'a> Extractor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: source.lines().collect(),
        }
    }

    /// Extract text content of a node
    fn node_text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    /// Type text with whitespace removed, e.g. `Map<String, Integer>` -> `Map<String,Integer>`
    fn type_text(&self, node: Node) -> String {
        self.node_text(node).split_whitespace().collect()
    }

    /// Whole source lines covering a node, original indentation kept
    fn line_text(&self, node: Node) -> String {
        let start = node.start_position().row;
        let end = node.end_position().row.min(self.lines.len().saturating_sub(1));
        if start > end {
            return String::new();
        }
        self.lines[start..=end].join("\n")
    }

    fn package_name(&self, node: Node) -> Option<String> {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"));
        name.map(|n| self.type_text(n))
    }

    fn import(&self, node: Node) -> Option<ImportDecl> {
        let mut is_static = false;
        let mut on_demand = false;
        let mut path = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => on_demand = true,
                "identifier" | "scoped_identifier" => path = Some(self.type_text(child)),
                _ => {}
            }
        }

        path.map(|path| ImportDecl { path, is_static, on_demand })
    }

    /// Push a type declaration and, after it, every type nested inside it
    fn collect_type(&self, node: Node, outer: Option<&str>, types: &mut Vec<ParsedType>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let simple = self.node_text(name_node);
        let name = match outer {
            Some(outer) => format!("{}.{}", outer, simple),
            None => simple.to_string(),
        };

        let kind = match node.kind() {
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            _ => TypeKind::Class,
        };

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|sc| sc.named_child(0))
            .map(|t| self.type_text(t));

        let interfaces = match kind {
            TypeKind::Interface => self
                .child_of_kind(node, "extends_interfaces")
                .map(|n| self.type_list(n))
                .unwrap_or_default(),
            _ => node
                .child_by_field_name("interfaces")
                .map(|n| self.type_list(n))
                .unwrap_or_default(),
        };

        let mut parsed = ParsedType {
            name,
            kind,
            superclass,
            interfaces,
            fields: Vec::new(),
            methods: Vec::new(),
            line_range: (node.start_position().row + 1, node.end_position().row + 1),
        };

        let mut nested = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for member in self.members(body) {
                match member.kind() {
                    "field_declaration" | "constant_declaration" => {
                        self.declared_variables(member, &mut parsed.fields)
                    }
                    "method_declaration" => {
                        if let Some(method) = self.method(member) {
                            parsed.methods.push(method);
                        }
                    }
                    kind if is_type_declaration(kind) => nested.push(member),
                    _ => {}
                }
            }
        }

        let outer_name = parsed.name.clone();
        types.push(parsed);
        for inner in nested {
            self.collect_type(inner, Some(&outer_name), types);
        }
    }

    /// Body members, with enum body declarations flattened in
    fn members<'t>(&self, body: Node<'t>) -> Vec<Node<'t>> {
        let mut members = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() == "enum_body_declarations" {
                let mut inner = child.walk();
                members.extend(child.named_children(&mut inner));
            } else {
                members.push(child);
            }
        }
        members
    }

    fn child_of_kind<'t>(&self, node: Node<'t>, kind: &str) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
        found
    }

    /// Types listed under `implements` or `extends`
    fn type_list(&self, node: Node) -> Vec<String> {
        let list = self.child_of_kind(node, "type_list").unwrap_or(node);
        let mut cursor = list.walk();
        let types = list
            .named_children(&mut cursor)
            .filter(|c| !is_comment(c.kind()))
            .map(|c| self.type_text(c))
            .collect();
        types
    }

    /// Variables of a field or local variable declaration, one per declarator
    fn declared_variables(&self, node: Node, out: &mut Vec<ParsedVariable>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let declared = self.type_text(type_node);

        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };

            let mut type_name = declared.clone();
            if type_name == "var" {
                // Only `var x = new T(..)` carries a type we can read off the syntax
                if let Some(value) = declarator.child_by_field_name("value") {
                    if value.kind() == "object_creation_expression" {
                        if let Some(t) = value.child_by_field_name("type") {
                            type_name = self.type_text(t);
                        }
                    }
                }
            }
            if let Some(dims) = declarator.child_by_field_name("dimensions") {
                type_name.push_str(&self.type_text(dims));
            }

            out.push(ParsedVariable {
                name: self.node_text(name).to_string(),
                type_name,
            });
        }
    }

    fn method(&self, node: Node) -> Option<ParsedMethod> {
        let name = self.node_text(node.child_by_field_name("name")?).to_string();

        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| self.parameters(p))
            .unwrap_or_default();

        let body_node = node.child_by_field_name("body");
        let mut locals = Vec::new();
        let mut calls = Vec::new();
        if let Some(body) = body_node {
            self.scan_body(body, &mut locals, &mut calls);
        }

        Some(ParsedMethod {
            name,
            parameters,
            line_range: (node.start_position().row + 1, node.end_position().row + 1),
            source: self.line_text(node),
            body: body_node.map(|b| self.line_text(b)),
            comments: self.leading_comments(node),
            locals,
            calls,
        })
    }

    fn parameters(&self, node: Node) -> Vec<ParsedParameter> {
        let mut params = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "formal_parameter" => {
                    let mut type_name = child
                        .child_by_field_name("type")
                        .map(|t| self.type_text(t))
                        .unwrap_or_default();
                    if let Some(dims) = child.child_by_field_name("dimensions") {
                        type_name.push_str(&self.type_text(dims));
                    }
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.node_text(n).to_string())
                        .unwrap_or_default();
                    params.push(ParsedParameter { name, type_name, varargs: false });
                }
                "spread_parameter" => {
                    let mut inner = child.walk();
                    let mut type_name = String::new();
                    let mut name = String::new();
                    for part in child.named_children(&mut inner) {
                        match part.kind() {
                            "modifiers" => {}
                            "variable_declarator" => {
                                if let Some(n) = part.child_by_field_name("name") {
                                    name = self.node_text(n).to_string();
                                }
                            }
                            _ if type_name.is_empty() => type_name = self.type_text(part),
                            _ => {}
                        }
                    }
                    params.push(ParsedParameter { name, type_name, varargs: true });
                }
                _ => {}
            }
        }

        params
    }

    /// Comments directly above a declaration, each within the window of the next
    fn leading_comments(&self, node: Node) -> Option<String> {
        let mut collected = Vec::new();
        let mut anchor_row = node.start_position().row;
        let mut current = node.prev_sibling();

        while let Some(prev) = current {
            if !is_comment(prev.kind()) {
                break;
            }
            if anchor_row.saturating_sub(prev.end_position().row) > COMMENT_WINDOW {
                break;
            }
            collected.push(self.line_text(prev).trim().to_string());
            anchor_row = prev.start_position().row;
            current = prev.prev_sibling();
        }

        if collected.is_empty() {
            None
        } else {
            collected.reverse();
            Some(collected.join("\n"))
        }
    }

    /// Collect local declarations and method invocations anywhere under a body
    fn scan_body(&self, node: Node, locals: &mut Vec<ParsedVariable>, calls: &mut Vec<ParsedCall>) {
        match node.kind() {
            "local_variable_declaration" => self.declared_variables(node, locals),
            "enhanced_for_statement" | "resource" => {
                if let (Some(t), Some(n)) =
                    (node.child_by_field_name("type"), node.child_by_field_name("name"))
                {
                    locals.push(ParsedVariable {
                        name: self.node_text(n).to_string(),
                        type_name: self.type_text(t),
                    });
                }
            }
            "catch_formal_parameter" => {
                let caught = self
                    .child_of_kind(node, "catch_type")
                    .and_then(|c| c.named_child(0));
                if let (Some(t), Some(n)) = (caught, node.child_by_field_name("name")) {
                    locals.push(ParsedVariable {
                        name: self.node_text(n).to_string(),
                        type_name: self.type_text(t),
                    });
                }
            }
            "method_invocation" => {
                if let Some(call) = self.call(node) {
                    calls.push(call);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.scan_body(child, locals, calls);
        }
    }

    fn call(&self, node: Node) -> Option<ParsedCall> {
        let name = self.node_text(node.child_by_field_name("name")?).to_string();

        let receiver = match node.child_by_field_name("object") {
            None => Receiver::Implicit,
            Some(object) => self.receiver(object),
        };

        let arguments = match node.child_by_field_name("arguments") {
            Some(args) => {
                let mut cursor = args.walk();
                let hints = args
                    .named_children(&mut cursor)
                    .filter(|a| !is_comment(a.kind()))
                    .map(|a| self.argument_hint(a))
                    .collect();
                hints
            }
            None => Vec::new(),
        };

        Some(ParsedCall {
            receiver,
            name,
            arguments,
            line: node.start_position().row + 1,
        })
    }

    fn receiver(&self, object: Node) -> Receiver {
        match object.kind() {
            "this" => Receiver::This,
            "super" => Receiver::Super,
            "identifier" => Receiver::Path(vec![self.node_text(object).to_string()]),
            "scoped_identifier" => Receiver::Path(
                self.type_text(object).split('.').map(str::to_string).collect(),
            ),
            "field_access" => match self.field_path(object) {
                Some((true, path)) if path.len() == 1 => Receiver::ThisField(path[0].clone()),
                Some((_, path)) => Receiver::Path(path),
                None => Receiver::Unresolvable,
            },
            "object_creation_expression" => object
                .child_by_field_name("type")
                .map(|t| Receiver::Typed(self.type_text(t)))
                .unwrap_or(Receiver::Unresolvable),
            "parenthesized_expression" => match object.named_child(0) {
                Some(inner) if inner.kind() == "cast_expression" => inner
                    .child_by_field_name("type")
                    .map(|t| Receiver::Typed(self.type_text(t)))
                    .unwrap_or(Receiver::Unresolvable),
                Some(inner) => self.receiver(inner),
                None => Receiver::Unresolvable,
            },
            _ => Receiver::Unresolvable,
        }
    }

    /// Dotted identifier chain of a field access; the flag is set when it starts at `this`
    fn field_path(&self, node: Node) -> Option<(bool, Vec<String>)> {
        match node.kind() {
            "identifier" => Some((false, vec![self.node_text(node).to_string()])),
            "this" => Some((true, Vec::new())),
            "field_access" => {
                let (from_this, mut path) = self.field_path(node.child_by_field_name("object")?)?;
                path.push(self.node_text(node.child_by_field_name("field")?).to_string());
                Some((from_this, path))
            }
            _ => None,
        }
    }

    fn argument_hint(&self, arg: Node) -> ArgumentHint {
        let text = self.node_text(arg);
        match arg.kind() {
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal"
            | "binary_integer_literal" => {
                if text.ends_with(['l', 'L']) {
                    ArgumentHint::Literal("long".to_string())
                } else {
                    ArgumentHint::Literal("int".to_string())
                }
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                if text.ends_with(['f', 'F']) {
                    ArgumentHint::Literal("float".to_string())
                } else {
                    ArgumentHint::Literal("double".to_string())
                }
            }
            "string_literal" | "text_block" => ArgumentHint::Literal("java.lang.String".to_string()),
            "character_literal" => ArgumentHint::Literal("char".to_string()),
            "true" | "false" => ArgumentHint::Literal("boolean".to_string()),
            "identifier" => ArgumentHint::Variable(text.to_string()),
            "object_creation_expression" | "cast_expression" => arg
                .child_by_field_name("type")
                .map(|t| ArgumentHint::Typed(self.type_text(t)))
                .unwrap_or(ArgumentHint::Unknown),
            _ => ArgumentHint::Unknown,
        }
    }
}
