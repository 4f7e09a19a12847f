//! Java language support.
//!
//! Extracts classes, methods, constructors, annotations, modifiers, imports,
//! call sites, and literal-comparison error guards
//! (`if (b == 0) throw new ...`) using the tree-sitter Java grammar.
//! Generics and nested classes are tolerated; type parameters stay verbatim
//! inside the recorded type hints.

use tree_sitter::{Language as TSLanguage, Node, Parser, Tree};

use crate::analyzer::types::{ErrorGuard, ImportDecl, Param};
use crate::error::{Result, TestsmithError};
use crate::lang::traits::{node_text, ClassDecl, FunctionDecl, Language};

/// Java language implementation.
pub struct Java;

/// Modifiers and annotations pulled from a declaration.
#[derive(Default)]
struct Modifiers {
    is_private: bool,
    is_static: bool,
    annotations: Vec<String>,
}

impl Java {
    fn child_by_field<'a>(&self, node: Node<'a>, field: &str) -> Option<Node<'a>> {
        node.child_by_field_name(field)
    }

    fn extract_modifiers(&self, node: Node, source: &[u8]) -> Modifiers {
        let mut mods = Modifiers::default();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "modifiers" {
                continue;
            }
            let mut inner = child.walk();
            for item in child.children(&mut inner) {
                match item.kind() {
                    "marker_annotation" | "annotation" => {
                        let text = node_text(item, source).trim_start_matches('@').trim();
                        mods.annotations.push(text.to_string());
                    }
                    _ => match node_text(item, source) {
                        "private" => mods.is_private = true,
                        "static" => mods.is_static = true,
                        _ => {}
                    },
                }
            }
        }
        mods
    }

    fn extract_formal_params(&self, params_node: Node, source: &[u8]) -> Vec<Param> {
        let mut params = Vec::new();
        let mut cursor = params_node.walk();
        for child in params_node.named_children(&mut cursor) {
            if !matches!(child.kind(), "formal_parameter" | "spread_parameter") {
                continue;
            }
            let Some(name_node) = self.child_by_field(child, "name") else {
                continue;
            };
            params.push(Param {
                name: node_text(name_node, source).to_string(),
                type_hint: self
                    .child_by_field(child, "type")
                    .map(|t| node_text(t, source).to_string()),
                default: None,
            });
        }
        params
    }

    /// Detect `if (<param> == <literal>) { throw new <Error>(...); }` guards.
    fn extract_guards(&self, body: Node, source: &[u8], params: &[Param]) -> Vec<ErrorGuard> {
        let mut guards = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            if node.kind() == "if_statement" {
                if let (Some(condition), Some(consequence)) = (
                    self.child_by_field(node, "condition"),
                    self.child_by_field(node, "consequence"),
                ) {
                    if let Some((param, trigger)) =
                        self.match_literal_equality(condition, source, params)
                    {
                        if let Some(error_kind) = self.find_thrown_kind(consequence, source) {
                            guards.push(ErrorGuard {
                                param,
                                trigger,
                                error_kind,
                                line: node.start_position().row + 1,
                            });
                        }
                    }
                }
            }
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                stack.push(child);
            }
        }
        guards.sort_by_key(|g| g.line);
        guards
    }

    fn match_literal_equality(
        &self,
        condition: Node,
        source: &[u8],
        params: &[Param],
    ) -> Option<(String, String)> {
        // Unwrap the parenthesized condition.
        let inner = if condition.kind() == "parenthesized_expression" {
            condition.named_child(0)?
        } else {
            condition
        };
        if inner.kind() != "binary_expression" {
            return None;
        }
        let operator = self.child_by_field(inner, "operator")?;
        if node_text(operator, source) != "==" {
            return None;
        }
        let left = self.child_by_field(inner, "left")?;
        let right = self.child_by_field(inner, "right")?;
        if left.kind() != "identifier" {
            return None;
        }
        if !matches!(
            right.kind(),
            "decimal_integer_literal"
                | "decimal_floating_point_literal"
                | "string_literal"
                | "character_literal"
                | "null_literal"
                | "true"
                | "false"
        ) {
            return None;
        }
        let name = node_text(left, source);
        if !params.iter().any(|p| p.name == name) {
            return None;
        }
        Some((name.to_string(), node_text(right, source).to_string()))
    }

    fn find_thrown_kind(&self, node: Node, source: &[u8]) -> Option<String> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == "throw_statement" {
                let mut cursor = current.walk();
                for child in current.named_children(&mut cursor) {
                    if child.kind() == "object_creation_expression" {
                        if let Some(ty) = self.child_by_field(child, "type") {
                            return Some(node_text(ty, source).to_string());
                        }
                    }
                }
                return Some("RuntimeException".to_string());
            }
            let mut cursor = current.walk();
            for child in current.named_children(&mut cursor) {
                stack.push(child);
            }
        }
        None
    }

    fn extract_method(&self, node: Node, source: &[u8]) -> Option<FunctionDecl> {
        let name = node_text(self.child_by_field(node, "name")?, source).to_string();
        let mods = self.extract_modifiers(node, source);
        let params = self
            .child_by_field(node, "parameters")
            .map(|p| self.extract_formal_params(p, source))
            .unwrap_or_default();
        let body = self.child_by_field(node, "body");
        let guards = body
            .map(|b| self.extract_guards(b, source, &params))
            .unwrap_or_default();

        Some(FunctionDecl {
            is_private: mods.is_private,
            is_static: mods.is_static,
            return_type: self
                .child_by_field(node, "type")
                .map(|t| node_text(t, source).to_string())
                .filter(|t| t != "void"),
            decorators: mods.annotations,
            is_async: false,
            line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            byte_range: (node.start_byte(), node.end_byte()),
            body: body.map(|b| node_text(b, source).to_string()).unwrap_or_default(),
            guards,
            params,
            name,
        })
    }
}

impl Language for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".java"]
    }

    fn ts_language(&self) -> TSLanguage {
        tree_sitter_java::LANGUAGE.into()
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| TestsmithError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"(method_declaration name: (identifier) @name) @function"#
    }

    fn class_query(&self) -> &'static str {
        r#"[
            (class_declaration name: (identifier) @name) @class
            (record_declaration name: (identifier) @name) @class
        ]"#
    }

    fn call_query(&self) -> &'static str {
        r#"[
            (method_invocation) @call
            (object_creation_expression) @call
        ]"#
    }

    fn extract_function(&self, node: Node, source: &[u8]) -> Option<FunctionDecl> {
        if node.kind() != "method_declaration" {
            return None;
        }
        self.extract_method(node, source)
    }

    fn extract_class(&self, node: Node, source: &[u8]) -> Option<ClassDecl> {
        if !matches!(node.kind(), "class_declaration" | "record_declaration") {
            return None;
        }
        let name = node_text(self.child_by_field(node, "name")?, source).to_string();
        let mods = self.extract_modifiers(node, source);

        let mut bases = Vec::new();
        if let Some(superclass) = self.child_by_field(node, "superclass") {
            let mut cursor = superclass.walk();
            for child in superclass.named_children(&mut cursor) {
                bases.push(node_text(child, source).to_string());
            }
        }
        if let Some(interfaces) = self.child_by_field(node, "interfaces") {
            let mut cursor = interfaces.walk();
            for child in interfaces.named_children(&mut cursor) {
                if child.kind() == "type_list" {
                    let mut inner = child.walk();
                    for ty in child.named_children(&mut inner) {
                        bases.push(node_text(ty, source).to_string());
                    }
                }
            }
        }

        let mut methods = Vec::new();
        let mut constructor_params = Vec::new();
        if let Some(body) = self.child_by_field(node, "body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                match child.kind() {
                    "method_declaration" => {
                        if let Some(method) = self.extract_method(child, source) {
                            methods.push(method);
                        }
                    }
                    "constructor_declaration" => {
                        if let Some(params) = self
                            .child_by_field(child, "parameters")
                            .map(|p| self.extract_formal_params(p, source))
                        {
                            // Keep the first (least surprising) constructor.
                            if constructor_params.is_empty() {
                                constructor_params = params;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(ClassDecl {
            is_private: mods.is_private,
            decorators: mods.annotations,
            line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            byte_range: (node.start_byte(), node.end_byte()),
            bases,
            methods,
            constructor_params,
            name,
        })
    }

    fn extract_imports(&self, tree: &Tree, source: &[u8]) -> Vec<ImportDecl> {
        let mut imports = Vec::new();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() != "import_declaration" {
                continue;
            }
            let mut inner = child.walk();
            for item in child.named_children(&mut inner) {
                if matches!(item.kind(), "scoped_identifier" | "identifier") {
                    let module = node_text(item, source).to_string();
                    let names = module
                        .rsplit('.')
                        .next()
                        .map(|n| vec![n.to_string()])
                        .unwrap_or_default();
                    imports.push(ImportDecl {
                        module,
                        names,
                        line: child.start_position().row + 1,
                    });
                    break;
                }
            }
        }
        imports
    }

    fn call_target(&self, node: Node, source: &[u8]) -> Option<String> {
        match node.kind() {
            "method_invocation" => {
                let name = node_text(self.child_by_field(node, "name")?, source);
                match self.child_by_field(node, "object") {
                    Some(object) => {
                        let object_text = node_text(object, source);
                        let object_text =
                            object_text.strip_prefix("this.").unwrap_or(object_text);
                        Some(format!("{object_text}.{name}"))
                    }
                    None => Some(name.to_string()),
                }
            }
            "object_creation_expression" => {
                let ty = node_text(self.child_by_field(node, "type")?, source);
                Some(format!("new {ty}"))
            }
            _ => None,
        }
    }
}
