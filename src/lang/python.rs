//! Python language support.
//!
//! Extracts functions, methods, classes, decorators, default parameter
//! values, type annotations, imports, call sites, and literal-comparison
//! error guards (`if b == 0: raise ...`) using the tree-sitter Python
//! grammar. Decorated and nested declarations are tolerated; decorators are
//! recorded verbatim as opaque metadata.

use tree_sitter::{Language as TSLanguage, Node, Parser, Tree};

use crate::analyzer::types::{ErrorGuard, ImportDecl, Param};
use crate::error::{Result, TestsmithError};
use crate::lang::traits::{node_text, ClassDecl, FunctionDecl, Language};

/// Python language implementation.
pub struct Python;

impl Python {
    fn child_by_field<'a>(&self, node: Node<'a>, field: &str) -> Option<Node<'a>> {
        node.child_by_field_name(field)
    }

    /// Extract the ordered parameter list, dropping `self`/`cls` receivers.
    fn extract_params(&self, params_node: Node, source: &[u8]) -> Vec<Param> {
        let mut params = Vec::new();
        let mut cursor = params_node.walk();
        for child in params_node.named_children(&mut cursor) {
            let param = match child.kind() {
                "identifier" => Some(Param::new(node_text(child, source))),
                // First named child of typed_parameter is the pattern.
                "typed_parameter" => child.named_child(0).map(|n| Param {
                    name: node_text(n, source).to_string(),
                    type_hint: self
                        .child_by_field(child, "type")
                        .map(|t| node_text(t, source).to_string()),
                    default: None,
                }),
                "default_parameter" => self.child_by_field(child, "name").map(|n| Param {
                    name: node_text(n, source).to_string(),
                    type_hint: None,
                    default: self
                        .child_by_field(child, "value")
                        .map(|v| node_text(v, source).to_string()),
                }),
                "typed_default_parameter" => self.child_by_field(child, "name").map(|n| Param {
                    name: node_text(n, source).to_string(),
                    type_hint: self
                        .child_by_field(child, "type")
                        .map(|t| node_text(t, source).to_string()),
                    default: self
                        .child_by_field(child, "value")
                        .map(|v| node_text(v, source).to_string()),
                }),
                // *args / **kwargs and separators carry no testable shape.
                _ => None,
            };
            if let Some(param) = param {
                if param.name != "self" && param.name != "cls" {
                    params.push(param);
                }
            }
        }
        params
    }

    /// Collect decorator texts from an enclosing `decorated_definition`.
    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        let Some(parent) = node.parent() else {
            return Vec::new();
        };
        if parent.kind() != "decorated_definition" {
            return Vec::new();
        }
        let mut decorators = Vec::new();
        let mut cursor = parent.walk();
        for child in parent.named_children(&mut cursor) {
            if child.kind() == "decorator" {
                let text = node_text(child, source).trim_start_matches('@').trim();
                decorators.push(text.to_string());
            }
        }
        decorators
    }

    /// Detect `if <param> == <literal>: raise <Error>` guards in a body.
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
                        if let Some(error_kind) = self.find_raised_kind(consequence, source) {
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

    /// Match `<identifier> == <literal>` where the identifier is a parameter.
    fn match_literal_equality(
        &self,
        condition: Node,
        source: &[u8],
        params: &[Param],
    ) -> Option<(String, String)> {
        if condition.kind() != "comparison_operator" {
            return None;
        }
        let left = condition.named_child(0)?;
        let right = condition.named_child(1)?;
        if condition.named_child_count() != 2 {
            return None;
        }
        let mut cursor = condition.walk();
        let has_eq = condition
            .children_by_field_name("operators", &mut cursor)
            .any(|op| node_text(op, source) == "==");
        if !has_eq {
            return None;
        }
        if left.kind() != "identifier" {
            return None;
        }
        if !matches!(right.kind(), "integer" | "float" | "string" | "none" | "true" | "false") {
            return None;
        }
        let name = node_text(left, source);
        if !params.iter().any(|p| p.name == name) {
            return None;
        }
        Some((name.to_string(), node_text(right, source).to_string()))
    }

    /// Find the raised error kind in a guarded branch, if any.
    fn find_raised_kind(&self, node: Node, source: &[u8]) -> Option<String> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == "raise_statement" {
                let raised = current.named_child(0)?;
                return match raised.kind() {
                    "call" => self
                        .child_by_field(raised, "function")
                        .map(|f| node_text(f, source).to_string()),
                    "identifier" => Some(node_text(raised, source).to_string()),
                    _ => Some("Exception".to_string()),
                };
            }
            let mut cursor = current.walk();
            for child in current.named_children(&mut cursor) {
                stack.push(child);
            }
        }
        None
    }

    fn extract_function_inner(&self, node: Node, source: &[u8]) -> Option<FunctionDecl> {
        let name = node_text(self.child_by_field(node, "name")?, source).to_string();
        let params = self
            .child_by_field(node, "parameters")
            .map(|p| self.extract_params(p, source))
            .unwrap_or_default();
        let body = self.child_by_field(node, "body");
        let guards = body
            .map(|b| self.extract_guards(b, source, &params))
            .unwrap_or_default();
        let is_async = node
            .child(0)
            .map(|c| c.kind() == "async")
            .unwrap_or(false);

        // The decorated_definition wrapper owns the full span when present.
        let span_node = node
            .parent()
            .filter(|p| p.kind() == "decorated_definition")
            .unwrap_or(node);

        let decorators = self.extract_decorators(node, source);
        let is_static = decorators.iter().any(|d| d == "staticmethod");

        Some(FunctionDecl {
            is_private: name.starts_with('_'),
            is_static,
            return_type: self
                .child_by_field(node, "return_type")
                .map(|n| node_text(n, source).to_string()),
            decorators,
            is_async,
            line: span_node.start_position().row + 1,
            end_line: span_node.end_position().row + 1,
            byte_range: (span_node.start_byte(), span_node.end_byte()),
            body: body.map(|b| node_text(b, source).to_string()).unwrap_or_default(),
            guards,
            params,
            name,
        })
    }
}

impl Language for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".py", ".pyw"]
    }

    fn ts_language(&self) -> TSLanguage {
        tree_sitter_python::LANGUAGE.into()
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| TestsmithError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"(function_definition name: (identifier) @name) @function"#
    }

    fn class_query(&self) -> &'static str {
        r#"(class_definition name: (identifier) @name) @class"#
    }

    fn call_query(&self) -> &'static str {
        r#"[
            (call function: (identifier) @callee) @call
            (call function: (attribute) @callee) @call
        ]"#
    }

    fn extract_function(&self, node: Node, source: &[u8]) -> Option<FunctionDecl> {
        if node.kind() != "function_definition" {
            return None;
        }
        self.extract_function_inner(node, source)
    }

    fn extract_class(&self, node: Node, source: &[u8]) -> Option<ClassDecl> {
        if node.kind() != "class_definition" {
            return None;
        }
        let name = node_text(self.child_by_field(node, "name")?, source).to_string();

        let mut bases = Vec::new();
        if let Some(superclasses) = self.child_by_field(node, "superclasses") {
            let mut cursor = superclasses.walk();
            for child in superclasses.named_children(&mut cursor) {
                if matches!(child.kind(), "identifier" | "attribute") {
                    bases.push(node_text(child, source).to_string());
                }
            }
        }

        let mut methods = Vec::new();
        let mut constructor_params = Vec::new();
        if let Some(body) = self.child_by_field(node, "body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                let func_node = match child.kind() {
                    "function_definition" => Some(child),
                    "decorated_definition" => child
                        .child_by_field_name("definition")
                        .filter(|d| d.kind() == "function_definition"),
                    _ => None,
                };
                if let Some(func_node) = func_node {
                    if let Some(method) = self.extract_function_inner(func_node, source) {
                        if method.name == "__init__" {
                            constructor_params = method.params.clone();
                        } else {
                            methods.push(method);
                        }
                    }
                }
            }
        }

        let span_node = node
            .parent()
            .filter(|p| p.kind() == "decorated_definition")
            .unwrap_or(node);

        Some(ClassDecl {
            is_private: name.starts_with('_'),
            decorators: self.extract_decorators(node, source),
            line: span_node.start_position().row + 1,
            end_line: span_node.end_position().row + 1,
            byte_range: (span_node.start_byte(), span_node.end_byte()),
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
            match child.kind() {
                "import_statement" => {
                    let mut inner = child.walk();
                    for item in child.named_children(&mut inner) {
                        let module = match item.kind() {
                            "dotted_name" => node_text(item, source).to_string(),
                            "aliased_import" => item
                                .child_by_field_name("name")
                                .map(|n| node_text(n, source).to_string())
                                .unwrap_or_default(),
                            _ => continue,
                        };
                        imports.push(ImportDecl {
                            module,
                            names: Vec::new(),
                            line: child.start_position().row + 1,
                        });
                    }
                }
                "import_from_statement" => {
                    let module = child
                        .child_by_field_name("module_name")
                        .map(|n| node_text(n, source).to_string())
                        .unwrap_or_default();
                    let mut names = Vec::new();
                    let mut inner = child.walk();
                    for item in child.named_children(&mut inner) {
                        if item.kind() == "dotted_name" && node_text(item, source) != module {
                            names.push(node_text(item, source).to_string());
                        } else if item.kind() == "aliased_import" {
                            if let Some(n) = item.child_by_field_name("name") {
                                names.push(node_text(n, source).to_string());
                            }
                        }
                    }
                    imports.push(ImportDecl {
                        module,
                        names,
                        line: child.start_position().row + 1,
                    });
                }
                _ => {}
            }
        }
        imports
    }

    fn call_target(&self, node: Node, source: &[u8]) -> Option<String> {
        if node.kind() != "call" {
            return None;
        }
        let function = self.child_by_field(node, "function")?;
        let text = node_text(function, source);
        // `self.db.query` and `db.query` name the same dependency surface.
        Some(text.strip_prefix("self.").unwrap_or(text).to_string())
    }
}
