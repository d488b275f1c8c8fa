//! Java front end: turns source text into [`MethodFragment`]s with tree-sitter.
//!
//! Only methods declared directly in a named class body are collected;
//! constructors, interface methods without a body, and anonymous-class
//! methods are skipped. Inside a body, every expression statement headed by
//! a method invocation becomes a [`BodyNode::Call`], at any depth.

use tree_sitter::{Node, Parser};
use tracing::warn;

use crate::errors::{LogEvoError, LogEvoResult};
use crate::models::{Argument, BodyNode, CallExpr, MethodFragment, Operand};

/// Reusable Java method parser.
pub struct JavaMethodParser {
    parser: Parser,
}

impl JavaMethodParser {
    pub fn new() -> LogEvoResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| LogEvoError::Parse(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse `source` and return its methods in document order.
    ///
    /// Syntax errors are tolerated: whatever tree-sitter recovered is used.
    pub fn parse_methods(&mut self, source: &str) -> LogEvoResult<Vec<MethodFragment>> {
        let tree = self
            .parser
            .parse(source.as_bytes(), None)
            .ok_or_else(|| LogEvoError::Parse("tree-sitter returned no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            warn!("Java source contains syntax errors; using recovered tree");
        }

        let mut methods = Vec::new();
        collect_methods(root, source.as_bytes(), &mut methods);
        Ok(methods)
    }
}

/// One-shot convenience around [`JavaMethodParser`].
pub fn parse_java_methods(source: &str) -> LogEvoResult<Vec<MethodFragment>> {
    JavaMethodParser::new()?.parse_methods(source)
}

// ---------------------------------------------------------------------------
// Tree walking
// ---------------------------------------------------------------------------

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .collect()
}

fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

fn in_named_class_body(node: Node<'_>) -> bool {
    node.parent()
        .filter(|p| p.kind() == "class_body")
        .and_then(|p| p.parent())
        .is_some_and(|gp| gp.kind() == "class_declaration")
}

fn collect_methods(node: Node<'_>, source: &[u8], out: &mut Vec<MethodFragment>) {
    if node.kind() == "method_declaration" && in_named_class_body(node) {
        if let Some(method) = method_fragment(node, source) {
            out.push(method);
        }
    }
    for child in named_children(node) {
        collect_methods(child, source, out);
    }
}

fn method_fragment(node: Node<'_>, source: &[u8]) -> Option<MethodFragment> {
    let body = node.child_by_field_name("body")?;
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    let parameter_types = node
        .child_by_field_name("parameters")
        .map(|params| parameter_types(params, source))
        .unwrap_or_default();

    Some(MethodFragment::new(
        name,
        parameter_types,
        node_text(node, source),
        node_text(body, source),
        body_nodes(body, source),
    ))
}

fn parameter_types(params: Node<'_>, source: &[u8]) -> Vec<String> {
    let mut types = Vec::new();
    for param in named_children(params) {
        match param.kind() {
            "formal_parameter" => {
                if let Some(ty) = param.child_by_field_name("type") {
                    types.push(strip_whitespace(node_text(ty, source)));
                }
            }
            "spread_parameter" => {
                let ty = named_children(param).into_iter().find(|c| {
                    !matches!(c.kind(), "modifiers" | "variable_declarator") && !is_comment(*c)
                });
                if let Some(ty) = ty {
                    types.push(format!("{}...", strip_whitespace(node_text(ty, source))));
                }
            }
            _ => {}
        }
    }
    types
}

fn body_nodes(node: Node<'_>, source: &[u8]) -> Vec<BodyNode> {
    let mut out = Vec::new();
    for child in named_children(node) {
        if is_comment(child) {
            continue;
        }
        if child.kind() == "expression_statement" {
            if let Some(head) = child.named_child(0) {
                if head.kind() == "method_invocation" {
                    out.push(BodyNode::Call(call_expr(head, source)));
                }
            }
        }
        // Lambdas and anonymous classes inside the statement hold statements too.
        let nested = body_nodes(child, source);
        if !nested.is_empty() {
            out.push(BodyNode::Block(nested));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Call expressions
// ---------------------------------------------------------------------------

fn call_expr(node: Node<'_>, source: &[u8]) -> CallExpr {
    let method = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
        .unwrap_or("");
    let name = match node.child_by_field_name("object") {
        Some(object) => format!("{}.{}", strip_whitespace(node_text(object, source)), method),
        None => method.to_string(),
    };
    let arguments = node
        .child_by_field_name("arguments")
        .map(|args| {
            named_children(args)
                .into_iter()
                .filter(|a| !is_comment(*a))
                .map(|a| Argument::new(node_text(a, source), operands(a, source)))
                .collect()
        })
        .unwrap_or_default();

    CallExpr::new(name, node_text(node, source), arguments)
}

fn operands(node: Node<'_>, source: &[u8]) -> Vec<Operand> {
    match node.kind() {
        "binary_expression" => {
            let mut out = Vec::new();
            if let Some(left) = node.child_by_field_name("left") {
                out.extend(operands(left, source));
            }
            if let Some(right) = node.child_by_field_name("right") {
                out.extend(operands(right, source));
            }
            out
        }
        "parenthesized_expression" => named_children(node)
            .into_iter()
            .filter(|c| !is_comment(*c))
            .flat_map(|c| operands(c, source))
            .collect(),
        "string_literal" | "text_block" | "character_literal" => {
            vec![Operand::Text(node_text(node, source).to_string())]
        }
        "identifier" | "field_access" | "array_access" | "this" => {
            vec![Operand::Var(strip_whitespace(node_text(node, source)))]
        }
        "method_invocation" => vec![Operand::Call(call_expr(node, source))],
        _ => vec![Operand::Other(node_text(node, source).to_string())],
    }
}
