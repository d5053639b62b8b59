//! Route extraction from Express-style call sites.
//!
//! A route is a call `app.<verb>("<path>", handler?)` or
//! `router.<verb>("<path>", handler?)` with a literal string path.

use std::fmt;

use serde::{Deserialize, Serialize};

use tree_sitter::Node;

use crate::error::ParseError;
use crate::syntax::{SourceKind, SourceTree, code_children, for_each_node, is_optional_chain, parse_source, string_value};

/// Receiver identifiers whose method calls declare routes.
pub const ROUTE_RECEIVERS: &[&str] = &["app", "router"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Map a lowercase router method name to its verb.
    pub fn from_callee(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route declaration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub method: HttpMethod,
    /// `:`-prefixed path segments with the prefix stripped, in path order.
    pub path_params: Vec<String>,
    pub uses_request_body: bool,
    pub uses_response_body: bool,
}

impl RouteDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path_params: path_params(&path),
            path,
            method,
            uses_request_body: false,
            uses_response_body: false,
        }
    }
}

/// Path parameters of a route path, e.g. `/users/:id/posts/:postId` gives
/// `["id", "postId"]`. Duplicates are kept.
pub fn path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(str::to_string)
        .collect()
}

/// Parse a TypeScript (or plain JavaScript) source and return every route it
/// declares, in source order.
pub fn extract_routes(source: &str) -> Result<Vec<RouteDescriptor>, ParseError> {
    extract_routes_as(source, SourceKind::TypeScript)
}

/// Like [`extract_routes`], with an explicit grammar.
pub fn extract_routes_as(source: &str, kind: SourceKind) -> Result<Vec<RouteDescriptor>, ParseError> {
    let tree = parse_source(source, kind)?;
    Ok(routes_in_tree(&tree))
}

/// Collect the routes declared anywhere in an already parsed file.
pub fn routes_in_tree(tree: &SourceTree<'_>) -> Vec<RouteDescriptor> {
    let mut routes = Vec::new();
    for_each_node(tree.root(), |node| {
        if node.kind() == "call_expression"
            && let Some(route) = match_route(tree, node)
        {
            routes.push(route);
        }
    });
    routes
}

fn match_route(tree: &SourceTree<'_>, call: Node<'_>) -> Option<RouteDescriptor> {
    if is_optional_chain(call) {
        return None;
    }
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "member_expression" || is_optional_chain(callee) {
        return None;
    }
    let receiver = callee.child_by_field_name("object")?;
    if receiver.kind() != "identifier" || !ROUTE_RECEIVERS.contains(&tree.text(receiver)) {
        return None;
    }
    let property = callee.child_by_field_name("property")?;
    if property.kind() != "property_identifier" {
        return None;
    }
    let method = HttpMethod::from_callee(tree.text(property))?;

    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }
    let args = code_children(arguments);
    let path = string_value(tree, *args.first()?)?;

    let mut route = RouteDescriptor::new(method, path);
    if let Some(handler) = args.get(1).filter(|handler| is_inline_function(**handler))
        && let Some(body) = handler.child_by_field_name("body")
    {
        let usage = body_usage(tree, body);
        route.uses_request_body = usage.request_body;
        route.uses_response_body = usage.response_body;
    }
    Some(route)
}

fn is_inline_function(node: Node<'_>) -> bool {
    matches!(node.kind(), "arrow_function" | "function_expression" | "function")
}

/// Whether a handler body reads `req.body` or calls through `res.json`.
#[derive(Debug, Default, Clone, Copy)]
struct BodyUsage {
    request_body: bool,
    response_body: bool,
}

fn body_usage(tree: &SourceTree<'_>, body: Node<'_>) -> BodyUsage {
    let mut usage = BodyUsage::default();
    for_each_node(body, |node| {
        if node.kind() != "member_expression" || is_optional_chain(node) {
            return;
        }
        let (Some(object), Some(property)) = (node.child_by_field_name("object"), node.child_by_field_name("property"))
        else {
            return;
        };
        if object.kind() != "identifier" || property.kind() != "property_identifier" {
            return;
        }
        match (tree.text(object), tree.text(property)) {
            ("req", "body") => usage.request_body = true,
            ("res", "json") => usage.response_body = true,
            _ => {}
        }
    });
    usage
}
