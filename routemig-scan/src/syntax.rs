//! tree-sitter parsing and small node helpers.

use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{ParseError, ParseResult};

const BOM: char = '\u{feff}';

/// Grammar used to parse a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// JavaScript, including JSX.
    JavaScript,
    #[default]
    TypeScript,
}

impl SourceKind {
    /// `.ts`, `.mts` and `.cts` are TypeScript, everything else JavaScript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            _ => Self::JavaScript,
        }
    }

    pub fn language(self) -> Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

/// A parsed source file. Node text is read from `source`.
pub struct SourceTree<'src> {
    pub source: &'src str,
    pub tree: Tree,
}

impl<'src> SourceTree<'src> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &'src str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }
}

/// Parse `source` with the grammar for `kind`.
///
/// A leading byte order mark is ignored. Any error or missing node in the
/// tree fails the parse, located at the first such node.
pub fn parse_source(source: &str, kind: SourceKind) -> ParseResult<SourceTree<'_>> {
    let bom_len = if source.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let body = &source[bom_len..];

    let mut parser = Parser::new();
    parser
        .set_language(&kind.language())
        .map_err(|err| ParseError::at(0, format!("grammar unavailable: {err}")))?;
    let tree = parser
        .parse(body, None)
        .ok_or_else(|| ParseError::at(0, "parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let node = first_error(root);
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            let text = body.get(node.byte_range()).unwrap_or_default();
            match text.chars().next() {
                Some(first) => format!("unexpected `{first}`"),
                None => "unexpected end of input".to_string(),
            }
        };
        return Err(ParseError::at(node.start_byte(), message)
            .locate(body)
            .shifted(bom_len));
    }

    Ok(SourceTree { source: body, tree })
}

/// Outermost-first search for the earliest error or missing node.
fn first_error(root: Node<'_>) -> Node<'_> {
    let mut node = root;
    'descend: loop {
        if node.is_error() || node.is_missing() {
            return node;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.has_error() || child.is_missing() {
                node = child;
                continue 'descend;
            }
        }
        return node;
    }
}

/// Visit `root` and every node below it in document order.
pub fn for_each_node<'tree>(root: Node<'tree>, mut visit: impl FnMut(Node<'tree>)) {
    let mut cursor = root.walk();
    let mut depth = 0usize;
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if depth == 0 {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

/// `a?.b` and `f?.()` carry an `optional_chain` child.
pub fn is_optional_chain(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let optional = node.children(&mut cursor).any(|child| child.kind() == "optional_chain");
    optional
}

/// Named children other than comments.
pub fn code_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Cooked value of a plain `'...'` or `"..."` literal.
pub fn string_value(tree: &SourceTree<'_>, node: Node<'_>) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut value = String::new();
    let mut cursor = node.walk();
    for part in node.named_children(&mut cursor) {
        let text = tree.text(part);
        match part.kind() {
            "escape_sequence" => value.push_str(&unescape(text)),
            _ => value.push_str(text),
        }
    }
    Some(value)
}

fn unescape(sequence: &str) -> String {
    let Some(body) = sequence.strip_prefix('\\') else {
        return sequence.to_string();
    };
    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let simple = match first {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'v' => Some('\u{b}'),
        '0' if body.len() == 1 => Some('\0'),
        '\n' | '\r' | '\u{2028}' | '\u{2029}' => return String::new(),
        'x' | 'u' => None,
        other => Some(other),
    };
    if let Some(ch) = simple {
        return ch.to_string();
    }

    let hex = chars.as_str().trim_start_matches('{').trim_end_matches('}');
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map_or_else(|| sequence.to_string(), |ch| ch.to_string())
}
