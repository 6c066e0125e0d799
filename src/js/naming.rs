//! Heuristics that give syntax tree nodes human meaningful names and decide
//! which nodes are worth splitting up.

use super::ast::{Node, NodeKind};
use super::children::{child_nodes, DeclaratorVisit};
use crate::record::SymbolType;

/// A name found directly on a node, together with where the naming
/// identifier sits so it can be told apart from the same text elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRef<'n> {
    pub name: &'n str,
    pub start: u32,
}

/// Result of searching a subtree for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming<'n> {
    Name { name: &'n str, kind: SymbolType },
    NoName,
    /// More than one descendant could name the node. This never names the
    /// node, but unlike `NoName` it leaves the node free to be expanded.
    Ambiguous,
}

/// The name a node carries by itself. The first matching rule wins.
pub fn direct_name(node: &Node) -> Option<NameRef<'_>> {
    match &node.kind {
        NodeKind::ExpressionStatement { expression } => match &expression.kind {
            NodeKind::AssignmentExpression { left, .. } => identifier_ref(left),
            _ => None,
        },
        NodeKind::Property { key, value } => key
            .as_deref()
            .and_then(identifier_ref)
            .or_else(|| identifier_ref(value)),
        NodeKind::FunctionDeclaration { id, .. }
        | NodeKind::FunctionExpression { id, .. }
        | NodeKind::VariableDeclarator { id, .. } => id.as_ref().map(|id| NameRef {
            name: &id.name,
            start: id.start,
        }),
        NodeKind::VariableDeclaration { declarations } => match declarations.as_slice() {
            [single] => direct_name(single),
            _ => None,
        },
        _ => None,
    }
}

fn identifier_ref(node: &Node) -> Option<NameRef<'_>> {
    node.identifier_name().map(|name| NameRef {
        name,
        start: node.start,
    })
}

/// The name used when mapping minified names back through a source map.
/// Unlike [`direct_name`] this never looks at a property value or through a
/// single declarator statement.
pub fn exact_name(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::ExpressionStatement { expression } => match &expression.kind {
            NodeKind::AssignmentExpression { left, .. } => left.identifier_name(),
            _ => None,
        },
        NodeKind::Property { key, .. } => key.as_deref().and_then(Node::identifier_name),
        NodeKind::FunctionDeclaration { id, .. }
        | NodeKind::FunctionExpression { id, .. }
        | NodeKind::VariableDeclarator { id, .. } => id.as_ref().map(|id| id.name.as_str()),
        _ => None,
    }
}

pub fn node_type(node: &Node) -> SymbolType {
    let node = match &node.kind {
        NodeKind::Property { value, .. } => &**value,
        _ => node,
    };
    match node.kind {
        NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. } => {
            SymbolType::Function
        }
        NodeKind::VariableDeclaration { .. } | NodeKind::VariableDeclarator { .. } => {
            SymbolType::Var
        }
        _ => SymbolType::Code,
    }
}

/// Looks through the children of a node for exactly one name it could
/// borrow. The search stops with no name at an anonymous function or call,
/// since whatever lives behind it is not a name of the node itself.
pub fn find_unique_name<'n>(children: &[&'n Node], visit: DeclaratorVisit) -> Naming<'n> {
    let mut found: Option<(&'n str, SymbolType)> = None;
    for &child in children {
        let candidate = match direct_name(child) {
            Some(name_ref) => Some((name_ref.name, node_type(child))),
            None if child.is_function() || matches!(child.kind, NodeKind::CallExpression { .. }) => {
                return Naming::NoName;
            }
            None => match find_unique_name(&child_nodes(child, visit), visit) {
                Naming::Name { name, kind } => Some((name, kind)),
                Naming::NoName => None,
                Naming::Ambiguous => return Naming::Ambiguous,
            },
        };
        if let Some(candidate) = candidate {
            if found.is_some() {
                return Naming::Ambiguous;
            }
            found = Some(candidate);
        }
    }
    match found {
        Some((name, kind)) => Naming::Name { name, kind },
        None => Naming::NoName,
    }
}

/// Whether anything below `nodes` could carry a name of its own. `except` is
/// the naming identifier of the parent, which does not count.
pub fn has_nameable_descendant(nodes: &[&Node], except: Option<u32>, visit: DeclaratorVisit) -> bool {
    nodes.iter().any(|node| {
        if direct_name(node).is_some_and(|name_ref| Some(name_ref.start) != except) {
            return true;
        }
        let children = child_nodes(node, visit);
        if find_unique_name(&children, visit) != Naming::NoName {
            return true;
        }
        has_nameable_descendant(&children, except, visit)
    })
}

/// Nodes that only ever act as containers: they are always split into their
/// children and never become a named leaf themselves.
pub fn is_always_expanded(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::ObjectExpression { .. }
            | NodeKind::FunctionExpression { .. }
            | NodeKind::CallExpression { .. }
            | NodeKind::BlockStatement { .. }
            | NodeKind::MemberExpression { .. }
            | NodeKind::ExpressionStatement { .. }
    )
}

/// `.` qualifies the members of an object literal, `/` everything nested in
/// a function or module scope.
pub fn delimiter(node: &Node, children: &[&Node]) -> char {
    let object_like = node.is_object_expression()
        || matches!(children, [only] if only.is_object_expression());
    if object_like {
        '.'
    } else {
        '/'
    }
}

/// Prefix for the children of an expanded node. Unnamed nodes do not add a
/// level of qualification.
pub fn child_prefix(parent_prefix: &str, name: Option<&str>, node: &Node, children: &[&Node]) -> String {
    match name {
        Some(name) => format!("{parent_prefix}{name}{}", delimiter(node, children)),
        None => parent_prefix.to_string(),
    }
}

/// Splits a qualified prefix such as `WebAssembly.Instance/exports/` back
/// into its segments.
pub fn split_prefix(prefix: &str) -> Vec<&str> {
    prefix
        .split(['.', '/'])
        .filter(|segment| !segment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::ast::Identifier;

    fn ident(name: &str, start: u32) -> Node {
        Node::new(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            start,
            start + name.len() as u32,
        )
    }

    fn declarator(name: &str, start: u32) -> Node {
        Node::new(
            NodeKind::VariableDeclarator {
                id: Some(Identifier {
                    name: name.to_string(),
                    start,
                    end: start + name.len() as u32,
                }),
                init: None,
            },
            start,
            start + name.len() as u32,
        )
    }

    fn anonymous_function(start: u32) -> Node {
        Node::new(
            NodeKind::FunctionExpression {
                id: None,
                body: Box::new(Node::new(NodeKind::BlockStatement { body: vec![] }, start + 10, start + 12)),
            },
            start,
            start + 12,
        )
    }

    #[test]
    fn property_prefers_identifier_key() {
        let property = Node::new(
            NodeKind::Property {
                key: Some(Box::new(ident("bar", 0))),
                value: Box::new(ident("baz", 5)),
            },
            0,
            8,
        );
        assert_eq!(direct_name(&property).map(|n| n.name), Some("bar"));

        let literal_key = Node::new(
            NodeKind::Property {
                key: Some(Box::new(Node::new(NodeKind::Literal, 0, 5))),
                value: Box::new(ident("baz", 6)),
            },
            0,
            9,
        );
        assert_eq!(direct_name(&literal_key).map(|n| n.name), Some("baz"));
        assert_eq!(exact_name(&literal_key), None);
    }

    #[test]
    fn unique_ambiguous_and_missing_names() {
        let a = declarator("a", 0);
        let b = declarator("b", 4);
        let literal = Node::new(NodeKind::Literal, 8, 9);

        assert_eq!(
            find_unique_name(&[&a, &literal], DeclaratorVisit::Collapsed),
            Naming::Name {
                name: "a",
                kind: SymbolType::Var
            }
        );
        assert_eq!(
            find_unique_name(&[&a, &b], DeclaratorVisit::Collapsed),
            Naming::Ambiguous
        );
        assert_eq!(
            find_unique_name(&[&literal], DeclaratorVisit::Collapsed),
            Naming::NoName
        );
    }

    #[test]
    fn anonymous_function_stops_the_search() {
        let a = declarator("a", 0);
        let function = anonymous_function(4);
        assert_eq!(
            find_unique_name(&[&a, &function], DeclaratorVisit::Collapsed),
            Naming::NoName
        );
    }

    #[test]
    fn parent_name_does_not_count_as_descendant() {
        let a = declarator("a", 4);
        assert!(!has_nameable_descendant(&[&a], Some(4), DeclaratorVisit::Each));
        assert!(has_nameable_descendant(&[&a], None, DeclaratorVisit::Each));
    }

    #[test]
    fn object_literals_use_dot() {
        let object = Node::new(NodeKind::ObjectExpression { properties: vec![] }, 10, 12);
        let statement = Node::new(
            NodeKind::VariableDeclaration {
                declarations: vec![],
            },
            0,
            13,
        );
        assert_eq!(child_prefix("", Some("foo"), &statement, &[&object]), "foo.");
        assert_eq!(child_prefix("a/", Some("foo"), &statement, &[]), "a/foo/");
        assert_eq!(child_prefix("a/", None, &statement, &[&object]), "a/");
    }

    #[test]
    fn prefixes_split_on_both_delimiters() {
        assert_eq!(
            split_prefix("WebAssembly.Instance/exports/"),
            vec!["WebAssembly", "Instance", "exports"]
        );
        assert!(split_prefix("").is_empty());
    }
}
