//! Which sub-nodes own bytes, and how many bytes each node spans.

use super::ast::{Node, NodeKind};

/// How the declarators of a `var` statement are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaratorVisit {
    /// A statement with a single declarator is sized through its initializer
    /// directly, so `var a = ...;` reads as one symbol.
    Collapsed,
    /// Every declarator is visited on its own. Source map alignment needs
    /// this since names are mapped at the declarator.
    Each,
}

/// The children of `node` that take part in size accounting, in source order.
///
/// Identifiers that only name something (function ids, parameters, labels,
/// declarator ids, catch parameters) are not children: their bytes stay with
/// the node that declares them.
pub fn child_nodes(node: &Node, visit: DeclaratorVisit) -> Vec<&Node> {
    let mut children: Vec<&Node> = Vec::new();
    match &node.kind {
        NodeKind::BlockStatement { body } => children.extend(body),
        NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        } => {
            children.extend([&**test, &**consequent]);
            children.extend(alternate.as_deref());
        }
        NodeKind::BinaryExpression { left, right }
        | NodeKind::LogicalExpression { left, right }
        | NodeKind::AssignmentExpression { left, right } => children.extend([&**left, &**right]),
        NodeKind::MemberExpression { object, property } => {
            children.extend([&**object, &**property])
        }
        NodeKind::Property { key, value } => {
            children.extend(key.as_deref());
            children.push(value);
        }
        NodeKind::TryStatement {
            block,
            handler,
            finalizer,
        } => {
            children.push(block);
            children.extend(handler.as_deref());
            children.extend(finalizer.as_deref());
        }
        NodeKind::CatchClause { body }
        | NodeKind::FunctionDeclaration { body, .. }
        | NodeKind::FunctionExpression { body, .. }
        | NodeKind::LabeledStatement { body } => children.push(body),
        NodeKind::ThrowStatement { argument }
        | NodeKind::UnaryExpression { argument }
        | NodeKind::UpdateExpression { argument } => children.push(argument),
        NodeKind::ReturnStatement { argument } => children.extend(argument.as_deref()),
        NodeKind::CallExpression { callee, arguments }
        | NodeKind::NewExpression { callee, arguments } => {
            children.push(callee);
            children.extend(arguments);
        }
        NodeKind::VariableDeclaration { declarations } => match (visit, declarations.as_slice()) {
            (DeclaratorVisit::Collapsed, [single]) => {
                if let NodeKind::VariableDeclarator { init, .. } = &single.kind {
                    children.extend(init.as_deref());
                }
            }
            _ => children.extend(declarations),
        },
        NodeKind::VariableDeclarator { init, .. } => children.extend(init.as_deref()),
        NodeKind::ArrayExpression { elements } => children.extend(elements),
        NodeKind::ObjectExpression { properties } => children.extend(properties),
        NodeKind::ExpressionStatement { expression } => children.push(expression),
        NodeKind::SwitchStatement {
            discriminant,
            cases,
        } => {
            children.push(discriminant);
            children.extend(cases);
        }
        NodeKind::SwitchCase { test, consequent } => {
            children.extend(consequent);
            children.extend(test.as_deref());
        }
        NodeKind::SequenceExpression { expressions } => children.extend(expressions),
        NodeKind::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => children.extend([&**test, &**consequent, &**alternate]),
        NodeKind::ForStatement {
            init,
            test,
            update,
            body,
        } => {
            children.extend(init.as_deref());
            children.extend(test.as_deref());
            children.extend(update.as_deref());
            children.push(body);
        }
        NodeKind::WhileStatement { test, body } | NodeKind::DoWhileStatement { test, body } => {
            children.extend([&**test, &**body])
        }
        NodeKind::ForInStatement { left, right, body } => {
            children.extend([&**left, &**right, &**body])
        }
        NodeKind::BreakStatement
        | NodeKind::ContinueStatement
        | NodeKind::Identifier { .. }
        | NodeKind::Literal
        | NodeKind::ThisExpression
        | NodeKind::EmptyStatement
        | NodeKind::DebuggerStatement
        | NodeKind::Unsupported { .. } => {}
    }
    children
}

/// Bytes attributed to `node` including everything inside it.
///
/// Declarators of a `var a=1,b=2,c=3;` statement share the keyword, the commas
/// and the terminator with their siblings. Those bytes are handed out so that
/// the declarators together cover the whole statement: the first declarator
/// takes the leading keyword, every later one takes the comma before it and
/// the last one also takes whatever follows it up to the end of the statement.
pub fn byte_range(node: &Node, parent: Option<&Node>) -> u64 {
    let Some(statement) = parent else {
        return node.len();
    };
    let (NodeKind::VariableDeclarator { .. }, NodeKind::VariableDeclaration { declarations }) =
        (&node.kind, &statement.kind)
    else {
        return node.len();
    };
    if declarations.len() < 2 {
        return node.len();
    }
    let Some(index) = declarations.iter().position(|d| std::ptr::eq(d, node)) else {
        return node.len();
    };

    let (start, end) = if index == 0 {
        (statement.start, node.end)
    } else if index == declarations.len() - 1 {
        (node.start.saturating_sub(1), statement.end.max(node.end))
    } else {
        (node.start.saturating_sub(1), node.end)
    };
    u64::from(end.saturating_sub(start))
}

/// Bytes covered by the direct children of `node`, each measured on its own.
pub fn child_bytes(node: &Node, visit: DeclaratorVisit) -> u64 {
    child_nodes(node, visit).iter().map(|child| child.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declarator(start: u32, end: u32) -> Node {
        Node::new(
            NodeKind::VariableDeclarator {
                id: None,
                init: Some(Box::new(Node::new(NodeKind::Literal, end - 1, end))),
            },
            start,
            end,
        )
    }

    // var foo=4,bar=2,baz=3;
    fn three_declarators() -> Node {
        Node::new(
            NodeKind::VariableDeclaration {
                declarations: vec![declarator(4, 9), declarator(10, 15), declarator(16, 21)],
            },
            0,
            22,
        )
    }

    #[test]
    fn declarators_split_the_whole_statement() {
        let statement = three_declarators();
        let NodeKind::VariableDeclaration { declarations } = &statement.kind else {
            unreachable!()
        };
        let sizes: Vec<u64> = declarations
            .iter()
            .map(|d| byte_range(d, Some(&statement)))
            .collect();
        assert_eq!(sizes, vec![9, 6, 7]);
        assert_eq!(sizes.iter().sum::<u64>(), statement.len());
    }

    #[test]
    fn declarator_without_statement_parent_uses_its_span() {
        let statement = three_declarators();
        let NodeKind::VariableDeclaration { declarations } = &statement.kind else {
            unreachable!()
        };
        assert_eq!(byte_range(&declarations[1], None), 5);
    }

    #[test]
    fn single_declarator_collapses_to_initializer() {
        let statement = Node::new(
            NodeKind::VariableDeclaration {
                declarations: vec![declarator(4, 9)],
            },
            0,
            10,
        );
        let collapsed = child_nodes(&statement, DeclaratorVisit::Collapsed);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].kind, NodeKind::Literal);

        let each = child_nodes(&statement, DeclaratorVisit::Each);
        assert_eq!(each.len(), 1);
        assert_eq!(each[0].kind_name(), "VariableDeclarator");
        assert_eq!(child_bytes(&statement, DeclaratorVisit::Collapsed), 1);
        assert_eq!(child_bytes(&statement, DeclaratorVisit::Each), 5);
    }

    #[test]
    fn switch_case_lists_consequent_before_test() {
        let case = Node::new(
            NodeKind::SwitchCase {
                test: Some(Box::new(Node::new(NodeKind::Literal, 5, 6))),
                consequent: vec![Node::new(NodeKind::EmptyStatement, 7, 8)],
            },
            0,
            8,
        );
        let kinds: Vec<_> = child_nodes(&case, DeclaratorVisit::Collapsed)
            .iter()
            .map(|n| n.kind_name())
            .collect();
        assert_eq!(kinds, vec!["EmptyStatement", "Literal"]);
    }
}
