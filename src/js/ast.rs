//! The subset of the ECMAScript syntax tree that size accounting understands.
//!
//! Only the fields that own bytes worth attributing are kept. Anything the
//! parser produces outside this subset is lowered to [`NodeKind::Unsupported`]
//! and rejected before sizing starts.

use super::children::{child_nodes, DeclaratorVisit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub body: Vec<Node>,
}

impl Program {
    /// The first node, in source order, that sizing cannot handle.
    pub fn first_unsupported(&self) -> Option<(&'static str, u32)> {
        self.body.iter().find_map(Node::first_unsupported)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    BlockStatement {
        body: Vec<Node>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    BinaryExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
    },
    /// `key` is absent for shorthand properties, whose key and value share
    /// the same bytes.
    Property {
        key: Option<Box<Node>>,
        value: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        body: Box<Node>,
    },
    FunctionDeclaration {
        id: Option<Identifier>,
        body: Box<Node>,
    },
    FunctionExpression {
        id: Option<Identifier>,
        body: Box<Node>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    ReturnStatement {
        argument: Option<Box<Node>>,
    },
    UnaryExpression {
        argument: Box<Node>,
    },
    UpdateExpression {
        argument: Box<Node>,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    VariableDeclaration {
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Option<Identifier>,
        init: Option<Box<Node>>,
    },
    ArrayExpression {
        elements: Vec<Node>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    BreakStatement,
    ContinueStatement,
    LabeledStatement {
        body: Box<Node>,
    },
    SwitchStatement {
        discriminant: Box<Node>,
        cases: Vec<Node>,
    },
    SwitchCase {
        test: Option<Box<Node>>,
        consequent: Vec<Node>,
    },
    SequenceExpression {
        expressions: Vec<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    ForInStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    Identifier {
        name: String,
    },
    Literal,
    ThisExpression,
    EmptyStatement,
    DebuggerStatement,
    Unsupported {
        kind: &'static str,
    },
}

impl Node {
    pub fn new(kind: NodeKind, start: u32, end: u32) -> Self {
        Self { kind, start, end }
    }

    pub fn len(&self) -> u64 {
        u64::from(self.end.saturating_sub(self.start))
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::FunctionExpression { .. } => "FunctionExpression",
            NodeKind::ThrowStatement { .. } => "ThrowStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::BreakStatement => "BreakStatement",
            NodeKind::ContinueStatement => "ContinueStatement",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal => "Literal",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::Unsupported { kind } => *kind,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. }
        )
    }

    pub fn is_object_expression(&self) -> bool {
        matches!(self.kind, NodeKind::ObjectExpression { .. })
    }

    /// Name of a plain identifier node.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    fn first_unsupported(&self) -> Option<(&'static str, u32)> {
        if let NodeKind::Unsupported { kind } = self.kind {
            return Some((kind, self.start));
        }
        child_nodes(self, DeclaratorVisit::Each)
            .into_iter()
            .find_map(Node::first_unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_unsupported_node() {
        let program = Program {
            body: vec![Node::new(
                NodeKind::ExpressionStatement {
                    expression: Box::new(Node::new(
                        NodeKind::SequenceExpression {
                            expressions: vec![
                                Node::new(NodeKind::Literal, 0, 1),
                                Node::new(
                                    NodeKind::Unsupported {
                                        kind: "ArrowFunctionExpression",
                                    },
                                    2,
                                    9,
                                ),
                            ],
                        },
                        0,
                        9,
                    )),
                },
                0,
                10,
            )],
        };
        assert_eq!(
            program.first_unsupported(),
            Some(("ArrowFunctionExpression", 2))
        );
    }
}
