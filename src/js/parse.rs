//! Lowers the `oxc` syntax tree into [`ast`](super::ast) nodes.
//!
//! Parentheses are dropped, directive prologues become plain expression
//! statements and every construct outside the supported subset becomes
//! [`NodeKind::Unsupported`].

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentTarget, CatchClause, ComputedMemberExpression,
    Directive, Expression, ForStatementInit, ForStatementLeft, Function, ObjectPropertyKind,
    PropertyKey, SimpleAssignmentTarget, Statement, StaticMemberExpression, SwitchCase,
    VariableDeclaration,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

use super::ast::{Identifier, Node, NodeKind, Program};
use crate::error::{Error, Result};

/// Parses a script and rejects it if it uses syntax sizing cannot account for.
pub fn parse(source_text: &str) -> Result<Program> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source_text, SourceType::cjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|error| error.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Parse(message));
    }

    let mut body = Vec::with_capacity(ret.program.directives.len() + ret.program.body.len());
    body.extend(ret.program.directives.iter().map(lower_directive));
    body.extend(ret.program.body.iter().map(lower_statement));
    let program = Program { body };

    if let Some((kind, offset)) = program.first_unsupported() {
        return Err(Error::UnsupportedNode { kind, offset });
    }
    Ok(program)
}

fn node(span: Span, kind: NodeKind) -> Node {
    Node::new(kind, span.start, span.end)
}

fn boxed(node: Node) -> Box<Node> {
    Box::new(node)
}

fn unsupported(span: Span, kind: &'static str) -> Node {
    node(span, NodeKind::Unsupported { kind })
}

fn identifier(span: Span, name: &str) -> Node {
    node(
        span,
        NodeKind::Identifier {
            name: name.to_string(),
        },
    )
}

fn lower_directive(directive: &Directive<'_>) -> Node {
    node(
        directive.span,
        NodeKind::ExpressionStatement {
            expression: boxed(node(directive.expression.span, NodeKind::Literal)),
        },
    )
}

fn block(span: Span, directives: &[Directive<'_>], statements: &[Statement<'_>]) -> Node {
    let body = directives
        .iter()
        .map(lower_directive)
        .chain(statements.iter().map(lower_statement))
        .collect();
    node(span, NodeKind::BlockStatement { body })
}

fn lower_statement(statement: &Statement<'_>) -> Node {
    match statement {
        Statement::BlockStatement(it) => block(it.span, &[], &it.body),
        Statement::EmptyStatement(it) => node(it.span, NodeKind::EmptyStatement),
        Statement::DebuggerStatement(it) => node(it.span, NodeKind::DebuggerStatement),
        Statement::BreakStatement(it) => node(it.span, NodeKind::BreakStatement),
        Statement::ContinueStatement(it) => node(it.span, NodeKind::ContinueStatement),
        Statement::ExpressionStatement(it) => node(
            it.span,
            NodeKind::ExpressionStatement {
                expression: boxed(lower_expression(&it.expression)),
            },
        ),
        Statement::IfStatement(it) => node(
            it.span,
            NodeKind::IfStatement {
                test: boxed(lower_expression(&it.test)),
                consequent: boxed(lower_statement(&it.consequent)),
                alternate: it.alternate.as_ref().map(|s| boxed(lower_statement(s))),
            },
        ),
        Statement::LabeledStatement(it) => node(
            it.span,
            NodeKind::LabeledStatement {
                body: boxed(lower_statement(&it.body)),
            },
        ),
        Statement::ReturnStatement(it) => node(
            it.span,
            NodeKind::ReturnStatement {
                argument: it.argument.as_ref().map(|e| boxed(lower_expression(e))),
            },
        ),
        Statement::ThrowStatement(it) => node(
            it.span,
            NodeKind::ThrowStatement {
                argument: boxed(lower_expression(&it.argument)),
            },
        ),
        Statement::TryStatement(it) => node(
            it.span,
            NodeKind::TryStatement {
                block: boxed(block(it.block.span, &[], &it.block.body)),
                handler: it.handler.as_ref().map(|h| boxed(lower_catch_clause(h))),
                finalizer: it
                    .finalizer
                    .as_ref()
                    .map(|f| boxed(block(f.span, &[], &f.body))),
            },
        ),
        Statement::SwitchStatement(it) => node(
            it.span,
            NodeKind::SwitchStatement {
                discriminant: boxed(lower_expression(&it.discriminant)),
                cases: it.cases.iter().map(lower_switch_case).collect(),
            },
        ),
        Statement::ForStatement(it) => node(
            it.span,
            NodeKind::ForStatement {
                init: it.init.as_ref().map(|i| boxed(lower_for_init(i))),
                test: it.test.as_ref().map(|e| boxed(lower_expression(e))),
                update: it.update.as_ref().map(|e| boxed(lower_expression(e))),
                body: boxed(lower_statement(&it.body)),
            },
        ),
        Statement::ForInStatement(it) => node(
            it.span,
            NodeKind::ForInStatement {
                left: boxed(lower_for_left(&it.left)),
                right: boxed(lower_expression(&it.right)),
                body: boxed(lower_statement(&it.body)),
            },
        ),
        Statement::WhileStatement(it) => node(
            it.span,
            NodeKind::WhileStatement {
                test: boxed(lower_expression(&it.test)),
                body: boxed(lower_statement(&it.body)),
            },
        ),
        Statement::DoWhileStatement(it) => node(
            it.span,
            NodeKind::DoWhileStatement {
                test: boxed(lower_expression(&it.test)),
                body: boxed(lower_statement(&it.body)),
            },
        ),
        Statement::VariableDeclaration(it) => lower_variable_declaration(it),
        Statement::FunctionDeclaration(it) => lower_function(it, true),
        other => unsupported(other.span(), statement_kind(other)),
    }
}

fn statement_kind(statement: &Statement<'_>) -> &'static str {
    match statement {
        Statement::ForOfStatement(_) => "ForOfStatement",
        Statement::WithStatement(_) => "WithStatement",
        Statement::ClassDeclaration(_) => "ClassDeclaration",
        Statement::ImportDeclaration(_) => "ImportDeclaration",
        Statement::ExportNamedDeclaration(_)
        | Statement::ExportDefaultDeclaration(_)
        | Statement::ExportAllDeclaration(_) => "ExportDeclaration",
        _ => "Statement",
    }
}

fn lower_catch_clause(clause: &CatchClause<'_>) -> Node {
    node(
        clause.span,
        NodeKind::CatchClause {
            body: boxed(block(clause.body.span, &[], &clause.body.body)),
        },
    )
}

fn lower_switch_case(case: &SwitchCase<'_>) -> Node {
    node(
        case.span,
        NodeKind::SwitchCase {
            test: case.test.as_ref().map(|e| boxed(lower_expression(e))),
            consequent: case.consequent.iter().map(lower_statement).collect(),
        },
    )
}

fn lower_for_init(init: &ForStatementInit<'_>) -> Node {
    match init {
        ForStatementInit::VariableDeclaration(decl) => lower_variable_declaration(decl),
        _ => match init.as_expression() {
            Some(expression) => lower_expression(expression),
            None => unsupported(init.span(), "ForStatementInit"),
        },
    }
}

fn lower_for_left(left: &ForStatementLeft<'_>) -> Node {
    match left {
        ForStatementLeft::VariableDeclaration(decl) => lower_variable_declaration(decl),
        ForStatementLeft::AssignmentTargetIdentifier(id) => identifier(id.span, &id.name),
        ForStatementLeft::StaticMemberExpression(member) => lower_static_member(member),
        ForStatementLeft::ComputedMemberExpression(member) => lower_computed_member(member),
        other => unsupported(other.span(), "AssignmentPattern"),
    }
}

fn lower_variable_declaration(decl: &VariableDeclaration<'_>) -> Node {
    let declarations = decl
        .declarations
        .iter()
        .map(|declarator| {
            let id = declarator.id.get_binding_identifier().map(|id| Identifier {
                name: id.name.to_string(),
                start: id.span.start,
                end: id.span.end,
            });
            node(
                declarator.span,
                NodeKind::VariableDeclarator {
                    id,
                    init: declarator.init.as_ref().map(|e| boxed(lower_expression(e))),
                },
            )
        })
        .collect();
    node(decl.span, NodeKind::VariableDeclaration { declarations })
}

fn lower_function(function: &Function<'_>, declaration: bool) -> Node {
    let Some(body) = function.body.as_ref() else {
        return unsupported(function.span, "FunctionWithoutBody");
    };
    let id = function.id.as_ref().map(|id| Identifier {
        name: id.name.to_string(),
        start: id.span.start,
        end: id.span.end,
    });
    let body = boxed(block(body.span, &body.directives, &body.statements));
    let kind = if declaration {
        NodeKind::FunctionDeclaration { id, body }
    } else {
        NodeKind::FunctionExpression { id, body }
    };
    node(function.span, kind)
}

fn lower_static_member(member: &StaticMemberExpression<'_>) -> Node {
    node(
        member.span,
        NodeKind::MemberExpression {
            object: boxed(lower_expression(&member.object)),
            property: boxed(identifier(member.property.span, &member.property.name)),
        },
    )
}

fn lower_computed_member(member: &ComputedMemberExpression<'_>) -> Node {
    node(
        member.span,
        NodeKind::MemberExpression {
            object: boxed(lower_expression(&member.object)),
            property: boxed(lower_expression(&member.expression)),
        },
    )
}

fn lower_assignment_target(target: &AssignmentTarget<'_>) -> Node {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(id) => identifier(id.span, &id.name),
        AssignmentTarget::StaticMemberExpression(member) => lower_static_member(member),
        AssignmentTarget::ComputedMemberExpression(member) => lower_computed_member(member),
        other => unsupported(other.span(), "AssignmentPattern"),
    }
}

fn lower_simple_target(target: &SimpleAssignmentTarget<'_>) -> Node {
    match target {
        SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => identifier(id.span, &id.name),
        SimpleAssignmentTarget::StaticMemberExpression(member) => lower_static_member(member),
        SimpleAssignmentTarget::ComputedMemberExpression(member) => lower_computed_member(member),
        other => unsupported(other.span(), "SimpleAssignmentTarget"),
    }
}

fn lower_arguments(arguments: &[Argument<'_>]) -> Vec<Node> {
    arguments
        .iter()
        .map(|argument| match argument.as_expression() {
            Some(expression) => lower_expression(expression),
            None => unsupported(argument.span(), "SpreadElement"),
        })
        .collect()
}

fn lower_property_key(key: &PropertyKey<'_>) -> Node {
    match key {
        PropertyKey::StaticIdentifier(id) => identifier(id.span, &id.name),
        _ => match key.as_expression() {
            Some(expression) => lower_expression(expression),
            None => unsupported(key.span(), "PrivateIdentifier"),
        },
    }
}

fn lower_property(property: &ObjectPropertyKind<'_>) -> Node {
    match property {
        ObjectPropertyKind::ObjectProperty(it) => node(
            it.span,
            NodeKind::Property {
                key: (!it.shorthand).then(|| boxed(lower_property_key(&it.key))),
                value: boxed(lower_expression(&it.value)),
            },
        ),
        ObjectPropertyKind::SpreadProperty(it) => unsupported(it.span, "SpreadElement"),
    }
}

fn lower_expression(expression: &Expression<'_>) -> Node {
    match expression {
        Expression::BooleanLiteral(it) => node(it.span, NodeKind::Literal),
        Expression::NullLiteral(it) => node(it.span, NodeKind::Literal),
        Expression::NumericLiteral(it) => node(it.span, NodeKind::Literal),
        Expression::BigIntLiteral(it) => node(it.span, NodeKind::Literal),
        Expression::RegExpLiteral(it) => node(it.span, NodeKind::Literal),
        Expression::StringLiteral(it) => node(it.span, NodeKind::Literal),
        Expression::Identifier(it) => identifier(it.span, &it.name),
        Expression::ThisExpression(it) => node(it.span, NodeKind::ThisExpression),
        Expression::ParenthesizedExpression(it) => lower_expression(&it.expression),
        Expression::FunctionExpression(it) => lower_function(it, false),
        Expression::ArrayExpression(it) => {
            let elements = it
                .elements
                .iter()
                .filter_map(|element| match element {
                    ArrayExpressionElement::Elision(_) => None,
                    ArrayExpressionElement::SpreadElement(spread) => {
                        Some(unsupported(spread.span, "SpreadElement"))
                    }
                    _ => element.as_expression().map(lower_expression),
                })
                .collect();
            node(it.span, NodeKind::ArrayExpression { elements })
        }
        Expression::ObjectExpression(it) => node(
            it.span,
            NodeKind::ObjectExpression {
                properties: it.properties.iter().map(lower_property).collect(),
            },
        ),
        Expression::AssignmentExpression(it) => node(
            it.span,
            NodeKind::AssignmentExpression {
                left: boxed(lower_assignment_target(&it.left)),
                right: boxed(lower_expression(&it.right)),
            },
        ),
        Expression::BinaryExpression(it) => node(
            it.span,
            NodeKind::BinaryExpression {
                left: boxed(lower_expression(&it.left)),
                right: boxed(lower_expression(&it.right)),
            },
        ),
        Expression::LogicalExpression(it) => node(
            it.span,
            NodeKind::LogicalExpression {
                left: boxed(lower_expression(&it.left)),
                right: boxed(lower_expression(&it.right)),
            },
        ),
        Expression::UnaryExpression(it) => node(
            it.span,
            NodeKind::UnaryExpression {
                argument: boxed(lower_expression(&it.argument)),
            },
        ),
        Expression::UpdateExpression(it) => node(
            it.span,
            NodeKind::UpdateExpression {
                argument: boxed(lower_simple_target(&it.argument)),
            },
        ),
        Expression::CallExpression(it) => node(
            it.span,
            NodeKind::CallExpression {
                callee: boxed(lower_expression(&it.callee)),
                arguments: lower_arguments(&it.arguments),
            },
        ),
        Expression::NewExpression(it) => node(
            it.span,
            NodeKind::NewExpression {
                callee: boxed(lower_expression(&it.callee)),
                arguments: lower_arguments(&it.arguments),
            },
        ),
        Expression::ConditionalExpression(it) => node(
            it.span,
            NodeKind::ConditionalExpression {
                test: boxed(lower_expression(&it.test)),
                consequent: boxed(lower_expression(&it.consequent)),
                alternate: boxed(lower_expression(&it.alternate)),
            },
        ),
        Expression::SequenceExpression(it) => node(
            it.span,
            NodeKind::SequenceExpression {
                expressions: it.expressions.iter().map(lower_expression).collect(),
            },
        ),
        Expression::StaticMemberExpression(it) => lower_static_member(it),
        Expression::ComputedMemberExpression(it) => lower_computed_member(it),
        other => unsupported(other.span(), expression_kind(other)),
    }
}

fn expression_kind(expression: &Expression<'_>) -> &'static str {
    match expression {
        Expression::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
        Expression::ClassExpression(_) => "ClassExpression",
        Expression::TemplateLiteral(_) => "TemplateLiteral",
        Expression::TaggedTemplateExpression(_) => "TaggedTemplateExpression",
        Expression::AwaitExpression(_) => "AwaitExpression",
        Expression::YieldExpression(_) => "YieldExpression",
        Expression::ChainExpression(_) => "ChainExpression",
        Expression::MetaProperty(_) => "MetaProperty",
        Expression::Super(_) => "Super",
        Expression::ImportExpression(_) => "ImportExpression",
        Expression::PrivateFieldExpression(_) => "PrivateFieldExpression",
        _ => "Expression",
    }
}
