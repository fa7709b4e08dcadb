use tracing::{debug, warn};

use super::{CstElement, CstNode, CstToken};
use crate::ast::{BinaryOperator, Expression, Literal, Script, Statement};

const UNNAMED_VARIABLE: &str = "unknown";

/// One precedence tier: the operand rule and its operator tokens, in the
/// order used when tokens carry no offsets.
struct Tier {
    operand: &'static str,
    operators: &'static [(&'static str, BinaryOperator)],
}

const LOGICAL: Tier = Tier {
    operand: "comparisonExpression",
    operators: &[("And", BinaryOperator::And), ("Or", BinaryOperator::Or)],
};

const COMPARISON: Tier = Tier {
    operand: "additiveExpression",
    operators: &[
        ("Eq", BinaryOperator::Equal),
        ("Neq", BinaryOperator::NotEqual),
        ("Gte", BinaryOperator::GreaterThanEqual),
        ("Lte", BinaryOperator::LessThanEqual),
        ("Gt", BinaryOperator::GreaterThan),
        ("Lt", BinaryOperator::LessThan),
    ],
};

const ADDITIVE: Tier = Tier {
    operand: "multiplicativeExpression",
    operators: &[
        ("Plus", BinaryOperator::Add),
        ("Minus", BinaryOperator::Subtract),
    ],
};

const MULTIPLICATIVE: Tier = Tier {
    operand: "unaryExpression",
    operators: &[
        ("Mult", BinaryOperator::Multiply),
        ("Div", BinaryOperator::Divide),
    ],
};

/// Lowers a `script` node. Never fails: shapes the interpreter does not
/// know become `Unsupported` nodes that report when evaluated.
pub fn lower_script(root: &CstNode) -> Script {
    if !root.is("script") {
        warn!(root = ?root.name, "tree root is not a script");
        return Script::default();
    }
    let statements = root
        .nodes("statement")
        .filter_map(lower_statement)
        .collect();
    Script::new(statements)
}

fn lower_statement(statement: &CstNode) -> Option<Statement> {
    let node = statement.children.values().flatten().find_map(|e| match e {
        CstElement::Node(node) if node.name.is_some() => Some(node),
        _ => None,
    })?;
    let name = node.name.as_deref().unwrap_or_default();

    let lowered = match name {
        "assignment" => Statement::Assignment {
            name: node
                .first_token("Identifier")
                .map(|t| t.image.clone())
                .unwrap_or_else(|| UNNAMED_VARIABLE.to_string()),
            value: node.first_node("expression").map(lower_expression),
        },
        "highlightStmt" => Statement::Highlight {
            arguments: lower_args(node),
        },
        "expression" => match leading_plot_call(node) {
            Some(primary) => Statement::Plot {
                arguments: lower_args(primary),
            },
            None => {
                debug!("expression statement is not a plot call");
                Statement::Expression(lower_expression(node))
            }
        },
        other => Statement::Unsupported(other.to_string()),
    };
    Some(lowered)
}

/// Follows the first child of every tier down to the primary and returns
/// it when it is a `plot` call.
fn leading_plot_call(expression: &CstNode) -> Option<&CstNode> {
    let primary = [
        "logicalExpression",
        "comparisonExpression",
        "additiveExpression",
        "multiplicativeExpression",
        "unaryExpression",
        "primary",
    ]
    .iter()
    .try_fold(expression, |node, key| node.first_node(key))?;

    let callee = primary
        .first_token("Plot")
        .or_else(|| primary.first_token("Identifier"))?;
    callee.image.eq_ignore_ascii_case("plot").then_some(primary)
}

fn lower_args(node: &CstNode) -> Vec<Expression> {
    node.first_node("args")
        .map(|args| args.nodes("expression").map(lower_expression).collect())
        .unwrap_or_default()
}

pub fn lower_expression(node: &CstNode) -> Expression {
    match node.name.as_deref() {
        Some("expression") => first_or_unsupported(node, "logicalExpression"),
        Some("logicalExpression") => lower_tier(node, &LOGICAL),
        Some("comparisonExpression") => lower_tier(node, &COMPARISON),
        Some("additiveExpression") => lower_tier(node, &ADDITIVE),
        Some("multiplicativeExpression") => lower_tier(node, &MULTIPLICATIVE),
        Some("unaryExpression") => lower_unary(node),
        _ => lower_primary(node),
    }
}

fn first_or_unsupported(node: &CstNode, key: &str) -> Expression {
    node.first_node(key)
        .map(lower_expression)
        .unwrap_or(Expression::Unsupported)
}

fn lower_tier(node: &CstNode, tier: &Tier) -> Expression {
    let mut operands = node.nodes(tier.operand).map(lower_expression);
    let Some(first) = operands.next() else {
        return Expression::Unsupported;
    };

    let operators = ordered_operators(node, tier);
    if operators.is_empty() {
        return first;
    }
    Expression::Chain {
        first: Box::new(first),
        rest: operators.into_iter().zip(operands).collect(),
    }
}

fn ordered_operators(node: &CstNode, tier: &Tier) -> Vec<BinaryOperator> {
    let mut tokens: Vec<(&CstToken, BinaryOperator)> = tier
        .operators
        .iter()
        .flat_map(|(key, op)| node.tokens(key).map(move |token| (token, *op)))
        .collect();
    if tokens.iter().all(|(token, _)| token.start_offset.is_some()) {
        tokens.sort_by_key(|(token, _)| token.start_offset);
    }
    tokens.into_iter().map(|(_, op)| op).collect()
}

fn lower_unary(node: &CstNode) -> Expression {
    if node.has("Not") {
        return Expression::Not(Box::new(first_or_unsupported(node, "unaryExpression")));
    }
    first_or_unsupported(node, "primary")
}

fn lower_primary(node: &CstNode) -> Expression {
    if node.has("LParen") && node.has("expression") && node.has("RParen") {
        return first_or_unsupported(node, "expression");
    }

    if node.has("LBracket") && node.has("RBracket") {
        let elements = node
            .first_node("arrayElements")
            .map(|elements| elements.nodes("expression").map(lower_expression).collect())
            .unwrap_or_default();
        return Expression::Array(elements);
    }

    let identifiers: Vec<&str> = node.tokens("Identifier").map(|t| t.image.as_str()).collect();

    // 関数呼び出し
    if node.has("LParen") && node.has("RParen") {
        let (function, properties) = match node.first_token("Plot") {
            Some(plot) => (plot.image.as_str(), identifiers.as_slice()),
            None => match identifiers.split_first() {
                Some((function, properties)) => (*function, properties),
                None => return Expression::Unsupported,
            },
        };
        let call = Expression::call(function, lower_args(node));
        return with_members(node, call, properties);
    }

    // 変数
    if let Some((name, properties)) = identifiers.split_first() {
        return with_members(node, Expression::variable(*name), properties);
    }

    if let Some(token) = node.first_token("NumberLiteral") {
        return match token.image.parse::<f64>() {
            Ok(value) => Expression::number(value),
            Err(_) => Expression::Unsupported,
        };
    }
    if let Some(token) = node.first_token("StringLiteral") {
        return Expression::string(strip_quotes(&token.image));
    }
    if node.has("TrueLiteral") {
        return Expression::Literal(Literal::Boolean(true));
    }
    if node.has("FalseLiteral") {
        return Expression::Literal(Literal::Boolean(false));
    }

    Expression::Unsupported
}

fn with_members(node: &CstNode, base: Expression, properties: &[&str]) -> Expression {
    if properties.is_empty() || !node.has("Dot") {
        return base;
    }
    Expression::member(base, properties)
}

fn strip_quotes(image: &str) -> &str {
    let mut chars = image.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '"' || open == '\'') => {
            chars.as_str()
        }
        _ => image,
    }
}
