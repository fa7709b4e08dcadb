//! Typed syntax tree walked by the evaluator.
//!
//! The external parser produces a loosely shaped tree (see [`crate::syntax`]);
//! it is lowered into these types before evaluation so that every operator
//! boundary can match exhaustively.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub statements: Vec<Statement>,
}

impl Script {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

// 文
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment {
        name: String,
        value: Option<Expression>,
    },
    Plot {
        arguments: Vec<Expression>,
    },
    Highlight {
        arguments: Vec<Expression>,
    },
    /// An expression statement that is not a plot call. Not evaluated.
    Expression(Expression),
    /// A statement node the lowering did not recognise, by rule name.
    Unsupported(String),
}

// 式
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Variable(String),
    Array(Vec<Expression>),
    FunctionCall {
        function: String,
        arguments: Vec<Expression>,
    },
    /// `base.a.b`, resolved left to right.
    Member {
        base: Box<Expression>,
        properties: Vec<String>,
    },
    /// One precedence tier folded left: `first op1 e1 op2 e2 ...`.
    ///
    /// Kept as a flat chain rather than nested binary nodes because only the
    /// operands in `rest` pass through the entity check before combining.
    Chain {
        first: Box<Expression>,
        rest: Vec<(BinaryOperator, Expression)>,
    },
    Not(Box<Expression>),
    Unsupported,
}

impl Expression {
    pub fn number(value: f64) -> Self {
        Expression::Literal(Literal::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn call(function: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            function: function.into(),
            arguments,
        }
    }

    pub fn member(base: Expression, properties: &[&str]) -> Self {
        Expression::Member {
            base: Box::new(base),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Expression::Chain {
            first: Box::new(left),
            rest: vec![(op, right)],
        }
    }
}

// リテラル
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

// 二項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    And,
    Or,
}
