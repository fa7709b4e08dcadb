mod cache_test;
mod cst_test;
mod script_test;

use llamascript::{Expression, Statement};

pub fn protocol(id: &str) -> Expression {
    Expression::call("protocol", vec![Expression::string(id)])
}

pub fn chain(id: &str) -> Expression {
    Expression::call("chain", vec![Expression::string(id)])
}

pub fn assign(name: &str, value: Expression) -> Statement {
    Statement::Assignment {
        name: name.to_string(),
        value: Some(value),
    }
}

pub fn plot(arguments: Vec<Expression>) -> Statement {
    Statement::Plot { arguments }
}
