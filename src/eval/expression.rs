use std::str::FromStr;
use std::sync::Arc;

use async_recursion::async_recursion;
use futures::future::join_all;

use super::algebra;
use super::context::EvaluationContext;
use super::entity::resolve_entity;
use super::functions::Builtin;
use super::property::evaluate_property;
use super::value::{EntityKind, Scalar, Value};
use crate::ast::{BinaryOperator, Expression, Literal};
use crate::eval::evaluator::{EvalError, EvalResult};

pub struct ExpressionEvaluator;

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    #[async_recursion]
    pub async fn eval_expression(
        &self,
        expr: &Expression,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(Self::eval_literal(lit)),
            Expression::Variable(name) => self.eval_variable(name, &context),
            Expression::Array(items) => self.eval_array(items, context).await,
            Expression::FunctionCall {
                function,
                arguments,
            } => self.eval_function_call(function, arguments, context).await,
            Expression::Member { base, properties } => {
                self.eval_member(base, properties, context).await
            }
            Expression::Chain { first, rest } => self.eval_chain(first, rest, context).await,
            Expression::Not(operand) => {
                let value = self.eval_expression(operand, context.clone()).await;
                let value = context.settle(value);
                Ok(Value::Series(algebra::not(value.as_ref(), context.now())))
            }
            Expression::Unsupported => Err(EvalError::UnsupportedExpression),
        }
    }

    /// Evaluates call arguments. Failures are recorded and leave `None` in
    /// their slot; the result always has one entry per argument.
    pub async fn eval_arguments(
        &self,
        arguments: &[Expression],
        context: Arc<EvaluationContext>,
    ) -> Vec<Option<Value>> {
        let results = if context.config().evaluate_arguments_concurrently {
            join_all(
                arguments
                    .iter()
                    .map(|arg| self.eval_expression(arg, context.clone())),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(arguments.len());
            for arg in arguments {
                results.push(self.eval_expression(arg, context.clone()).await);
            }
            results
        };
        results
            .into_iter()
            .map(|result| context.settle(result))
            .collect()
    }

    /// Rejects an entity handle used where a value is required.
    pub fn resolve_value(
        &self,
        value: Option<Value>,
        source: &Expression,
        context: &EvaluationContext,
    ) -> Option<Value> {
        match value {
            Some(Value::Entity(entity)) => {
                let variable = match source {
                    Expression::Variable(name) => Some(name.clone()),
                    _ => None,
                };
                context.report(&EvalError::EntityMisuse { variable, entity });
                None
            }
            other => other,
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::number(*n),
            Literal::String(s) => Value::string(s.clone()),
            Literal::Boolean(b) => Value::Scalar(Scalar::Bool(*b)),
            Literal::Null => Value::Scalar(Scalar::Null),
        }
    }

    // 変数の評価
    fn eval_variable(&self, name: &str, context: &EvaluationContext) -> EvalResult<Value> {
        if name == "null" {
            return Ok(Value::Scalar(Scalar::Null));
        }
        context.get_variable(name)
    }

    async fn eval_array(
        &self,
        items: &[Expression],
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            let value = self.eval_expression(item, context.clone()).await;
            elements.push(context.settle(value));
        }
        Ok(Value::List(elements))
    }

    async fn eval_function_call(
        &self,
        function: &str,
        arguments: &[Expression],
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        let args = self.eval_arguments(arguments, context.clone()).await;

        if let Ok(kind) = EntityKind::from_str(function) {
            return resolve_entity(kind, &args);
        }
        match Builtin::lookup(function) {
            Some(builtin) => builtin.call(&args, context.config().default_window, context.now()),
            None => Err(EvalError::UnknownFunction(function.to_string())),
        }
    }

    async fn eval_member(
        &self,
        base: &Expression,
        properties: &[String],
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        let mut value = self.eval_expression(base, context.clone()).await?;
        for property in properties {
            value = evaluate_property(value, property, &context).await?;
        }
        Ok(value)
    }

    /// Left fold over one precedence tier. Only operands after the first are
    /// checked for entity handles.
    async fn eval_chain(
        &self,
        first: &Expression,
        rest: &[(BinaryOperator, Expression)],
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        if rest.is_empty() {
            return self.eval_expression(first, context).await;
        }

        let left = self.eval_expression(first, context.clone()).await;
        let mut left = context.settle(left);
        for (op, operand) in rest {
            let right = self.eval_expression(operand, context.clone()).await;
            let right = context.settle(right);
            let right = self.resolve_value(right, operand, &context);
            let combined = algebra::apply(*op, left.as_ref(), right.as_ref(), context.now());
            left = Some(Value::Series(combined));
        }
        left.ok_or(EvalError::UnsupportedExpression)
    }
}
