use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::color::is_valid_color;
use super::context::{ChartType, EvaluationContext, HighlightDescriptor, PlotDescriptor};
use super::expression::ExpressionEvaluator;
use super::value::Value;
use crate::ast::{Expression, Script, Statement};
use crate::eval::evaluator::{EvalError, EvalResult};

// Positional plot arguments.
const PLOT_SERIES: usize = 0;
const PLOT_LABEL: usize = 1;
const PLOT_CHART_TYPE: usize = 2;
const PLOT_COLOR: usize = 3;
const PLOT_DASHED: usize = 4;
const PLOT_GROUP: usize = 5;

pub struct StatementEvaluator {
    pub expression_evaluator: Arc<ExpressionEvaluator>,
}

impl Default for StatementEvaluator {
    fn default() -> Self {
        Self {
            expression_evaluator: Arc::new(ExpressionEvaluator::new()),
        }
    }
}

impl StatementEvaluator {
    pub fn new(expression_evaluator: Arc<ExpressionEvaluator>) -> Self {
        Self {
            expression_evaluator,
        }
    }

    /// Runs every statement in order. A failing or panicking statement is
    /// recorded and the next one runs.
    pub async fn eval_script(&self, script: &Script, context: Arc<EvaluationContext>) {
        for (index, statement) in script.statements.iter().enumerate() {
            let outcome = AssertUnwindSafe(self.eval_statement(statement, context.clone()))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => context.report(&error),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(statement = index, "statement panicked: {}", message);
                    context.report(&EvalError::Interpreter(message));
                }
            }
        }
    }

    pub async fn eval_statement(
        &self,
        statement: &Statement,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<()> {
        match statement {
            Statement::Assignment { name, value } => {
                self.eval_assignment(name, value.as_ref(), context).await
            }
            Statement::Plot { arguments } => self.eval_plot(arguments, context).await,
            Statement::Highlight { arguments } => self.eval_highlight(arguments, context).await,
            Statement::Expression(_) => {
                debug!("skipping expression statement without plot");
                Ok(())
            }
            Statement::Unsupported(name) => Err(EvalError::UnsupportedStatement(name.clone())),
        }
    }

    async fn eval_assignment(
        &self,
        name: &str,
        value: Option<&Expression>,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<()> {
        let Some(expr) = value else {
            context.remove_variable(name);
            return Ok(());
        };
        match self
            .expression_evaluator
            .eval_expression(expr, context.clone())
            .await
        {
            Ok(value) => {
                context.set_variable(name, value);
                Ok(())
            }
            Err(error) => {
                context.remove_variable(name);
                Err(error)
            }
        }
    }

    async fn eval_plot(
        &self,
        arguments: &[Expression],
        context: Arc<EvaluationContext>,
    ) -> EvalResult<()> {
        if arguments.is_empty() {
            return Err(EvalError::InvalidArgument(
                "plot() expects at least one argument".to_string(),
            ));
        }

        let values = self
            .expression_evaluator
            .eval_arguments(arguments, context.clone())
            .await;
        let values: Vec<Option<Value>> = values
            .into_iter()
            .zip(arguments)
            .map(|(value, expr)| self.expression_evaluator.resolve_value(value, expr, &context))
            .collect();
        let arg = |i: usize| values.get(i).and_then(|v| v.as_ref());

        // Failure already recorded while evaluating the argument.
        let Some(series) = arg(PLOT_SERIES) else {
            debug!("plot skipped: series unavailable");
            return Ok(());
        };
        if series.is_empty_collection() {
            return Err(EvalError::EmptySeries);
        }

        let label = arg(PLOT_LABEL).and_then(Value::as_str).map(str::to_string);

        let chart_type = arg(PLOT_CHART_TYPE).and_then(Value::as_str).map(|raw| {
            ChartType::from_str(raw).unwrap_or_else(|_| {
                context.report(&EvalError::InvalidArgument(format!(
                    "Only 'area' and 'bar' chart types are supported. Got: {}",
                    raw
                )));
                ChartType::Area
            })
        });

        let color = arg(PLOT_COLOR).and_then(Value::as_str).and_then(|raw| {
            if is_valid_color(raw) {
                Some(raw.to_string())
            } else {
                context.report(&EvalError::InvalidArgument(format!(
                    "Invalid color: {}",
                    raw
                )));
                None
            }
        });

        let dashed = arg(PLOT_DASHED).map(Value::is_truthy);
        let group = arg(PLOT_GROUP).cloned();

        context.push_plot(PlotDescriptor {
            series: series.clone(),
            label,
            chart_type,
            color,
            dashed,
            group,
        });
        Ok(())
    }

    async fn eval_highlight(
        &self,
        arguments: &[Expression],
        context: Arc<EvaluationContext>,
    ) -> EvalResult<()> {
        let arguments = self
            .expression_evaluator
            .eval_arguments(arguments, context.clone())
            .await;
        context.push_highlight(HighlightDescriptor { arguments });
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
