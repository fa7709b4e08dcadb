use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::context::{DiagnosticKind, EvaluationContext, EvaluationReport};
use super::statement::StatementEvaluator;
use super::value::EntityRef;
use crate::ast::Script;
use crate::config::InterpreterConfig;
use crate::source::{FetchError, MetricSource};
use crate::syntax::{lower_script, CstNode};
use crate::InternalResult;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Property {0} not found")]
    PropertyNotFound(String),
    #[error("Property {property} not found on {entity}")]
    EntityPropertyNotFound { property: String, entity: EntityRef },
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error(
        "Variable{} is a {entity} entity but no data property (e.g. .tvl, .volume) was selected. Please select a property.",
        variable_label(.variable)
    )]
    EntityMisuse {
        variable: Option<String>,
        entity: EntityRef,
    },
    #[error("The data series for the plot is empty or unavailable. Please check your data source.")]
    EmptySeries,
    #[error("Unsupported expression node encountered.")]
    UnsupportedExpression,
    #[error("Unsupported statement type: {0}")]
    UnsupportedStatement(String),
    #[error("Failed to load {property} for {entity}: {error}")]
    Fetch {
        entity: EntityRef,
        property: String,
        error: FetchError,
    },
    #[error("Interpreter error: {0}")]
    Interpreter(String),
}

fn variable_label(variable: &Option<String>) -> String {
    variable
        .as_ref()
        .map(|name| format!(" '{}'", name))
        .unwrap_or_default()
}

impl EvalError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            EvalError::UndefinedVariable(_) => DiagnosticKind::UndefinedVariable,
            EvalError::PropertyNotFound(_) | EvalError::EntityPropertyNotFound { .. } => {
                DiagnosticKind::UnresolvedProperty
            }
            EvalError::InvalidArgument(_) | EvalError::UnknownFunction(_) => {
                DiagnosticKind::InvalidArgument
            }
            EvalError::EntityMisuse { .. } => DiagnosticKind::EntityMisuse,
            EvalError::EmptySeries => DiagnosticKind::EmptySeries,
            EvalError::UnsupportedExpression | EvalError::UnsupportedStatement(_) => {
                DiagnosticKind::UnsupportedNode
            }
            EvalError::Fetch { .. } => DiagnosticKind::FetchFailed,
            EvalError::Interpreter(_) => DiagnosticKind::InterpreterError,
        }
    }
}

/// An `Err` has not been recorded yet; whoever consumes it records it in
/// the context.
pub type EvalResult<T> = Result<T, EvalError>;

/// Entry point: runs a script against a metric source and returns every
/// plot, highlight, variable and diagnostic it produced.
pub struct Interpreter {
    statement_evaluator: StatementEvaluator,
    source: Arc<dyn MetricSource>,
    config: InterpreterConfig,
}

impl Interpreter {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self::with_config(source, InterpreterConfig::default())
    }

    pub fn with_config(source: Arc<dyn MetricSource>, config: InterpreterConfig) -> Self {
        Self {
            statement_evaluator: StatementEvaluator::default(),
            source,
            config,
        }
    }

    /// Interprets a tree produced by the external parser.
    pub async fn interpret(&self, tree: &CstNode) -> EvaluationReport {
        let script = lower_script(tree);
        self.interpret_script(&script).await
    }

    /// Interprets a parser tree serialized as JSON.
    pub async fn interpret_json(&self, json: &str) -> InternalResult<EvaluationReport> {
        let tree: CstNode = serde_json::from_str(json)?;
        Ok(self.interpret(&tree).await)
    }

    #[tracing::instrument(skip_all, fields(statements = script.statements.len()))]
    pub async fn interpret_script(&self, script: &Script) -> EvaluationReport {
        let context = Arc::new(EvaluationContext::new(
            self.source.clone(),
            self.config.clone(),
        ));
        self.statement_evaluator
            .eval_script(script, context.clone())
            .await;

        let report = context.report_snapshot();
        if report.errors.is_empty() {
            info!(plots = report.plots.len(), "script evaluated");
        } else {
            warn!(
                plots = report.plots.len(),
                errors = report.errors.len(),
                "script evaluated with errors"
            );
        }
        report
    }
}
