use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::evaluator::{EvalError, EvalResult};
use super::property::PropertyCache;
use super::value::{Series, Timestamp, Value};
use crate::config::InterpreterConfig;
use crate::source::MetricSource;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartType {
    Area,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotDescriptor {
    pub series: Value,
    pub label: Option<String>,
    pub chart_type: Option<ChartType>,
    pub color: Option<String>,
    pub dashed: Option<bool>,
    pub group: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightDescriptor {
    pub arguments: Vec<Option<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum DiagnosticKind {
    UndefinedVariable,
    UnresolvedProperty,
    InvalidArgument,
    EntityMisuse,
    EmptySeries,
    UnsupportedNode,
    FetchFailed,
    InterpreterError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl From<&EvalError> for Diagnostic {
    fn from(error: &EvalError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// State of one interpretation run.
///
/// Created fresh by [`crate::Interpreter`] and shared by reference count
/// across the statements of that run only. Diagnostics are append-only.
pub struct EvaluationContext {
    variables: DashMap<String, Value>,
    plots: Mutex<Vec<PlotDescriptor>>,
    highlights: Mutex<Vec<HighlightDescriptor>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
    cache: PropertyCache,
    source: Arc<dyn MetricSource>,
    config: InterpreterConfig,
}

impl EvaluationContext {
    pub fn new(source: Arc<dyn MetricSource>, config: InterpreterConfig) -> Self {
        Self {
            variables: DashMap::new(),
            plots: Mutex::new(Vec::new()),
            highlights: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(Vec::new()),
            cache: PropertyCache::new(),
            source,
            config,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn MetricSource> {
        &self.source
    }

    pub fn cache(&self) -> &PropertyCache {
        &self.cache
    }

    /// Wall clock in seconds, or the configured fixed instant.
    pub fn now(&self) -> Timestamp {
        self.config
            .now_override
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    // 変数アクセス
    pub fn get_variable(&self, name: &str) -> EvalResult<Value> {
        self.variables
            .get(name)
            .map(|v| v.value().clone())
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    pub fn set_variable(&self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn remove_variable(&self, name: &str) {
        self.variables.remove(name);
    }

    pub fn push_plot(&self, plot: PlotDescriptor) {
        lock(&self.plots).push(plot);
    }

    pub fn push_highlight(&self, highlight: HighlightDescriptor) {
        lock(&self.highlights).push(highlight);
    }

    pub fn report(&self, error: &EvalError) {
        debug!(kind = %error.kind(), "{}", error);
        lock(&self.diagnostics).push(Diagnostic::from(error));
    }

    /// Records a failed evaluation and continues with a missing operand.
    pub fn settle(&self, result: EvalResult<Value>) -> Option<Value> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(&error);
                None
            }
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.diagnostics)
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn plots(&self) -> Vec<PlotDescriptor> {
        lock(&self.plots).clone()
    }

    pub fn highlights(&self) -> Vec<HighlightDescriptor> {
        lock(&self.highlights).clone()
    }

    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.variables
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn report_snapshot(&self) -> EvaluationReport {
        EvaluationReport {
            variables: self.variables(),
            plots: self.plots(),
            highlights: self.highlights(),
            errors: self.errors(),
            diagnostics: self.diagnostics(),
            cache: self.cache.entries(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Final state of a run, handed to the charting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub variables: BTreeMap<String, Value>,
    pub plots: Vec<PlotDescriptor>,
    pub highlights: Vec<HighlightDescriptor>,
    pub errors: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub cache: BTreeMap<String, Series>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    fn setup_test_context() -> EvaluationContext {
        let config = InterpreterConfig {
            now_override: Some(1_000),
            ..InterpreterConfig::default()
        };
        EvaluationContext::new(Arc::new(InMemorySource::new()), config)
    }

    #[test]
    fn test_variables_overwrite_and_remove() {
        let context = setup_test_context();
        context.set_variable("x", Value::number(1.0));
        context.set_variable("x", Value::number(2.0));
        assert_eq!(context.get_variable("x").unwrap(), Value::number(2.0));

        context.remove_variable("x");
        let err = context.get_variable("x").unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable: x");
    }

    #[test]
    fn test_settle_records_errors_in_order() {
        let context = setup_test_context();
        assert_eq!(context.settle(Ok(Value::number(1.0))), Some(Value::number(1.0)));
        assert_eq!(
            context.settle(Err(EvalError::UndefinedVariable("a".to_string()))),
            None
        );
        assert_eq!(
            context.settle(Err(EvalError::UndefinedVariable("b".to_string()))),
            None
        );

        assert_eq!(
            context.errors(),
            vec!["Undefined variable: a", "Undefined variable: b"]
        );
        assert!(context
            .diagnostics()
            .iter()
            .all(|d| d.kind == DiagnosticKind::UndefinedVariable));
    }

    #[test]
    fn test_now_override() {
        assert_eq!(setup_test_context().now(), 1_000);
    }

    #[test]
    fn test_report_snapshot() {
        let context = setup_test_context();
        context.set_variable("b", Value::number(2.0));
        context.set_variable("a", Value::number(1.0));
        context.push_highlight(HighlightDescriptor { arguments: vec![] });

        let report = context.report_snapshot();
        assert_eq!(report.variables.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(report.highlights.len(), 1);
        assert!(report.plots.is_empty());
        assert!(report.cache.is_empty());
    }
}
