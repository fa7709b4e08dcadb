use std::sync::Arc;

use llamascript::{
    eval::{
        context::DiagnosticKind,
        value::{Series, Value},
    },
    BinaryOperator, Expression, Literal, Script,
};
use pretty_assertions::assert_eq;

use super::{assign, chain, plot, protocol};
use crate::{fixture_source, interpreter, series};

async fn run(statements: Vec<llamascript::Statement>) -> llamascript::eval::context::EvaluationReport {
    interpreter(Arc::new(fixture_source()))
        .interpret_script(&Script::new(statements))
        .await
}

fn nullable(points: &[(i64, Option<f64>)]) -> Series {
    points.iter().copied().collect()
}

#[tokio::test]
async fn test_series_addition_aligns_on_union() {
    let report = run(vec![assign(
        "x",
        Expression::binary(
            Expression::member(protocol("aave"), &["tvl"]),
            BinaryOperator::Add,
            Expression::member(chain("ethereum"), &["fees"]),
        ),
    )])
    .await;

    assert!(report.errors.is_empty());
    assert_eq!(
        report.variables["x"],
        Value::Series(series(&[(1, 10.0), (2, 25.0), (3, 7.0)]))
    );
}

#[tokio::test]
async fn test_scalar_broadcast() {
    let report = run(vec![assign(
        "x",
        Expression::binary(
            Expression::member(protocol("aave"), &["tvl"]),
            BinaryOperator::Multiply,
            Expression::number(2.0),
        ),
    )])
    .await;

    assert_eq!(
        report.variables["x"],
        Value::Series(series(&[(1, 20.0), (2, 40.0)]))
    );
}

#[tokio::test]
async fn test_series_functions() {
    let report = run(vec![
        assign(
            "avg",
            Expression::call(
                "ma",
                vec![
                    Expression::member(chain("ethereum"), &["tvl"]),
                    Expression::number(3.0),
                ],
            ),
        ),
        assign(
            "delta",
            Expression::call("diff", vec![Expression::member(protocol("aave"), &["fees"])]),
        ),
        assign(
            "growth",
            Expression::call(
                "pctChange",
                vec![Expression::member(protocol("aave"), &["revenue"])],
            ),
        ),
    ])
    .await;

    assert!(report.errors.is_empty());
    assert_eq!(
        report.variables["avg"],
        Value::Series(nullable(&[(1, None), (2, None), (3, Some(2.0)), (4, Some(3.0))]))
    );
    assert_eq!(
        report.variables["delta"],
        Value::Series(nullable(&[(1, None), (2, Some(3.0)), (3, Some(-2.0))]))
    );
    assert_eq!(
        report.variables["growth"],
        Value::Series(nullable(&[(1, None), (2, Some(1000.0))]))
    );
}

#[tokio::test]
async fn test_plot_of_undefined_variable() {
    let report = run(vec![plot(vec![Expression::variable("foo")])]).await;

    assert!(report.plots.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("foo"));
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UndefinedVariable);
}

#[tokio::test]
async fn test_plot_of_bare_entity() {
    let report = run(vec![
        assign("x", protocol("uniswap")),
        plot(vec![Expression::variable("x")]),
    ])
    .await;

    assert!(report.plots.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("PROTOCOL"));
    assert!(report.errors[0].contains("uniswap"));
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::EntityMisuse);
}

#[tokio::test]
async fn test_bad_plot_does_not_stop_later_plots() {
    let report = run(vec![
        plot(vec![Expression::member(protocol("aave"), &["tvl"])]),
        plot(vec![Expression::variable("missing")]),
        plot(vec![Expression::member(chain("ethereum"), &["tvl"])]),
    ])
    .await;

    assert_eq!(report.plots.len(), 2);
    assert_eq!(report.errors, vec!["Undefined variable: missing"]);
    assert_eq!(
        report.plots[0].series,
        Value::Series(series(&[(1, 10.0), (2, 20.0)]))
    );
}

#[tokio::test]
async fn test_unknown_property_and_unmapped_data() {
    let report = run(vec![
        assign("a", Expression::member(protocol("aave"), &["users"])),
        plot(vec![Expression::member(chain("base"), &["tvl"])]),
    ])
    .await;

    assert_eq!(
        report.errors,
        vec![
            "Property users not found on PROTOCOL(aave)",
            "The data series for the plot is empty or unavailable. Please check your data source.",
        ]
    );
    assert!(!report.variables.contains_key("a"));
    assert!(report.cache.contains_key("base-tvl"));
}

#[tokio::test]
async fn test_scalar_if_returns_series_branch() {
    let tvl = Expression::member(protocol("aave"), &["tvl"]);
    let report = run(vec![assign(
        "x",
        Expression::call(
            "IF",
            vec![
                Expression::Literal(Literal::Boolean(true)),
                tvl,
                Expression::number(0.0),
            ],
        ),
    )])
    .await;

    assert!(report.errors.is_empty());
    assert_eq!(
        report.variables["x"],
        Value::Series(series(&[(1, 10.0), (2, 20.0)]))
    );
}

#[tokio::test]
async fn test_report_serializes_for_charting() {
    let report = run(vec![plot(vec![
        Expression::member(protocol("aave"), &["tvl"]),
        Expression::string("Aave TVL"),
        Expression::string("bar"),
    ])])
    .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["plots"][0]["label"], "Aave TVL");
    assert_eq!(json["plots"][0]["chartType"], "bar");
    assert_eq!(json["plots"][0]["series"], serde_json::json!([[1, 10.0], [2, 20.0]]));
    assert_eq!(json["cache"]["aave-tvl"], serde_json::json!([[1, 10.0], [2, 20.0]]));
}
