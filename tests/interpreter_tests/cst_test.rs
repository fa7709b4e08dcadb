use std::sync::Arc;

use llamascript::{
    eval::{context::ChartType, value::Value},
    Error,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};

use crate::{fixture_source, interpreter, series};

fn token(image: &str, offset: usize) -> Json {
    json!({ "image": image, "startOffset": offset })
}

fn node(name: &str, children: Json) -> Json {
    json!({ "name": name, "children": children })
}

/// Builds `expression` down to a single primary.
fn expression(primary: Json) -> Json {
    let unary = node("unaryExpression", json!({ "primary": [primary] }));
    let mult = node("multiplicativeExpression", json!({ "unaryExpression": [unary] }));
    additive_expression(json!({ "multiplicativeExpression": [mult] }))
}

fn additive_expression(additive_children: Json) -> Json {
    let additive = node("additiveExpression", additive_children);
    let comparison = node("comparisonExpression", json!({ "additiveExpression": [additive] }));
    let logical = node("logicalExpression", json!({ "comparisonExpression": [comparison] }));
    node("expression", json!({ "logicalExpression": [logical] }))
}

fn mult_of(primary: Json) -> Json {
    node(
        "multiplicativeExpression",
        json!({ "unaryExpression": [node("unaryExpression", json!({ "primary": [primary] }))] }),
    )
}

fn string_literal(text: &str, offset: usize) -> Json {
    node(
        "primary",
        json!({ "StringLiteral": [token(&format!("\"{}\"", text), offset)] }),
    )
}

fn number_literal(text: &str, offset: usize) -> Json {
    node("primary", json!({ "NumberLiteral": [token(text, offset)] }))
}

fn args(expressions: Vec<Json>) -> Json {
    node("args", json!({ "expression": expressions }))
}

fn statement(key: &str, inner: Json) -> Json {
    node("statement", json!({ key: [inner] }))
}

/// x = protocol("aave").tvl + 1
/// plot(x, "Aave TVL + 1", "bar", "teal")
/// highlight(x)
fn dashboard_script() -> Json {
    let entity_tvl = node(
        "primary",
        json!({
            "Identifier": [token("protocol", 4), token("tvl", 22)],
            "LParen": [token("(", 12)],
            "args": [args(vec![expression(string_literal("aave", 13))])],
            "RParen": [token(")", 19)],
            "Dot": [token(".", 21)]
        }),
    );
    let sum = additive_expression(json!({
        "multiplicativeExpression": [mult_of(entity_tvl), mult_of(number_literal("1", 28))],
        "Plus": [token("+", 26)]
    }));
    let assignment = node(
        "assignment",
        json!({
            "Identifier": [token("x", 0)],
            "Assign": [token("=", 2)],
            "expression": [sum]
        }),
    );

    let x = || node("primary", json!({ "Identifier": [token("x", 35)] }));
    let plot_call = node(
        "primary",
        json!({
            "Plot": [token("plot", 30)],
            "LParen": [token("(", 34)],
            "args": [args(vec![
                expression(x()),
                expression(string_literal("Aave TVL + 1", 38)),
                expression(string_literal("bar", 54)),
                expression(string_literal("teal", 61)),
            ])],
            "RParen": [token(")", 67)]
        }),
    );
    let highlight = node(
        "highlightStmt",
        json!({
            "Highlight": [token("highlight", 69)],
            "args": [args(vec![expression(x())])]
        }),
    );

    node(
        "script",
        json!({ "statement": [
            statement("assignment", assignment),
            statement("expression", expression(plot_call)),
            statement("highlightStmt", highlight),
        ] }),
    )
}

#[tokio::test]
async fn test_interpret_parser_tree_json() {
    let report = interpreter(Arc::new(fixture_source()))
        .interpret_json(&dashboard_script().to_string())
        .await
        .unwrap();

    let expected = Value::Series(series(&[(1, 11.0), (2, 21.0)]));
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.variables["x"], expected);

    assert_eq!(report.plots.len(), 1);
    let plot = &report.plots[0];
    assert_eq!(plot.series, expected);
    assert_eq!(plot.label.as_deref(), Some("Aave TVL + 1"));
    assert_eq!(plot.chart_type, Some(ChartType::Bar));
    assert_eq!(plot.color.as_deref(), Some("teal"));
    assert_eq!(plot.dashed, None);

    assert_eq!(report.highlights.len(), 1);
    assert_eq!(report.highlights[0].arguments, vec![Some(expected)]);
}

#[tokio::test]
async fn test_unsupported_nodes_are_diagnostics() {
    let tree = node(
        "script",
        json!({ "statement": [
            statement("loopStmt", node("loopStmt", json!({}))),
            statement("assignment", node("assignment", json!({
                "Identifier": [token("y", 0)],
                "expression": [expression(node("primary", json!({})))]
            }))),
        ] }),
    );
    let report = interpreter(Arc::new(fixture_source()))
        .interpret_json(&tree.to_string())
        .await
        .unwrap();

    assert_eq!(
        report.errors,
        vec![
            "Unsupported statement type: loopStmt",
            "Unsupported expression node encountered.",
        ]
    );
    assert!(report.variables.is_empty());
}

#[tokio::test]
async fn test_malformed_tree_is_an_error() {
    let result = interpreter(Arc::new(fixture_source()))
        .interpret_json(r#"{"name": "script"}"#)
        .await;
    assert!(matches!(result, Err(Error::Syntax(_))));
}
