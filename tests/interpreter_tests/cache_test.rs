use std::sync::Arc;

use llamascript::{
    eval::{property::MetricEndpoint, value::Value},
    source::{FetchError, MockMetricSource},
    BinaryOperator, Expression, Script, Statement,
};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;

use super::{assign, plot, protocol};
use crate::{interpreter, series};

fn aave_tvl() -> Expression {
    Expression::member(protocol("aave"), &["tvl"])
}

#[tokio::test]
async fn test_repeated_property_is_fetched_once() {
    let mut source = MockMetricSource::new();
    source
        .expect_fetch()
        .with(eq(MetricEndpoint::ProtocolTvl), eq("aave"))
        .times(1)
        .returning(|_, _| Ok(series(&[(1, 10.0), (2, 20.0)])));

    let report = interpreter(Arc::new(source))
        .interpret_script(&Script::new(vec![
            assign("a", aave_tvl()),
            assign("b", aave_tvl()),
        ]))
        .await;

    assert!(report.errors.is_empty());
    assert_eq!(report.variables["a"], report.variables["b"]);
    assert_eq!(report.cache.len(), 1);
}

#[tokio::test]
async fn test_sibling_arguments_share_one_fetch() {
    let mut source = MockMetricSource::new();
    source
        .expect_fetch()
        .times(1)
        .returning(|_, _| Ok(series(&[(1, 10.0)])));

    let report = interpreter(Arc::new(source))
        .interpret_script(&Script::new(vec![Statement::Highlight {
            arguments: vec![aave_tvl(), aave_tvl(), aave_tvl()],
        }]))
        .await;

    assert!(report.errors.is_empty());
    assert_eq!(report.highlights[0].arguments.len(), 3);
}

#[tokio::test]
async fn test_failed_fetch_is_reported_and_retried() {
    let mut source = MockMetricSource::new();
    let mut seq = mockall::Sequence::new();
    source
        .expect_fetch()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(FetchError::Unavailable("timeout".to_string())));
    source
        .expect_fetch()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(series(&[(1, 10.0)])));

    let report = interpreter(Arc::new(source))
        .interpret_script(&Script::new(vec![
            plot(vec![aave_tvl()]),
            plot(vec![aave_tvl()]),
        ]))
        .await;

    assert_eq!(
        report.errors,
        vec!["Failed to load tvl for PROTOCOL(aave): data source unavailable: timeout"]
    );
    assert_eq!(report.plots.len(), 1);
    assert_eq!(report.cache.len(), 1);
}

#[tokio::test]
async fn test_entity_on_left_of_chain_is_not_rejected() {
    let source = MockMetricSource::new();
    let report = interpreter(Arc::new(source))
        .interpret_script(&Script::new(vec![
            assign(
                "left",
                Expression::binary(protocol("aave"), BinaryOperator::Add, Expression::number(1.0)),
            ),
            assign(
                "right",
                Expression::binary(Expression::number(1.0), BinaryOperator::Add, protocol("aave")),
            ),
        ]))
        .await;

    assert_eq!(
        report.errors,
        vec!["Variable is a PROTOCOL(aave) entity but no data property (e.g. .tvl, .volume) was selected. Please select a property."]
    );
    assert_eq!(report.variables["left"], Value::Series(Default::default()));
    assert_eq!(report.variables["right"], Value::Series(Default::default()));
}
