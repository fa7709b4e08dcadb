mod interpreter_tests;

use std::sync::Arc;

use llamascript::{
    config::InterpreterConfig,
    eval::{property::MetricEndpoint, value::Series},
    source::{InMemorySource, MetricSource},
    Interpreter,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    // テストの前に一度だけ実行したい処理
    // tracing_subscriberの初期化
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub const NOW: i64 = 1_700_000_000;

pub fn series(points: &[(i64, f64)]) -> Series {
    points.iter().copied().collect()
}

pub fn fixture_source() -> InMemorySource {
    InMemorySource::new()
        .with_series(
            MetricEndpoint::ProtocolTvl,
            "aave",
            series(&[(1, 10.0), (2, 20.0)]),
        )
        .with_series(
            MetricEndpoint::ProtocolFees,
            "aave",
            series(&[(1, 5.0), (2, 8.0), (3, 6.0)]),
        )
        .with_series(
            MetricEndpoint::ProtocolRevenue,
            "aave",
            series(&[(1, 0.0), (2, 10.0)]),
        )
        .with_series(
            MetricEndpoint::ChainFees,
            "ethereum",
            series(&[(2, 5.0), (3, 7.0)]),
        )
        .with_series(
            MetricEndpoint::ChainTvl,
            "ethereum",
            series(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]),
        )
}

pub fn interpreter(source: Arc<dyn MetricSource>) -> Interpreter {
    Interpreter::with_config(
        source,
        InterpreterConfig {
            now_override: Some(NOW),
            ..InterpreterConfig::default()
        },
    )
}
