//! Data sources behind entity properties.
//!
//! The interpreter only sees [`MetricSource`]; concrete HTTP clients live
//! with the embedding application.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::eval::property::MetricEndpoint;
use crate::eval::value::Series;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Fetches one metric series for one entity id.
///
/// Implementations resolve to an empty series when there is no data, so that
/// callers can tell "nothing to plot" apart from a failed request.
#[mockall::automock]
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self, endpoint: MetricEndpoint, id: &str) -> Result<Series, FetchError>;
}

/// Fixed in-memory data, keyed by endpoint and id. Counts fetches.
#[derive(Debug, Default)]
pub struct InMemorySource {
    data: HashMap<(MetricEndpoint, String), Series>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(
        mut self,
        endpoint: MetricEndpoint,
        id: impl Into<String>,
        series: Series,
    ) -> Self {
        self.data.insert((endpoint, id.into()), series);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricSource for InMemorySource {
    async fn fetch(&self, endpoint: MetricEndpoint, id: &str) -> Result<Series, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .data
            .get(&(endpoint, id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
