//! Property access on values, backed by a per-run fetch cache.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;

use super::context::EvaluationContext;
use super::value::{EntityKind, EntityRef, Scalar, Series, Value};
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::source::FetchError;

/// Upstream chart endpoints a property can resolve to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum MetricEndpoint {
    ProtocolTvl,
    ProtocolVolume,
    ProtocolFees,
    ProtocolRevenue,
    ProtocolMedianApy,
    TokenMcap,
    TokenPrice,
    TokenVolume,
    ChainTvl,
    ChainVolume,
    ChainFees,
    ChainUsers,
    ChainTxs,
    ChainAggregators,
    ChainPerps,
    ChainBridgeAggregators,
    ChainPerpsAggregators,
    ChainOptions,
    ChainRevenue,
    ChainBribes,
    ChainTokenTax,
    ChainActiveUsers,
    ChainNewUsers,
    ChainGasUsed,
}

lazy_static! {
    static ref PROPERTY_MAPPINGS: HashMap<EntityKind, HashMap<&'static str, MetricEndpoint>> = {
        use MetricEndpoint::*;
        let protocol = HashMap::from([
            ("tvl", ProtocolTvl),
            ("volume", ProtocolVolume),
            ("fees", ProtocolFees),
            ("revenue", ProtocolRevenue),
            ("mcap", TokenMcap),
            ("price", TokenPrice),
            ("medianApy", ProtocolMedianApy),
        ]);
        let chain = HashMap::from([
            ("tvl", ChainTvl),
            ("volume", ChainVolume),
            ("fees", ChainFees),
            ("users", ChainUsers),
            ("txs", ChainTxs),
            ("aggregators", ChainAggregators),
            ("perps", ChainPerps),
            ("bridgeAggregators", ChainBridgeAggregators),
            ("perpsAggregators", ChainPerpsAggregators),
            ("options", ChainOptions),
            ("revenue", ChainRevenue),
            ("bribes", ChainBribes),
            ("tokenTax", ChainTokenTax),
            ("activeUsers", ChainActiveUsers),
            ("newUsers", ChainNewUsers),
            ("gasUsed", ChainGasUsed),
        ]);
        let token = HashMap::from([
            ("price", TokenPrice),
            ("volume", TokenVolume),
            ("marketCap", TokenMcap),
        ]);
        HashMap::from([
            (EntityKind::Protocol, protocol),
            (EntityKind::Chain, chain),
            (EntityKind::Token, token),
        ])
    };
}

/// Endpoint behind `kind.property`. Property names are case-sensitive.
pub fn lookup_property(kind: EntityKind, property: &str) -> Option<MetricEndpoint> {
    PROPERTY_MAPPINGS
        .get(&kind)
        .and_then(|props| props.get(property))
        .copied()
}

/// Property names available on an entity kind, sorted.
pub fn properties_of(kind: EntityKind) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PROPERTY_MAPPINGS
        .get(&kind)
        .map(|props| props.keys().copied().collect())
        .unwrap_or_default();
    names.sort_unstable();
    names
}

/// Fetch results keyed by `"<id>-<property>"`.
///
/// Each key owns a cell, so concurrent lookups of one key share a single
/// fetch. Failed fetches leave the cell empty.
#[derive(Default)]
pub struct PropertyCache {
    cells: DashMap<String, Arc<OnceCell<Series>>>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(id: &str, property: &str) -> String {
        format!("{}-{}", id, property)
    }

    #[tracing::instrument(level = "debug", skip(self, fetch))]
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Series, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Series, FetchError>>,
    {
        let cell = self.cells.entry(key.to_string()).or_default().value().clone();
        if let Some(series) = cell.get() {
            debug!("cache hit");
            return Ok(series.clone());
        }
        cell.get_or_try_init(|| async move {
            debug!("cache miss");
            fetch().await
        })
        .await
        .cloned()
    }

    pub fn get(&self, key: &str) -> Option<Series> {
        self.cells
            .get(key)
            .and_then(|cell| cell.value().get().cloned())
    }

    /// Settled entries only.
    pub fn entries(&self) -> BTreeMap<String, Series> {
        self.cells
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .get()
                    .map(|series| (entry.key().clone(), series.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.iter().filter(|entry| entry.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves `base.property`.
///
/// Entities go through the mapping table and the cache. Series and lists
/// expose `length`; lists also accept numeric indices.
pub async fn evaluate_property(
    base: Value,
    property: &str,
    context: &EvaluationContext,
) -> EvalResult<Value> {
    match base {
        Value::Entity(entity) => fetch_entity_property(entity, property, context).await,
        Value::Series(series) if property == "length" => Ok(Value::number(series.len() as f64)),
        Value::List(items) => {
            if property == "length" {
                return Ok(Value::number(items.len() as f64));
            }
            match property.parse::<usize>().ok().and_then(|i| items.into_iter().nth(i)) {
                Some(Some(item)) => Ok(item),
                Some(None) => Ok(Value::Scalar(Scalar::Null)),
                None => Err(EvalError::PropertyNotFound(property.to_string())),
            }
        }
        _ => Err(EvalError::PropertyNotFound(property.to_string())),
    }
}

async fn fetch_entity_property(
    entity: EntityRef,
    property: &str,
    context: &EvaluationContext,
) -> EvalResult<Value> {
    let Some(endpoint) = lookup_property(entity.kind, property) else {
        return Err(EvalError::EntityPropertyNotFound {
            property: property.to_string(),
            entity,
        });
    };
    let key = PropertyCache::key(&entity.id, property);
    let source = context.source();
    context
        .cache()
        .get_or_fetch(&key, || source.fetch(endpoint, &entity.id))
        .await
        .map(Value::Series)
        .map_err(|error| EvalError::Fetch {
            entity: entity.clone(),
            property: property.to_string(),
            error,
        })
}
