use core::fmt;

use serde::{Deserialize, Serialize};

/// Seconds since Unix epoch.
pub type Timestamp = i64;

/// One observation of a series. `None` marks a point without data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Timestamp, Option<f64>)", into = "(Timestamp, Option<f64>)")]
pub struct Point {
    pub timestamp: Timestamp,
    pub value: Option<f64>,
}

impl Point {
    pub fn new(timestamp: Timestamp, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

impl From<(Timestamp, Option<f64>)> for Point {
    fn from((timestamp, value): (Timestamp, Option<f64>)) -> Self {
        Self { timestamp, value }
    }
}

impl From<Point> for (Timestamp, Option<f64>) {
    fn from(point: Point) -> Self {
        (point.timestamp, point.value)
    }
}

/// Ordered points with strictly increasing, unique timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct Series(Vec<Point>);

impl Series {
    /// Sorts by timestamp; on duplicate timestamps the last point wins.
    pub fn new(mut points: Vec<Point>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let mut deduped: Vec<Point> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }
        Self(deduped)
    }

    /// Series with a single point, used when two scalars are combined.
    pub fn single(timestamp: Timestamp, value: Option<f64>) -> Self {
        Self(vec![Point::new(timestamp, value)])
    }

    /// Keeps the timestamps of `self` and replaces every value.
    pub fn map_values<F>(&self, mut f: F) -> Series
    where
        F: FnMut(usize, Option<f64>) -> Option<f64>,
    {
        Self(
            self.0
                .iter()
                .enumerate()
                .map(|(i, p)| Point::new(p.timestamp, f(i, p.value)))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter().map(|p| p.value)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.0.iter().map(|p| p.timestamp)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Point>> for Series {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl From<Series> for Vec<Point> {
    fn from(series: Series) -> Self {
        series.0
    }
}

impl FromIterator<(Timestamp, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (Timestamp, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(t, v)| Point::new(t, Some(v))).collect())
    }
}

impl FromIterator<(Timestamp, Option<f64>)> for Series {
    fn from_iter<I: IntoIterator<Item = (Timestamp, Option<f64>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Point::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    String(String),
    Null,
}

impl Scalar {
    /// Numeric reading used by comparisons, logic and `if` branches.
    /// Booleans read as 1/0; strings and null have no numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::String(_) | Scalar::Null => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Number(n) => *n != 0.0 && !n.is_nan(),
            Scalar::Bool(b) => *b,
            Scalar::String(s) => !s.is_empty(),
            Scalar::Null => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Null => write!(f, "null"),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityKind {
    Protocol,
    Chain,
    Token,
}

/// Unresolved handle naming a protocol, chain or token. Only usable through
/// property access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_ref().to_uppercase(), self.id)
    }
}

// 値の型システム
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Series(Series),
    Entity(EntityRef),
    /// Array literal; elements whose evaluation failed stay `None`.
    List(Vec<Option<Value>>),
}

impl Value {
    pub fn number(n: f64) -> Self {
        Value::Scalar(Scalar::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Value::Series(series) => Some(series),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Scalar(scalar) => scalar.is_truthy(),
            Value::Series(_) | Value::Entity(_) | Value::List(_) => true,
        }
    }

    /// Series or list without elements.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Series(series) => series.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Scalar(_) | Value::Entity(_) => false,
        }
    }
}

impl From<Series> for Value {
    fn from(series: Series) -> Self {
        Value::Series(series)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Scalar(scalar) => write!(f, "{}", scalar),
            Value::Series(series) => write!(f, "series[{}]", series.len()),
            Value::Entity(entity) => write!(f, "{}", entity),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", DisplayOperand(item.as_ref()))?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Formats a possibly missing operand, printing `undefined` when absent.
pub struct DisplayOperand<'a>(pub Option<&'a Value>);

impl fmt::Display for DisplayOperand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "undefined"),
        }
    }
}
