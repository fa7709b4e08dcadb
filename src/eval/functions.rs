//! Built-in series transforms: `ma`, `ema`, `diff`, `abs`, `pctChange`, `if`.

use std::str::FromStr;

use super::algebra::truthy;
use super::value::{Scalar, Series, Timestamp, Value};
use crate::eval::evaluator::{EvalError, EvalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Builtin {
    Ma,
    Ema,
    Diff,
    Abs,
    PctChange,
    If,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }

    /// Applies the builtin to already evaluated arguments. Missing arguments
    /// are `None`.
    pub fn call(
        self,
        args: &[Option<Value>],
        default_window: usize,
        now: Timestamp,
    ) -> EvalResult<Value> {
        let arg = |i: usize| args.get(i).and_then(|a| a.as_ref());
        match self {
            Builtin::Ma | Builtin::Ema => {
                let label = self.to_string().to_uppercase();
                let series = arg(0).and_then(Value::as_series).ok_or_else(|| {
                    EvalError::InvalidArgument(format!(
                        "{} expects a series as first argument",
                        label
                    ))
                })?;
                let window = match arg(1) {
                    None | Some(Value::Scalar(Scalar::Null)) => default_window,
                    Some(value) => positive_window(value).ok_or_else(|| {
                        EvalError::InvalidArgument(format!(
                            "{} expects a positive integer window",
                            label
                        ))
                    })?,
                };
                Ok(Value::Series(if self == Builtin::Ma {
                    moving_average(series, window)
                } else {
                    exponential_moving_average(series, window)
                }))
            }
            Builtin::Diff => Ok(Value::Series(diff(single_series(args, "diff")?))),
            Builtin::Abs => Ok(Value::Series(abs(single_series(args, "abs")?))),
            Builtin::PctChange => Ok(Value::Series(pct_change(single_series(
                args,
                "pctChange",
            )?))),
            Builtin::If => Ok(select(arg(0), arg(1), arg(2), now)),
        }
    }
}

fn positive_window(value: &Value) -> Option<usize> {
    match value {
        Value::Scalar(Scalar::Number(n)) if *n >= 1.0 && n.fract() == 0.0 => Some(*n as usize),
        _ => None,
    }
}

fn single_series<'a>(args: &'a [Option<Value>], name: &str) -> EvalResult<&'a Series> {
    match args {
        [Some(Value::Series(series))] => Ok(series),
        _ => Err(EvalError::InvalidArgument(format!(
            "{}() expects a series",
            name
        ))),
    }
}

/// Trailing simple moving average. The first `window - 1` points are null;
/// null inputs inside a window count as 0.
pub fn moving_average(series: &Series, window: usize) -> Series {
    let values: Vec<Option<f64>> = series.values().collect();
    series.map_values(|i, _| {
        if window == 0 || i + 1 < window {
            return None;
        }
        let sum: f64 = values[i + 1 - window..=i]
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .sum();
        Some(sum / window as f64)
    })
}

/// Recursive EMA with `alpha = 2 / (window + 1)`, seeded with the first
/// value as given.
pub fn exponential_moving_average(series: &Series, window: usize) -> Series {
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut prev: Option<f64> = None;
    series.map_values(|i, v| {
        if i == 0 {
            prev = v;
            return v;
        }
        let current = v.unwrap_or(0.0);
        let ema = alpha * current + (1.0 - alpha) * prev.unwrap_or(current);
        prev = Some(ema);
        Some(ema)
    })
}

/// Point-to-point delta; the first point is null.
pub fn diff(series: &Series) -> Series {
    let values: Vec<Option<f64>> = series.values().collect();
    series.map_values(|i, v| {
        if i == 0 {
            None
        } else {
            Some(v.unwrap_or(0.0) - values[i - 1].unwrap_or(0.0))
        }
    })
}

/// Absolute value. Null points stay null.
pub fn abs(series: &Series) -> Series {
    series.map_values(|_, v| v.map(f64::abs))
}

/// Percentage change against the previous point. A zero or null previous
/// value divides by 1.
pub fn pct_change(series: &Series) -> Series {
    let values: Vec<Option<f64>> = series.values().collect();
    series.map_values(|i, v| {
        if i == 0 {
            return None;
        }
        let prev = values[i - 1].unwrap_or(0.0);
        let divisor = if prev == 0.0 || prev.is_nan() { 1.0 } else { prev };
        Some((v.unwrap_or(0.0) - prev) / divisor * 100.0)
    })
}

/// `if(cond, then, else)`.
///
/// A series condition picks per point, reading series branches by position.
/// A scalar condition returns a series or string branch unchanged and wraps
/// other scalar branches into a one-point series stamped `now`.
pub fn select(
    condition: Option<&Value>,
    then_value: Option<&Value>,
    else_value: Option<&Value>,
    now: Timestamp,
) -> Value {
    if let Some(Value::Series(condition)) = condition {
        return Value::Series(condition.map_values(|i, cond| {
            let branch = if truthy(cond) { then_value } else { else_value };
            branch_value_at(branch, i)
        }));
    }

    let chosen = if condition.is_some_and(Value::is_truthy) {
        then_value
    } else {
        else_value
    };
    match chosen {
        Some(text @ Value::Scalar(Scalar::String(_))) => text.clone(),
        Some(Value::Scalar(scalar)) => Value::Series(Series::single(now, scalar.as_number())),
        Some(other) => other.clone(),
        None => Value::Series(Series::single(now, None)),
    }
}

fn branch_value_at(branch: Option<&Value>, index: usize) -> Option<f64> {
    match branch? {
        Value::Series(series) => series.points().get(index).and_then(|p| p.value),
        Value::Scalar(scalar) => scalar.as_number(),
        Value::Entity(_) | Value::List(_) => None,
    }
}
