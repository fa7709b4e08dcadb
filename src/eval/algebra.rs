//! Elementwise operators over scalars and series.
//!
//! Every operator accepts possibly missing operands and never fails. Shapes:
//! series⊕series aligns on the sorted union of timestamps and fills absent
//! points with 0, series⊕scalar broadcasts the scalar, and scalar⊕scalar
//! yields a one-point series stamped `now`.

use std::collections::BTreeMap;

use super::value::{Scalar, Series, Timestamp, Value};
use crate::ast::BinaryOperator;

/// Operand after shape classification.
#[derive(Debug, Clone, Copy)]
enum Operand<'a> {
    Series(&'a Series),
    Scalar(Option<f64>),
}

/// Applies any binary operator of the language.
pub fn apply(
    op: BinaryOperator,
    left: Option<&Value>,
    right: Option<&Value>,
    now: Timestamp,
) -> Series {
    match op {
        BinaryOperator::Add => elementwise_op(left, right, now, |a, b| a + b),
        BinaryOperator::Subtract => elementwise_op(left, right, now, |a, b| a - b),
        BinaryOperator::Multiply => elementwise_op(left, right, now, |a, b| a * b),
        BinaryOperator::Divide => {
            elementwise_op(left, right, now, |a, b| if b == 0.0 { 0.0 } else { a / b })
        }
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::GreaterThan
        | BinaryOperator::LessThanEqual
        | BinaryOperator::GreaterThanEqual => compare(op, left, right, now),
        BinaryOperator::And => combine(
            logical_operand(left),
            logical_operand(right),
            now,
            |a, b| Some(bool_value(truthy(a) && truthy(b))),
        ),
        BinaryOperator::Or => combine(
            logical_operand(left),
            logical_operand(right),
            now,
            |a, b| Some(bool_value(truthy(a) || truthy(b))),
        ),
    }
}

/// Arithmetic. Null values count as 0. Operands that are missing or not
/// numeric (strings, booleans, null scalars, entities, lists) make the
/// result empty.
pub fn elementwise_op<F>(left: Option<&Value>, right: Option<&Value>, now: Timestamp, op: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    let (Some(a), Some(b)) = (arithmetic_operand(left), arithmetic_operand(right)) else {
        return Series::default();
    };
    combine(a, b, now, |x, y| Some(op(x.unwrap_or(0.0), y.unwrap_or(0.0))))
}

/// Comparison producing 1/0 points. Equality is strict on null; ordering
/// reads null as 0. Two string scalars compare by value; a string never
/// equals a non-string.
pub fn compare(
    op: BinaryOperator,
    left: Option<&Value>,
    right: Option<&Value>,
    now: Timestamp,
) -> Series {
    if let (Some(Value::Scalar(Scalar::String(a))), Some(Value::Scalar(Scalar::String(b)))) =
        (left, right)
    {
        let result = match op {
            BinaryOperator::Equal => Some(a == b),
            BinaryOperator::NotEqual => Some(a != b),
            BinaryOperator::LessThan => Some(a < b),
            BinaryOperator::GreaterThan => Some(a > b),
            BinaryOperator::LessThanEqual => Some(a <= b),
            BinaryOperator::GreaterThanEqual => Some(a >= b),
            _ => None,
        };
        return Series::single(now, result.map(bool_value));
    }

    if matches!(op, BinaryOperator::Equal | BinaryOperator::NotEqual) {
        if let (Some(Value::Scalar(Scalar::String(_))), other)
        | (other, Some(Value::Scalar(Scalar::String(_)))) = (left, right)
        {
            let unequal = Some(bool_value(op == BinaryOperator::NotEqual));
            return match other {
                Some(Value::Series(series)) => series.map_values(|_, _| unequal),
                _ => Series::single(now, unequal),
            };
        }
    }

    combine_loose(left, right, now, |a, b| match op {
        BinaryOperator::Equal => a == b,
        BinaryOperator::NotEqual => a != b,
        BinaryOperator::LessThan => a.unwrap_or(0.0) < b.unwrap_or(0.0),
        BinaryOperator::GreaterThan => a.unwrap_or(0.0) > b.unwrap_or(0.0),
        BinaryOperator::LessThanEqual => a.unwrap_or(0.0) <= b.unwrap_or(0.0),
        BinaryOperator::GreaterThanEqual => a.unwrap_or(0.0) >= b.unwrap_or(0.0),
        _ => false,
    })
}

/// Logical negation. A missing operand is falsy, so `!` of it is true.
pub fn not(operand: Option<&Value>, now: Timestamp) -> Series {
    match operand {
        Some(Value::Series(series)) => series.map_values(|_, v| Some(bool_value(!truthy(v)))),
        Some(other) => Series::single(now, Some(bool_value(!other.is_truthy()))),
        None => Series::single(now, Some(bool_value(true))),
    }
}

pub fn truthy(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v != 0.0 && !v.is_nan())
}

pub fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn arithmetic_operand(value: Option<&Value>) -> Option<Operand<'_>> {
    match value? {
        Value::Series(series) => Some(Operand::Series(series)),
        Value::Scalar(Scalar::Number(n)) => Some(Operand::Scalar(Some(*n))),
        Value::Scalar(_) | Value::Entity(_) | Value::List(_) => None,
    }
}

fn loose_operand(value: Option<&Value>) -> Operand<'_> {
    match value {
        Some(Value::Series(series)) => Operand::Series(series),
        Some(Value::Scalar(scalar)) => Operand::Scalar(scalar.as_number()),
        Some(Value::Entity(_)) | Some(Value::List(_)) | None => Operand::Scalar(None),
    }
}

/// Non-series operands of `&&`/`||` are read by truthiness, so non-empty
/// strings count as true.
fn logical_operand(value: Option<&Value>) -> Operand<'_> {
    match value {
        Some(Value::Series(series)) => Operand::Series(series),
        Some(other) => Operand::Scalar(Some(bool_value(other.is_truthy()))),
        None => Operand::Scalar(None),
    }
}

fn combine_loose<F>(left: Option<&Value>, right: Option<&Value>, now: Timestamp, pred: F) -> Series
where
    F: Fn(Option<f64>, Option<f64>) -> bool,
{
    combine(loose_operand(left), loose_operand(right), now, |a, b| {
        Some(bool_value(pred(a, b)))
    })
}

fn combine<F>(left: Operand<'_>, right: Operand<'_>, now: Timestamp, f: F) -> Series
where
    F: Fn(Option<f64>, Option<f64>) -> Option<f64>,
{
    match (left, right) {
        (Operand::Series(a), Operand::Series(b)) => {
            let mut aligned: BTreeMap<Timestamp, (Option<f64>, Option<f64>)> = BTreeMap::new();
            for point in a.points() {
                aligned.insert(point.timestamp, (point.value, Some(0.0)));
            }
            for point in b.points() {
                aligned
                    .entry(point.timestamp)
                    .and_modify(|entry| entry.1 = point.value)
                    .or_insert((Some(0.0), point.value));
            }
            aligned
                .into_iter()
                .map(|(timestamp, (x, y))| (timestamp, f(x, y)))
                .collect()
        }
        (Operand::Series(a), Operand::Scalar(y)) => a.map_values(|_, x| f(x, y)),
        (Operand::Scalar(x), Operand::Series(b)) => b.map_values(|_, y| f(x, y)),
        (Operand::Scalar(x), Operand::Scalar(y)) => Series::single(now, f(x, y)),
    }
}
