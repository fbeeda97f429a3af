/*!
 * Value Operations
 * Native (unguarded) semantics for comparison, addition, iteration and calls
 */

use super::collections::{IterRef, ValueIter};
use super::function::CallArgs;
use super::types::Value;
use crate::core::errors::{GuardResult, NativeError, NativeResult};
use std::cmp::Ordering;

fn lexicographic(a: &[Value], b: &[Value]) -> NativeResult<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.compare(y)? {
            Ordering::Equal => continue,
            unequal => return Ok(unequal),
        }
    }
    Ok(a.len().cmp(&b.len()))
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            Value::Function(_) | Value::Iter(_) | Value::Object(_) => true,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(*b as i64 as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Ordering used by min, max and sorted
    ///
    /// An unordered pair (NaN) is neither less nor greater: `Equal`.
    pub fn compare(&self, other: &Value) -> NativeResult<Ordering> {
        match (self, other) {
            (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
                Ok(self.as_int().cmp(&other.as_int()))
            }
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => {
                let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
            }
            (Value::Str(a), Value::Str(b)) => Ok(a.as_str().cmp(b.as_str())),
            (Value::Tuple(a), Value::Tuple(b)) => lexicographic(a, b),
            (Value::List(a), Value::List(b)) => lexicographic(&a.snapshot(), &b.snapshot()),
            _ => Err(NativeError::type_error(format!(
                "'<' not supported between instances of '{}' and '{}'",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// The `+` operator
    pub fn add(&self, other: &Value) -> NativeResult<Value> {
        match (self, other) {
            (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
                let (a, b) = (self.as_int().unwrap_or_default(), other.as_int().unwrap_or_default());
                a.checked_add(b)
                    .map(Value::Int)
                    .ok_or_else(|| NativeError::Overflow("integer addition overflowed".into()))
            }
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => Ok(Value::Float(
                a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default(),
            )),
            (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{}{}", a, b))),
            (Value::Tuple(a), Value::Tuple(b)) => {
                Ok(Value::tuple(a.iter().chain(b.iter()).cloned()))
            }
            (Value::List(a), Value::List(b)) => {
                let mut items = a.snapshot();
                items.extend(b.snapshot());
                Ok(Value::list(items))
            }
            _ => Err(NativeError::type_error(format!(
                "unsupported operand type(s) for +: '{}' and '{}'",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Native iteration, without any validation
    ///
    /// Lists, tuples and strings are restartable (each call snapshots the
    /// source); dicts iterate their keys; iterators are consumed in place.
    pub fn iterate(&self) -> NativeResult<ValueIter> {
        match self {
            Value::List(l) => Ok(Box::new(l.snapshot().into_iter().map(Ok))),
            Value::Tuple(items) => Ok(Box::new(items.to_vec().into_iter().map(Ok))),
            Value::Dict(d) => Ok(Box::new(d.keys().into_iter().map(Ok))),
            Value::Str(s) => {
                let chars: Vec<Value> = s.chars().map(|c| Value::str(c.to_string())).collect();
                Ok(Box::new(chars.into_iter().map(Ok)))
            }
            Value::Iter(it) => {
                let it: IterRef = it.clone();
                Ok(Box::new(std::iter::from_fn(move || it.next())))
            }
            other => Err(NativeError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Drain the native iteration into a vector
    pub fn collect_items(&self) -> GuardResult<Vec<Value>> {
        self.iterate()?.collect()
    }

    /// Invoke a callable value
    pub fn call(&self, args: CallArgs) -> GuardResult<Value> {
        match self {
            Value::Function(f) => f.call(args),
            other => Err(NativeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))
            .into()),
        }
    }

    pub fn len(&self) -> NativeResult<usize> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::Tuple(items) => Ok(items.len()),
            Value::List(l) => Ok(l.len()),
            Value::Dict(d) => Ok(d.len()),
            other => Err(NativeError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }
}
