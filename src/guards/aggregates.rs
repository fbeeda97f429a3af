/*!
 * Guarded Aggregate Built-ins
 *
 * Whole-collection operations validate every element they touch, in
 * iteration order, before computing anything. The first refusal is the one
 * reported and no partial result escapes.
 */

use super::iter::GuardedIterator;
use crate::authority::context::ExecutionContext;
use crate::core::errors::{GuardResult, NativeError};
use crate::value::native::sort_values;
use crate::value::{CallArgs, ListRef, Value};
use std::cmp::Ordering;
use tracing::debug_span;

/// Pull every element of `iterable`, validating each one
fn validated_items(ctx: &ExecutionContext, iterable: &Value) -> GuardResult<Vec<Value>> {
    GuardedIterator::over(ctx, iterable)?.collect()
}

fn validate_each(ctx: &ExecutionContext, items: &[Value]) -> GuardResult<()> {
    items.iter().try_for_each(|item| ctx.validate_value(item))
}

/// Candidates of `min`/`max`: one iterable argument or several values
fn candidates(ctx: &ExecutionContext, func: &str, args: &CallArgs) -> GuardResult<Vec<Value>> {
    match args.positional.as_slice() {
        [] => Err(NativeError::type_error(format!(
            "{}() expected at least 1 argument, got 0",
            func
        ))
        .into()),
        [iterable] => validated_items(ctx, iterable),
        values => {
            validate_each(ctx, values)?;
            Ok(values.to_vec())
        }
    }
}

fn extreme(ctx: &ExecutionContext, func: &str, args: &CallArgs, wanted: Ordering) -> GuardResult<Value> {
    let _span = debug_span!("guarded_aggregate", func, context = %ctx.id()).entered();
    args.expect_keywords(func, &["key", "default"])?;
    let default = args.keyword("default");
    if default.is_some() && args.positional.len() > 1 {
        return Err(NativeError::type_error(format!(
            "Cannot specify a default for {}() with multiple positional arguments",
            func
        ))
        .into());
    }

    let items = candidates(ctx, func, args)?;
    if items.is_empty() {
        return match default {
            Some(default) => Ok(default.clone()),
            None => Err(NativeError::value_error(format!("{}() arg is an empty sequence", func)).into()),
        };
    }

    let key = args.keyword("key").filter(|k| !k.is_none());
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let rank = match key {
            Some(key) => key.call(CallArgs::positional([item.clone()]))?,
            None => item.clone(),
        };
        best = match best {
            Some((best_rank, best_item)) => {
                if rank.compare(&best_rank)? == wanted {
                    Some((rank, item))
                } else {
                    Some((best_rank, best_item))
                }
            }
            None => Some((rank, item)),
        };
    }
    match best {
        Some((_, item)) => Ok(item),
        None => Ok(Value::None),
    }
}

/// Guarded `min(iterable)` / `min(a, b, ...)`
///
/// Accepts the native `key=` and `default=` keywords. The first of several
/// equal minima wins.
pub fn guarded_min(ctx: &ExecutionContext, args: &CallArgs) -> GuardResult<Value> {
    extreme(ctx, "min", args, Ordering::Less)
}

/// Guarded `max(iterable)` / `max(a, b, ...)`
pub fn guarded_max(ctx: &ExecutionContext, args: &CallArgs) -> GuardResult<Value> {
    extreme(ctx, "max", args, Ordering::Greater)
}

/// Guarded `sum(iterable, start=0)`
///
/// Every element is validated before the left fold starts. Strings are
/// refused as a start value, as natively.
pub fn guarded_sum(ctx: &ExecutionContext, iterable: &Value, start: Option<&Value>) -> GuardResult<Value> {
    let _span = debug_span!("guarded_aggregate", func = "sum", context = %ctx.id()).entered();
    let start = start.cloned().unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(NativeError::type_error("sum() can't sum strings [use ''.join(seq) instead]").into());
    }

    let items = validated_items(ctx, iterable)?;
    let mut total = start;
    for item in &items {
        total = total.add(item)?;
    }
    Ok(total)
}

/// Guarded `sorted(iterable, reverse=False)`, always a new list
pub fn guarded_sorted(ctx: &ExecutionContext, iterable: &Value, reverse: bool) -> GuardResult<Value> {
    let _span = debug_span!("guarded_aggregate", func = "sorted", context = %ctx.id()).entered();
    let items = sort_values(validated_items(ctx, iterable)?, reverse)?;
    Ok(Value::List(ListRef::new(items)))
}

/// Lazy `(index, value)` pairs over a guarded iteration
///
/// Values are validated as they are produced; indices are synthesized and
/// never validated.
pub struct GuardedEnumerate {
    inner: GuardedIterator,
    index: i64,
}

impl GuardedEnumerate {
    pub fn into_value(self) -> Value {
        Value::Iter(crate::value::IterRef::guarded(self))
    }
}

impl Iterator for GuardedEnumerate {
    type Item = GuardResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.inner.next()? {
            Ok(value) => value,
            Err(err) => return Some(Err(err)),
        };
        let pair = Value::tuple([Value::Int(self.index), value]);
        self.index += 1;
        Some(Ok(pair))
    }
}

/// Guarded `enumerate(iterable, start=0)`
pub fn guarded_enumerate(ctx: &ExecutionContext, iterable: &Value, start: i64) -> GuardResult<GuardedEnumerate> {
    Ok(GuardedEnumerate {
        inner: GuardedIterator::over(ctx, iterable)?,
        index: start,
    })
}
