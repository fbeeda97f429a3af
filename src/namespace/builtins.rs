/*!
 * Pure Built-ins
 * Constructors and conversions that expose nothing they were not given
 */

use crate::core::errors::{GuardResult, NativeError, NativeResult};
use crate::core::limits::MAX_RANGE_LEN;
use crate::value::{dict_fromkeys, CallArgs, DictRef, Function, Value};

fn int_arg(func: &str, value: &Value) -> NativeResult<i64> {
    value.as_int().ok_or_else(|| {
        NativeError::type_error(format!(
            "{}() expected an integer, got '{}'",
            func,
            value.type_name()
        ))
    })
}

pub(crate) fn builtin_abs(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("abs", 1, 1)?;
    args.expect_keywords("abs", &[])?;
    match &args.positional[0] {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| NativeError::Overflow("integer absolute value overflows".into()).into()),
        other => Err(NativeError::type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))
        .into()),
    }
}

pub(crate) fn builtin_bool(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("bool", 0, 1)?;
    Ok(Value::Bool(args.positional.first().map(Value::truthy).unwrap_or(false)))
}

pub(crate) fn builtin_int(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("int", 0, 1)?;
    let Some(value) = args.positional.first() else {
        return Ok(Value::Int(0));
    };
    let converted = match value {
        Value::Int(i) => *i,
        Value::Bool(b) => i64::from(*b),
        Value::Float(f) if f.is_nan() => {
            return Err(NativeError::value_error("cannot convert float NaN to integer").into())
        }
        Value::Float(f) => {
            let truncated = f.trunc();
            if truncated < -9.2e18 || truncated > 9.2e18 {
                return Err(NativeError::Overflow("float too large to convert to int".into()).into());
            }
            truncated as i64
        }
        Value::Str(s) => s.trim().parse::<i64>().map_err(|_| {
            NativeError::value_error(format!("invalid literal for int() with base 10: {}", value.repr()))
        })?,
        other => {
            return Err(NativeError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
            .into())
        }
    };
    Ok(Value::Int(converted))
}

pub(crate) fn builtin_float(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("float", 0, 1)?;
    let Some(value) = args.positional.first() else {
        return Ok(Value::Float(0.0));
    };
    let converted = match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Str(s) => s.trim().parse::<f64>().map_err(|_| {
            NativeError::value_error(format!("could not convert string to float: {}", value.repr()))
        })?,
        other => {
            return Err(NativeError::type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
            .into())
        }
    };
    Ok(Value::Float(converted))
}

pub(crate) fn builtin_str(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("str", 0, 1)?;
    Ok(match args.positional.first() {
        Some(Value::Str(s)) => Value::Str(s.clone()),
        Some(other) => Value::str(other.to_string()),
        None => Value::str(""),
    })
}

pub(crate) fn builtin_len(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("len", 1, 1)?;
    Ok(Value::from(args.positional[0].len()?))
}

/// `range(stop)` / `range(start, stop[, step])` as a list, bounded in size
pub(crate) fn builtin_range(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("range", 1, 3)?;
    args.expect_keywords("range", &[])?;
    let ints = args
        .positional
        .iter()
        .map(|v| int_arg("range", v))
        .collect::<NativeResult<Vec<i64>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(NativeError::type_error("range expected 1 to 3 arguments").into()),
    };
    if step == 0 {
        return Err(NativeError::value_error("range() arg 3 must not be zero").into());
    }

    let span = i128::from(stop) - i128::from(start);
    let step_wide = i128::from(step);
    let len = if (step > 0 && span > 0) || (step < 0 && span < 0) {
        (span.abs() + step_wide.abs() - 1) / step_wide.abs()
    } else {
        0
    };
    if len > MAX_RANGE_LEN as i128 {
        return Err(NativeError::value_error("range() too large").into());
    }

    let items = (0..len).map(|i| Value::Int((i128::from(start) + i * step_wide) as i64));
    Ok(Value::list(items))
}

pub(crate) fn builtin_tuple(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("tuple", 0, 1)?;
    match args.positional.first() {
        Some(Value::Tuple(items)) => Ok(Value::Tuple(items.clone())),
        Some(iterable) => Ok(Value::tuple(iterable.collect_items()?)),
        None => Ok(Value::tuple([])),
    }
}

pub(crate) fn builtin_list(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("list", 0, 1)?;
    match args.positional.first() {
        Some(iterable) => Ok(Value::list(iterable.collect_items()?)),
        None => Ok(Value::list([])),
    }
}

/// `dict(mapping_or_pairs, **kwargs)`
pub(crate) fn builtin_dict(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("dict", 0, 1)?;
    let dict = DictRef::new();
    match args.positional.first() {
        Some(Value::Dict(source)) => {
            for (key, value) in source.items() {
                dict.insert(key, value)?;
            }
        }
        Some(pairs) => {
            for (index, item) in pairs.collect_items()?.into_iter().enumerate() {
                let pair = item.collect_items()?;
                let [key, value]: [Value; 2] = pair.try_into().map_err(|pair: Vec<Value>| {
                    NativeError::value_error(format!(
                        "dictionary update sequence element #{} has length {}; 2 is required",
                        index,
                        pair.len()
                    ))
                })?;
                dict.insert(key, value)?;
            }
        }
        None => {}
    }
    for (name, value) in args.keywords {
        dict.insert(Value::Str(name), value)?;
    }
    Ok(Value::Dict(dict))
}

/// The `dict` constructor value, carrying `dict.fromkeys`
pub(crate) fn dict_type() -> Value {
    let fromkeys = Value::Function(Function::new("fromkeys", dict_fromkeys));
    Value::Function(Function::new("dict", builtin_dict).with_attr("fromkeys", fromkeys))
}
