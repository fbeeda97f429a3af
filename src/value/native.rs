/*!
 * Native Attribute Surface
 * Unguarded attribute reads and bound methods of the built-in types
 *
 * Nothing here consults an authority. Restricted code only reaches these
 * through the guarded attribute dispatcher.
 */

use super::collections::{DictRef, IterRef, ListRef};
use super::function::{CallArgs, Function};
use super::types::Value;
use crate::core::errors::{GuardResult, NativeError, NativeResult};
use std::cmp::Ordering;

fn dict_method<F>(dict: &DictRef, name: &str, body: F) -> Value
where
    F: Fn(&DictRef, CallArgs) -> GuardResult<Value> + Send + Sync + 'static,
{
    let dict = dict.clone();
    Value::Function(Function::new(&format!("dict.{}", name), move |args| body(&dict, args)))
}

fn list_method<F>(list: &ListRef, name: &str, body: F) -> Value
where
    F: Fn(&ListRef, CallArgs) -> GuardResult<Value> + Send + Sync + 'static,
{
    let list = list.clone();
    Value::Function(Function::new(&format!("list.{}", name), move |args| body(&list, args)))
}

fn value_method<F>(receiver: &Value, name: &str, body: F) -> Value
where
    F: Fn(&Value, CallArgs) -> GuardResult<Value> + Send + Sync + 'static,
{
    let receiver = receiver.clone();
    let qualified = format!("{}.{}", receiver.type_name(), name);
    Value::Function(Function::new(&qualified, move |args| body(&receiver, args)))
}

/// `dict.fromkeys(iterable, value=None)`
pub fn dict_fromkeys(args: CallArgs) -> GuardResult<Value> {
    args.expect_positional("fromkeys", 1, 2)?;
    let keys = args.required("fromkeys", 0, "iterable")?.collect_items()?;
    let fill = args.arg(1, "value").cloned().unwrap_or(Value::None);
    let dict = DictRef::from_pairs(keys.into_iter().map(|k| (k, fill.clone())))?;
    Ok(Value::Dict(dict))
}

/// Native `dict.pop` without validation
pub(crate) fn dict_pop(dict: &DictRef, args: &CallArgs) -> GuardResult<Value> {
    args.expect_positional("pop", 1, 2)?;
    let key = args.required("pop", 0, "key")?;
    match dict.remove(key)? {
        Some(value) => Ok(value),
        None => match args.arg(1, "default") {
            Some(default) => Ok(default.clone()),
            None => Err(NativeError::Key(key.repr()).into()),
        },
    }
}

/// Index argument of `list.pop`
pub(crate) fn pop_index(args: &CallArgs) -> NativeResult<Option<i64>> {
    args.expect_positional("pop", 0, 1)?;
    match args.arg(0, "index") {
        None => Ok(None),
        Some(v) => v.as_int().map(Some).ok_or_else(|| {
            NativeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                v.type_name()
            ))
        }),
    }
}

fn dict_attr(dict: &DictRef, name: &str) -> Option<Value> {
    let method = match name {
        "get" => dict_method(dict, name, |d, args| {
            args.expect_positional("get", 1, 2)?;
            let key = args.required("get", 0, "key")?;
            Ok(d.get(key)?
                .unwrap_or_else(|| args.arg(1, "default").cloned().unwrap_or(Value::None)))
        }),
        "pop" => dict_method(dict, name, |d, args| dict_pop(d, &args)),
        "keys" => dict_method(dict, name, |d, _| Ok(Value::list(d.keys()))),
        "values" => dict_method(dict, name, |d, _| Ok(Value::list(d.values()))),
        "items" => dict_method(dict, name, |d, _| {
            Ok(Value::list(d.items().into_iter().map(|(k, v)| Value::tuple([k, v]))))
        }),
        "iterkeys" => dict_method(dict, name, |d, _| {
            Ok(Value::Iter(IterRef::new(d.keys().into_iter().map(Ok))))
        }),
        "itervalues" => dict_method(dict, name, |d, _| {
            Ok(Value::Iter(IterRef::new(d.values().into_iter().map(Ok))))
        }),
        "iteritems" => dict_method(dict, name, |d, _| {
            let items = d.items().into_iter().map(|(k, v)| Ok(Value::tuple([k, v])));
            Ok(Value::Iter(IterRef::new(items)))
        }),
        "has_key" => dict_method(dict, name, |d, args| {
            args.expect_positional("has_key", 1, 1)?;
            Ok(Value::Bool(d.contains(args.required("has_key", 0, "key")?)?))
        }),
        "copy" => dict_method(dict, name, |d, _| Ok(Value::Dict(d.copy()))),
        "clear" => dict_method(dict, name, |d, _| {
            d.clear();
            Ok(Value::None)
        }),
        "setdefault" => dict_method(dict, name, |d, args| {
            args.expect_positional("setdefault", 1, 2)?;
            let key = args.required("setdefault", 0, "key")?.clone();
            let default = args.arg(1, "default").cloned().unwrap_or(Value::None);
            Ok(d.setdefault(key, default)?)
        }),
        "update" => dict_method(dict, name, |d, args| {
            args.expect_positional("update", 0, 1)?;
            if let Some(other) = args.positional.first() {
                match other {
                    Value::Dict(src) => {
                        for (k, v) in src.items() {
                            d.insert(k, v)?;
                        }
                    }
                    pairs => {
                        for pair in pairs.collect_items()? {
                            let kv = pair.collect_items()?;
                            if kv.len() != 2 {
                                return Err(NativeError::value_error(
                                    "dictionary update sequence element has wrong length",
                                )
                                .into());
                            }
                            d.insert(kv[0].clone(), kv[1].clone())?;
                        }
                    }
                }
            }
            for (k, v) in &args.keywords {
                d.insert(Value::str(k), v.clone())?;
            }
            Ok(Value::None)
        }),
        "fromkeys" => Value::Function(Function::new("dict.fromkeys", dict_fromkeys)),
        _ => return None,
    };
    Some(method)
}

fn list_attr(list: &ListRef, name: &str) -> Option<Value> {
    let method = match name {
        "append" => list_method(list, name, |l, args| {
            args.expect_positional("append", 1, 1)?;
            l.push(args.positional[0].clone());
            Ok(Value::None)
        }),
        "extend" => list_method(list, name, |l, args| {
            args.expect_positional("extend", 1, 1)?;
            l.extend(args.positional[0].collect_items()?);
            Ok(Value::None)
        }),
        "insert" => list_method(list, name, |l, args| {
            args.expect_positional("insert", 2, 2)?;
            let index = args.positional[0]
                .as_int()
                .ok_or_else(|| NativeError::type_error("insert index must be an integer"))?;
            l.insert(index, args.positional[1].clone());
            Ok(Value::None)
        }),
        "pop" => list_method(list, name, |l, args| Ok(l.pop(pop_index(&args)?)?)),
        "remove" => list_method(list, name, |l, args| {
            args.expect_positional("remove", 1, 1)?;
            l.remove(&args.positional[0])?;
            Ok(Value::None)
        }),
        "index" => list_method(list, name, |l, args| {
            args.expect_positional("index", 1, 1)?;
            l.snapshot()
                .iter()
                .position(|item| item == &args.positional[0])
                .map(Value::from)
                .ok_or_else(|| NativeError::value_error("list.index(x): x not in list").into())
        }),
        "count" => list_method(list, name, |l, args| {
            args.expect_positional("count", 1, 1)?;
            let n = l.snapshot().iter().filter(|item| *item == &args.positional[0]).count();
            Ok(Value::from(n))
        }),
        "reverse" => list_method(list, name, |l, _| {
            l.reverse();
            Ok(Value::None)
        }),
        "sort" => list_method(list, name, |l, args| {
            args.expect_keywords("sort", &["reverse"])?;
            let reverse = args.keyword("reverse").is_some_and(Value::truthy);
            l.replace(sort_values(l.snapshot(), reverse)?);
            Ok(Value::None)
        }),
        _ => return None,
    };
    Some(method)
}

fn str_attr(receiver: &Value, name: &str) -> Option<Value> {
    let method = match name {
        "upper" => value_method(receiver, name, |v, _| {
            Ok(Value::str(v.as_str().unwrap_or_default().to_uppercase()))
        }),
        "lower" => value_method(receiver, name, |v, _| {
            Ok(Value::str(v.as_str().unwrap_or_default().to_lowercase()))
        }),
        "strip" => value_method(receiver, name, |v, _| {
            Ok(Value::str(v.as_str().unwrap_or_default().trim()))
        }),
        "split" => value_method(receiver, name, |v, args| {
            let s = v.as_str().unwrap_or_default();
            let parts: Vec<Value> = match args.arg(0, "sep").and_then(Value::as_str) {
                Some(sep) if !sep.is_empty() => s.split(sep).map(Value::str).collect(),
                Some(_) => return Err(NativeError::value_error("empty separator").into()),
                None => s.split_whitespace().map(Value::str).collect(),
            };
            Ok(Value::list(parts))
        }),
        "startswith" | "endswith" => {
            let (prefix, func) = if name == "startswith" {
                (true, "startswith")
            } else {
                (false, "endswith")
            };
            value_method(receiver, name, move |v, args| {
                args.expect_positional(func, 1, 1)?;
                let s = v.as_str().unwrap_or_default();
                let affix = args.positional[0]
                    .as_str()
                    .ok_or_else(|| NativeError::type_error("argument must be str"))?;
                Ok(Value::Bool(if prefix { s.starts_with(affix) } else { s.ends_with(affix) }))
            })
        }
        "join" => value_method(receiver, name, |v, args| {
            args.expect_positional("join", 1, 1)?;
            let mut parts = Vec::new();
            for item in args.positional[0].collect_items()? {
                match item.as_str() {
                    Some(s) => parts.push(s.to_string()),
                    None => {
                        return Err(NativeError::type_error(format!(
                            "sequence item: expected str instance, {} found",
                            item.type_name()
                        ))
                        .into())
                    }
                }
            }
            Ok(Value::str(parts.join(v.as_str().unwrap_or_default())))
        }),
        _ => return None,
    };
    Some(method)
}

fn tuple_attr(receiver: &Value, name: &str) -> Option<Value> {
    let method = match name {
        "index" => value_method(receiver, name, |v, args| {
            args.expect_positional("index", 1, 1)?;
            v.collect_items()?
                .iter()
                .position(|item| item == &args.positional[0])
                .map(Value::from)
                .ok_or_else(|| NativeError::value_error("tuple.index(x): x not in tuple").into())
        }),
        "count" => value_method(receiver, name, |v, args| {
            args.expect_positional("count", 1, 1)?;
            let n = v.collect_items()?.iter().filter(|i| *i == &args.positional[0]).count();
            Ok(Value::from(n))
        }),
        _ => return None,
    };
    Some(method)
}

/// Stable sort with the native ordering
///
/// Only "strictly before" is asked of the ordering, so unordered pairs (NaN)
/// and equal items keep their input order in both directions. The first
/// incomparable pair aborts the sort.
pub(crate) fn sort_values(items: Vec<Value>, reverse: bool) -> NativeResult<Vec<Value>> {
    let wanted = if reverse { Ordering::Greater } else { Ordering::Less };
    merge_sort(items, &|a: &Value, b: &Value| -> NativeResult<bool> { Ok(a.compare(b)? == wanted) })
}

fn merge_sort<F>(mut items: Vec<Value>, before: &F) -> NativeResult<Vec<Value>>
where
    F: Fn(&Value, &Value) -> NativeResult<bool>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, before)?;
    let right = merge_sort(right, before)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // ties go left
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => before(r, l)?,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    Ok(merged)
}

/// Native attribute read
///
/// Returns `AttributeError` for names the value does not have.
pub fn native_getattr(value: &Value, name: &str) -> NativeResult<Value> {
    let found = match value {
        Value::Dict(d) => dict_attr(d, name),
        Value::List(l) => list_attr(l, name),
        Value::Str(_) => str_attr(value, name),
        Value::Tuple(_) => tuple_attr(value, name),
        Value::Function(f) => f.attr(name),
        Value::Object(obj) => obj.get_attr(name),
        _ => None,
    };
    found.ok_or_else(|| NativeError::attribute(value.type_name(), name))
}
