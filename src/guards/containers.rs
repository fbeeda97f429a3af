/*!
 * Guarded Container Wrappers
 *
 * Factories returning closures that run a mapping or sequence operation and
 * validate every value the operation exposes. The closures capture the
 * execution context, so the authority bound when they are *called* governs.
 */

use super::iter::GuardedIterator;
use super::overrides::RedirectFactory;
use crate::authority::context::ExecutionContext;
use crate::core::errors::{GuardResult, NativeError, NativeResult};
use crate::value::native::{dict_pop, pop_index};
use crate::value::{CallArgs, DictRef, Function, ListRef, Value};
use std::sync::Arc;

/// Which side of a mapping a guarded iteration yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterKind {
    Keys,
    Values,
    /// `(key, value)` tuples; both halves are validated
    Items,
}

impl IterKind {
    /// Kind selected by a dict method name
    pub fn from_method(name: &str) -> Option<Self> {
        match name {
            "keys" | "iterkeys" => Some(IterKind::Keys),
            "values" | "itervalues" => Some(IterKind::Values),
            "items" | "iteritems" => Some(IterKind::Items),
            _ => None,
        }
    }
}

fn expect_dict<'a>(container: &'a Value, name: &str) -> NativeResult<&'a DictRef> {
    container.as_dict().ok_or_else(|| {
        NativeError::type_error(format!(
            "{}() requires a dict, not '{}'",
            name,
            container.type_name()
        ))
    })
}

fn expect_list<'a>(container: &'a Value, name: &str) -> NativeResult<&'a ListRef> {
    container.as_list().ok_or_else(|| {
        NativeError::type_error(format!(
            "{}() requires a list, not '{}'",
            name,
            container.type_name()
        ))
    })
}

/// Guarded `dict.get(key, default=None)`
///
/// A found value is validated before it is returned. A missing key returns
/// the default (or `None`) without consulting the authority.
pub fn guard_mapping_get(ctx: &ExecutionContext, container: &Value, name: &str) -> GuardResult<Value> {
    let dict = expect_dict(container, name)?.clone();
    let ctx = ctx.clone();
    let get = Function::new(name, move |args: CallArgs| {
        args.expect_positional("get", 1, 2)?;
        let key = args.required("get", 0, "key")?;
        match dict.get(key)? {
            Some(value) => {
                ctx.validate_value(&value)?;
                Ok(value)
            }
            None => Ok(args.arg(1, "default").cloned().unwrap_or(Value::None)),
        }
    });
    Ok(Value::Function(get))
}

/// Guarded `dict.pop(key[, default])`
///
/// The key is removed before the value is validated; a denied pop still
/// mutates the mapping. Native `KeyError`s skip the authority entirely.
pub fn guard_mapping_pop(ctx: &ExecutionContext, container: &Value, name: &str) -> GuardResult<Value> {
    let dict = expect_dict(container, name)?.clone();
    let ctx = ctx.clone();
    let pop = Function::new(name, move |args: CallArgs| {
        let value = dict_pop(&dict, &args)?;
        ctx.validate_value(&value)?;
        Ok(value)
    });
    Ok(Value::Function(pop))
}

/// Guarded `dict.setdefault(key, default=None)`
///
/// Same ordering as `guard_mapping_pop`: the native call runs first, so a
/// refused value may already have been inserted as the default.
pub fn guard_mapping_setdefault(ctx: &ExecutionContext, container: &Value, name: &str) -> GuardResult<Value> {
    let dict = expect_dict(container, name)?.clone();
    let ctx = ctx.clone();
    let setdefault = Function::new(name, move |args: CallArgs| {
        args.expect_positional("setdefault", 1, 2)?;
        let key = args.required("setdefault", 0, "key")?.clone();
        let default = args.arg(1, "default").cloned().unwrap_or(Value::None);
        let value = dict.setdefault(key, default)?;
        ctx.validate_value(&value)?;
        Ok(value)
    });
    Ok(Value::Function(setdefault))
}

/// Guarded `list.pop([index])`, same ordering as `guard_mapping_pop`
pub fn guard_sequence_pop(ctx: &ExecutionContext, container: &Value, name: &str) -> GuardResult<Value> {
    let list = expect_list(container, name)?.clone();
    let ctx = ctx.clone();
    let pop = Function::new(name, move |args: CallArgs| {
        let value = list.pop(pop_index(&args)?)?;
        ctx.validate_value(&value)?;
        Ok(value)
    });
    Ok(Value::Function(pop))
}

/// Factory for guarded iteration of one kind
///
/// The returned closure yields a fresh guarded iterator per call. Dicts
/// iterate the requested side; any other iterable yields its elements for
/// `Keys` and `Values`.
pub fn guard_iteration(kind: IterKind) -> RedirectFactory {
    Arc::new(move |ctx: &ExecutionContext, container: &Value, name: &str| -> GuardResult<Value> {
        match container {
            Value::Dict(_) => {}
            _ if kind == IterKind::Items => {
                expect_dict(container, name)?;
            }
            other => {
                other.iterate()?;
            }
        }

        let ctx = ctx.clone();
        let container = container.clone();
        let iterate = Function::new(name, move |args: CallArgs| {
            args.expect_positional("iteration", 0, 0)?;
            let iter = match &container {
                Value::Dict(dict) => GuardedIterator::mapping(&ctx, dict, kind),
                other => GuardedIterator::over(&ctx, other)?,
            };
            Ok(iter.into_value())
        });
        Ok(Value::Function(iterate))
    })
}

/// Guarded iteration whose kind follows the method name
///
/// `iterkeys`/`keys` yield keys, `itervalues`/`values` values and
/// `iteritems`/`items` pairs.
pub fn guard_named_iteration(ctx: &ExecutionContext, container: &Value, name: &str) -> GuardResult<Value> {
    let kind = IterKind::from_method(name).ok_or_else(|| {
        NativeError::value_error(format!("no guarded iteration for '{}'", name))
    })?;
    guard_iteration(kind)(ctx, container, name)
}
