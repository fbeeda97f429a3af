/*!
 * Guarded Apply
 * Dynamic calls with unpacked arguments
 */

use crate::authority::context::ExecutionContext;
use crate::core::errors::{GuardResult, NativeError};
use crate::value::{CallArgs, Value};
use tracing::{debug_span, trace};

/// Call `func` with `args` once every argument value is approved
///
/// A call with no arguments at all runs unchecked. Otherwise positionals
/// are validated in order, then keyword values in order, and the first
/// refusal stops the call before it happens.
pub fn guarded_apply(ctx: &ExecutionContext, func: &Value, args: CallArgs) -> GuardResult<Value> {
    if args.is_empty() {
        trace!(context = %ctx.id(), "apply with nothing to unpack");
        return func.call(args);
    }

    let _span = debug_span!("guarded_apply", context = %ctx.id(), positional = args.positional.len()).entered();
    for value in &args.positional {
        ctx.validate_value(value)?;
    }
    for (_, value) in &args.keywords {
        ctx.validate_value(value)?;
    }
    func.call(args)
}

/// `apply(func, args=(), kwargs={})` with the arguments still packed
///
/// `args` may be any iterable; `kwargs` must be a dict with string keys.
pub fn apply_packed(
    ctx: &ExecutionContext,
    func: &Value,
    args: Option<&Value>,
    kwargs: Option<&Value>,
) -> GuardResult<Value> {
    let positional = match args {
        Some(Value::None) | None => Vec::new(),
        Some(args) => args.collect_items()?,
    };

    let mut keywords = Vec::new();
    match kwargs {
        Some(Value::None) | None => {}
        Some(Value::Dict(dict)) => {
            for (key, value) in dict.items() {
                match key {
                    Value::Str(name) => keywords.push((name, value)),
                    other => {
                        return Err(NativeError::type_error(format!(
                            "keywords must be strings, not '{}'",
                            other.type_name()
                        ))
                        .into())
                    }
                }
            }
        }
        Some(other) => {
            return Err(NativeError::type_error(format!(
                "apply() arg 3 must be a dict, not '{}'",
                other.type_name()
            ))
            .into())
        }
    }

    guarded_apply(ctx, func, CallArgs { positional, keywords })
}
