/*!
 * Safe Namespace
 *
 * The fixed set of names restricted code runs under. Guarded entries close
 * over the execution context they were built for; pure entries are shared
 * native functions.
 */

pub mod builtins;

use crate::authority::context::ExecutionContext;
use crate::core::errors::{GuardResult, NativeError, NativeResult};
use crate::guards::{
    apply_packed, guard_mapping_get, guard_mapping_pop, guard_named_iteration, guard_sequence_pop,
    guarded_apply, guarded_enumerate, guarded_getattr, guarded_getattr_or, guarded_hasattr,
    guarded_iter, guarded_max, guarded_min, guarded_sorted, guarded_sum,
};
use crate::value::{CallArgs, Function, Value};
use ahash::AHashMap;
use builtins::{
    builtin_abs, builtin_bool, builtin_float, builtin_int, builtin_len, builtin_list, builtin_range,
    builtin_str, builtin_tuple, dict_type,
};
use smartstring::alias::String as SmartString;
use std::fmt;
use tracing::debug;

/// Every name a `SafeNamespace` binds, sorted
pub const SAFE_NAMES: &[&str] = &[
    "False",
    "None",
    "True",
    "_apply_",
    "_get_dict_get_",
    "_get_dict_pop_",
    "_get_iter_",
    "_get_list_pop_",
    "_getattr_",
    "_getiter_",
    "abs",
    "apply",
    "bool",
    "dict",
    "enumerate",
    "float",
    "getattr",
    "hasattr",
    "int",
    "iter",
    "len",
    "list",
    "max",
    "min",
    "range",
    "sorted",
    "str",
    "sum",
    "tuple",
];

fn name_arg<'a>(args: &'a CallArgs, func: &str, index: usize) -> NativeResult<&'a str> {
    let value = args.required(func, index, "name")?;
    value.as_str().ok_or_else(|| {
        NativeError::type_error(format!(
            "{}(): attribute name must be string, not '{}'",
            func,
            value.type_name()
        ))
    })
}

/// Guarded `(container, name)` factory entry such as `_get_dict_get_`
fn factory_entry(
    func: &'static str,
    factory: fn(&ExecutionContext, &Value, &str) -> GuardResult<Value>,
) -> impl Fn(&ExecutionContext, CallArgs) -> GuardResult<Value> + Send + Sync + 'static {
    move |ctx: &ExecutionContext, args: CallArgs| {
        args.expect_positional(func, 2, 2)?;
        let container = args.required(func, 0, "container")?;
        factory(ctx, container, name_arg(&args, func, 1)?)
    }
}

/// Name → value mapping handed to the restricted-code runner
pub struct SafeNamespace {
    context: ExecutionContext,
    names: AHashMap<SmartString, Value>,
}

impl SafeNamespace {
    /// Namespace whose guarded entries check through `ctx`
    pub fn new(ctx: &ExecutionContext) -> Self {
        let mut namespace = Self {
            context: ctx.clone(),
            names: AHashMap::with_capacity(SAFE_NAMES.len()),
        };
        namespace.install_constants();
        namespace.install_pure();
        namespace.install_guarded();
        debug!(context = %ctx.id(), names = namespace.names.len(), "safe namespace built");
        namespace
    }

    fn bind(&mut self, name: &str, value: Value) {
        self.names.insert(name.into(), value);
    }

    fn bind_guarded<F>(&mut self, name: &str, body: F)
    where
        F: Fn(&ExecutionContext, CallArgs) -> GuardResult<Value> + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.bind(name, Value::Function(Function::new(name, move |args| body(&ctx, args))));
    }

    fn install_constants(&mut self) {
        self.bind("None", Value::None);
        self.bind("True", Value::Bool(true));
        self.bind("False", Value::Bool(false));
    }

    fn install_pure(&mut self) {
        let pure: [(&str, fn(CallArgs) -> GuardResult<Value>); 9] = [
            ("abs", builtin_abs),
            ("bool", builtin_bool),
            ("int", builtin_int),
            ("float", builtin_float),
            ("str", builtin_str),
            ("len", builtin_len),
            ("range", builtin_range),
            ("tuple", builtin_tuple),
            ("list", builtin_list),
        ];
        for (name, body) in pure {
            self.bind(name, Value::Function(Function::new(name, body)));
        }
        self.bind("dict", dict_type());
    }

    fn install_guarded(&mut self) {
        self.bind_guarded("min", |ctx, args| guarded_min(ctx, &args));
        self.bind_guarded("max", |ctx, args| guarded_max(ctx, &args));

        self.bind_guarded("sum", |ctx, args| {
            args.expect_positional("sum", 1, 2)?;
            args.expect_keywords("sum", &["start"])?;
            guarded_sum(ctx, args.required("sum", 0, "iterable")?, args.arg(1, "start"))
        });

        self.bind_guarded("sorted", |ctx, args| {
            args.expect_positional("sorted", 1, 1)?;
            args.expect_keywords("sorted", &["reverse"])?;
            let reverse = args.keyword("reverse").map(Value::truthy).unwrap_or(false);
            guarded_sorted(ctx, &args.positional[0], reverse)
        });

        self.bind_guarded("enumerate", |ctx, args| {
            args.expect_positional("enumerate", 1, 2)?;
            let start = match args.arg(1, "start") {
                None => 0,
                Some(v) => v.as_int().ok_or_else(|| {
                    NativeError::type_error(format!(
                        "'{}' object cannot be interpreted as an integer",
                        v.type_name()
                    ))
                })?,
            };
            Ok(guarded_enumerate(ctx, args.required("enumerate", 0, "iterable")?, start)?.into_value())
        });

        self.bind_guarded("apply", |ctx, args| {
            args.expect_positional("apply", 1, 3)?;
            let func = args.required("apply", 0, "function")?;
            apply_packed(ctx, func, args.arg(1, "args"), args.arg(2, "kwargs"))
        });

        self.bind_guarded("_apply_", |ctx, mut args| {
            if args.positional.is_empty() {
                return Err(NativeError::type_error("_apply_() missing the callable").into());
            }
            let func = args.positional.remove(0);
            guarded_apply(ctx, &func, args)
        });

        let iter = |ctx: &ExecutionContext, args: CallArgs| -> GuardResult<Value> {
            args.expect_positional("iter", 1, 1)?;
            guarded_iter(ctx, &args.positional[0])
        };
        self.bind_guarded("iter", iter);
        self.bind_guarded("_getiter_", iter);

        self.bind_guarded("getattr", |ctx, args| {
            args.expect_positional("getattr", 2, 3)?;
            let object = &args.positional[0];
            let name = name_arg(&args, "getattr", 1)?;
            match args.positional.get(2) {
                Some(default) => guarded_getattr_or(ctx, object, name, default.clone()),
                None => guarded_getattr(ctx, object, name),
            }
        });

        self.bind_guarded("_getattr_", |ctx, args| {
            args.expect_positional("_getattr_", 2, 2)?;
            guarded_getattr(ctx, &args.positional[0], name_arg(&args, "_getattr_", 1)?)
        });

        self.bind_guarded("hasattr", |ctx, args| {
            args.expect_positional("hasattr", 2, 2)?;
            let found = guarded_hasattr(ctx, &args.positional[0], name_arg(&args, "hasattr", 1)?)?;
            Ok(Value::Bool(found))
        });

        self.bind_guarded("_get_dict_get_", factory_entry("_get_dict_get_", guard_mapping_get));
        self.bind_guarded("_get_dict_pop_", factory_entry("_get_dict_pop_", guard_mapping_pop));
        self.bind_guarded("_get_list_pop_", factory_entry("_get_list_pop_", guard_sequence_pop));
        self.bind_guarded("_get_iter_", factory_entry("_get_iter_", guard_named_iteration));
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names.get(name)
    }

    /// Like `get`, but an unknown name is a `NameError`
    pub fn lookup(&self, name: &str) -> NativeResult<&Value> {
        self.get(name).ok_or_else(|| NativeError::Name(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Bound names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(SmartString::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Call the callable bound to `name`
    pub fn call(&self, name: &str, args: CallArgs) -> GuardResult<Value> {
        self.lookup(name)?.call(args)
    }
}

impl fmt::Debug for SafeNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeNamespace")
            .field("context", &self.context.id())
            .field("names", &self.names.len())
            .finish()
    }
}
