/*!
 * Callable Values
 * Native functions and call arguments
 */

use super::types::Value;
use crate::core::errors::{GuardResult, NativeError, NativeResult};
use ahash::AHashMap;
use smartstring::alias::String as SmartString;
use std::fmt;
use std::sync::Arc;

/// Signature of every callable reachable from restricted code
pub type NativeFn = dyn Fn(CallArgs) -> GuardResult<Value> + Send + Sync;

/// Positional and keyword arguments of one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(SmartString, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keywords: Vec::new(),
        }
    }

    pub fn with_keyword(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.keywords.push((SmartString::from(name), value.into()));
        self
    }

    /// True when nothing is passed at all
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Argument by position, falling back to its keyword name
    pub fn arg(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional.get(index).or_else(|| self.keyword(name))
    }

    /// Like `arg`, but a missing argument is a `TypeError`
    pub fn required(&self, func: &str, index: usize, name: &str) -> NativeResult<&Value> {
        self.arg(index, name).ok_or_else(|| {
            NativeError::type_error(format!("{}() missing required argument '{}'", func, name))
        })
    }

    /// Reject calls with too few or too many positional arguments
    pub fn expect_positional(&self, func: &str, min: usize, max: usize) -> NativeResult<()> {
        let given = self.positional.len();
        if given < min || given > max {
            let expected = if min == max {
                format!("{}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(NativeError::type_error(format!(
                "{}() takes {} positional arguments but {} were given",
                func, expected, given
            )));
        }
        Ok(())
    }

    /// Reject keywords outside `allowed`
    pub fn expect_keywords(&self, func: &str, allowed: &[&str]) -> NativeResult<()> {
        match self.keywords.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((k, _)) => Err(NativeError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                func, k
            ))),
            None => Ok(()),
        }
    }
}

impl From<Vec<Value>> for CallArgs {
    fn from(values: Vec<Value>) -> Self {
        Self::positional(values)
    }
}

/// Native callable with an optional attribute namespace
#[derive(Clone)]
pub struct Function {
    name: SmartString,
    body: Arc<NativeFn>,
    attrs: Option<Arc<AHashMap<SmartString, Value>>>,
}

impl Function {
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(CallArgs) -> GuardResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: SmartString::from(name),
            body: Arc::new(body),
            attrs: None,
        }
    }

    /// Attach a named attribute (e.g. `dict.fromkeys`)
    pub fn with_attr(mut self, name: &str, value: Value) -> Self {
        let mut attrs = self.attrs.as_deref().cloned().unwrap_or_default();
        attrs.insert(SmartString::from(name), value);
        self.attrs = Some(Arc::new(attrs));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<Value> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(name).cloned())
    }

    pub fn call(&self, args: CallArgs) -> GuardResult<Value> {
        (self.body)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.body) as *const ()
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}
