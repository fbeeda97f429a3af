/*!
 * Shared test fixtures
 * Recording authority and context helpers
 */

#![allow(dead_code)]

use guarded_exec::authority::{AccessRequest, Authority, Decision};
use guarded_exec::{AuthorityRegistry, CallArgs, ExecutionContext, Function, OverrideTable, Value};
use parking_lot::Mutex;
use std::sync::Arc;

/// One call received by a `RecordingAuthority`
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Validate { name: String },
    ValidateValue(Value),
    CheckPermission(String),
}

type ValueFilter = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Authority that records every call and approves or rejects on demand
pub struct RecordingAuthority {
    calls: Mutex<Vec<Call>>,
    reject: bool,
    reject_value: Option<ValueFilter>,
}

impl RecordingAuthority {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reject: false,
            reject_value: None,
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reject: true,
            reject_value: None,
        })
    }

    /// Rejects only the values matching `filter`
    pub fn rejecting_values<F>(filter: F) -> Arc<Self>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reject: false,
            reject_value: Some(Box::new(filter)),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn validate_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Validate { .. }))
            .count()
    }
}

impl Authority for RecordingAuthority {
    fn validate(&self, request: &AccessRequest<'_>) -> Decision {
        self.calls.lock().push(Call::Validate {
            name: request.name.to_string(),
        });
        Decision::from(!self.reject)
    }

    fn validate_value(&self, value: &Value) -> Decision {
        self.calls.lock().push(Call::ValidateValue(value.clone()));
        let refused = self.reject || self.reject_value.as_ref().is_some_and(|f| f(value));
        Decision::from(!refused)
    }

    fn check_permission(&self, permission: &str, _object: &Value) -> bool {
        self.calls.lock().push(Call::CheckPermission(permission.to_string()));
        !self.reject
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn context() -> ExecutionContext {
    context_with(OverrideTable::with_container_defaults())
}

pub fn context_with(overrides: OverrideTable) -> ExecutionContext {
    ExecutionContext::new(Arc::new(AuthorityRegistry::new()), Arc::new(overrides))
}

/// Context with `authority` bound
pub fn bound(authority: Arc<RecordingAuthority>) -> ExecutionContext {
    let ctx = context();
    ctx.bind(authority);
    ctx
}

pub fn ints(values: &[i64]) -> Value {
    Value::list(values.iter().map(|v| Value::Int(*v)))
}

pub fn dict(pairs: &[(&str, Value)]) -> Value {
    let map = guarded_exec::value::DictRef::from_pairs(
        pairs.iter().map(|(k, v)| (Value::str(k), v.clone())),
    )
    .unwrap();
    Value::Dict(map)
}

pub fn args(values: impl IntoIterator<Item = Value>) -> CallArgs {
    CallArgs::positional(values)
}

/// `f(a=1, b=2): return a + b`
pub fn add_ab() -> Value {
    Value::from(Function::new("f", |call: CallArgs| {
        let a = call.arg(0, "a").cloned().unwrap_or(Value::Int(1));
        let b = call.arg(1, "b").cloned().unwrap_or(Value::Int(2));
        Ok(a.add(&b)?)
    }))
}
