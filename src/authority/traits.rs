/*!
 * Authority Traits
 * The contract every security authority must satisfy
 */

use crate::value::Value;

/// Outcome of a single authority check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::Deny { reason } => Some(reason),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::deny("refused")
        }
    }
}

/// Generic attribute access being validated
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    /// Object performing the access, `None` for restricted code itself
    pub accessor: Option<&'a Value>,
    /// Object whose attribute is read
    pub accessed: &'a Value,
    /// Attribute name
    pub name: &'a str,
    /// Object the attribute was found on
    pub container: &'a Value,
    /// Value the access would expose
    pub value: &'a Value,
}

impl<'a> AccessRequest<'a> {
    /// Attribute read by restricted code on `object`
    pub fn attribute(object: &'a Value, name: &'a str, value: &'a Value) -> Self {
        Self {
            accessor: None,
            accessed: object,
            name,
            container: object,
            value,
        }
    }
}

/// Pluggable policy decision-maker consulted by the guards
///
/// Implementations must be fast and non-blocking: they run inline with every
/// guarded operation.
pub trait Authority: Send + Sync {
    /// Validate a generic attribute access
    fn validate(&self, request: &AccessRequest<'_>) -> Decision;

    /// Validate a value about to be exposed to restricted code
    fn validate_value(&self, value: &Value) -> Decision;

    /// Check a named permission on an object; never raises
    fn check_permission(&self, permission: &str, object: &Value) -> bool;

    /// Name for logs and audit records
    fn name(&self) -> &str {
        "authority"
    }
}

/// Authority that approves everything
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveAuthority;

impl Authority for PermissiveAuthority {
    fn validate(&self, _request: &AccessRequest<'_>) -> Decision {
        Decision::Allow
    }

    fn validate_value(&self, _value: &Value) -> Decision {
        Decision::Allow
    }

    fn check_permission(&self, _permission: &str, _object: &Value) -> bool {
        true
    }

    fn name(&self) -> &str {
        "permissive"
    }
}

/// Authority that refuses everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllAuthority;

impl Authority for DenyAllAuthority {
    fn validate(&self, request: &AccessRequest<'_>) -> Decision {
        Decision::deny(format!("attribute '{}' refused", request.name))
    }

    fn validate_value(&self, value: &Value) -> Decision {
        Decision::deny(format!("{} value refused", value.type_name()))
    }

    fn check_permission(&self, _permission: &str, _object: &Value) -> bool {
        false
    }

    fn name(&self) -> &str {
        "deny_all"
    }
}
