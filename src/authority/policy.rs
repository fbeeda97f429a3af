/*!
 * Policy Authority
 * Authority built from an ordered chain of policies
 */

use super::traits::{AccessRequest, Authority, Decision};
use crate::value::{TypeKey, Value};
use ahash::AHashSet;
use smartstring::alias::String as SmartString;
use tracing::trace;

/// Policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny,
    Abstain,
}

/// The question put to a policy
#[derive(Debug, Clone, Copy)]
pub enum AccessCheck<'a> {
    Attribute(&'a AccessRequest<'a>),
    Value(&'a Value),
    Permission { permission: &'a str, object: &'a Value },
}

/// Policy that can evaluate access checks
pub trait Policy: Send + Sync {
    fn evaluate(&self, check: &AccessCheck<'_>) -> PolicyDecision;

    fn name(&self) -> &str;
}

/// Authority that consults its policies in order
///
/// The first non-abstaining policy decides. When every policy abstains the
/// check is denied.
pub struct PolicyAuthority {
    name: SmartString,
    policies: Vec<Box<dyn Policy>>,
}

impl PolicyAuthority {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
        }
    }

    /// Add a policy
    pub fn add_policy(&mut self, policy: Box<dyn Policy>) {
        self.policies.push(policy);
    }

    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    fn decide(&self, check: &AccessCheck<'_>) -> Decision {
        for policy in &self.policies {
            match policy.evaluate(check) {
                PolicyDecision::Allow => {
                    trace!(policy = policy.name(), "policy allowed check");
                    return Decision::Allow;
                }
                PolicyDecision::Deny => {
                    trace!(policy = policy.name(), "policy denied check");
                    return Decision::deny(format!("denied by policy '{}'", policy.name()));
                }
                PolicyDecision::Abstain => continue,
            }
        }

        Decision::deny("no policy allowed this access")
    }
}

impl Authority for PolicyAuthority {
    fn validate(&self, request: &AccessRequest<'_>) -> Decision {
        self.decide(&AccessCheck::Attribute(request))
    }

    fn validate_value(&self, value: &Value) -> Decision {
        self.decide(&AccessCheck::Value(value))
    }

    fn check_permission(&self, permission: &str, object: &Value) -> bool {
        self.decide(&AccessCheck::Permission { permission, object }).is_allowed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Allows values of plain data types, abstains on everything else
///
/// Scalars, strings, tuples and the built-in containers count as plain data.
/// Host objects, functions and iterators are left to later policies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarValuePolicy;

impl Policy for ScalarValuePolicy {
    fn evaluate(&self, check: &AccessCheck<'_>) -> PolicyDecision {
        let AccessCheck::Value(value) = check else {
            return PolicyDecision::Abstain;
        };
        match value.type_key() {
            TypeKey::None
            | TypeKey::Bool
            | TypeKey::Int
            | TypeKey::Float
            | TypeKey::Str
            | TypeKey::Tuple
            | TypeKey::List
            | TypeKey::Dict => PolicyDecision::Allow,
            _ => PolicyDecision::Abstain,
        }
    }

    fn name(&self) -> &str {
        "scalar_values"
    }
}

/// Allow or deny attribute checks by name
#[derive(Debug, Default, Clone)]
pub struct AttributeNamePolicy {
    allowed: AHashSet<SmartString>,
    denied: AHashSet<SmartString>,
}

impl AttributeNamePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, name: &str) -> Self {
        self.allowed.insert(name.into());
        self
    }

    pub fn deny(mut self, name: &str) -> Self {
        self.denied.insert(name.into());
        self
    }
}

impl Policy for AttributeNamePolicy {
    fn evaluate(&self, check: &AccessCheck<'_>) -> PolicyDecision {
        let AccessCheck::Attribute(request) = check else {
            return PolicyDecision::Abstain;
        };
        if self.denied.contains(request.name) {
            PolicyDecision::Deny
        } else if self.allowed.contains(request.name) {
            PolicyDecision::Allow
        } else {
            PolicyDecision::Abstain
        }
    }

    fn name(&self) -> &str {
        "attribute_names"
    }
}

/// Grants a fixed set of named permissions on any object
#[derive(Debug, Default, Clone)]
pub struct PermissionGrantPolicy {
    granted: AHashSet<SmartString>,
}

impl PermissionGrantPolicy {
    pub fn new<'a>(permissions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            granted: permissions.into_iter().map(SmartString::from).collect(),
        }
    }
}

impl Policy for PermissionGrantPolicy {
    fn evaluate(&self, check: &AccessCheck<'_>) -> PolicyDecision {
        match check {
            AccessCheck::Permission { permission, .. } if self.granted.contains(*permission) => {
                PolicyDecision::Allow
            }
            _ => PolicyDecision::Abstain,
        }
    }

    fn name(&self) -> &str {
        "permission_grants"
    }
}

/// Policy backed by a closure
pub struct FnPolicy<F> {
    name: SmartString,
    evaluate: F,
}

impl<F> FnPolicy<F>
where
    F: Fn(&AccessCheck<'_>) -> PolicyDecision + Send + Sync,
{
    pub fn new(name: &str, evaluate: F) -> Self {
        Self {
            name: name.into(),
            evaluate,
        }
    }
}

impl<F> Policy for FnPolicy<F>
where
    F: Fn(&AccessCheck<'_>) -> PolicyDecision + Send + Sync,
{
    fn evaluate(&self, check: &AccessCheck<'_>) -> PolicyDecision {
        (self.evaluate)(check)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
