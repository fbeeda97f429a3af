/*!
 * Execution Context
 * Explicit handle through which every guard resolves its authority
 */

use super::audit::GuardCheck;
use super::registry::AuthorityRegistry;
use super::scope::AuthorityBinding;
use super::traits::{AccessRequest, Authority, Decision};
use crate::core::errors::{GuardError, GuardResult};
use crate::core::types::ContextId;
use crate::guards::OverrideTable;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One logical thread of control executing restricted code
///
/// Cloning is cheap and yields a handle to the same context. Guarded
/// closures capture the handle, never the authority: the authority is
/// resolved on every call, so a later binding governs.
#[derive(Clone)]
pub struct ExecutionContext {
    id: ContextId,
    registry: Arc<AuthorityRegistry>,
    overrides: Arc<OverrideTable>,
}

impl ExecutionContext {
    pub fn new(registry: Arc<AuthorityRegistry>, overrides: Arc<OverrideTable>) -> Self {
        Self {
            id: ContextId::new(),
            registry,
            overrides,
        }
    }

    /// Handle for an existing context id
    pub fn with_id(id: ContextId, registry: Arc<AuthorityRegistry>, overrides: Arc<OverrideTable>) -> Self {
        Self {
            id,
            registry,
            overrides,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn registry(&self) -> &Arc<AuthorityRegistry> {
        &self.registry
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn bind(&self, authority: Arc<dyn Authority>) -> Option<Arc<dyn Authority>> {
        self.registry.bind(self.id, authority)
    }

    pub fn unbind(&self) -> Option<Arc<dyn Authority>> {
        self.registry.unbind(self.id)
    }

    /// Bind for the lifetime of the returned guard
    pub fn scoped(&self, authority: Arc<dyn Authority>) -> AuthorityBinding {
        AuthorityBinding::bind(self, authority)
    }

    pub fn current(&self) -> GuardResult<Arc<dyn Authority>> {
        self.registry.current(self.id)
    }

    fn settle(&self, authority: &dyn Authority, check: GuardCheck, subject: &str, decision: Decision) -> GuardResult<()> {
        if let Some(audit) = self.registry.audit() {
            audit.log_decision(self.id, check, subject, authority.name(), &decision);
        }
        match decision {
            Decision::Allow => {
                debug!(context = %self.id, ?check, subject, "access allowed");
                Ok(())
            }
            Decision::Deny { reason } => {
                warn!(context = %self.id, ?check, subject, reason = %reason, "access denied");
                Err(GuardError::denied(subject, reason))
            }
        }
    }

    /// Generic attribute validation through the current authority
    pub fn validate(&self, request: &AccessRequest<'_>) -> GuardResult<()> {
        let authority = self.current()?;
        let decision = authority.validate(request);
        self.settle(authority.as_ref(), GuardCheck::Attribute, request.name, decision)
    }

    /// Value validation through the current authority
    pub fn validate_value(&self, value: &Value) -> GuardResult<()> {
        let authority = self.current()?;
        let decision = authority.validate_value(value);
        self.settle(authority.as_ref(), GuardCheck::Value, value.type_name(), decision)
    }

    /// Permission query; only a missing authority is an error
    pub fn check_permission(&self, permission: &str, object: &Value) -> GuardResult<bool> {
        let authority = self.current()?;
        Ok(authority.check_permission(permission, object))
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext").field("id", &self.id).finish()
    }
}
