/*!
 * Authority Registry
 * Maps execution contexts to their bound security authority
 */

use super::audit::AuditLogger;
use super::context::ExecutionContext;
use super::traits::Authority;
use crate::core::errors::{GuardError, GuardResult};
use crate::core::types::ContextId;
use crate::guards::OverrideTable;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Process-wide registry of bound authorities
///
/// Bindings are keyed by context id, so concurrent bind/unbind on
/// different contexts never touch the same entry.
pub struct AuthorityRegistry {
    bindings: DashMap<ContextId, Arc<dyn Authority>, RandomState>,
    audit: Option<Arc<AuditLogger>>,
}

impl AuthorityRegistry {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::with_hasher(RandomState::new()),
            audit: None,
        }
    }

    /// Registry that records guard decisions to `audit`
    pub fn with_audit(audit: Arc<AuditLogger>) -> Self {
        Self {
            bindings: DashMap::with_hasher(RandomState::new()),
            audit: Some(audit),
        }
    }

    /// Install `authority` for `context`, returning the previous binding
    pub fn bind(&self, context: ContextId, authority: Arc<dyn Authority>) -> Option<Arc<dyn Authority>> {
        debug!(context = %context, authority = authority.name(), "binding authority");
        self.bindings.insert(context, authority)
    }

    /// Remove the binding for `context`, returning it
    pub fn unbind(&self, context: ContextId) -> Option<Arc<dyn Authority>> {
        debug!(context = %context, "unbinding authority");
        self.bindings.remove(&context).map(|(_, authority)| authority)
    }

    /// Authority currently bound for `context`
    ///
    /// A missing binding is an integration error in the host, so it is
    /// logged loudly and reported as `Unavailable`.
    pub fn current(&self, context: ContextId) -> GuardResult<Arc<dyn Authority>> {
        match self.bindings.get(&context) {
            Some(entry) => Ok(Arc::clone(entry.value())),
            None => {
                warn!(context = %context, "guarded operation with no authority bound");
                if let Some(audit) = &self.audit {
                    audit.log_unavailable(context);
                }
                Err(GuardError::Unavailable { context })
            }
        }
    }

    /// Tear down `context`: its binding and its per-context audit state
    pub fn retire(&self, context: ContextId) {
        debug!(context = %context, "retiring context");
        self.bindings.remove(&context);
        if let Some(audit) = &self.audit {
            audit.clear_context(context);
        }
    }

    pub fn is_bound(&self, context: ContextId) -> bool {
        self.bindings.contains_key(&context)
    }

    /// Number of contexts with a live binding
    pub fn bound_contexts(&self) -> usize {
        self.bindings.len()
    }

    pub fn audit(&self) -> Option<&Arc<AuditLogger>> {
        self.audit.as_ref()
    }

    /// New execution context resolving authorities through this registry
    pub fn context(self: &Arc<Self>, overrides: Arc<OverrideTable>) -> ExecutionContext {
        ExecutionContext::new(Arc::clone(self), overrides)
    }
}

impl Default for AuthorityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
