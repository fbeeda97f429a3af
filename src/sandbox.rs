/*!
 * Sandbox
 * One registry and override table shared by every execution context
 */

use crate::authority::audit::AuditLogger;
use crate::authority::context::ExecutionContext;
use crate::authority::registry::AuthorityRegistry;
use crate::authority::traits::Authority;
use crate::config::GuardConfig;
use crate::core::errors::GuardError;
use crate::guards::OverrideTable;
use crate::monitoring::UnitSpan;
use crate::namespace::SafeNamespace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::info;

/// Entry point for embedding systems
pub struct Sandbox {
    config: GuardConfig,
    registry: Arc<AuthorityRegistry>,
    overrides: Arc<OverrideTable>,
}

impl Sandbox {
    pub fn new(config: GuardConfig) -> Self {
        let registry = if config.audit_enabled() {
            let audit = AuditLogger::new(config.audit_capacity, config.audit_allowed);
            AuthorityRegistry::with_audit(Arc::new(audit))
        } else {
            AuthorityRegistry::new()
        };
        let overrides = if config.container_defaults {
            OverrideTable::with_container_defaults()
        } else {
            OverrideTable::new()
        };

        info!(
            audit_capacity = config.audit_capacity,
            container_defaults = config.container_defaults,
            "sandbox created"
        );
        Self {
            config,
            registry: Arc::new(registry),
            overrides: Arc::new(overrides),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AuthorityRegistry> {
        &self.registry
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn audit(&self) -> Option<&Arc<AuditLogger>> {
        self.registry.audit()
    }

    /// Fresh execution context with nothing bound
    pub fn context(&self) -> ExecutionContext {
        self.registry.context(Arc::clone(&self.overrides))
    }

    /// Release everything the sandbox holds for `ctx`
    ///
    /// Call once the context will run no more units. Audit events stay in the
    /// global trail; the per-context log and denial counter are dropped.
    pub fn retire(&self, ctx: ExecutionContext) {
        self.registry.retire(ctx.id());
    }

    pub fn namespace(&self, ctx: &ExecutionContext) -> SafeNamespace {
        SafeNamespace::new(ctx)
    }

    /// Run one unit of work on `ctx` under `authority`
    ///
    /// The authority is unbound on every exit path. A panic inside `work`
    /// is resumed after the binding has been released.
    pub fn run_unit<T, F>(&self, ctx: &ExecutionContext, authority: Arc<dyn Authority>, work: F) -> Result<T, GuardError>
    where
        F: FnOnce(&ExecutionContext, &SafeNamespace) -> Result<T, GuardError>,
    {
        let span = UnitSpan::new(ctx.id(), authority.name());
        let binding = ctx.scoped(authority);
        let namespace = self.namespace(binding.context());

        let outcome = {
            let _entered = span.enter();
            panic::catch_unwind(AssertUnwindSafe(|| work(binding.context(), &namespace)))
        };
        drop(binding);

        match outcome {
            Ok(Ok(value)) => {
                span.record_result(true);
                Ok(value)
            }
            Ok(Err(err)) => {
                span.record_error(&err.to_string());
                Err(err)
            }
            Err(payload) => {
                span.record_error("panicked");
                drop(span);
                panic::resume_unwind(payload)
            }
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}
