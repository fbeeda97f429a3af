/*!
 * Authority Module
 * Security authorities, their per-context registry and audit trail
 *
 * ## Features
 * - Explicit execution-context handles instead of ambient global state
 * - Scoped binding with guaranteed release on every exit path
 * - Policy-chain authority for embedding systems without their own
 * - Bounded audit trail of guard decisions
 *
 * ## Usage
 * ```ignore
 * use guarded_exec::authority::{run_unit, AuthorityRegistry, PermissiveAuthority};
 *
 * let registry = Arc::new(AuthorityRegistry::new());
 * let ctx = registry.context(Arc::new(OverrideTable::with_container_defaults()));
 *
 * run_unit(&ctx, Arc::new(PermissiveAuthority), |ctx| {
 *     guarded_getattr(ctx, &value, "keys")
 * })?;
 * ```
 */

pub mod audit;
pub mod context;
pub mod policy;
pub mod registry;
pub mod scope;
pub mod traits;

pub use audit::{AuditEvent, AuditLogger, AuditSeverity, AuditStats, GuardCheck};
pub use context::ExecutionContext;
pub use policy::{
    AccessCheck, AttributeNamePolicy, FnPolicy, PermissionGrantPolicy, Policy, PolicyAuthority,
    PolicyDecision, ScalarValuePolicy,
};
pub use registry::AuthorityRegistry;
pub use scope::{run_unit, AuthorityBinding};
pub use traits::{AccessRequest, Authority, DenyAllAuthority, Decision, PermissiveAuthority};
