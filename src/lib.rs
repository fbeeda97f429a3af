/*!
 * Guarded Execution Library
 * Policy layer mediating every attribute, container and built-in access
 * made by restricted code
 */

pub mod authority;
pub mod config;
pub mod core;
pub mod guards;
pub mod monitoring;
pub mod namespace;
pub mod sandbox;
pub mod value;

// Re-exports
pub use authority::{
    run_unit, AccessRequest, AuditLogger, Authority, AuthorityBinding, AuthorityRegistry, Decision,
    DenyAllAuthority, ExecutionContext, PermissiveAuthority, PolicyAuthority,
};
pub use config::{ConfigError, GuardConfig};
pub use crate::core::{ContextId, GuardError, GuardResult, NativeError, NativeResult};
pub use guards::{
    guard_iteration, guard_mapping_get, guard_mapping_pop, guard_mapping_setdefault, guard_sequence_pop, guarded_apply,
    guarded_enumerate, guarded_getattr, guarded_iter, guarded_max, guarded_min, guarded_sum,
    AttrPolicy, AttributeTable, IterKind, OverrideTable, TypePolicy,
};
pub use namespace::SafeNamespace;
pub use sandbox::Sandbox;
pub use value::{CallArgs, Function, HostObject, TypeKey, Value};
