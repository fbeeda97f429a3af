/*!
 * Guards Module
 * Guarded attribute access, container wrappers and aggregate built-ins
 *
 * Every guard takes the execution context explicitly (or captures it in the
 * closure it returns) and resolves the bound authority at call time.
 */

pub mod aggregates;
pub mod apply;
pub mod containers;
pub mod getattr;
pub mod iter;
pub mod overrides;

pub use aggregates::{
    guarded_enumerate, guarded_max, guarded_min, guarded_sorted, guarded_sum, GuardedEnumerate,
};
pub use apply::{apply_packed, guarded_apply};
pub use containers::{
    guard_iteration, guard_mapping_get, guard_mapping_pop, guard_mapping_setdefault, guard_named_iteration,
    guard_sequence_pop, IterKind,
};
pub use getattr::{guarded_getattr, guarded_getattr_or, guarded_hasattr};
pub use iter::{guarded_iter, GuardedIterator};
pub use overrides::{
    AttrPolicy, AttributeTable, OverrideTable, RedirectFactory, Resolved, TypePolicy, Unlisted,
};
