/*!
 * Per-Type Override Table
 *
 * Curated attribute surfaces for trusted types. An entry either returns the
 * native attribute unchecked, redirects to a guarded replacement, or denies
 * outright. Names with no entry fall through to the generic authority check.
 *
 * Reads take a lock-free snapshot; registration clones the table and swaps
 * it in, so registering while restricted code runs never blocks a reader.
 */

use super::containers::{
    guard_iteration, guard_mapping_get, guard_mapping_pop, guard_mapping_setdefault, guard_sequence_pop, IterKind,
};
use crate::authority::context::ExecutionContext;
use crate::core::errors::GuardResult;
use crate::value::{HostObject, TypeKey, Value};
use ahash::AHashMap;
use arc_swap::ArcSwap;
use smartstring::alias::String as SmartString;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds the value returned for a redirected attribute
///
/// Called with the reading context, the object and the attribute name.
pub type RedirectFactory = Arc<dyn Fn(&ExecutionContext, &Value, &str) -> GuardResult<Value> + Send + Sync>;

/// Policy for one attribute name
#[derive(Clone)]
pub enum AttrPolicy {
    /// Return the native attribute without consulting the authority
    Allow,
    /// Return whatever the factory builds instead of the native attribute
    Redirect(RedirectFactory),
    /// Refuse without reading the attribute
    Deny,
}

impl AttrPolicy {
    pub fn redirect<F>(factory: F) -> Self
    where
        F: Fn(&ExecutionContext, &Value, &str) -> GuardResult<Value> + Send + Sync + 'static,
    {
        AttrPolicy::Redirect(Arc::new(factory))
    }
}

impl fmt::Debug for AttrPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrPolicy::Allow => f.write_str("Allow"),
            AttrPolicy::Redirect(_) => f.write_str("Redirect(..)"),
            AttrPolicy::Deny => f.write_str("Deny"),
        }
    }
}

/// What happens to names missing from an attribute table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unlisted {
    /// Generic authority check
    #[default]
    FallThrough,
    /// Closed table: anything not listed is denied
    Deny,
}

/// Attribute name → policy for one type
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    entries: AHashMap<SmartString, AttrPolicy>,
    unlisted: Unlisted,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that denies every name it does not list
    pub fn closed() -> Self {
        Self {
            entries: AHashMap::new(),
            unlisted: Unlisted::Deny,
        }
    }

    pub fn allow(mut self, name: &str) -> Self {
        self.entries.insert(name.into(), AttrPolicy::Allow);
        self
    }

    pub fn allow_all<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.entries.insert(name.into(), AttrPolicy::Allow);
        }
        self
    }

    pub fn redirect<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&ExecutionContext, &Value, &str) -> GuardResult<Value> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), AttrPolicy::redirect(factory));
        self
    }

    pub fn redirect_with(mut self, name: &str, factory: RedirectFactory) -> Self {
        self.entries.insert(name.into(), AttrPolicy::Redirect(factory));
        self
    }

    pub fn deny(mut self, name: &str) -> Self {
        self.entries.insert(name.into(), AttrPolicy::Deny);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrPolicy> {
        self.entries.get(name)
    }

    pub fn unlisted(&self) -> Unlisted {
        self.unlisted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Override policy for a whole type
#[derive(Debug, Clone)]
pub enum TypePolicy {
    /// Every public attribute is returned unchecked
    AllowAll,
    Table(AttributeTable),
}

impl From<AttributeTable> for TypePolicy {
    fn from(table: AttributeTable) -> Self {
        TypePolicy::Table(table)
    }
}

/// Outcome of an override lookup
#[derive(Clone)]
pub enum Resolved {
    Allow,
    Redirect(RedirectFactory),
    Deny,
    FallThrough,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Allow => f.write_str("Allow"),
            Resolved::Redirect(_) => f.write_str("Redirect(..)"),
            Resolved::Deny => f.write_str("Deny"),
            Resolved::FallThrough => f.write_str("FallThrough"),
        }
    }
}

type PolicyMap = AHashMap<TypeKey, Arc<TypePolicy>>;

/// Type identity → override policy
pub struct OverrideTable {
    types: ArcSwap<PolicyMap>,
}

impl OverrideTable {
    /// Empty table: every attribute read goes to the authority
    pub fn new() -> Self {
        Self {
            types: ArcSwap::from_pointee(PolicyMap::new()),
        }
    }

    /// Table preloaded with the curated built-in container surfaces
    pub fn with_container_defaults() -> Self {
        let table = Self::new();
        table.install_container_defaults();
        table
    }

    /// Register curated surfaces for dict, list, tuple and str
    ///
    /// dict and list methods that return a stored element redirect to
    /// guarded wrappers. The rest return `None`, a count, an index, a fresh
    /// copy or a new mapping built from the caller's values, and are allowed
    /// unchecked.
    pub fn install_container_defaults(&self) {
        let iter_keys = guard_iteration(IterKind::Keys);
        let iter_values = guard_iteration(IterKind::Values);
        let iter_items = guard_iteration(IterKind::Items);

        let dict = AttributeTable::new()
            .redirect("get", guard_mapping_get)
            .redirect("pop", guard_mapping_pop)
            .redirect("setdefault", guard_mapping_setdefault)
            .redirect_with("keys", Arc::clone(&iter_keys))
            .redirect_with("iterkeys", iter_keys)
            .redirect_with("values", Arc::clone(&iter_values))
            .redirect_with("itervalues", iter_values)
            .redirect_with("items", Arc::clone(&iter_items))
            .redirect_with("iteritems", iter_items)
            .allow_all(["clear", "copy", "fromkeys", "has_key", "update"]);

        let list = AttributeTable::new()
            .redirect("pop", guard_sequence_pop)
            .allow_all(["append", "extend", "insert", "remove", "index", "count", "reverse", "sort"]);

        self.register(TypeKey::Dict, dict);
        self.register(TypeKey::List, list);
        self.register(TypeKey::Tuple, TypePolicy::AllowAll);
        self.register(TypeKey::Str, TypePolicy::AllowAll);
    }

    /// Install (or replace) the policy for `key`
    pub fn register(&self, key: TypeKey, policy: impl Into<TypePolicy>) {
        let policy = Arc::new(policy.into());
        debug!(?key, "registering type override");
        self.types.rcu(|current| {
            let mut next = PolicyMap::clone(current);
            next.insert(key, Arc::clone(&policy));
            next
        });
    }

    /// Install the policy for a host object type
    pub fn register_type<T: HostObject>(&self, policy: impl Into<TypePolicy>) {
        self.register(TypeKey::of::<T>(), policy);
    }

    pub fn remove(&self, key: TypeKey) -> bool {
        let mut removed = false;
        self.types.rcu(|current| {
            let mut next = PolicyMap::clone(current);
            removed = next.remove(&key).is_some();
            next
        });
        removed
    }

    pub fn get(&self, key: TypeKey) -> Option<Arc<TypePolicy>> {
        self.types.load().get(&key).cloned()
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.types.load().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.types.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.load().is_empty()
    }

    /// How a read of `name` on a value of type `key` is handled
    pub fn resolve(&self, key: TypeKey, name: &str) -> Resolved {
        let types = self.types.load();
        match types.get(&key).map(Arc::as_ref) {
            None => Resolved::FallThrough,
            Some(TypePolicy::AllowAll) => Resolved::Allow,
            Some(TypePolicy::Table(table)) => match table.get(name) {
                Some(AttrPolicy::Allow) => Resolved::Allow,
                Some(AttrPolicy::Redirect(factory)) => Resolved::Redirect(Arc::clone(factory)),
                Some(AttrPolicy::Deny) => Resolved::Deny,
                None => match table.unlisted() {
                    Unlisted::FallThrough => Resolved::FallThrough,
                    Unlisted::Deny => Resolved::Deny,
                },
            },
        }
    }
}

impl Default for OverrideTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OverrideTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideTable")
            .field("types", &self.types.load().len())
            .finish()
    }
}
