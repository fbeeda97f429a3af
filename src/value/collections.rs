/*!
 * Shared Containers
 * Reference-semantics list, dict and iterator handles
 */

use super::types::Value;
use crate::core::errors::{GuardResult, NativeError, NativeResult};
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Boxed iterator over values, items may carry guard errors
pub type ValueIter = Box<dyn Iterator<Item = GuardResult<Value>> + Send>;

fn unhashable(key: &Value) -> NativeError {
    NativeError::type_error(format!("unhashable type: '{}'", key.type_name()))
}

/// Shared mutable list
#[derive(Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    pub fn extend(&self, values: Vec<Value>) {
        self.0.write().extend(values);
    }

    pub fn insert(&self, index: i64, value: Value) {
        let mut items = self.0.write();
        let len = items.len() as i64;
        let at = if index < 0 { (len + index).max(0) } else { index.min(len) };
        items.insert(at as usize, value);
    }

    /// Remove and return the item at `index` (last when `None`)
    ///
    /// Negative indices count from the end.
    pub fn pop(&self, index: Option<i64>) -> NativeResult<Value> {
        let mut items = self.0.write();
        if items.is_empty() {
            return Err(NativeError::Index("pop from empty list".into()));
        }
        let len = items.len() as i64;
        let raw = index.unwrap_or(-1);
        let at = if raw < 0 { len + raw } else { raw };
        if at < 0 || at >= len {
            return Err(NativeError::Index("pop index out of range".into()));
        }
        Ok(items.remove(at as usize))
    }

    /// Remove the first item equal to `value`
    ///
    /// Equality may read this same list (`l.remove(l)`), so the search runs on
    /// a snapshot with no lock held.
    pub fn remove(&self, value: &Value) -> NativeResult<()> {
        let not_found = || NativeError::value_error("list.remove(x): x not in list");
        let at = self
            .snapshot()
            .iter()
            .position(|item| item == value)
            .ok_or_else(not_found)?;

        let mut items = self.0.write();
        if at >= items.len() {
            return Err(not_found());
        }
        items.remove(at);
        Ok(())
    }

    pub fn reverse(&self) {
        self.0.write().reverse();
    }

    pub fn replace(&self, items: Vec<Value>) {
        *self.0.write() = items;
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

/// Shared mutable mapping
#[derive(Clone, Default)]
pub struct DictRef(Arc<RwLock<AHashMap<Value, Value>>>);

impl DictRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping, rejecting unhashable keys
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> NativeResult<Self> {
        let dict = Self::new();
        for (key, value) in pairs {
            dict.insert(key, value)?;
        }
        Ok(dict)
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, key: &Value) -> NativeResult<Option<Value>> {
        if !key.is_hashable() {
            return Err(unhashable(key));
        }
        Ok(self.0.read().get(key).cloned())
    }

    pub fn contains(&self, key: &Value) -> NativeResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn insert(&self, key: Value, value: Value) -> NativeResult<Option<Value>> {
        if !key.is_hashable() {
            return Err(unhashable(&key));
        }
        Ok(self.0.write().insert(key, value))
    }

    pub fn remove(&self, key: &Value) -> NativeResult<Option<Value>> {
        if !key.is_hashable() {
            return Err(unhashable(key));
        }
        Ok(self.0.write().remove(key))
    }

    /// Return the value for `key`, inserting `default` first when absent
    pub fn setdefault(&self, key: Value, default: Value) -> NativeResult<Value> {
        if !key.is_hashable() {
            return Err(unhashable(&key));
        }
        Ok(self.0.write().entry(key).or_insert(default).clone())
    }

    pub fn clear(&self) {
        self.0.write().clear();
    }

    pub fn keys(&self) -> Vec<Value> {
        self.0.read().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.read().values().cloned().collect()
    }

    pub fn items(&self) -> Vec<(Value, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Shallow copy into a new, independent mapping
    pub fn copy(&self) -> DictRef {
        DictRef(Arc::new(RwLock::new(self.0.read().clone())))
    }

    pub(crate) fn content_eq(&self, other: &DictRef) -> bool {
        let ours = self.items();
        if ours.len() != other.len() {
            return false;
        }
        ours.iter()
            .all(|(k, v)| matches!(other.get(k), Ok(Some(ref theirs)) if theirs == v))
    }

    pub fn ptr_eq(&self, other: &DictRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

/// Shared one-shot iterator
///
/// Cloning shares the cursor: pulling from one clone advances all of them.
#[derive(Clone)]
pub struct IterRef {
    inner: Arc<Mutex<ValueIter>>,
    guarded: bool,
}

impl IterRef {
    /// Wrap an unguarded native iterator
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = GuardResult<Value>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(iter))),
            guarded: false,
        }
    }

    /// Wrap an iterator that already validates what it yields
    pub(crate) fn guarded<I>(iter: I) -> Self
    where
        I: Iterator<Item = GuardResult<Value>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(iter))),
            guarded: true,
        }
    }

    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    pub fn next(&self) -> Option<GuardResult<Value>> {
        self.inner.lock().next()
    }

    pub fn ptr_eq(&self, other: &IterRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}
